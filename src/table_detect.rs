use tracing::{debug, info};

use crate::columns::detect_columns;
use crate::model::{PageFragments, TableData, TableKind, TextFragment};
use crate::options::{AlignmentPolicy, DetectionConfig};
use crate::regions::segment_regions;
use crate::rows::{cluster_rows, filter_separator_fragments};
use crate::table_build::build_table;
use crate::warning::{ExtractWarning, WarningCode};

/// Recovers the tables of one page, first detected region first.
pub fn detect_tables_in_page(
    fragments: &[TextFragment],
    page_number: u32,
    config: &DetectionConfig,
    alignment: AlignmentPolicy,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<TableData> {
    let fragments = filter_separator_fragments(fragments);
    if fragments.is_empty() {
        debug!(page = page_number, "page has no text fragments");
        return Vec::new();
    }

    let rows = cluster_rows(&fragments, config.row_threshold);
    let anchors = detect_columns(&fragments, config);
    let regions = segment_regions(&rows, config.region_gap());
    debug!(
        page = page_number,
        rows = rows.len(),
        columns = anchors.len(),
        regions = regions.len(),
        "clustered page"
    );

    if anchors.is_empty() && !regions.is_empty() {
        warnings.push(
            ExtractWarning::new(
                WarningCode::NoColumnsDetected,
                "no recurring x positions on page; only key-value blocks can be recovered",
            )
            .with_page(page_number),
        );
    }

    let mut tables = Vec::new();
    for (index, region) in regions.iter().enumerate() {
        let region_no = index + 1;
        let outcome = build_table(
            region.slice(&rows),
            &anchors,
            page_number,
            config,
            alignment,
        );

        let dropped = outcome.unassigned_fragments + outcome.unplaced_values;
        if dropped > 0 {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::UnassignedFragments,
                    "text outside every header column was left out of the table",
                )
                .with_page(page_number)
                .with_region(region_no)
                .with_count(dropped),
            );
        }
        if outcome.kind == TableKind::KeyValue && outcome.skipped_rows > 0 {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::SkippedKeyValueRows,
                    "rows without a colon were skipped in a key-value block",
                )
                .with_page(page_number)
                .with_region(region_no)
                .with_count(outcome.skipped_rows),
            );
        }

        match outcome.table {
            Some(table) => {
                debug!(
                    page = page_number,
                    region = region_no,
                    kind = ?outcome.kind,
                    rows = table.rows.len(),
                    "recovered table"
                );
                tables.push(table);
            }
            None => warnings.push(
                ExtractWarning::new(
                    WarningCode::DroppedRegion,
                    "region produced no rows and was discarded",
                )
                .with_page(page_number)
                .with_region(region_no),
            ),
        }
    }

    tables
}

pub(crate) fn detect_tables(
    pages: &[PageFragments],
    config: &DetectionConfig,
    alignment: AlignmentPolicy,
    warnings: &mut Vec<ExtractWarning>,
) -> Vec<TableData> {
    let mut tables = Vec::new();
    for page in pages {
        let page_tables = detect_tables_in_page(
            &page.fragments,
            page.page_number,
            config,
            alignment,
            warnings,
        );
        info!(
            page = page.page_number,
            tables = page_tables.len(),
            "processed page"
        );
        tables.extend(page_tables);
    }

    if tables.is_empty() {
        warnings.push(ExtractWarning::new(
            WarningCode::NoTablesDetected,
            "no tables were detected in the selected pages",
        ));
    }

    tables
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{detect_tables, detect_tables_in_page};
    use crate::model::{PageFragments, TableData, TextFragment};
    use crate::options::{AlignmentPolicy, DetectionConfig};
    use crate::warning::{ExtractWarning, WarningCode};

    type WarningKey = (WarningCode, Option<u32>, Option<usize>, Option<usize>);

    fn detect_with_warnings(
        fragments: &[(&str, f32, f32)],
        page_number: u32,
    ) -> (Vec<TableData>, Vec<WarningKey>) {
        let fragments = fragments
            .iter()
            .map(|&(text, x, y)| TextFragment::new(text, x, y))
            .collect::<Vec<_>>();
        let mut warnings = Vec::new();
        let tables = detect_tables_in_page(
            &fragments,
            page_number,
            &DetectionConfig::default(),
            AlignmentPolicy::default(),
            &mut warnings,
        );
        let keys = warnings
            .iter()
            .map(|warning: &ExtractWarning| {
                (warning.code, warning.page, warning.region, warning.count)
            })
            .collect();
        (tables, keys)
    }

    fn statement_fragments() -> Vec<TextFragment> {
        vec![
            TextFragment::new("Date", 10.0, 100.0),
            TextFragment::new("Amount", 60.0, 100.0),
            TextFragment::new("------------", 10.0, 104.0),
            TextFragment::new("01-Jan-2024", 10.0, 110.0),
            TextFragment::new("500.00", 60.0, 110.0),
            TextFragment::new("02-Jan-2024", 10.0, 120.0),
            TextFragment::new("75.25", 61.0, 120.0),
        ]
    }

    #[test]
    fn recovers_single_grid_table() {
        let mut warnings = Vec::new();
        let tables = detect_tables_in_page(
            &statement_fragments(),
            3,
            &DetectionConfig::default(),
            AlignmentPolicy::default(),
            &mut warnings,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Date", "Amount"]);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[1]["Amount"], "75.25");
        assert_eq!(tables[0].page_number, 3);
        assert!(warnings.is_empty(), "warnings: {warnings:?}");
    }

    #[test]
    fn page_without_regions_returns_empty_list() {
        let mut warnings = Vec::new();
        let fragments = vec![
            TextFragment::new("Lonely heading", 10.0, 10.0),
            TextFragment::new("Footer", 10.0, 400.0),
        ];
        let tables = detect_tables_in_page(
            &fragments,
            1,
            &DetectionConfig::default(),
            AlignmentPolicy::default(),
            &mut warnings,
        );
        assert!(tables.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn empty_page_is_not_an_error() {
        let mut warnings = Vec::new();
        let tables = detect_tables_in_page(
            &[TextFragment::new("-----", 10.0, 10.0)],
            1,
            &DetectionConfig::default(),
            AlignmentPolicy::default(),
            &mut warnings,
        );
        assert!(tables.is_empty());
    }

    #[test]
    fn reports_no_tables_across_document() {
        let pages = vec![PageFragments {
            page_number: 1,
            fragments: vec![TextFragment::new("Cover page", 10.0, 10.0)],
        }];
        let mut warnings = Vec::new();
        let tables = detect_tables(
            &pages,
            &DetectionConfig::default(),
            AlignmentPolicy::default(),
            &mut warnings,
        );
        assert!(tables.is_empty());
        assert_eq!(warnings.last().map(|w| w.code), Some(WarningCode::NoTablesDetected));
    }

    #[test]
    fn keeps_page_order_across_document() {
        let pages = vec![
            PageFragments {
                page_number: 1,
                fragments: statement_fragments(),
            },
            PageFragments {
                page_number: 2,
                fragments: statement_fragments(),
            },
        ];
        let mut warnings = Vec::new();
        let tables = detect_tables(
            &pages,
            &DetectionConfig::default(),
            AlignmentPolicy::default(),
            &mut warnings,
        );
        let page_numbers = tables.iter().map(|t| t.page_number).collect::<Vec<_>>();
        assert_eq!(page_numbers, vec![1, 2]);
    }

    #[test]
    fn key_value_block_without_anchors_warns_about_columns() {
        let (tables, warnings) = detect_with_warnings(
            &[
                ("Customer Details", 10.0, 10.0),
                ("Account No: 1234567890", 10.0, 20.0),
            ],
            1,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0]["Value"], "1234567890");
        assert_eq!(
            warnings,
            vec![
                (WarningCode::NoColumnsDetected, Some(1), None, None),
                (WarningCode::SkippedKeyValueRows, Some(1), Some(1), Some(1)),
            ]
        );
    }

    #[test]
    fn fragment_left_of_first_anchor_is_counted() {
        let (tables, warnings) = detect_with_warnings(
            &[
                ("Date", 50.0, 10.0),
                ("Amount", 100.0, 10.0),
                ("*", 10.0, 20.0),
                ("01-Jan-2024", 50.0, 20.0),
                ("5.00", 100.0, 20.0),
                ("02-Jan-2024", 50.0, 30.0),
                ("6.00", 100.0, 30.0),
            ],
            2,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[0].rows[0]["Date"], "01-Jan-2024");
        assert_eq!(
            warnings,
            vec![(WarningCode::UnassignedFragments, Some(2), Some(1), Some(1))]
        );
    }

    #[test]
    fn colon_less_rows_in_key_value_block_are_counted() {
        let (tables, warnings) = detect_with_warnings(
            &[
                ("Details", 10.0, 10.0),
                ("Branch: Central", 10.0, 20.0),
                ("IFSC: SBIN0001", 10.0, 30.0),
                ("see overleaf", 10.0, 40.0),
            ],
            3,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(
            warnings,
            vec![(WarningCode::SkippedKeyValueRows, Some(3), Some(1), Some(2))]
        );
    }

    #[test]
    fn region_without_assignable_header_is_dropped() {
        let (tables, warnings) = detect_with_warnings(
            &[
                ("Date", 50.0, 10.0),
                ("01-Jan-2024", 50.0, 20.0),
                ("02-Jan-2024", 50.0, 30.0),
                ("Title", 10.0, 100.0),
                ("a", 50.0, 110.0),
                ("b", 50.0, 120.0),
            ],
            4,
        );

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].headers, vec!["Date"]);
        assert_eq!(
            warnings,
            vec![
                (WarningCode::UnassignedFragments, Some(4), Some(2), Some(1)),
                (WarningCode::DroppedRegion, Some(4), Some(2), None),
            ]
        );
    }
}
