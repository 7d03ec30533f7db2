//! Recovers tables from positioned text.
//!
//! A page's fragments are clustered into rows by rounded `y`, column anchors
//! are taken from recurring `x` positions, rows are split into regions at
//! large vertical gaps, and each region becomes either a `Field`/`Value`
//! table or a grid table keyed by its first row.

mod columns;
mod error;
mod export;
mod model;
mod options;
mod pdf_reader;
mod regions;
mod rows;
mod table_build;
mod table_detect;
mod validate;
mod warning;

use std::path::Path;

use tracing::info;

use crate::pdf_reader::{read_pdf_fragments, read_pdf_fragments_from_bytes};
use crate::table_detect::detect_tables;

pub use columns::{detect_columns, find_nearest_column};
pub use error::ExtractError;
pub use export::{
    CellValue, classify_cell, table_file_name, tables_to_json, write_table_csv, write_tables_csv,
    write_tables_json,
};
pub use model::{PageFragments, TableData, TableKind, TableRow, TextFragment};
pub use options::{AlignmentPolicy, DetectionConfig, ExtractOptions, PageSelection};
pub use regions::{TableRegion, segment_regions};
pub use rows::{RowGroup, cluster_rows, filter_separator_fragments, is_separator_line};
pub use table_build::{BuildOutcome, KEY_VALUE_HEADERS, build_table, classify_region};
pub use table_detect::detect_tables_in_page;
pub use validate::{ValidationReport, validate_tables};
pub use warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionReport {
    pub tables: Vec<TableData>,
    pub warnings: Vec<ExtractWarning>,
    pub page_count: usize,
}

impl ExtractionReport {
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|table| table.rows.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Runs the reconstruction over already-extracted pages.
///
/// Pages outside `options.pages` are skipped. Output tables follow page order.
/// A selection that matches no page is an error; a document without pages
/// is an empty report.
pub fn extract_tables_from_fragments(
    pages: &[PageFragments],
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    options.detection.validate()?;

    let selected = pages
        .iter()
        .filter(|page| {
            options
                .pages
                .as_ref()
                .is_none_or(|selection| selection.contains(page.page_number))
        })
        .cloned()
        .collect::<Vec<_>>();
    if selected.is_empty() && options.pages.is_some() {
        return Err(ExtractError::NoPagesSelected);
    }

    let mut warnings = Vec::new();
    let tables = detect_tables(
        &selected,
        &options.detection,
        options.alignment,
        &mut warnings,
    );
    info!(
        pages = selected.len(),
        tables = tables.len(),
        warnings = warnings.len(),
        "table extraction finished"
    );

    Ok(ExtractionReport {
        tables,
        warnings,
        page_count: selected.len(),
    })
}

pub fn extract_tables_from_pdf(
    input_pdf: &Path,
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    options.detection.validate()?;
    let pages = read_pdf_fragments(input_pdf, options.pages.as_ref())?;
    extract_tables_from_fragments(&pages, options)
}

pub fn extract_tables_from_pdf_bytes(
    input_pdf: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractionReport, ExtractError> {
    options.detection.validate()?;
    let pages = read_pdf_fragments_from_bytes(input_pdf, options.pages.as_ref())?;
    extract_tables_from_fragments(&pages, options)
}

#[cfg(test)]
mod tests {
    use super::{
        ExtractError, ExtractOptions, PageSelection, WarningCode, extract_tables_from_fragments,
    };
    use crate::model::{PageFragments, TextFragment};

    fn page(page_number: u32) -> PageFragments {
        PageFragments {
            page_number,
            fragments: vec![
                TextFragment::new("Field", 10.0, 10.0),
                TextFragment::new("Branch: Central", 10.0, 20.0),
            ],
        }
    }

    #[test]
    fn honours_page_selection() {
        let options = ExtractOptions {
            pages: Some("2".parse::<PageSelection>().expect("selection should parse")),
            ..ExtractOptions::default()
        };
        let report = extract_tables_from_fragments(&[page(1), page(2)], &options)
            .expect("extraction should succeed");
        assert_eq!(report.page_count, 1);
        assert_eq!(report.table_count(), 1);
        assert_eq!(report.tables[0].page_number, 2);
        assert_eq!(report.row_count(), 1);
    }

    #[test]
    fn selection_matching_nothing_is_an_error() {
        let options = ExtractOptions {
            pages: Some("9".parse::<PageSelection>().expect("selection should parse")),
            ..ExtractOptions::default()
        };
        let err = extract_tables_from_fragments(&[page(1)], &options)
            .expect_err("no pages should be selected");
        assert!(matches!(err, ExtractError::NoPagesSelected));
    }

    #[test]
    fn document_without_pages_reports_no_tables() {
        let report = extract_tables_from_fragments(&[], &ExtractOptions::default())
            .expect("an empty document is not a failure");
        assert!(report.is_empty());
        assert_eq!(report.page_count, 0);
        assert_eq!(
            report.warnings.iter().map(|w| w.code).collect::<Vec<_>>(),
            vec![WarningCode::NoTablesDetected]
        );
    }

    #[test]
    fn rejects_invalid_thresholds() {
        let mut options = ExtractOptions::default();
        options.detection.row_threshold = -1.0;
        let err = extract_tables_from_fragments(&[page(1)], &options)
            .expect_err("negative threshold should fail");
        assert!(matches!(err, ExtractError::InvalidOption(_)));
    }
}
