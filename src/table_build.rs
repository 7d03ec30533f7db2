use std::collections::BTreeMap;

use crate::columns::find_nearest_column;
use crate::model::{TableData, TableKind, TableRow, TextFragment};
use crate::options::{AlignmentPolicy, DetectionConfig};
use crate::rows::RowGroup;

pub const KEY_VALUE_HEADERS: [&str; 2] = ["Field", "Value"];

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub kind: TableKind,
    pub table: Option<TableData>,
    pub unassigned_fragments: usize,
    pub unplaced_values: usize,
    pub skipped_rows: usize,
}

impl BuildOutcome {
    fn empty(kind: TableKind) -> Self {
        Self {
            kind,
            table: None,
            unassigned_fragments: 0,
            unplaced_values: 0,
            skipped_rows: 0,
        }
    }
}

/// Decides the table shape from the row right after the presumed header.
///
/// A colon or one of `keywords` in that row marks a key-value block.
#[must_use]
pub fn classify_region(rows: &[RowGroup], keywords: &[String]) -> TableKind {
    let Some(probe) = rows.get(1) else {
        return TableKind::Grid;
    };

    let text = probe.joined_text().to_lowercase();
    let has_keyword = keywords
        .iter()
        .any(|keyword| text.contains(keyword.to_lowercase().as_str()));
    if text.contains(':') || has_keyword {
        TableKind::KeyValue
    } else {
        TableKind::Grid
    }
}

/// Builds a table from the rows of one region, first row first.
///
/// `table` is `None` when no row survives.
#[must_use]
pub fn build_table(
    rows: &[RowGroup],
    anchors: &[f32],
    page_number: u32,
    config: &DetectionConfig,
    alignment: AlignmentPolicy,
) -> BuildOutcome {
    let kind = classify_region(rows, &config.key_value_keywords);
    let mut outcome = match kind {
        TableKind::KeyValue => build_key_value(rows),
        TableKind::Grid => build_grid(rows, anchors, config.column_threshold, alignment),
    };

    if let Some(table) = &mut outcome.table {
        table.page_number = page_number;
    }
    outcome
}

fn build_key_value(rows: &[RowGroup]) -> BuildOutcome {
    let mut outcome = BuildOutcome::empty(TableKind::KeyValue);
    let mut table_rows = Vec::new();

    for row in rows {
        let text = row.joined_text();
        let Some((field, value)) = text.trim().split_once(':') else {
            outcome.skipped_rows += 1;
            continue;
        };

        let mut entry = TableRow::new();
        entry.insert(KEY_VALUE_HEADERS[0].to_string(), field.trim().to_string());
        entry.insert(KEY_VALUE_HEADERS[1].to_string(), value.trim().to_string());
        table_rows.push(entry);
    }

    if !table_rows.is_empty() {
        outcome.table = Some(TableData {
            headers: KEY_VALUE_HEADERS.iter().map(ToString::to_string).collect(),
            rows: table_rows,
            page_number: 0,
        });
    }
    outcome
}

fn collect_columns(
    fragments: &[&TextFragment],
    anchors: &[f32],
    tolerance: f32,
) -> (BTreeMap<usize, String>, usize) {
    let mut columns: BTreeMap<usize, String> = BTreeMap::new();
    let mut unassigned = 0;

    for fragment in fragments {
        let Some(column) = find_nearest_column(fragment.x, anchors, tolerance) else {
            unassigned += 1;
            continue;
        };
        let text = fragment.text.trim();
        if text.is_empty() {
            continue;
        }
        let cell = columns.entry(column).or_default();
        if !cell.is_empty() {
            cell.push(' ');
        }
        cell.push_str(text);
    }

    columns.retain(|_, cell| !cell.is_empty());
    (columns, unassigned)
}

fn align_row(
    values: &BTreeMap<usize, String>,
    headers: &[(usize, String)],
    alignment: AlignmentPolicy,
) -> (TableRow, usize) {
    let mut row = TableRow::new();
    match alignment {
        AlignmentPolicy::IndexPreserving => {
            for (column, header) in headers {
                if let Some(value) = values.get(column) {
                    row.insert(header.clone(), value.clone());
                }
            }
            let unplaced = values.len().saturating_sub(row.len());
            (row, unplaced)
        }
        AlignmentPolicy::Positional => {
            for ((_, header), value) in headers.iter().zip(values.values()) {
                row.insert(header.clone(), value.clone());
            }
            (row, values.len().saturating_sub(headers.len()))
        }
    }
}

fn build_grid(
    rows: &[RowGroup],
    anchors: &[f32],
    tolerance: f32,
    alignment: AlignmentPolicy,
) -> BuildOutcome {
    let mut outcome = BuildOutcome::empty(TableKind::Grid);
    let Some((header_row, data_rows)) = rows.split_first() else {
        return outcome;
    };
    if anchors.is_empty() {
        return outcome;
    }

    let (header_columns, unassigned) =
        collect_columns(&header_row.sorted_by_x(), anchors, tolerance);
    outcome.unassigned_fragments += unassigned;
    let headers = header_columns.into_iter().collect::<Vec<_>>();
    if headers.is_empty() {
        return outcome;
    }

    let mut table_rows = Vec::new();
    for data_row in data_rows {
        let (values, unassigned) = collect_columns(&data_row.sorted_by_x(), anchors, tolerance);
        outcome.unassigned_fragments += unassigned;

        let (row, unplaced) = align_row(&values, &headers, alignment);
        outcome.unplaced_values += unplaced;
        if row.is_empty() {
            outcome.skipped_rows += 1;
            continue;
        }
        table_rows.push(row);
    }

    if !table_rows.is_empty() {
        outcome.table = Some(TableData {
            headers: headers.into_iter().map(|(_, header)| header).collect(),
            rows: table_rows,
            page_number: 0,
        });
    }
    outcome
}
