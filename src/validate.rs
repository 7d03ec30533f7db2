use tracing::{info, warn};

use crate::model::TableData;

const AMOUNT_HEADER_HINTS: [&str; 4] = ["amount", "balance", "dr", "cr"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

pub(crate) fn clean_amount(value: &str) -> String {
    value
        .replace(['₹', ','], "")
        .replace("Dr", "")
        .replace("Cr", "")
        .trim()
        .to_string()
}

fn is_amount_header(header: &str) -> bool {
    let lower = header.to_lowercase();
    AMOUNT_HEADER_HINTS.iter().any(|hint| lower.contains(hint))
}

fn check_amounts(table: &TableData, table_no: usize, issues: &mut Vec<String>) {
    for header in table.headers.iter().filter(|header| is_amount_header(header)) {
        for (row_index, row) in table.rows.iter().enumerate() {
            let Some(value) = row.get(header).filter(|value| !value.trim().is_empty()) else {
                continue;
            };
            if clean_amount(value).parse::<f64>().is_err() {
                issues.push(format!(
                    "Table {table_no} (Page {}), Row {}: Invalid amount format in column '{header}': {value}",
                    table.page_number,
                    row_index + 1
                ));
            }
        }
    }
}

/// Checks recovered tables for structural gaps and suspicious values.
#[must_use]
pub fn validate_tables(tables: &[TableData]) -> ValidationReport {
    let mut issues = Vec::new();
    let mut is_valid = true;

    for (index, table) in tables.iter().enumerate() {
        let table_no = index + 1;
        let page = table.page_number;

        if table.headers.is_empty() {
            issues.push(format!("Table {table_no} (Page {page}): Missing headers"));
            is_valid = false;
            continue;
        }
        if table.rows.is_empty() {
            issues.push(format!("Table {table_no} (Page {page}): No data rows found"));
            is_valid = false;
            continue;
        }

        for (row_index, row) in table.rows.iter().enumerate() {
            let row_no = row_index + 1;
            for header in &table.headers {
                if !row.contains_key(header) {
                    issues.push(format!(
                        "Table {table_no} (Page {page}), Row {row_no}: Missing value for header '{header}'"
                    ));
                    is_valid = false;
                }
            }
            for (column, value) in row {
                if value.trim().is_empty() {
                    issues.push(format!(
                        "Table {table_no} (Page {page}), Row {row_no}: Empty value for column '{column}'"
                    ));
                }
            }
        }

        check_amounts(table, table_no, &mut issues);
    }

    if is_valid {
        info!(tables = tables.len(), "table validation passed");
    } else {
        warn!(issues = issues.len(), "table validation failed");
        for issue in &issues {
            warn!("{issue}");
        }
    }

    ValidationReport { is_valid, issues }
}
