use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::NaiveDate;
use csv::WriterBuilder;
use regex::Regex;

use crate::error::ExtractError;
use crate::model::TableData;
use crate::validate::clean_amount;

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^₹?\s*[\d,]+\.?\d*\s*(Dr|Cr)?$").expect("hardcoded amount regex is valid")
});
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{2}[-/]\w{3}[-/]\d{4}|\d{2}/\d{2}/\d{4})$")
        .expect("hardcoded date regex is valid")
});

const DATE_INPUT_FORMATS: [&str; 3] = ["%d-%b-%Y", "%d/%b/%Y", "%d/%m/%Y"];
const DATE_OUTPUT_FORMAT: &str = "%d-%b-%Y";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Amount(f64),
    Date(Option<NaiveDate>, String),
    Text(String),
}

impl CellValue {
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Amount(value) => format!("{value:.2}"),
            Self::Date(Some(date), _) => date.format(DATE_OUTPUT_FORMAT).to_string(),
            Self::Date(None, raw) | Self::Text(raw) => raw.clone(),
        }
    }
}

#[must_use]
pub fn classify_cell(value: &str) -> CellValue {
    let trimmed = value.trim();
    if AMOUNT_RE.is_match(trimmed) {
        if let Ok(amount) = clean_amount(trimmed).parse::<f64>() {
            return CellValue::Amount(amount);
        }
        return CellValue::Text(trimmed.to_string());
    }

    if DATE_RE.is_match(trimmed) {
        let parsed = DATE_INPUT_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok());
        return CellValue::Date(parsed, trimmed.to_string());
    }

    CellValue::Text(trimmed.to_string())
}

fn table_records(table: &TableData) -> impl Iterator<Item = Vec<String>> + '_ {
    table.rows.iter().map(|row| {
        table
            .headers
            .iter()
            .map(|header| {
                row.get(header)
                    .map(|value| classify_cell(value).render())
                    .unwrap_or_default()
            })
            .collect()
    })
}

#[must_use]
pub fn table_file_name(table: &TableData, index: usize) -> String {
    format!("page-{}-table-{}.csv", table.page_number, index + 1)
}

pub fn write_table_csv<W: std::io::Write>(
    writer: W,
    table: &TableData,
    delimiter: u8,
) -> Result<(), ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .flexible(false)
        .from_writer(writer);
    writer.write_record(&table.headers)?;
    for record in table_records(table) {
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one CSV per table into `dir` and returns the written paths.
pub fn write_tables_csv(
    dir: &Path,
    tables: &[TableData],
    delimiter: u8,
) -> Result<Vec<PathBuf>, ExtractError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(tables.len());
    for (index, table) in tables.iter().enumerate() {
        let path = dir.join(table_file_name(table, index));
        let file = std::fs::File::create(&path)?;
        write_table_csv(file, table, delimiter)?;
        written.push(path);
    }
    Ok(written)
}

pub fn tables_to_json(tables: &[TableData]) -> Result<String, ExtractError> {
    Ok(serde_json::to_string_pretty(tables)?)
}

pub fn write_tables_json(path: &Path, tables: &[TableData]) -> Result<(), ExtractError> {
    std::fs::write(path, tables_to_json(tables)?)?;
    Ok(())
}
