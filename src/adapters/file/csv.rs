//! CSV files
//!
//! Reading infers one type per column from its non-empty fields: integer, float,
//! boolean, date, datetime, falling back to text. Empty fields are missing values.

use crate::domain::{CellValue, Column, DextractError, Result, Table};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Reads a CSV file with a header row
///
/// # Errors
///
/// Returns a source error if the file cannot be opened or a record is malformed.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| DextractError::Source(format!("Failed to open {}: {}", path.display(), e)))?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut fields: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        for (index, column) in fields.iter_mut().enumerate() {
            column.push(record.get(index).unwrap_or_default().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(fields)
        .map(|(name, raw)| Column::new(name, infer_column(&raw)))
        .collect();

    Table::from_columns(columns)
}

/// Writes a table with a header row; missing values become empty fields
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_table(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for index in 0..table.n_rows() {
        if let Some(row) = table.row(index) {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn infer_column(raw: &[String]) -> Vec<CellValue> {
    let present = || raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty());

    let parse_all = |parse: &dyn Fn(&str) -> Option<CellValue>| -> Option<Vec<CellValue>> {
        if present().any(|s| parse(s).is_none()) {
            return None;
        }
        Some(
            raw.iter()
                .map(|s| {
                    let s = s.trim();
                    if s.is_empty() {
                        CellValue::Null
                    } else {
                        parse(s).unwrap_or_default()
                    }
                })
                .collect(),
        )
    };

    if present().next().is_none() {
        return vec![CellValue::Null; raw.len()];
    }

    parse_all(&|s| s.parse::<i64>().ok().map(CellValue::Int))
        .or_else(|| parse_all(&|s| s.parse::<f64>().ok().map(CellValue::Float)))
        .or_else(|| parse_all(&parse_bool))
        .or_else(|| {
            parse_all(&|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .map(CellValue::Date)
            })
        })
        .or_else(|| parse_all(&parse_datetime))
        .unwrap_or_else(|| {
            raw.iter()
                .map(|s| {
                    if s.trim().is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(s.clone())
                    }
                })
                .collect()
        })
}

fn parse_bool(s: &str) -> Option<CellValue> {
    match s.to_ascii_lowercase().as_str() {
        "true" => Some(CellValue::Bool(true)),
        "false" => Some(CellValue::Bool(false)),
        _ => None,
    }
}

fn parse_datetime(s: &str) -> Option<CellValue> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .map(CellValue::DateTime)
}
