//! Spreadsheet workbooks (xlsx, xlsm, xls, ods)
//!
//! The first row of the sheet is the header. Blank header cells are named
//! `Unnamed: <index>`.

use crate::domain::{CellValue, DextractError, Result, Table};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

/// Reads one worksheet into a table
///
/// With `sheet = None` the workbook must contain exactly one sheet.
///
/// # Errors
///
/// Returns a source error if the workbook cannot be opened, the named sheet does not
/// exist, or no sheet was named and the workbook has several.
pub fn read_table(path: impl AsRef<Path>, sheet: Option<&str>) -> Result<Table> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| DextractError::Source(format!("Failed to open {}: {}", path.display(), e)))?;

    let names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) if names.iter().any(|n| n == name) => name.to_string(),
        Some(name) => {
            return Err(DextractError::Source(format!(
                "Sheet '{}' not found in {}; available sheets: {}",
                name,
                path.display(),
                names.join(", ")
            )))
        }
        None => match names.as_slice() {
            [only] => only.clone(),
            [] => {
                return Err(DextractError::Source(format!(
                    "{} contains no sheets",
                    path.display()
                )))
            }
            _ => {
                return Err(DextractError::Source(format!(
                    "{} has several sheets, name one of: {}",
                    path.display(),
                    names.join(", ")
                )))
            }
        },
    };

    let range = workbook.worksheet_range(&sheet_name).map_err(|e| {
        DextractError::Source(format!("Failed to read sheet '{}': {}", sheet_name, e))
    })?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(index, cell)| header_name(cell, index))
            .collect(),
        None => return Ok(Table::new()),
    };

    let body = rows
        .map(|cells| {
            (0..header.len())
                .map(|index| cells.get(index).map(cell_value).unwrap_or_default())
                .collect()
        })
        .collect();

    tracing::debug!(path = %path.display(), sheet = %sheet_name, "Read worksheet");
    Table::from_rows(header, body)
}

fn header_name(cell: &Data, index: usize) -> String {
    let name = cell.to_string();
    if name.trim().is_empty() {
        format!("Unnamed: {index}")
    } else {
        name
    }
}

pub(crate) fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_values() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::Float(3.0)), CellValue::Float(3.0));
        assert_eq!(cell_value(&Data::String(String::new())), CellValue::Null);
        assert_eq!(cell_value(&Data::String("x".to_string())), CellValue::from("x"));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Bool(true));
    }

    #[test]
    fn test_blank_header_named_by_index() {
        assert_eq!(header_name(&Data::Empty, 2), "Unnamed: 2");
        assert_eq!(header_name(&Data::String("UserId".to_string()), 0), "UserId");
    }

    #[test]
    fn test_missing_workbook() {
        let result = read_table("/not/here.xlsx", None);
        assert!(matches!(result, Err(DextractError::Source(_))));
    }
}
