//! Local tabular files
//!
//! - [`csv`] - read and write CSV with per-column type inference
//! - [`spreadsheet`] - read one worksheet of an xlsx/xls/ods workbook

pub mod csv;
pub mod spreadsheet;
