//! In-memory tabular model
//!
//! A [`Table`] is an ordered set of named [`Column`]s whose values are typed
//! [`CellValue`]s with an explicit missing value. Every loader (SQL rows, table storage
//! entities, CSV and spreadsheet files, merges) produces a `Table`, and the
//! pseudonymisation engine rewrites columns of it in place.

use super::errors::DextractError;
use super::result::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Single typed value in a table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Missing value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

/// Coarse type of a non-missing cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Bool,
    Int,
    Float,
    Text,
    Date,
    DateTime,
}

/// Hashable identity of a cell, used for distinct counts and value counts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CellKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// True for `Null` and for floating point NaN
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Type of the value, `None` when missing
    pub fn kind(&self) -> Option<CellKind> {
        match self {
            CellValue::Null => None,
            CellValue::Float(f) if f.is_nan() => None,
            CellValue::Bool(_) => Some(CellKind::Bool),
            CellValue::Int(_) => Some(CellKind::Int),
            CellValue::Float(_) => Some(CellKind::Float),
            CellValue::Text(_) => Some(CellKind::Text),
            CellValue::Date(_) => Some(CellKind::Date),
            CellValue::DateTime(_) => Some(CellKind::DateTime),
        }
    }

    /// Hashable key for this value; all missing values share one key
    pub fn key(&self) -> CellKey {
        match self {
            CellValue::Null => CellKey::Null,
            CellValue::Float(f) if f.is_nan() => CellKey::Null,
            CellValue::Bool(b) => CellKey::Bool(*b),
            CellValue::Int(i) => CellKey::Int(*i),
            CellValue::Float(f) => CellKey::Float(f.to_bits()),
            CellValue::Text(s) => CellKey::Text(s.clone()),
            CellValue::Date(d) => CellKey::Date(*d),
            CellValue::DateTime(dt) => CellKey::DateTime(*dt),
        }
    }

    /// Numeric view of ints and floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Float(v) if v.is_nan() => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// Named, ordered sequence of cell values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<CellValue>,
}

impl Column {
    /// Creates a column from any iterator of convertible values
    pub fn new<V: Into<CellValue>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rewrites every value in place; the column length cannot change
    pub fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(&CellValue) -> CellValue,
    {
        for value in &mut self.values {
            *value = f(value);
        }
    }

    /// Number of non-missing values
    pub fn non_null_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_null()).count()
    }

    /// Number of distinct non-missing values
    pub fn unique_count(&self) -> usize {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .map(CellValue::key)
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Ordered set of equally long, uniquely named columns
///
/// Deserialisation goes through [`Table::from_columns`], so saved tables are held to the
/// same shape rules as freshly built ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<Column>,
}

impl TryFrom<RawTable> for Table {
    type Error = DextractError;

    fn try_from(raw: RawTable) -> Result<Self> {
        Self::from_columns(raw.columns)
    }
}

impl Table {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from columns
    ///
    /// # Errors
    ///
    /// Returns a validation error on duplicate names or unequal column lengths.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new();
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Builds a table from a header and row-major values
    ///
    /// # Errors
    ///
    /// Returns a validation error if any row length differs from the header.
    pub fn from_rows(header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let mut columns: Vec<Vec<CellValue>> = header
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != header.len() {
                return Err(DextractError::Validation(format!(
                    "Row {} has {} values, expected {}",
                    index,
                    row.len(),
                    header.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        Self::from_columns(
            header
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column { name, values })
                .collect(),
        )
    }

    /// Builds a table from records of (field, value) pairs
    ///
    /// Columns are the union of all fields in first-seen order; fields missing from a
    /// record become missing values.
    pub fn from_records(records: Vec<Vec<(String, CellValue)>>) -> Self {
        let mut columns: Vec<Column> = Vec::new();
        let row_count = records.len();

        for (row, record) in records.into_iter().enumerate() {
            for (field, value) in record {
                let position = match columns.iter().position(|c| c.name == field) {
                    Some(position) => position,
                    None => {
                        columns.push(Column {
                            name: field,
                            values: vec![CellValue::Null; row_count],
                        });
                        columns.len() - 1
                    }
                };
                columns[position].values[row] = value;
            }
        }

        Self { columns }
    }

    /// Appends the rows of several tables, aligning columns by name
    pub fn concat(tables: &[&Table]) -> Self {
        let records = tables
            .iter()
            .flat_map(|table| {
                (0..table.n_rows()).map(move |row| {
                    table
                        .columns
                        .iter()
                        .map(|c| (c.name.clone(), c.values[row].clone()))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut result = Self::from_records(records);

        // Keep columns of empty inputs so the schema survives
        for table in tables {
            for column in &table.columns {
                if result.column(&column.name).is_none() {
                    result.columns.push(Column {
                        name: column.name.clone(),
                        values: vec![CellValue::Null; result.n_rows()],
                    });
                }
            }
        }
        result
    }

    /// Adds a column at the end
    ///
    /// # Errors
    ///
    /// Returns a validation error if the name is taken or the length differs.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(DextractError::Validation(format!(
                "Duplicate column name '{}'",
                column.name
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.len() != column.len() {
                return Err(DextractError::Validation(format!(
                    "Column '{}' has {} rows, table has {}",
                    column.name,
                    column.len(),
                    first.len()
                )));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows
    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0
    }

    /// Values of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.n_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// New table holding the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: indices
                        .iter()
                        .filter_map(|&i| c.values.get(i).cloned())
                        .collect(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        Table::from_columns(vec![
            Column::new("UserId", vec![Some(101_i64), Some(102), None]),
            Column::new("Name", vec!["a", "b", "c"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_mismatched_lengths() {
        let result = Table::from_columns(vec![
            Column::new("a", vec![1_i64, 2]),
            Column::new("b", vec![1_i64]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let result = Table::from_columns(vec![
            Column::new("a", vec![1_i64]),
            Column::new("a", vec![2_i64]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_rows() {
        let table = Table::from_rows(
            vec!["x".to_string(), "y".to_string()],
            vec![
                vec![CellValue::Int(1), CellValue::from("one")],
                vec![CellValue::Int(2), CellValue::Null],
            ],
        )
        .unwrap();

        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("y").unwrap().values()[1], CellValue::Null);
        assert!(Table::from_rows(vec!["x".to_string()], vec![vec![]]).is_err());
    }

    #[test]
    fn test_from_records_unions_fields() {
        let table = Table::from_records(vec![
            vec![("a".to_string(), CellValue::Int(1))],
            vec![
                ("b".to_string(), CellValue::from("x")),
                ("a".to_string(), CellValue::Int(2)),
            ],
        ]);

        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.column("b").unwrap().values()[0], CellValue::Null);
        assert_eq!(table.column("a").unwrap().values()[1], CellValue::Int(2));
    }

    #[test]
    fn test_concat_aligns_columns() {
        let first = sample_table();
        let second = Table::from_columns(vec![Column::new("UserId", vec![103_i64])]).unwrap();

        let merged = Table::concat(&[&first, &second]);
        assert_eq!(merged.n_rows(), 4);
        assert_eq!(merged.column("Name").unwrap().values()[3], CellValue::Null);
        assert_eq!(merged.column("UserId").unwrap().values()[3], CellValue::Int(103));
    }

    #[test]
    fn test_counts_ignore_missing() {
        let column = Column::new("v", vec![Some(1.0_f64), Some(f64::NAN), Some(1.0), None]);
        assert_eq!(column.non_null_count(), 2);
        assert_eq!(column.unique_count(), 1);
    }

    #[test]
    fn test_deserialize_validates_shape() {
        let table = sample_table();
        let json = serde_json::to_string(&table).unwrap();
        let restored: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, table);

        let ragged = r#"{"columns":[
            {"name":"a","values":[{"type":"int","value":1},{"type":"int","value":2}]},
            {"name":"b","values":[{"type":"int","value":1}]}
        ]}"#;
        assert!(serde_json::from_str::<Table>(ragged).is_err());

        let duplicated = r#"{"columns":[
            {"name":"a","values":[]},
            {"name":"a","values":[]}
        ]}"#;
        assert!(serde_json::from_str::<Table>(duplicated).is_err());
    }

    #[test]
    fn test_map_values_keeps_length() {
        let mut table = sample_table();
        let column = table.column_mut("UserId").unwrap();
        column.map_values(|v| match v {
            CellValue::Int(i) => CellValue::Int(i - 100),
            _ => CellValue::Null,
        });
        assert_eq!(
            column.values(),
            &[CellValue::Int(1), CellValue::Int(2), CellValue::Null]
        );
        assert_eq!(table.n_rows(), 3);
    }

    #[test]
    fn test_select_rows_and_row() {
        let table = sample_table();
        let sample = table.select_rows(&[2, 0]);
        assert_eq!(sample.n_rows(), 2);
        assert_eq!(sample.row(1).unwrap()[1], &CellValue::from("a"));
        assert!(table.row(3).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Float(f64::NAN).to_string(), "");
        assert_eq!(CellValue::Int(5).to_string(), "5");
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2024-03-09");
    }
}
