//! Per-column summary statistics
//!
//! The statistics computed depend on the kind of values a column holds:
//!
//! | Kind | Statistics |
//! |------|------------|
//! | int | min, max, value counts when fewer than 10 distinct |
//! | float | min, 25%, 50%, 75%, max (floats that are all whole numbers count as int) |
//! | bool | value counts |
//! | datetime | min, max |
//! | text | min/max length, min/max word count, value counts when fewer than 10 distinct |
//!
//! Every column also reports count, nunique and non-null. Missing values are ignored.

use crate::domain::{CellKey, CellKind, CellValue, Column, Table};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;

/// Distinct-value threshold below which value counts are reported
const VALUE_COUNTS_LIMIT: usize = 10;

/// Kind of statistics computed for a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsKind {
    Int,
    Float,
    Bool,
    DateTime,
    Text,
    Unknown,
}

impl fmt::Display for StatisticsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatisticsKind::Int => "int",
            StatisticsKind::Float => "float",
            StatisticsKind::Bool => "bool",
            StatisticsKind::DateTime => "datetime",
            StatisticsKind::Text => "text",
            StatisticsKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Summary of one column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStatistics {
    pub field: String,
    /// Non-missing values
    pub count: usize,
    pub nunique: usize,
    pub non_null: usize,
    pub kind: StatisticsKind,
    /// Kind-specific statistics, in display order
    pub details: Vec<(String, CellValue)>,
}

impl ColumnStatistics {
    /// Looks up a kind-specific statistic
    pub fn detail(&self, name: &str) -> Option<&CellValue> {
        self.details.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// One row per column; columns are the union of the statistics reported
    pub fn to_table(stats: &[ColumnStatistics]) -> Table {
        let records = stats
            .iter()
            .map(|s| {
                let mut record = vec![
                    ("field".to_string(), CellValue::from(s.field.as_str())),
                    ("count".to_string(), CellValue::Int(s.count as i64)),
                    ("nunique".to_string(), CellValue::Int(s.nunique as i64)),
                    ("non-null".to_string(), CellValue::Int(s.non_null as i64)),
                    ("type".to_string(), CellValue::Text(s.kind.to_string())),
                ];
                record.extend(s.details.iter().cloned());
                record
            })
            .collect();
        Table::from_records(records)
    }
}

/// Summary statistics for every column of a table
pub fn summary_statistics(table: &Table) -> Vec<ColumnStatistics> {
    table.columns().iter().map(column_statistics).collect()
}

/// Summary statistics for one column
pub fn column_statistics(column: &Column) -> ColumnStatistics {
    let values: Vec<&CellValue> = column.values().iter().filter(|v| !v.is_null()).collect();
    let nunique = column.unique_count();

    let mut stats = ColumnStatistics {
        field: column.name().to_string(),
        count: values.len(),
        nunique,
        non_null: values.len(),
        kind: StatisticsKind::Unknown,
        details: Vec::new(),
    };

    match infer_kind(&values) {
        Some(CellKind::Int) => int_statistics(&mut stats, &values),
        Some(CellKind::Float) => {
            let floats: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
            if floats.iter().all(|f| f.fract() == 0.0) {
                int_statistics(&mut stats, &values);
            } else {
                float_statistics(&mut stats, floats);
            }
        }
        Some(CellKind::Bool) => {
            stats.kind = StatisticsKind::Bool;
            stats.add("value_counts", value_counts(&values));
        }
        Some(CellKind::Date) | Some(CellKind::DateTime) => datetime_statistics(&mut stats, &values),
        Some(CellKind::Text) => text_statistics(&mut stats, &values),
        None => {}
    }

    stats
}

impl ColumnStatistics {
    fn add(&mut self, name: &str, value: impl Into<CellValue>) {
        self.details.push((name.to_string(), value.into()));
    }
}

/// Common kind of the non-missing values; ints mixed with floats count as float and
/// dates mixed with datetimes as datetime
fn infer_kind(values: &[&CellValue]) -> Option<CellKind> {
    let mut kinds = values.iter().filter_map(|v| v.kind());
    let first = kinds.next()?;
    kinds.try_fold(first, |acc, kind| match (acc, kind) {
        (a, b) if a == b => Some(a),
        (CellKind::Int, CellKind::Float) | (CellKind::Float, CellKind::Int) => Some(CellKind::Float),
        (CellKind::Date, CellKind::DateTime) | (CellKind::DateTime, CellKind::Date) => {
            Some(CellKind::DateTime)
        }
        _ => None,
    })
}

fn int_statistics(stats: &mut ColumnStatistics, values: &[&CellValue]) {
    stats.kind = StatisticsKind::Int;
    let ints: Vec<i64> = values
        .iter()
        .filter_map(|v| match v {
            CellValue::Int(i) => Some(*i),
            CellValue::Float(f) => Some(*f as i64),
            _ => None,
        })
        .collect();

    stats.add("min", ints.iter().min().copied());
    stats.add("max", ints.iter().max().copied());
    if stats.nunique < VALUE_COUNTS_LIMIT {
        let as_cells: Vec<CellValue> = ints.into_iter().map(CellValue::Int).collect();
        stats.add("value_counts", value_counts(&as_cells.iter().collect::<Vec<_>>()));
    }
}

fn float_statistics(stats: &mut ColumnStatistics, mut floats: Vec<f64>) {
    stats.kind = StatisticsKind::Float;
    floats.sort_by(f64::total_cmp);

    stats.add("min", floats.first().copied());
    stats.add("25%", quantile(&floats, 0.25));
    stats.add("50%", quantile(&floats, 0.50));
    stats.add("75%", quantile(&floats, 0.75));
    stats.add("max", floats.last().copied());
}

fn datetime_statistics(stats: &mut ColumnStatistics, values: &[&CellValue]) {
    stats.kind = StatisticsKind::DateTime;
    let datetimes: Vec<NaiveDateTime> = values
        .iter()
        .filter_map(|v| match v {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
            _ => None,
        })
        .collect();

    let cell = |dt: Option<&NaiveDateTime>| dt.map_or(CellValue::Null, |dt| CellValue::DateTime(*dt));
    stats.add("min", cell(datetimes.iter().min()));
    stats.add("max", cell(datetimes.iter().max()));
}

fn text_statistics(stats: &mut ColumnStatistics, values: &[&CellValue]) {
    stats.kind = StatisticsKind::Text;
    let texts: Vec<&str> = values
        .iter()
        .filter_map(|v| match v {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();

    let lengths: Vec<i64> = texts.iter().map(|s| s.chars().count() as i64).collect();
    // Words are counted as spaces plus one
    let words: Vec<i64> = texts.iter().map(|s| s.matches(' ').count() as i64 + 1).collect();

    stats.add("min_length", lengths.iter().min().copied());
    stats.add("max_length", lengths.iter().max().copied());
    stats.add("min_words", words.iter().min().copied());
    stats.add("max_words", words.iter().max().copied());
    if stats.nunique < VALUE_COUNTS_LIMIT {
        stats.add("value_counts", value_counts(values));
    }
}

/// Linear-interpolation quantile of sorted values
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Renders `{value: count, ...}`, most frequent first
fn value_counts(values: &[&CellValue]) -> String {
    let mut counts: HashMap<CellKey, (&CellValue, usize)> = HashMap::new();
    for &value in values {
        counts.entry(value.key()).or_insert((value, 0)).1 += 1;
    }

    let mut counts: Vec<(CellKey, (&CellValue, usize))> = counts.into_iter().collect();
    counts.sort_by(|(ka, (_, ca)), (kb, (_, cb))| cb.cmp(ca).then_with(|| ka.cmp(kb)));

    let entries: Vec<String> = counts
        .iter()
        .map(|(_, (value, count))| match value {
            CellValue::Text(s) => format!("'{s}': {count}"),
            other => format!("{other}: {count}"),
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stats(column: Column) -> ColumnStatistics {
        column_statistics(&column)
    }

    #[test]
    fn test_int_column() {
        let s = stats(Column::new("n", [Some(3_i64), Some(1), Some(3), None]));
        assert_eq!(s.kind, StatisticsKind::Int);
        assert_eq!(s.count, 3);
        assert_eq!(s.nunique, 2);
        assert_eq!(s.detail("min"), Some(&CellValue::Int(1)));
        assert_eq!(s.detail("max"), Some(&CellValue::Int(3)));
        assert_eq!(
            s.detail("value_counts"),
            Some(&CellValue::Text("{3: 2, 1: 1}".to_string()))
        );
    }

    #[test]
    fn test_value_counts_omitted_for_many_distinct() {
        let s = stats(Column::new("n", 0_i64..20));
        assert!(s.detail("value_counts").is_none());
    }

    #[test]
    fn test_whole_floats_treated_as_int() {
        let s = stats(Column::new("n", [1.0, 2.0, f64::NAN]));
        assert_eq!(s.kind, StatisticsKind::Int);
        assert_eq!(s.detail("max"), Some(&CellValue::Int(2)));
    }

    #[test]
    fn test_float_quantiles() {
        let s = stats(Column::new("x", [1.5, 2.5, 3.5, 4.5, 5.5]));
        assert_eq!(s.kind, StatisticsKind::Float);
        assert_eq!(s.detail("min"), Some(&CellValue::Float(1.5)));
        assert_eq!(s.detail("25%"), Some(&CellValue::Float(2.5)));
        assert_eq!(s.detail("50%"), Some(&CellValue::Float(3.5)));
        assert_eq!(s.detail("max"), Some(&CellValue::Float(5.5)));
    }

    #[test]
    fn test_quantile_interpolates() {
        assert_eq!(quantile(&[1.0, 2.0], 0.25), Some(1.25));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_bool_column() {
        let s = stats(Column::new("b", [true, false, true]));
        assert_eq!(s.kind, StatisticsKind::Bool);
        assert_eq!(
            s.detail("value_counts"),
            Some(&CellValue::Text("{true: 2, false: 1}".to_string()))
        );
    }

    #[test]
    fn test_text_column() {
        let s = stats(Column::new("t", ["a b c", "hello", "a b c"]));
        assert_eq!(s.kind, StatisticsKind::Text);
        assert_eq!(s.detail("min_length"), Some(&CellValue::Int(5)));
        assert_eq!(s.detail("max_words"), Some(&CellValue::Int(3)));
        assert_eq!(s.detail("min_words"), Some(&CellValue::Int(1)));
        assert_eq!(
            s.detail("value_counts"),
            Some(&CellValue::Text("{'a b c': 2, 'hello': 1}".to_string()))
        );
    }

    #[test]
    fn test_datetime_column() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 5, 6).unwrap();
        let column = Column::new("d", [CellValue::Date(d1), CellValue::Date(d2)]);
        let s = stats(column);
        assert_eq!(s.kind, StatisticsKind::DateTime);
        assert_eq!(
            s.detail("min"),
            Some(&CellValue::DateTime(d2.and_hms_opt(0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_mixed_and_empty_are_unknown() {
        assert_eq!(
            stats(Column::new("m", [CellValue::Int(1), CellValue::from("x")])).kind,
            StatisticsKind::Unknown
        );
        assert_eq!(
            stats(Column::new("e", [CellValue::Null])).kind,
            StatisticsKind::Unknown
        );
    }

    #[test]
    fn test_to_table_unions_columns() {
        let table = Table::from_columns(vec![
            Column::new("n", [1_i64, 2]),
            Column::new("t", ["x", "y"]),
        ])
        .unwrap();
        let summary = ColumnStatistics::to_table(&summary_statistics(&table));

        assert_eq!(summary.n_rows(), 2);
        let names: Vec<_> = summary.column_names().collect();
        assert_eq!(&names[..5], &["field", "count", "nunique", "non-null", "type"]);
        assert!(names.contains(&"min_length"));
        assert_eq!(summary.column("min_length").unwrap().values()[0], CellValue::Null);
    }
}
