//! Date dimension tables
//!
//! One row per calendar day, with the usual keys and calendar attributes used to
//! join facts on dates in reporting tools.

use crate::domain::{CellValue, Column, Result, Table};
use chrono::{Datelike, NaiveDate, Utc, Weekday};

/// Column names of a date table, in order
pub const DATE_TABLE_COLUMNS: [&str; 17] = [
    "Date",
    "UnixTimestamp",
    "DateKey",
    "DateDayFirst",
    "DateUSA",
    "Year",
    "Month",
    "Day",
    "DayOfYear",
    "DayName",
    "IsWeekend",
    "DayOfWeekMon0",
    "DayOfWeekSun0",
    "ISOWeekOfYear",
    "MonthName",
    "MonthNameAbbr",
    "Quarter",
];

/// Builds a date dimension from `start` to `end` inclusive
///
/// `end` defaults to today (UTC). When `start` is after `end` the table is empty but
/// still has every column. `UnixTimestamp` is midnight UTC. `DateUSA` is formatted
/// year-day-month.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use dextract::core::dimension::date_table;
/// use dextract::domain::CellValue;
///
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let end = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
/// let table = date_table(start, Some(end)).unwrap();
///
/// assert_eq!(table.n_rows(), 7);
/// assert_eq!(table.column("DateKey").unwrap().values()[0], CellValue::Int(20240101));
/// ```
pub fn date_table(start: NaiveDate, end: Option<NaiveDate>) -> Result<Table> {
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();

    let mut rows: Vec<Vec<CellValue>> = Vec::with_capacity(dates.len());
    for date in dates {
        rows.push(date_row(date));
    }

    Table::from_rows(
        DATE_TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    )
}

fn date_row(date: NaiveDate) -> Vec<CellValue> {
    let weekday = date.weekday();
    let month_name = month_name(date.month());
    let timestamp = date
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp());

    vec![
        CellValue::Date(date),
        CellValue::from(timestamp),
        CellValue::Int(i64::from(date.year()) * 10_000 + i64::from(date.month() * 100 + date.day())),
        CellValue::Text(date.format("%d-%m-%Y").to_string()),
        CellValue::Text(date.format("%Y-%d-%m").to_string()),
        CellValue::Int(i64::from(date.year())),
        CellValue::Int(i64::from(date.month())),
        CellValue::Int(i64::from(date.day())),
        CellValue::Int(i64::from(date.ordinal())),
        CellValue::Text(day_name(weekday).to_string()),
        CellValue::Bool(matches!(weekday, Weekday::Sat | Weekday::Sun)),
        CellValue::Int(i64::from(weekday.num_days_from_monday())),
        CellValue::Int(i64::from(weekday.num_days_from_sunday())),
        CellValue::Int(i64::from(date.iso_week().week())),
        CellValue::Text(month_name.to_string()),
        CellValue::Text(month_name[..3].to_string()),
        CellValue::Int(i64::from((date.month() - 1) / 3 + 1)),
    ]
}

fn day_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    const NAMES: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    NAMES[(month as usize).saturating_sub(1) % 12]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn value(table: &Table, column: &str, row: usize) -> CellValue {
        table.column(column).unwrap().values()[row].clone()
    }

    #[test]
    fn test_columns_in_order() {
        let table = date_table(date(2024, 1, 1), Some(date(2024, 1, 1))).unwrap();
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, DATE_TABLE_COLUMNS.to_vec());
    }

    #[test]
    fn test_leap_day_row() {
        let table = date_table(date(2024, 2, 28), Some(date(2024, 3, 1))).unwrap();
        assert_eq!(table.n_rows(), 3);

        assert_eq!(value(&table, "Date", 1), CellValue::Date(date(2024, 2, 29)));
        assert_eq!(value(&table, "UnixTimestamp", 1), CellValue::Int(1_709_164_800));
        assert_eq!(value(&table, "DateKey", 1), CellValue::Int(20240229));
        assert_eq!(value(&table, "DateDayFirst", 1), CellValue::from("29-02-2024"));
        assert_eq!(value(&table, "DateUSA", 1), CellValue::from("2024-29-02"));
        assert_eq!(value(&table, "DayOfYear", 1), CellValue::Int(60));
        assert_eq!(value(&table, "DayName", 1), CellValue::from("Thursday"));
        assert_eq!(value(&table, "IsWeekend", 1), CellValue::Bool(false));
        assert_eq!(value(&table, "DayOfWeekMon0", 1), CellValue::Int(3));
        assert_eq!(value(&table, "DayOfWeekSun0", 1), CellValue::Int(4));
        assert_eq!(value(&table, "ISOWeekOfYear", 1), CellValue::Int(9));
        assert_eq!(value(&table, "MonthName", 1), CellValue::from("February"));
        assert_eq!(value(&table, "MonthNameAbbr", 1), CellValue::from("Feb"));
        assert_eq!(value(&table, "Quarter", 1), CellValue::Int(1));
    }

    #[test]
    fn test_weekend_and_sunday_index() {
        let table = date_table(date(2023, 12, 31), Some(date(2023, 12, 31))).unwrap();
        assert_eq!(value(&table, "DayName", 0), CellValue::from("Sunday"));
        assert_eq!(value(&table, "IsWeekend", 0), CellValue::Bool(true));
        assert_eq!(value(&table, "DayOfWeekMon0", 0), CellValue::Int(6));
        assert_eq!(value(&table, "DayOfWeekSun0", 0), CellValue::Int(0));
        assert_eq!(value(&table, "ISOWeekOfYear", 0), CellValue::Int(52));
        assert_eq!(value(&table, "Quarter", 0), CellValue::Int(4));
    }

    #[test]
    fn test_start_after_end_is_empty() {
        let table = date_table(date(2024, 5, 2), Some(date(2024, 5, 1))).unwrap();
        assert_eq!(table.n_rows(), 0);
        assert_eq!(table.n_columns(), DATE_TABLE_COLUMNS.len());
    }

    #[test]
    fn test_end_defaults_to_today() {
        let today = Utc::now().date_naive();
        let table = date_table(today - chrono::Duration::days(2), None).unwrap();
        assert!(table.n_rows() >= 3);
    }
}
