//! PostgreSQL row to [`Table`] conversion
//!
//! Each result column gets a [`Decoder`] from its declared type. Types without a
//! decoder are loaded as missing values and logged once per column.

use crate::domain::{CellValue, Column, Result, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::types::Type;
use tokio_postgres::Row;

/// How values of one result column are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Text,
    Date,
    Timestamp,
    TimestampTz,
    Uuid,
    Json,
    Unsupported,
}

impl Decoder {
    pub fn for_type(ty: &Type) -> Self {
        match *ty {
            Type::BOOL => Decoder::Bool,
            Type::INT2 => Decoder::Int2,
            Type::INT4 => Decoder::Int4,
            Type::INT8 => Decoder::Int8,
            Type::OID => Decoder::Oid,
            Type::FLOAT4 => Decoder::Float4,
            Type::FLOAT8 => Decoder::Float8,
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => Decoder::Text,
            Type::DATE => Decoder::Date,
            Type::TIMESTAMP => Decoder::Timestamp,
            Type::TIMESTAMPTZ => Decoder::TimestampTz,
            Type::UUID => Decoder::Uuid,
            Type::JSON | Type::JSONB => Decoder::Json,
            _ => Decoder::Unsupported,
        }
    }

    fn decode(self, row: &Row, index: usize) -> std::result::Result<CellValue, tokio_postgres::Error> {
        let value = match self {
            Decoder::Bool => row.try_get::<_, Option<bool>>(index)?.into(),
            Decoder::Int2 => row.try_get::<_, Option<i16>>(index)?.map(i64::from).into(),
            Decoder::Int4 => row.try_get::<_, Option<i32>>(index)?.map(i64::from).into(),
            Decoder::Int8 => row.try_get::<_, Option<i64>>(index)?.into(),
            Decoder::Oid => row.try_get::<_, Option<u32>>(index)?.map(i64::from).into(),
            Decoder::Float4 => row.try_get::<_, Option<f32>>(index)?.map(f64::from).into(),
            Decoder::Float8 => row.try_get::<_, Option<f64>>(index)?.into(),
            Decoder::Text => row.try_get::<_, Option<String>>(index)?.into(),
            Decoder::Date => row
                .try_get::<_, Option<NaiveDate>>(index)?
                .map(CellValue::Date)
                .unwrap_or_default(),
            Decoder::Timestamp => row
                .try_get::<_, Option<NaiveDateTime>>(index)?
                .map(CellValue::DateTime)
                .unwrap_or_default(),
            Decoder::TimestampTz => row
                .try_get::<_, Option<DateTime<Utc>>>(index)?
                .map(|dt| CellValue::DateTime(dt.naive_utc()))
                .unwrap_or_default(),
            Decoder::Uuid => row
                .try_get::<_, Option<uuid::Uuid>>(index)?
                .map(|u| u.to_string())
                .into(),
            Decoder::Json => row
                .try_get::<_, Option<serde_json::Value>>(index)?
                .map(|v| v.to_string())
                .into(),
            Decoder::Unsupported => CellValue::Null,
        };
        Ok(value)
    }
}

/// Builds a table from query rows
///
/// `columns` are the statement's result columns, so a query returning no rows still
/// yields the right header.
pub fn rows_to_table(columns: &[tokio_postgres::Column], rows: &[Row]) -> Result<Table> {
    let mut table = Table::new();

    for (index, column) in columns.iter().enumerate() {
        let decoder = Decoder::for_type(column.type_());
        if decoder == Decoder::Unsupported {
            tracing::warn!(
                column = %column.name(),
                pg_type = %column.type_(),
                "Unsupported column type loaded as missing values; cast it in the query"
            );
        }

        let values = rows
            .iter()
            .map(|row| decoder.decode(row, index))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                crate::domain::DextractError::Database(format!(
                    "Failed to read column '{}': {}",
                    column.name(),
                    e
                ))
            })?;

        table.push_column(Column::new(column.name(), values))?;
    }

    Ok(table)
}
