//! PostgreSQL adapter
//!
//! [`SqlClient`] runs queries for `sql` data sources and returns [`Table`](crate::domain::Table)s.

pub mod client;
pub mod convert;
pub mod helpers;

pub use client::SqlClient;
pub use helpers::join_identifiers_sql;
