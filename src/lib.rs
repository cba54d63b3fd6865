// Dextract - Pseudonymised Data Extracts
// Copyright (c) 2025 Dextract Contributors
// Licensed under the MIT License

//! # Dextract - pseudonymised data extracts
//!
//! Dextract builds shareable data extracts: tables loaded from SQL, CSV, spreadsheets
//! or Azure Table Storage whose identifier columns are replaced by consistent integer
//! surrogates before anything is written to the public folder.
//!
//! ## Overview
//!
//! - **Loading** tables into [`core::extract::DataSource`]s
//! - **Pseudonymising** identifier columns through one shared
//!   [`core::pseudonymise::IdentifierMappingStore`], refusing any identifier-shaped
//!   column that was neither mapped nor whitelisted
//! - **Publishing** CSV files, a markdown report and a zipped archive
//! - **Synchronising** a local folder with a blob container
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Pseudonymisation, extracts, reports, sync, date dimensions
//! - [`adapters`] - PostgreSQL, Azure Blob/Table Storage, CSV and spreadsheets
//! - [`domain`] - Identifiers, the table model and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dextract::core::extract::{DataExtract, DataSource};
//! use dextract::domain::{Column, DataSourceName, EntityName, Table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut extract = DataExtract::new("study", "Quiz activity", "extracts")?;
//!
//! let table = Table::from_columns(vec![Column::new("UserId", [101_i64, 102, 101])])?;
//! let user = EntityName::new("User")?;
//! let source = DataSource::new(DataSourceName::new("sessions")?, table)
//!     .with_columns_to_entities([("UserId", user)].into_iter().collect());
//! extract.add_data_source(source);
//!
//! extract.pseudonymise(&DataSourceName::new("sessions")?)?;
//! extract.export(None)?;
//! extract.generate_markdown_report()?;
//! extract.save()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return [`domain::Result`], whose error is
//! [`domain::DextractError`]. Pseudonymisation failures are never retried: they stem
//! from the data or the declared mappings and need a decision from the caller.
//!
//! ## Logging
//!
//! Dextract logs through `tracing`; see [`logging::init_logging`].

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
