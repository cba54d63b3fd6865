//! External system integrations for dextract.
//!
//! - [`sql`] - PostgreSQL queries loaded as tables
//! - [`azure`] - Azure Blob Storage and Table Storage over REST
//! - [`file`] - CSV and spreadsheet files
//! - [`storage`] - Blob store abstraction used by archiving and sync
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies from the core. Blob storage is reached
//! through the [`storage::BlobStore`] trait so extracts and sync can run against a
//! local directory in tests.
//!
//! ```rust,no_run
//! use dextract::adapters::storage::{create_blob_store, upload_file};
//! use dextract::config::load_config;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dextract.toml")?;
//! let storage = config.require_storage()?;
//! let store = create_blob_store(storage)?;
//!
//! let blob = upload_file(store.as_ref(), Path::new("data/a.csv"), Path::new("data")).await?;
//! println!("Uploaded {blob} to {}", store.location());
//! # Ok(())
//! # }
//! ```

pub mod azure;
pub mod file;
pub mod sql;
pub mod storage;
