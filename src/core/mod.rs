//! Core logic of dextract.
//!
//! # Modules
//!
//! - [`extract`] - Data sources, extracts, their layout and the configured runner
//! - [`pseudonymise`] - Identifier policy and persistent surrogate mappings
//! - [`report`] - Markdown report building and summary statistics
//! - [`sync`] - Two-way synchronisation of a folder with a blob container
//! - [`dimension`] - Date dimension tables
//!
//! # Example
//!
//! ```rust,no_run
//! use dextract::config::load_config;
//! use dextract::core::extract::{ExtractRunner, RunOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dextract.toml")?;
//! let runner = ExtractRunner::new(config)?;
//!
//! let summary = runner.run(&RunOptions::default()).await?;
//! println!("Exported {} files", summary.exported.len());
//! # Ok(())
//! # }
//! ```

pub mod dimension;
pub mod extract;
pub mod pseudonymise;
pub mod report;
pub mod sync;
