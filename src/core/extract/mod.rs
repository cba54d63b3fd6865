//! Data sources, data extracts and their on-disk layout
//!
//! The typical run:
//!
//! 1. Create a [`DataExtract`] (stamps id and time, creates the folders)
//! 2. Load each table into a [`DataSource`] and declare its identifier columns
//! 3. Register the sources and pseudonymise them one by one
//! 4. Export, generate the report, save and optionally archive
//!
//! [`ExtractRunner`] does all of this from a `dextract.toml`.

pub mod archive;
pub mod data_extract;
pub mod layout;
pub mod runner;
pub mod source;

pub use archive::zip_folder;
pub use data_extract::DataExtract;
pub use layout::ExtractLayout;
pub use runner::{configured_entities, ExtractRunner, RunOptions, RunSummary, SourceCheck};
pub use source::{ColumnMapping, DataSource};
