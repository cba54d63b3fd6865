//! Pseudonymisation of identifier columns
//!
//! Three pieces work together:
//! - [`classifier`] decides which column names look like identifiers
//! - [`mapping`] keeps the per-entity real-to-surrogate id mappings
//! - [`engine`] enforces the "mapped or whitelisted" policy and rewrites columns
//!
//! # Examples
//!
//! ```
//! use dextract::core::extract::{ColumnMapping, DataSource};
//! use dextract::core::pseudonymise::{IdentifierMappingStore, PseudonymisationEngine};
//! use dextract::domain::{CellValue, Column, DataSourceName, EntityName, Table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = Table::from_columns(vec![Column::new("UserId", [Some(101_i64), Some(102), None])])?;
//! let mapping: ColumnMapping = [("UserId", EntityName::new("User")?)].into_iter().collect();
//! let mut source = DataSource::new(DataSourceName::new("users")?, table)
//!     .with_columns_to_entities(mapping);
//!
//! let mut store = IdentifierMappingStore::new();
//! PseudonymisationEngine::new().pseudonymise(&mut store, &mut source)?;
//!
//! let values = source.table().column("UserId").unwrap().values();
//! assert_eq!(values, &[CellValue::Int(0), CellValue::Int(1), CellValue::Null]);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod engine;
pub mod mapping;

pub use classifier::{find_id_columns, ColumnClassifier, IdSuffixClassifier};
pub use engine::{ColumnOutcome, PseudonymisationEngine, PseudonymisationReport};
pub use mapping::{extend_mapping, EntityMapping, IdentifierMappingStore};
