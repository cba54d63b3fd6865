//! Domain models and types for dextract.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed names** ([`EntityName`], [`DataSourceName`], [`ExtractId`])
//! - **Tabular model** ([`Table`], [`Column`], [`CellValue`])
//! - **Error types** ([`DextractError`], [`PseudonymisationError`], [`StorageError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Names are newtypes so an entity name can never be passed where a data source
//! name is expected:
//!
//! ```rust
//! use dextract::domain::{DataSourceName, EntityName};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let entity = EntityName::new("User")?;
//! let source = DataSourceName::new("quiz_sessions")?;
//!
//! // This won't compile
//! // let wrong: EntityName = source;
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, DextractError>`]:
//!
//! ```rust
//! use dextract::domain::{DextractError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = dextract::config::load_config("dextract.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod result;
pub mod table;

// Re-export commonly used types for convenience
pub use errors::{DextractError, PseudonymisationError, StorageError};
pub use ids::{DataSourceName, EntityName, ExtractId};
pub use result::Result;
pub use table::{CellKey, CellKind, CellValue, Column, Table};
