//! Configuration management for dextract.
//!
//! Configuration is a TOML file (default `dextract.toml`) with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DEXTRACT_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use dextract::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("dextract.toml")?;
//!
//! println!("Extract: {}", config.extract.name);
//! for source in &config.sources {
//!     println!("  {} ({})", source.name, source.kind);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`ExtractConfig`] - Extract name, description, container and mapping snapshot
//! - [`SqlConfig`] - PostgreSQL connection
//! - [`StorageConfig`] - Blob/table storage endpoint and Azure AD credentials
//! - [`SourceConfig`] - One entry per data source
//! - [`LoggingConfig`] - Rolling JSON log file
//!
//! # Example Configuration
//!
//! ```toml
//! [extract]
//! name = "quiz-study"
//! description = "Quiz sessions of the 2024 cohort"
//! container = "extracts"
//! mappings = "secure/mappings.json"
//!
//! [sql]
//! connection_string = "${DEXTRACT_SQL_CONNECTION_STRING}"
//!
//! [[sources]]
//! name = "sessions"
//! kind = "sql"
//! path = "queries/sessions.sql"
//! whitelist = ["QuizId"]
//!
//! [sources.columns_to_entities]
//! UserId = "User"
//! SessionId = "Session"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, DextractConfig, ExtractConfig, LoggingConfig, SourceConfig, SourceKind,
    SqlConfig, StorageBackend, StorageConfig,
};
pub use secret::{redact_url, secret_string, secret_string_opt, SecretString, SecretValue};
