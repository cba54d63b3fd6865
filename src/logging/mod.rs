//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Console output with configurable levels
//! - JSON-formatted log files with daily or hourly rotation
//! - Macros for the events every extract run emits
//!
//! # Example
//!
//! ```no_run
//! use dextract::logging::init_logging;
//! use dextract::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! // Use tracing macros for logging
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log a data source that has been loaded into memory
///
/// # Example
///
/// ```no_run
/// use dextract::log_source_loaded;
///
/// log_source_loaded!("quiz_sessions", "sql", 1200, 8);
/// ```
#[macro_export]
macro_rules! log_source_loaded {
    ($source:expr, $kind:expr, $rows:expr, $columns:expr) => {
        tracing::info!(
            source = %$source,
            kind = $kind,
            rows = $rows,
            columns = $columns,
            "Loaded data source"
        );
    };
}

/// Log the completion of pseudonymising a data source
///
/// # Example
///
/// ```no_run
/// use dextract::log_pseudonymisation_complete;
///
/// log_pseudonymisation_complete!("quiz_sessions", 2, 0);
/// ```
#[macro_export]
macro_rules! log_pseudonymisation_complete {
    ($source:expr, $columns:expr, $unmapped:expr) => {
        tracing::info!(
            source = %$source,
            columns = $columns,
            unmapped = $unmapped,
            "Pseudonymised data source"
        );
        if $unmapped > 0 {
            tracing::warn!(
                source = %$source,
                unmapped = $unmapped,
                "Some identifier values had no surrogate and were written as missing"
            );
        }
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use dextract::log_error_with_context;
/// use dextract::domain::DextractError;
///
/// let error = DextractError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a single blob transfer
///
/// # Example
///
/// ```no_run
/// use dextract::log_blob_transfer;
///
/// log_blob_transfer!("upload", "data/sessions.csv");
/// ```
#[macro_export]
macro_rules! log_blob_transfer {
    ($direction:expr, $blob:expr) => {
        tracing::info!(
            direction = %$direction,
            blob = %$blob,
            "Transferred blob"
        );
    };
}
