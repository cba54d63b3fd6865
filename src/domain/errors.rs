//! Domain error types
//!
//! This module defines the error hierarchy for dextract.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main dextract error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum DextractError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Pseudonymisation policy and mapping errors
    #[error("Pseudonymisation error: {0}")]
    Pseudonymisation(#[from] PseudonymisationError),

    /// Blob and table storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// SQL database errors
    #[error("Database error: {0}")]
    Database(String),

    /// A data source could not be loaded or parsed
    #[error("Data source error: {0}")]
    Source(String),

    /// Export process errors
    #[error("Export error: {0}")]
    Export(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl DextractError {
    /// Process exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            DextractError::Configuration(_) => 2,
            DextractError::Pseudonymisation(_) | DextractError::Validation(_) => 3,
            DextractError::Storage(_)
            | DextractError::Database(_)
            | DextractError::Authentication(_) => 4,
            _ => 5,
        }
    }
}

/// Pseudonymisation errors
///
/// None of these are retried: the operations are deterministic, so the caller has to
/// amend the source declaration or the input data and start a fresh run.
#[derive(Debug, Error)]
pub enum PseudonymisationError {
    /// The named data source is not registered with the extract
    #[error("Data source not found: {source_name}")]
    NotFound { source_name: String },

    /// The data source has already been pseudonymised
    #[error("Data source '{source_name}' has already been pseudonymised")]
    AlreadyProcessed { source_name: String },

    /// Identifier-shaped columns that are neither mapped nor whitelisted
    #[error(
        "Data source '{source_name}': the columns {} should either be mapped to an entity or whitelisted",
        .columns.join("|")
    )]
    UnhandledIdentifierColumns {
        source_name: String,
        columns: Vec<String>,
    },

    /// Columns declared in `columns_to_entities` that the table does not have
    #[error(
        "Data source '{source_name}': the mapped columns {} are not in the table",
        .columns.join("|")
    )]
    MappedColumnsMissing {
        source_name: String,
        columns: Vec<String>,
    },

    /// A real identifier could not be represented as an integer
    #[error(
        "Cannot convert value '{value}' to an integer identifier for entity '{entity}'{}",
        .column.as_ref().map(|c| format!(" in column '{c}'")).unwrap_or_default()
    )]
    TypeConversion {
        entity: String,
        column: Option<String>,
        value: String,
    },

    /// Two real identifiers were assigned the same surrogate
    #[error(
        "Mapping for entity '{entity}' is not injective: {keys} real ids map to {values} surrogate ids"
    )]
    MappingCollision {
        entity: String,
        keys: usize,
        values: usize,
    },

    /// No surrogate above the entity's current maximum fits in an `i64`
    #[error("Surrogate ids for entity '{entity}' are exhausted")]
    SurrogateOverflow { entity: String },

    /// Export was attempted before pseudonymisation
    #[error("Data source '{source_name}' has not been pseudonymised and cannot be exported")]
    NotPseudonymised { source_name: String },
}

impl PseudonymisationError {
    /// Attaches the column being processed to a type conversion error
    pub fn with_column(self, column: &str) -> Self {
        match self {
            PseudonymisationError::TypeConversion { entity, value, .. } => {
                PseudonymisationError::TypeConversion {
                    entity,
                    column: Some(column.to_string()),
                    value,
                }
            }
            other => other,
        }
    }
}

/// Storage-specific errors
///
/// Errors that occur when talking to Azure Blob or Table Storage.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to reach the storage endpoint
    #[error("Failed to connect to storage: {0}")]
    ConnectionFailed(String),

    /// Token acquisition or authorisation failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Container does not exist
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// Blob does not exist
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Blob exists and overwrite was not requested
    #[error("Blob already exists: {0}")]
    BlobAlreadyExists(String),

    /// Table does not exist
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Server returned an unexpected status
    #[error("Request failed: {status} - {message}")]
    RequestFailed { status: u16, message: String },

    /// Response body could not be interpreted
    #[error("Invalid response from storage: {0}")]
    InvalidResponse(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for DextractError {
    fn from(err: std::io::Error) -> Self {
        DextractError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DextractError {
    fn from(err: serde_json::Error) -> Self {
        DextractError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DextractError {
    fn from(err: toml::de::Error) -> Self {
        DextractError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from csv errors
impl From<csv::Error> for DextractError {
    fn from(err: csv::Error) -> Self {
        DextractError::Source(format!("CSV error: {err}"))
    }
}

// Conversion from zip errors
impl From<zip::result::ZipError> for DextractError {
    fn from(err: zip::result::ZipError) -> Self {
        DextractError::Export(format!("Archive error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dextract_error_display() {
        let err = DextractError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_pseudonymisation_error_conversion() {
        let err = PseudonymisationError::NotFound {
            source_name: "sessions".to_string(),
        };
        let dextract_err: DextractError = err.into();
        assert!(matches!(dextract_err, DextractError::Pseudonymisation(_)));
        assert_eq!(dextract_err.exit_code(), 3);
    }

    #[test]
    fn test_storage_error_conversion() {
        let err = StorageError::BlobNotFound("data/a.csv".to_string());
        let dextract_err: DextractError = err.into();
        assert!(matches!(dextract_err, DextractError::Storage(_)));
        assert_eq!(dextract_err.exit_code(), 4);
    }

    #[test]
    fn test_unhandled_columns_message_names_every_column() {
        let err = PseudonymisationError::UnhandledIdentifierColumns {
            source_name: "answers".to_string(),
            columns: vec!["QuizId".to_string(), "SessionId".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("QuizId|SessionId"));
        assert!(message.contains("answers"));
    }

    #[test]
    fn test_type_conversion_with_column() {
        let err = PseudonymisationError::TypeConversion {
            entity: "User".to_string(),
            column: None,
            value: "1.5".to_string(),
        }
        .with_column("UserId");

        assert!(err.to_string().contains("in column 'UserId'"));
        assert!(err.to_string().contains("'1.5'"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: DextractError = io_err.into();
        assert!(matches!(err, DextractError::Io(_)));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: DextractError = json_err.into();
        assert!(matches!(err, DextractError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: DextractError = toml_err.into();
        assert!(matches!(err, DextractError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = DextractError::Validation("Test error".to_string());
        let _: &dyn std::error::Error = &err;
        let err = StorageError::ContainerNotFound("extracts".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
