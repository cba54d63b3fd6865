//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DextractConfig;
use crate::config::secret_string;
use crate::domain::errors::DextractError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DextractConfig
/// 4. Applies environment variable overrides (DEXTRACT_* prefix)
/// 5. Validates the configuration
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Errors
///
/// Returns a configuration error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use dextract::config::loader::load_config;
///
/// let config = load_config("dextract.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DextractConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(DextractError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        DextractError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: DextractConfig = toml::from_str(&contents)
        .map_err(|e| DextractError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        DextractError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    tracing::debug!(
        path = %path.display(),
        sources = config.sources.len(),
        "Configuration loaded"
    );

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. Every missing variable is reported in one error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| DextractError::Configuration(format!("Invalid placeholder pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(DextractError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using DEXTRACT_* prefix
///
/// Environment variables follow the pattern: DEXTRACT_<SECTION>_<KEY>
/// For example: DEXTRACT_EXTRACT_CONTAINER, DEXTRACT_SQL_CONNECTION_STRING
fn apply_env_overrides(config: &mut DextractConfig) {
    if let Ok(val) = std::env::var("DEXTRACT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("DEXTRACT_EXTRACT_NAME") {
        config.extract.name = val;
    }
    if let Ok(val) = std::env::var("DEXTRACT_EXTRACT_CONTAINER") {
        config.extract.container = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("DEXTRACT_EXTRACT_MAPPINGS") {
        config.extract.mappings = Some(PathBuf::from(val));
    }

    if let Some(ref mut sql) = config.sql {
        if let Ok(val) = std::env::var("DEXTRACT_SQL_CONNECTION_STRING") {
            sql.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("DEXTRACT_SQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                sql.max_connections = max;
            }
        }
        if let Ok(val) = std::env::var("DEXTRACT_SQL_SSL_MODE") {
            sql.ssl_mode = val;
        }
    }

    if let Some(ref mut storage) = config.storage {
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_CONTAINER") {
            storage.container = val;
        }
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_ACCOUNT_URL") {
            storage.account_url = Some(val);
        }
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_TABLE_URL") {
            storage.table_url = Some(val);
        }
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_TENANT_ID") {
            storage.tenant_id = Some(val);
        }
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_CLIENT_ID") {
            storage.client_id = Some(val);
        }
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_CLIENT_SECRET") {
            storage.client_secret = Some(secret_string(val));
        }
        if let Ok(val) = std::env::var("DEXTRACT_STORAGE_SYNC_ROOT") {
            storage.sync_root = PathBuf::from(val);
        }
    }

    if let Ok(val) = std::env::var("DEXTRACT_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("DEXTRACT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("DEXTRACT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}
