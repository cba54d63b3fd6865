//! CLI command implementations
//!
//! This module contains all CLI command implementations. Each command returns its
//! process exit code.

pub mod blobs;
pub mod check;
pub mod date_table;
pub mod extract;
pub mod init;
pub mod validate;

use crate::config::{load_config, DextractConfig};

/// Loads the configuration, printing the failure and returning exit code 2 on error
pub(crate) fn load_or_report(config_path: &str) -> Result<DextractConfig, i32> {
    load_config(config_path).map_err(|e| {
        tracing::error!(error = %e, config_path = %config_path, "Failed to load configuration");
        eprintln!("❌ Failed to load configuration: {e}");
        e.exit_code()
    })
}
