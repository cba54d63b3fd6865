//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the dextract configuration file.

use crate::config::{load_config, redact_url, StorageBackend};
use crate::core::extract::configured_entities;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(e.exit_code());
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Extract: {}", config.extract.name);
        println!("  Container: {}", config.extract.container.display());
        match config.extract.mappings {
            Some(ref path) => println!("  Mapping snapshot: {}", path.display()),
            None => println!("  Mapping snapshot: (none)"),
        }
        println!("  Log Level: {}", config.application.log_level);

        if let Some(ref sql) = config.sql {
            println!("  SQL Connection: {}", redact_url(&sql.connection_string));
            println!("  SQL Max Connections: {}", sql.max_connections);
            println!("  SQL SSL Mode: {}", sql.ssl_mode);
        }

        if let Some(ref storage) = config.storage {
            match storage.backend {
                StorageBackend::Azure => {
                    println!(
                        "  Blob Storage: {} (container '{}')",
                        storage.account_url.as_deref().unwrap_or("-"),
                        storage.container
                    );
                }
                StorageBackend::Local => {
                    println!("  Blob Storage: local directory {}", storage.container);
                }
            }
            println!("  Sync Root: {}", storage.sync_root.display());
        }

        println!("  Sources: {}", config.sources.len());
        for source in &config.sources {
            println!(
                "    - {} ({}, {} mapped column(s), {} whitelisted)",
                source.name,
                source.kind,
                source.columns_to_entities.len(),
                source.whitelist.len()
            );
        }

        let entities: Vec<String> = configured_entities(&config)
            .iter()
            .map(|e| e.to_string())
            .collect();
        println!("  Entities: {}", entities.join(", "));
        println!();
        Ok(0)
    }
}
