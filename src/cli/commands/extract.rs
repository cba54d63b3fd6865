//! Extract command implementation
//!
//! This module implements the `extract` command, which builds the configured data
//! extract end to end.

use super::load_or_report;
use crate::adapters::storage::create_blob_store;
use crate::core::extract::{ExtractRunner, RunOptions};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the extract command
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Mapping snapshot to read and update (overrides extract.mappings)
    #[arg(long, value_name = "FILE")]
    pub mappings: Option<PathBuf>,

    /// Zip the PUBLIC folder and upload it to the configured blob container
    #[arg(long)]
    pub archive: bool,

    /// Skip generating the markdown report
    #[arg(long)]
    pub no_report: bool,
}

impl ExtractArgs {
    /// Execute the extract command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting extract command");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let store = if self.archive {
            let storage = match config.require_storage() {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("❌ --archive: {e}");
                    return Ok(2);
                }
            };
            match create_blob_store(storage) {
                Ok(s) => Some(s),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create blob store");
                    eprintln!("❌ Failed to initialize blob storage: {e}");
                    return Ok(e.exit_code());
                }
            }
        } else {
            None
        };

        let mut runner = match ExtractRunner::new(config) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create extract runner");
                eprintln!("❌ Failed to initialize extract: {e}");
                return Ok(e.exit_code());
            }
        };
        if let Some(store) = store {
            runner = runner.with_blob_store(store);
        }

        let options = RunOptions {
            mappings: self.mappings.clone(),
            archive: self.archive,
            skip_report: self.no_report,
        };

        println!("🚀 Building extract '{}'...", runner.config().extract.name);
        println!();

        let summary = match runner.run(&options).await {
            Ok(s) => s,
            Err(e) => {
                crate::log_error_with_context!(&e, "Extract failed");
                eprintln!("❌ Extract failed: {e}");
                return Ok(e.exit_code());
            }
        };

        println!("📊 Extract Summary:");
        println!("{}", summary.extract);
        println!("  Folder: {}", summary.extract.layout().root().display());
        println!();
        for report in &summary.reports {
            println!(
                "  {}: {} column(s) pseudonymised, {} unmapped value(s)",
                report.source,
                report.columns.len(),
                report.total_unmapped()
            );
        }
        println!();
        println!("  Files exported: {}", summary.exported.len());
        if let Some(ref report_file) = summary.report_file {
            println!("  Report: {}", report_file.display());
        }
        println!("  Private file: {}", summary.private_file.display());
        if let Some(ref mappings) = summary.mappings_file {
            println!("  Mappings: {}", mappings.display());
        }
        if let Some(ref blob) = summary.archive_blob {
            println!("  Archive blob: {blob}");
        }
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();
        println!("✅ Extract completed successfully!");

        Ok(0)
    }
}
