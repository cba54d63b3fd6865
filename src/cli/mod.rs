//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for dextract using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// dextract - pseudonymised data extracts
#[derive(Parser, Debug)]
#[command(name = "dextract")]
#[command(version, about, long_about = None)]
#[command(author = "Dextract Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "dextract.toml", env = "DEXTRACT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DEXTRACT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the configured data extract
    Extract(commands::extract::ExtractArgs),

    /// Load every source and report unhandled identifier columns
    Check(commands::check::CheckArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),

    /// Work with the configured blob container
    Blobs(commands::blobs::BlobsArgs),

    /// Write a date dimension table to CSV
    DateTable(commands::date_table::DateTableArgs),
}
