//! Date table command implementation
//!
//! Writes a date dimension table to CSV. Needs no configuration file.

use crate::adapters::file::csv::write_table;
use crate::core::dimension::date_table;
use chrono::NaiveDate;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the date-table command
#[derive(Args, Debug)]
pub struct DateTableArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Last day, inclusive (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// CSV file to write
    #[arg(short, long)]
    pub output: PathBuf,
}

impl DateTableArgs {
    /// Execute the date-table command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(start = %self.start, end = ?self.end, "Generating date table");

        let table = match date_table(self.start, self.end) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("❌ Failed to build date table: {e}");
                return Ok(e.exit_code());
            }
        };

        if let Err(e) = write_table(&table, &self.output) {
            eprintln!("❌ Failed to write {}: {e}", self.output.display());
            return Ok(e.exit_code());
        }

        println!(
            "✅ Wrote {} day(s) to {}",
            table.n_rows(),
            self.output.display()
        );
        Ok(0)
    }
}
