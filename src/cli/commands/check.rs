//! Check command implementation
//!
//! Loads every configured source and lists identifier columns that are neither
//! mapped nor whitelisted, and mapped columns the table lacks. Nothing is
//! pseudonymised or written.

use super::load_or_report;
use crate::core::extract::ExtractRunner;
use clap::Args;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {}

impl CheckArgs {
    /// Execute the check command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Checking data sources");

        let config = match load_or_report(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        let runner = match ExtractRunner::new(config) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("❌ Failed to initialize sources: {e}");
                return Ok(e.exit_code());
            }
        };

        let checks = match runner.check().await {
            Ok(c) => c,
            Err(e) => {
                crate::log_error_with_context!(&e, "Loading sources failed");
                eprintln!("❌ Failed to load sources: {e}");
                return Ok(e.exit_code());
            }
        };

        let mut failed = 0;
        for check in &checks {
            if check.is_ok() {
                println!("✅ {} ({} rows)", check.source, check.rows);
            } else {
                failed += 1;
                println!("❌ {} ({} rows)", check.source, check.rows);
                if !check.unhandled_columns.is_empty() {
                    println!("   Unhandled identifier columns:");
                    for column in &check.unhandled_columns {
                        println!("     - {column}");
                    }
                }
                if !check.missing_mapped_columns.is_empty() {
                    println!("   Mapped columns not in the table:");
                    for column in &check.missing_mapped_columns {
                        println!("     - {column}");
                    }
                }
            }
        }

        println!();
        if failed == 0 {
            println!("All {} source(s) satisfy the identifier policy", checks.len());
            Ok(0)
        } else {
            println!("{failed} of {} source(s) fail the identifier policy", checks.len());
            println!("Fix the names in columns_to_entities or add columns to the whitelist.");
            Ok(3)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, mapping: &str) -> String {
        let csv = dir.path().join("a.csv");
        std::fs::write(&csv, "UserId,SessionId\n1,2\n").unwrap();
        let path = dir.path().join("dextract.toml");
        std::fs::write(
            &path,
            format!(
                "[extract]\nname = \"x\"\ncontainer = '{}'\n\n[[sources]]\nname = \"a\"\nkind = \"csv\"\npath = '{}'\n{mapping}\n",
                dir.path().join("out").display(),
                csv.display()
            ),
        )
        .unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_unhandled_columns_exit_code() {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, "columns_to_entities = { UserId = \"User\" }");
        assert_eq!(CheckArgs {}.execute(&path).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_all_handled() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "columns_to_entities = { UserId = \"User\" }\nwhitelist = [\"SessionId\"]",
        );
        assert_eq!(CheckArgs {}.execute(&path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_mapped_column_exit_code() {
        let dir = TempDir::new().unwrap();
        let path = write_config(
            &dir,
            "columns_to_entities = { UserId = \"User\", user_key = \"User\" }\nwhitelist = [\"SessionId\"]",
        );
        assert_eq!(CheckArgs {}.execute(&path).await.unwrap(), 3);
    }
}
