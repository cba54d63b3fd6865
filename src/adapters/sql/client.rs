//! PostgreSQL client
//!
//! Pooled connections via `deadpool-postgres`. Every checkout sets the configured
//! statement timeout before running the caller's SQL.

use super::convert::rows_to_table;
use crate::config::{redact_url, SqlConfig};
use crate::domain::{DextractError, Result, Table};
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::NoTls;

/// Client used by `sql` data sources
pub struct SqlClient {
    pool: Pool,
    statement_timeout_seconds: u64,
}

impl SqlClient {
    /// Create a new client from the `[sql]` section
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid connection string, or a database
    /// error if the pool or TLS connector cannot be built.
    pub fn new(config: &SqlConfig) -> Result<Self> {
        let mut pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                DextractError::Configuration(format!("Invalid PostgreSQL connection string: {}", e))
            })?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let manager = match config.ssl_mode.as_str() {
            "require" => {
                pg_config.ssl_mode(SslMode::Require);
                let connector = native_tls::TlsConnector::new().map_err(|e| {
                    DextractError::Database(format!("Failed to create TLS connector: {}", e))
                })?;
                let tls = postgres_native_tls::MakeTlsConnector::new(connector);
                Manager::from_config(pg_config, tls, manager_config)
            }
            "disable" => {
                pg_config.ssl_mode(SslMode::Disable);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
            _ => {
                pg_config.ssl_mode(SslMode::Prefer);
                Manager::from_config(pg_config, NoTls, manager_config)
            }
        };

        let timeout = Some(Duration::from_secs(config.connection_timeout_seconds));
        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .wait_timeout(timeout)
            .create_timeout(timeout)
            .recycle_timeout(timeout)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .map_err(|e| DextractError::Database(format!("Failed to create connection pool: {}", e)))?;

        tracing::info!(
            database = %redact_url(&config.connection_string),
            ssl_mode = %config.ssl_mode,
            "PostgreSQL client created"
        );

        Ok(Self {
            pool,
            statement_timeout_seconds: config.statement_timeout_seconds,
        })
    }

    /// Checks out a connection with the statement timeout applied
    async fn connection(&self) -> Result<Object> {
        let client = self.pool.get().await.map_err(|e| {
            DextractError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        client
            .batch_execute(&format!(
                "SET statement_timeout = {}",
                self.statement_timeout_seconds * 1000
            ))
            .await
            .map_err(|e| DextractError::Database(format!("Failed to set statement timeout: {}", e)))?;

        Ok(client)
    }

    /// Test the connection
    pub async fn test_connection(&self) -> Result<()> {
        let client = self.connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| DextractError::Database(format!("Connection test failed: {}", e)))?;

        tracing::info!("PostgreSQL connection test successful");
        Ok(())
    }

    /// Runs a query and loads the result as a table
    ///
    /// # Errors
    ///
    /// Returns a database error if the query fails.
    pub async fn query_table(&self, sql: &str) -> Result<Table> {
        let client = self.connection().await?;

        let statement = client
            .prepare(sql)
            .await
            .map_err(|e| DextractError::Database(format!("Query failed: {}", e)))?;
        let rows = client
            .query(&statement, &[])
            .await
            .map_err(|e| DextractError::Database(format!("Query failed: {}", e)))?;

        tracing::debug!(rows = rows.len(), columns = statement.columns().len(), "Query returned");
        rows_to_table(statement.columns(), &rows)
    }

    /// Runs one or more statements that return no rows
    ///
    /// # Errors
    ///
    /// Returns a database error if any statement fails.
    pub async fn execute(&self, sql: &str) -> Result<()> {
        let client = self.connection().await?;
        client
            .batch_execute(sql)
            .await
            .map_err(|e| DextractError::Database(format!("Statement execution failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    fn config(connection_string: &str, ssl_mode: &str) -> SqlConfig {
        SqlConfig {
            connection_string: secret_string(connection_string.to_string()),
            max_connections: 2,
            connection_timeout_seconds: 1,
            statement_timeout_seconds: 5,
            ssl_mode: ssl_mode.to_string(),
        }
    }

    #[tokio::test]
    async fn test_new_does_not_connect() {
        let client = SqlClient::new(&config("postgresql://u:p@127.0.0.1:1/db", "disable"));
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_connection_string() {
        let result = SqlClient::new(&config("postgresql://u:p@host:notaport/db", "prefer"));
        assert!(matches!(result, Err(DextractError::Configuration(_))));
    }
}
