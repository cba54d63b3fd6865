//! Azure Table Storage queries
//!
//! Entities are fetched with `Accept: application/json;odata=nometadata` and paged
//! through the `x-ms-continuation-NextPartitionKey` / `NextRowKey` response headers.

use super::auth::TokenSource;
use super::{connection_error, http_client, ms_date, status_error};
use crate::config::StorageConfig;
use crate::domain::{CellValue, DextractError, Result, StorageError, Table};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const TABLE_API_VERSION: &str = "2019-02-02";
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-NextRowKey";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    value: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Client for the Table service of one storage account
pub struct TableStorageClient {
    http: reqwest::Client,
    table_url: Url,
    tokens: Arc<dyn TokenSource>,
}

impl TableStorageClient {
    /// Creates a client for the Table service at `table_url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is invalid.
    pub fn new(table_url: &str, tokens: Arc<dyn TokenSource>, timeout_seconds: u64) -> Result<Self> {
        let table_url = Url::parse(table_url).map_err(|e| {
            DextractError::Configuration(format!("Invalid table service URL '{}': {}", table_url, e))
        })?;

        Ok(Self {
            http: http_client(timeout_seconds)?,
            table_url,
            tokens,
        })
    }

    /// Creates a client from the `[storage]` section
    ///
    /// Without `table_url` the endpoint is derived from `account_url` by replacing
    /// `.blob.` with `.table.`.
    pub fn from_config(config: &StorageConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let table_url = match (&config.table_url, &config.account_url) {
            (Some(url), _) => url.clone(),
            (None, Some(account)) => account.replacen(".blob.", ".table.", 1),
            (None, None) => {
                return Err(DextractError::Configuration(
                    "storage.table_url or storage.account_url is required".to_string(),
                ))
            }
        };
        Self::new(&table_url, tokens, config.timeout_seconds)
    }

    /// Runs a query against `table` and returns every matching entity
    ///
    /// `filter` is an OData `$filter` expression. Columns are the union of entity
    /// properties in first-seen order; `odata.*` metadata properties are dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::TableNotFound` if the table does not exist.
    pub async fn query_entities(&self, table: &str, filter: Option<&str>) -> Result<Table> {
        let mut records = Vec::new();
        let mut continuation: Option<(String, Option<String>)> = None;
        let mut pages = 0_usize;

        loop {
            let url = self.query_url(table, filter, continuation.as_ref())?;
            let token = self.tokens.token().await?;

            let response = self
                .http
                .get(url)
                .bearer_auth(token)
                .header("x-ms-version", TABLE_API_VERSION)
                .header("x-ms-date", ms_date())
                .header("Accept", "application/json;odata=nometadata")
                .send()
                .await
                .map_err(connection_error)?;

            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(StorageError::TableNotFound(table.to_string()).into());
            }
            if !status.is_success() {
                return Err(status_error(status, response.text().await.unwrap_or_default()));
            }

            let header = |name: &str| {
                response
                    .headers()
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            continuation = header(NEXT_PARTITION_KEY).map(|pk| (pk, header(NEXT_ROW_KEY)));

            let page: QueryResponse = response
                .json()
                .await
                .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
            pages += 1;
            records.extend(page.value.into_iter().map(entity_record));

            if continuation.is_none() {
                break;
            }
        }

        tracing::debug!(table = %table, pages, entities = records.len(), "Queried table storage");
        Ok(Table::from_records(records))
    }

    fn query_url(
        &self,
        table: &str,
        filter: Option<&str>,
        continuation: Option<&(String, Option<String>)>,
    ) -> Result<Url> {
        let mut url = self.table_url.clone();
        url.path_segments_mut()
            .map_err(|_| DextractError::Configuration("Table service URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&format!("{table}()"));

        {
            let mut query = url.query_pairs_mut();
            if let Some(filter) = filter {
                query.append_pair("$filter", filter);
            }
            if let Some((partition, row)) = continuation {
                query.append_pair("NextPartitionKey", partition);
                if let Some(row) = row {
                    query.append_pair("NextRowKey", row);
                }
            }
        }
        Ok(url)
    }
}

fn entity_record(entity: serde_json::Map<String, serde_json::Value>) -> Vec<(String, CellValue)> {
    entity
        .into_iter()
        .filter(|(key, _)| !key.starts_with("odata.") && !key.contains("@odata."))
        .map(|(key, value)| {
            let cell = json_cell(&key, value);
            (key, cell)
        })
        .collect()
}

fn json_cell(key: &str, value: serde_json::Value) -> CellValue {
    use serde_json::Value;

    match value {
        Value::Null => CellValue::Null,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => CellValue::Int(i),
            None => n.as_f64().map(CellValue::Float).unwrap_or(CellValue::Null),
        },
        Value::String(s) if key == "Timestamp" => s
            .parse::<DateTime<Utc>>()
            .map(|dt| CellValue::DateTime(dt.naive_utc()))
            .unwrap_or(CellValue::Text(s)),
        Value::String(s) => CellValue::Text(s),
        other => CellValue::Text(other.to_string()),
    }
}
