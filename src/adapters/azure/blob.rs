//! Azure Blob Storage client
//!
//! Talks to the Blob service REST API directly: container create, paged list, and
//! put/get/head/delete of block blobs.

use super::auth::TokenSource;
use super::{connection_error, http_client, ms_date, status_error, API_VERSION};
use crate::adapters::storage::{normalise_blob_name, BlobStore};
use crate::config::StorageConfig;
use crate::domain::{DextractError, Result, StorageError};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Method, RequestBuilder, StatusCode};
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Client for one blob container
pub struct AzureBlobClient {
    http: reqwest::Client,
    account_url: Url,
    container: String,
    tokens: Arc<dyn TokenSource>,
}

impl AzureBlobClient {
    /// Creates a client for `container` at `account_url`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL is invalid.
    pub fn new(
        account_url: &str,
        container: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
        timeout_seconds: u64,
    ) -> Result<Self> {
        let account_url = Url::parse(account_url).map_err(|e| {
            DextractError::Configuration(format!("Invalid storage account URL '{}': {}", account_url, e))
        })?;

        Ok(Self {
            http: http_client(timeout_seconds)?,
            account_url,
            container: container.into(),
            tokens,
        })
    }

    /// Creates a client from the `[storage]` section
    pub fn from_config(config: &StorageConfig, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        let account_url = config.account_url.as_deref().ok_or_else(|| {
            DextractError::Configuration("storage.account_url is required".to_string())
        })?;
        Self::new(account_url, &config.container, tokens, config.timeout_seconds)
    }

    fn container_url(&self) -> Result<Url> {
        let mut url = self.account_url.clone();
        url.path_segments_mut()
            .map_err(|_| DextractError::Configuration("Storage account URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(&self.container);
        Ok(url)
    }

    fn blob_url(&self, blob_name: &str) -> Result<Url> {
        let name = normalise_blob_name(blob_name);
        let mut url = self.container_url()?;
        url.path_segments_mut()
            .map_err(|_| DextractError::Configuration("Storage account URL cannot be a base".to_string()))?
            .extend(name.split('/'));
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let token = self.tokens.token().await?;
        Ok(self
            .http
            .request(method, url)
            .bearer_auth(token)
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", ms_date()))
    }

    async fn list_page(&self, marker: Option<&str>) -> Result<(Vec<String>, Option<String>)> {
        let mut url = self.container_url()?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("restype", "container").append_pair("comp", "list");
            if let Some(marker) = marker {
                query.append_pair("marker", marker);
            }
        }

        let response = self
            .request(Method::GET, url)
            .await?
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::ContainerNotFound(self.container.clone()).into());
        }
        let body = response.text().await.map_err(connection_error)?;
        if !status.is_success() {
            return Err(status_error(status, body));
        }

        parse_list_response(&body)
    }
}

#[async_trait]
impl BlobStore for AzureBlobClient {
    fn location(&self) -> String {
        format!(
            "{}/{}",
            self.account_url.as_str().trim_end_matches('/'),
            self.container
        )
    }

    async fn ensure_container(&self) -> Result<()> {
        let mut url = self.container_url()?;
        url.query_pairs_mut().append_pair("restype", "container");

        let response = self
            .request(Method::PUT, url)
            .await?
            .header("Content-Length", "0")
            .send()
            .await
            .map_err(connection_error)?;

        match response.status() {
            StatusCode::CREATED => {
                tracing::info!(container = %self.container, "Created blob container");
                Ok(())
            }
            StatusCode::CONFLICT => Ok(()),
            status => Err(status_error(status, response.text().await.unwrap_or_default())),
        }
    }

    async fn list_blobs(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let (page, next) = self.list_page(marker.as_deref()).await?;
            names.extend(page);
            match next {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        tracing::debug!(container = %self.container, count = names.len(), "Listed blobs");
        Ok(names)
    }

    async fn exists(&self, blob_name: &str) -> Result<bool> {
        let response = self
            .request(Method::HEAD, self.blob_url(blob_name)?)
            .await?
            .send()
            .await
            .map_err(connection_error)?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(status_error(status, String::new())),
        }
    }

    async fn upload(&self, path: &Path, blob_name: &str, overwrite: bool) -> Result<()> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            DextractError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut request = self
            .request(Method::PUT, self.blob_url(blob_name)?)
            .await?
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Length", bytes.len().to_string());
        if !overwrite {
            request = request.header("If-None-Match", "*");
        }

        let response = request.body(bytes).send().await.map_err(connection_error)?;

        match response.status() {
            StatusCode::CREATED => {
                crate::log_blob_transfer!("upload", normalise_blob_name(blob_name));
                Ok(())
            }
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(StorageError::BlobAlreadyExists(normalise_blob_name(blob_name)).into())
            }
            status => Err(status_error(status, response.text().await.unwrap_or_default())),
        }
    }

    async fn download(&self, blob_name: &str, dest: &Path) -> Result<()> {
        let response = self
            .request(Method::GET, self.blob_url(blob_name)?)
            .await?
            .send()
            .await
            .map_err(connection_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::BlobNotFound(normalise_blob_name(blob_name)).into());
        }
        if !status.is_success() {
            return Err(status_error(status, response.text().await.unwrap_or_default()));
        }

        let bytes = response.bytes().await.map_err(connection_error)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;

        crate::log_blob_transfer!("download", normalise_blob_name(blob_name));
        Ok(())
    }

    async fn delete(&self, blob_name: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, self.blob_url(blob_name)?)
            .await?
            .send()
            .await
            .map_err(connection_error)?;

        match response.status() {
            StatusCode::ACCEPTED | StatusCode::OK => {
                tracing::info!(blob = %normalise_blob_name(blob_name), "Deleted blob");
                Ok(())
            }
            StatusCode::NOT_FOUND => {
                Err(StorageError::BlobNotFound(normalise_blob_name(blob_name)).into())
            }
            status => Err(status_error(status, response.text().await.unwrap_or_default())),
        }
    }
}

/// Blob names and the continuation marker of one List Blobs page
fn parse_list_response(body: &str) -> Result<(Vec<String>, Option<String>)> {
    let name_re = Regex::new(r"<Blob>\s*<Name>([^<]*)</Name>")
        .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;
    let marker_re = Regex::new(r"<NextMarker>([^<]*)</NextMarker>")
        .map_err(|e| StorageError::InvalidResponse(e.to_string()))?;

    if !body.contains("<EnumerationResults") {
        return Err(StorageError::InvalidResponse(
            "List Blobs response has no EnumerationResults element".to_string(),
        )
        .into());
    }

    let names = name_re
        .captures_iter(body)
        .map(|cap| unescape_xml(&cap[1]))
        .collect();

    let marker = marker_re
        .captures(body)
        .map(|cap| unescape_xml(&cap[1]))
        .filter(|m| !m.is_empty());

    Ok((names, marker))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::azure::StaticTokenSource;

    fn client() -> AzureBlobClient {
        AzureBlobClient::new(
            "https://acct.blob.core.windows.net",
            "extracts",
            Arc::new(StaticTokenSource::new("t")),
            10,
        )
        .unwrap()
    }

    #[test]
    fn test_blob_url_encodes_segments() {
        let url = client().blob_url("data\\my file.csv").unwrap();
        assert_eq!(
            url.as_str(),
            "https://acct.blob.core.windows.net/extracts/data/my%20file.csv"
        );
    }

    #[test]
    fn test_parse_list_response() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<EnumerationResults ServiceEndpoint="https://acct.blob.core.windows.net/" ContainerName="extracts">
  <Blobs>
    <Blob><Name>a.csv</Name><Properties /></Blob>
    <Blob>
      <Name>docs/R&amp;D.xlsx</Name>
    </Blob>
  </Blobs>
  <NextMarker>2!abc</NextMarker>
</EnumerationResults>"#;

        let (names, marker) = parse_list_response(body).unwrap();
        assert_eq!(names, vec!["a.csv", "docs/R&D.xlsx"]);
        assert_eq!(marker.as_deref(), Some("2!abc"));
    }

    #[test]
    fn test_parse_list_last_page() {
        let body = "<EnumerationResults><Blobs /><NextMarker /></EnumerationResults>";
        let (names, marker) = parse_list_response(body).unwrap();
        assert!(names.is_empty());
        assert!(marker.is_none());
    }

    #[test]
    fn test_parse_list_rejects_garbage() {
        assert!(parse_list_response("<html></html>").is_err());
    }

    #[test]
    fn test_location() {
        assert_eq!(
            client().location(),
            "https://acct.blob.core.windows.net/extracts"
        );
    }
}
