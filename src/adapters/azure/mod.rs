//! Azure Storage REST adapters
//!
//! - [`AzureBlobClient`] - Blob Storage, implementing [`BlobStore`](crate::adapters::storage::BlobStore)
//! - [`TableStorageClient`] - Table Storage queries loaded as [`Table`](crate::domain::Table)s
//!
//! Both authenticate with Azure AD bearer tokens from a [`TokenSource`].

pub mod auth;
pub mod blob;
pub mod table;

pub use auth::{ClientSecretTokenSource, StaticTokenSource, TokenSource, STORAGE_SCOPE};
pub use blob::AzureBlobClient;
pub use table::TableStorageClient;

use crate::domain::{DextractError, StorageError};
use reqwest::StatusCode;

/// Storage service REST API version sent with every request
pub(crate) const API_VERSION: &str = "2021-08-06";

/// Current time in the RFC 1123 format of the `x-ms-date` header
pub(crate) fn ms_date() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

pub(crate) fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, DextractError> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .build()
        .map_err(|e| DextractError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

pub(crate) fn connection_error(err: reqwest::Error) -> DextractError {
    StorageError::ConnectionFailed(err.to_string()).into()
}

/// Maps an unexpected response status to a storage error
pub(crate) fn status_error(status: StatusCode, body: String) -> DextractError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StorageError::AuthenticationFailed(format!("{}: {}", status, body)).into()
        }
        _ => StorageError::RequestFailed {
            status: status.as_u16(),
            message: body,
        }
        .into(),
    }
}
