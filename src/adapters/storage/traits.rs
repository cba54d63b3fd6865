//! Blob store abstraction
//!
//! Extract archives and sync operate on a flat namespace of `/`-separated blob names
//! inside one container. [`AzureBlobClient`](crate::adapters::azure::AzureBlobClient)
//! and [`LocalBlobStore`](super::LocalBlobStore) implement it.

use crate::domain::{DextractError, Result};
use async_trait::async_trait;
use std::path::Path;

/// Blob container operations used by extracts and sync
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable location of the container, for logs and messages
    fn location(&self) -> String;

    /// Create the container if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created or accessed.
    async fn ensure_container(&self) -> Result<()>;

    /// List every blob name in the container
    ///
    /// # Errors
    ///
    /// Returns an error if the container is missing or the listing fails.
    async fn list_blobs(&self) -> Result<Vec<String>>;

    /// Check whether a blob exists
    async fn exists(&self, blob_name: &str) -> Result<bool>;

    /// Upload a local file under `blob_name`
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BlobAlreadyExists` if the blob exists and `overwrite` is
    /// false, or an I/O error if the local file cannot be read.
    async fn upload(&self, path: &Path, blob_name: &str, overwrite: bool) -> Result<()>;

    /// Download a blob to `dest`, creating parent directories
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BlobNotFound` if the blob does not exist.
    async fn download(&self, blob_name: &str, dest: &Path) -> Result<()>;

    /// Delete a blob
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BlobNotFound` if the blob does not exist.
    async fn delete(&self, blob_name: &str) -> Result<()>;
}

/// Normalises a blob name: `\` becomes `/` and leading separators are dropped
pub fn normalise_blob_name(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Blob name of `path` relative to `root`, with `/` separators
///
/// # Errors
///
/// Returns a validation error if `path` is not inside `root`.
pub fn blob_name_for(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        DextractError::Validation(format!(
            "{} is not inside {}",
            path.display(),
            root.display()
        ))
    })?;

    let name = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Ok(normalise_blob_name(&name))
}

/// Uploads `path`, naming the blob by its location relative to `root`
///
/// Existing blobs are overwritten.
///
/// # Errors
///
/// Returns an I/O error if `path` does not exist.
pub async fn upload_file(store: &dyn BlobStore, path: &Path, root: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(DextractError::Io(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let blob_name = blob_name_for(path, root)?;
    store.upload(path, &blob_name, true).await?;
    Ok(blob_name)
}
