//! Blob store factory
//!
//! Creates the blob store selected by `[storage] backend`.

use super::local::LocalBlobStore;
use super::traits::BlobStore;
use crate::adapters::azure::{AzureBlobClient, ClientSecretTokenSource};
use crate::config::schema::{StorageBackend, StorageConfig};
use crate::domain::Result;
use std::sync::Arc;

/// Create a blob store based on the configuration
///
/// # Errors
///
/// Returns a configuration error if Azure credentials are incomplete, or an
/// authentication error if the credential cannot be constructed.
pub fn create_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config.backend {
        StorageBackend::Azure => {
            tracing::info!(container = %config.container, "Creating Azure blob client");
            let tokens = ClientSecretTokenSource::from_config(config)?;
            let client = AzureBlobClient::from_config(config, Arc::new(tokens))?;
            Ok(Arc::new(client) as Arc<dyn BlobStore>)
        }
        StorageBackend::Local => {
            tracing::info!(container = %config.container, "Using local blob store");
            Ok(Arc::new(LocalBlobStore::new(&config.container)) as Arc<dyn BlobStore>)
        }
    }
}
