//! Azure AD bearer tokens for storage requests
//!
//! Storage requests authenticate with an `Authorization: Bearer` token for the
//! `https://storage.azure.com/.default` scope, obtained through the client credentials
//! flow of an App Registration.

use crate::config::{SecretString, StorageConfig};
use crate::domain::{DextractError, Result, StorageError};
use async_trait::async_trait;
use azure_core::credentials::TokenCredential;
use azure_identity::ClientSecretCredential;
use secrecy::ExposeSecret;
use std::sync::Arc;

/// OAuth scope covering Blob and Table Storage
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Supplies bearer tokens to the storage clients
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a currently valid access token
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AuthenticationFailed` if no token can be acquired.
    async fn token(&self) -> Result<String>;
}

/// Tokens from an App Registration's client secret
pub struct ClientSecretTokenSource {
    credential: Arc<ClientSecretCredential>,
}

impl ClientSecretTokenSource {
    /// Creates a token source for the given App Registration
    ///
    /// # Errors
    ///
    /// Returns an authentication error if the credential cannot be constructed.
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &SecretString) -> Result<Self> {
        let secret =
            azure_core::credentials::Secret::new(client_secret.expose_secret().as_ref().to_string());

        let credential = ClientSecretCredential::new(tenant_id, client_id.to_string(), secret, None)
            .map_err(|e| {
                DextractError::Authentication(format!(
                    "Failed to create Azure AD credential: {}",
                    e
                ))
            })?;

        Ok(Self { credential })
    }

    /// Creates a token source from the `[storage]` section
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the tenant, client id or secret is missing.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let tenant_id = config.tenant_id.as_deref().ok_or_else(|| {
            DextractError::Configuration("storage.tenant_id is required".to_string())
        })?;
        let client_id = config.client_id.as_deref().ok_or_else(|| {
            DextractError::Configuration("storage.client_id is required".to_string())
        })?;
        let client_secret = config.client_secret.as_ref().ok_or_else(|| {
            DextractError::Configuration("storage.client_secret is required".to_string())
        })?;

        Self::new(tenant_id, client_id, client_secret)
    }
}

#[async_trait]
impl TokenSource for ClientSecretTokenSource {
    async fn token(&self) -> Result<String> {
        let token = TokenCredential::get_token(&*self.credential, &[STORAGE_SCOPE], None)
            .await
            .map_err(|e| {
                StorageError::AuthenticationFailed(format!(
                    "Failed to acquire Azure AD token: {}",
                    e
                ))
            })?;

        Ok(token.token.secret().to_string())
    }
}

/// A fixed token, for emulators and tests
pub struct StaticTokenSource(SecretString);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(crate::config::secret_string(token.into()))
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn token(&self) -> Result<String> {
        Ok(self.0.expose_secret().as_ref().to_string())
    }
}
