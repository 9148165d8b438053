//! Private-key credential resolution.
//!
//! The key lives in a secret store as a JSON document of the shape
//! `{"private_key": "<PEM>"}`. It is fetched once per run and only ever held
//! in memory.

use async_trait::async_trait;
use russh::keys::PrivateKey;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info};

pub mod memory;
#[cfg(feature = "aws")]
pub mod secrets_manager;

pub use memory::MemorySecretStore;
#[cfg(feature = "aws")]
pub use secrets_manager::SecretsManagerStore;

/// Errors resolving the private-key credential
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Secret store unavailable: {0}")]
    Unavailable(String),
    #[error("Secret payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Secret missing 'private_key' field")]
    MissingPrivateKey,
    #[error("Invalid private key: {0}")]
    InvalidKey(#[from] russh::keys::Error),
}

/// Source of secret payloads
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the raw string payload stored under `name`
    async fn get_secret(&self, name: &str) -> Result<String, CredentialError>;
}

#[derive(Deserialize)]
struct SecretPayload {
    private_key: Option<String>,
}

/// In-memory private key handle
#[derive(Clone)]
pub struct Credential {
    key: Arc<PrivateKey>,
}

impl Credential {
    /// Parse an unencrypted PEM or OpenSSH private key
    pub fn from_pem(pem: &str) -> Result<Self, CredentialError> {
        let key = russh::keys::decode_secret_key(pem, None)?;
        Ok(Self { key: Arc::new(key) })
    }

    /// Parse the JSON secret payload and the key inside it
    pub fn from_secret_payload(payload: &str) -> Result<Self, CredentialError> {
        let secret: SecretPayload = serde_json::from_str(payload)?;
        let pem = secret
            .private_key
            .ok_or(CredentialError::MissingPrivateKey)?;
        Self::from_pem(&pem)
    }

    pub fn key(&self) -> Arc<PrivateKey> {
        self.key.clone()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("algorithm", &self.key.algorithm())
            .finish_non_exhaustive()
    }
}

/// Resolves the run's credential from a secret store
pub struct CredentialProvider<'a> {
    store: &'a dyn SecretStore,
    secret_name: &'a str,
}

impl<'a> CredentialProvider<'a> {
    pub fn new(store: &'a dyn SecretStore, secret_name: &'a str) -> Self {
        Self { store, secret_name }
    }

    /// Fetch and parse the credential. A single attempt, no retries.
    pub async fn fetch(&self) -> Result<Credential, CredentialError> {
        info!(secret = %self.secret_name, "Fetching secret");

        let result = match self.store.get_secret(self.secret_name).await {
            Ok(payload) => Credential::from_secret_payload(&payload),
            Err(e) => Err(e),
        };

        match &result {
            Ok(credential) => {
                info!(algorithm = %credential.key.algorithm(), "SFTP key retrieved")
            }
            Err(e) => error!(secret = %self.secret_name, error = %e, "Failed to fetch SFTP key"),
        }
        result
    }
}
