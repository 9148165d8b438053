use super::{CredentialError, SecretStore};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory secret store for testing and development
#[derive(Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(self, name: impl Into<String>, payload: impl Into<String>) -> Self {
        self.secrets.write().insert(name.into(), payload.into());
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, CredentialError> {
        self.secrets
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CredentialError::Unavailable(format!("no secret named '{}'", name)))
    }
}
