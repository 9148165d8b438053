use super::{CredentialError, SecretStore};
use async_trait::async_trait;
use aws_sdk_secretsmanager::Client;
use tracing::debug;

/// AWS Secrets Manager backed secret store
pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create from AWS SDK config loaded from environment
    pub async fn from_env() -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self::new(Client::new(&aws_config))
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn get_secret(&self, name: &str) -> Result<String, CredentialError> {
        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| CredentialError::Unavailable(e.to_string()))?;

        debug!(secret = %name, "Secret response received");

        output
            .secret_string()
            .map(str::to_owned)
            .ok_or_else(|| CredentialError::Unavailable(format!("secret '{}' has no string value", name)))
    }
}
