use crate::error::{Error, Result};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 22;
pub const DEFAULT_USER: &str = "ec2-user";
pub const DEFAULT_LEDGER_TABLE: &str = "student-query-sync-processed-files";
pub const DEFAULT_REMOTE_ROOT: &str = "/home/ec2-user/sftp";

/// Parameters for opening the remote session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Timeout for the SSH handshake
    pub connect_timeout: Duration,
    /// Idle time after which the SSH session is dropped
    pub inactivity_timeout: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            connect_timeout: Duration::from_secs(30),
            inactivity_timeout: Duration::from_secs(300),
        }
    }
}

/// Sync run configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub session: SessionConfig,
    /// Name of the secret holding `{"private_key": ...}`
    pub secret_name: String,
    /// Bucket on the object-store side of the sync
    pub bucket: String,
    pub ledger_table: String,
    /// Remote directory that mirrors the bucket
    pub remote_root: String,
}

impl SyncConfig {
    pub fn new(
        host: impl Into<String>,
        secret_name: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            session: SessionConfig::new(host),
            secret_name: secret_name.into(),
            bucket: bucket.into(),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            remote_root: DEFAULT_REMOTE_ROOT.to_string(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.session.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.session.user = user.into();
        self
    }

    pub fn ledger_table(mut self, table: impl Into<String>) -> Self {
        self.ledger_table = table.into();
        self
    }

    pub fn remote_root(mut self, root: impl Into<String>) -> Self {
        self.remote_root = root.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.session.connect_timeout = timeout;
        self
    }

    pub fn inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.session.inactivity_timeout = timeout;
        self
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("host", &self.session.host),
            ("secret name", &self.secret_name),
            ("bucket", &self.bucket),
            ("ledger table", &self.ledger_table),
            ("remote root", &self.remote_root),
        ];
        if let Some((name, _)) = required.into_iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(Error::Config(format!("{} must not be empty", name)));
        }
        if self.session.port == 0 {
            return Err(Error::Config("port must not be 0".to_string()));
        }
        if self.session.connect_timeout.is_zero() {
            return Err(Error::Config("connect timeout must be positive".to_string()));
        }
        Ok(())
    }
}
