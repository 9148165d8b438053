//! # s3-sftp-sync
//!
//! Idempotent file sync between an object-storage bucket and a directory on
//! an SFTP server, in both directions. Every file is transferred at most once:
//! a ledger records each file identifier after a successful transfer and is
//! consulted before the next one.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use s3_sftp_sync::{DynamoLedger, S3ObjectStore, SecretsManagerStore};
//! use s3_sftp_sync::{SftpConnector, SyncConfig, Syncer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = SyncConfig::new("sftp.example.com", "sftp-private-key", "file-sync-bucket");
//!     let syncer = Syncer::new(
//!         config.clone(),
//!         SftpConnector,
//!         Arc::new(SecretsManagerStore::from_env().await),
//!         Arc::new(DynamoLedger::from_env(&config.ledger_table).await),
//!         Arc::new(S3ObjectStore::from_env().await),
//!     );
//!
//!     let report = syncer.pull().await?;
//!     println!("{} file(s) transferred", report.transferred.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom Stores
//!
//! The secret store, ledger, object store and remote connector are traits;
//! in-memory implementations of each ship with the crate.

pub mod config;
pub mod credential;
pub mod error;
pub mod ledger;
pub mod remote;
pub mod store;
pub mod sync;

// Re-exports for convenience
pub use config::{SessionConfig, SyncConfig};
pub use credential::{Credential, CredentialError, CredentialProvider, SecretStore};
pub use credential::MemorySecretStore;
#[cfg(feature = "aws")]
pub use credential::SecretsManagerStore;
pub use ledger::{Ledger, LedgerError, MemoryLedger, TransferRecord};
#[cfg(feature = "aws")]
pub use ledger::DynamoLedger;
pub use remote::{
    ensure_path, MemoryConnector, MemoryRemote, RemoteConnector, RemoteError, RemoteSession,
    SftpConnector, Stat,
};
pub use store::{MemoryObjectStore, ObjectStore, StoreError};
#[cfg(feature = "aws")]
pub use store::S3ObjectStore;
pub use sync::{FailedItem, NotificationRecord, S3Event, SyncReport, Syncer};

pub use error::{Error, Result, TransferError};
