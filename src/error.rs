use thiserror::Error;

use crate::credential::CredentialError;
use crate::ledger::LedgerError;
use crate::remote::RemoteError;
use crate::store::StoreError;

/// Run-level error. Anything that reaches the caller as `Error` aborted the
/// whole run before or while setting up its batch.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Connection error: {0}")]
    Connection(#[source] RemoteError),

    #[error("Failed to list remote directory {path}: {source}")]
    Listing {
        path: String,
        #[source]
        source: RemoteError,
    },

    #[error("Invalid event document: {0}")]
    Event(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure of a single work item. Never aborts a batch.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),

    #[error("object store: {0}")]
    Store(#[from] StoreError),

    #[error("remote: {0}")]
    Remote(#[from] RemoteError),

    #[error("key {0} resolves outside the remote root")]
    OutsideRoot(String),
}
