//! Idempotency ledger.
//!
//! A record's presence is the only fact stored: once a file identifier is in
//! the ledger it is never transferred again. Records are never updated or
//! removed by this crate.

use async_trait::async_trait;

#[cfg(feature = "aws")]
pub mod dynamodb;
pub mod memory;

#[cfg(feature = "aws")]
pub use dynamodb::DynamoLedger;
pub use memory::MemoryLedger;

/// Errors reading or writing the ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
    #[error("Ledger error: {0}")]
    Other(String),
}

/// Marker that a file has already been transferred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub filename: String,
}

impl TransferRecord {
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
        }
    }
}

/// Key-value store of processed file identifiers
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Look up the record for `filename`
    async fn get(&self, filename: &str) -> Result<Option<TransferRecord>, LedgerError>;

    /// Record `filename` as processed. Writing an existing key is an upsert.
    async fn put(&self, filename: &str) -> Result<(), LedgerError>;
}
