use super::{Ledger, LedgerError, TransferRecord};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// In-memory ledger for testing and development
#[derive(Default)]
pub struct MemoryLedger {
    records: RwLock<HashMap<String, TransferRecord>>,
    failing: RwLock<HashSet<String>>,
    unreadable: RwLock<HashSet<String>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-recorded identifiers
    pub fn with_records<I, S>(filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let records = filenames
            .into_iter()
            .map(|f| {
                let record = TransferRecord::new(f);
                (record.filename.clone(), record)
            })
            .collect();
        Self {
            records: RwLock::new(records),
            failing: RwLock::default(),
            unreadable: RwLock::default(),
        }
    }

    /// Make `put` for `filename` fail
    pub fn fail_put(&self, filename: &str) {
        self.failing.write().insert(filename.to_string());
    }

    /// Make `get` for `filename` fail
    pub fn fail_get(&self, filename: &str) {
        self.unreadable.write().insert(filename.to_string());
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.records.read().contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn get(&self, filename: &str) -> Result<Option<TransferRecord>, LedgerError> {
        if self.unreadable.read().contains(filename) {
            return Err(LedgerError::Unavailable(format!(
                "injected read failure for {}",
                filename
            )));
        }
        Ok(self.records.read().get(filename).cloned())
    }

    async fn put(&self, filename: &str) -> Result<(), LedgerError> {
        if self.failing.read().contains(filename) {
            return Err(LedgerError::Unavailable(format!(
                "injected failure for {}",
                filename
            )));
        }
        self.records
            .write()
            .insert(filename.to_string(), TransferRecord::new(filename));
        Ok(())
    }
}
