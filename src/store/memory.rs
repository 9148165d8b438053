use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

#[derive(Default)]
struct StoreState {
    objects: HashMap<(String, String), Bytes>,
    failing: HashSet<String>,
    reads: Vec<String>,
    writes: Vec<String>,
}

/// In-memory object store for testing and development
#[derive(Default)]
pub struct MemoryObjectStore {
    state: RwLock<StoreState>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with a pre-populated object
    pub fn with_object(self, bucket: &str, key: &str, body: impl Into<Bytes>) -> Self {
        self.state
            .write()
            .objects
            .insert((bucket.to_string(), key.to_string()), body.into());
        self
    }

    /// Make any get or put of `key` fail
    pub fn fail_at(&self, key: &str) {
        self.state.write().failing.insert(key.to_string());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.state
            .read()
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Keys passed to `get_object`, in call order
    pub fn reads(&self) -> Vec<String> {
        self.state.read().reads.clone()
    }

    /// Keys passed to `put_object`, in call order
    pub fn writes(&self) -> Vec<String> {
        self.state.read().writes.clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let mut state = self.state.write();
        state.reads.push(key.to_string());
        if state.failing.contains(key) {
            return Err(StoreError::Io(format!("injected failure for {}", key)));
        }
        state
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError> {
        let mut state = self.state.write();
        state.writes.push(key.to_string());
        if state.failing.contains(key) {
            return Err(StoreError::Io(format!("injected failure for {}", key)));
        }
        state
            .objects
            .insert((bucket.to_string(), key.to_string()), body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get_object() {
        let store = MemoryObjectStore::new();
        let body = Bytes::from_static(b"hello world");

        store.put_object("bucket", "a.txt", body.clone()).await.unwrap();
        let read = store.get_object("bucket", "a.txt").await.unwrap();

        assert_eq!(read, body);
        assert_eq!(store.writes(), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_missing_object() {
        let store = MemoryObjectStore::new().with_object("other", "a.txt", "x");

        let result = store.get_object("bucket", "a.txt").await;

        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
