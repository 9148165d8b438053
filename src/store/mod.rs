//! Object-store side of the sync.

use async_trait::async_trait;
use bytes::Bytes;

pub mod memory;
#[cfg(feature = "aws")]
pub mod s3;

pub use memory::MemoryObjectStore;
#[cfg(feature = "aws")]
pub use s3::S3ObjectStore;

/// Errors that can occur in object store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Object not found")]
    NotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("I/O error: {0}")]
    Io(String),
}

/// Whole-object get/put against a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the full object body into memory
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    /// Create or overwrite an object
    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError>;
}
