use super::{ObjectStore, StoreError};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

/// S3 object store
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a new S3 store with the given client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create from AWS SDK config loaded from environment
    pub async fn from_env() -> Self {
        let aws_config = aws_config::load_from_env().await;
        Self::new(Client::new(&aws_config))
    }

    /// Create against an S3-compatible endpoint
    pub async fn with_endpoint(endpoint: &str, region: &str) -> Self {
        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .endpoint_url(endpoint)
            .force_path_style(true)
            .build();
        Self::new(Client::from_conf(s3_config))
    }

    /// Convert S3 error to StoreError
    fn map_s3_error(err: impl std::fmt::Display) -> StoreError {
        let msg = err.to_string();
        if msg.contains("NoSuchKey") || msg.contains("NotFound") || msg.contains("404") {
            StoreError::NotFound
        } else if msg.contains("AccessDenied") || msg.contains("403") {
            StoreError::PermissionDenied
        } else {
            StoreError::Io(msg)
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        debug!(bucket, key, "Fetching S3 object");

        let result = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(Self::map_s3_error)?;

        let bytes = result
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
            .into_bytes();

        Ok(bytes)
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Bytes) -> Result<(), StoreError> {
        debug!(bucket, key, len = body.len(), "Uploading S3 object");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(Self::map_s3_error)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_s3_error() {
        assert!(matches!(
            S3ObjectStore::map_s3_error("NoSuchKey: The specified key does not exist."),
            StoreError::NotFound
        ));
        assert!(matches!(
            S3ObjectStore::map_s3_error("AccessDenied"),
            StoreError::PermissionDenied
        ));
        assert!(matches!(
            S3ObjectStore::map_s3_error("dispatch failure"),
            StoreError::Io(_)
        ));
    }
}
