//! Pull direction: SFTP -> object store.

use super::{ItemOutcome, SyncReport, Syncer};
use crate::error::{Result, TransferError};
use crate::remote::{join_path, RemoteConnector, RemoteSession};
use crate::Error;
use tracing::{debug, error, info};

impl<C: RemoteConnector> Syncer<C> {
    /// Upload every new file in the remote root to the bucket.
    ///
    /// Fails if setup fails or the remote root cannot be listed; the session
    /// is closed in both cases once it was opened.
    pub async fn pull(&self) -> Result<SyncReport> {
        info!(root = %self.config.remote_root, "Pull sync started");

        let session = self.open_session().await?;
        let result = self.pull_listing(&session).await;
        self.close_session(&session).await;

        if let Ok(report) = &result {
            Self::log_report("pull", report);
        }
        result
    }

    async fn pull_listing(&self, session: &C::Session) -> Result<SyncReport> {
        let root = &self.config.remote_root;
        let entries = session.list_dir(root).await.map_err(|e| {
            error!(path = %root, error = %e, "Failed to list SFTP directory");
            Error::Listing {
                path: root.clone(),
                source: e,
            }
        })?;
        info!(path = %root, count = entries.len(), "Listed SFTP directory");

        let mut report = SyncReport::default();
        for entry in entries {
            if entry.attrs.is_dir {
                debug!(name = %entry.name, "Skipping directory");
                continue;
            }

            info!(filename = %entry.name, size = entry.attrs.size, "Processing file");
            let result = self.pull_item(session, &entry.name).await;
            if let Err(e) = &result {
                error!(filename = %entry.name, error = %e, "Error during SFTP -> S3 transfer");
            }
            report.record(&entry.name, result);
        }

        Ok(report)
    }

    async fn pull_item(
        &self,
        session: &C::Session,
        filename: &str,
    ) -> std::result::Result<ItemOutcome, TransferError> {
        if self.ledger.get(filename).await?.is_some() {
            info!(filename = %filename, "Skipping already processed file");
            return Ok(ItemOutcome::Skipped);
        }

        let path = join_path(&self.config.remote_root, filename);
        let data = session.read_file(&path).await?;

        let bucket = &self.config.bucket;
        self.objects.put_object(bucket, filename, data).await?;
        info!(path = %path, bucket = %bucket, key = %filename, "Transferred SFTP file to S3");

        self.ledger.put(filename).await?;
        Ok(ItemOutcome::Transferred)
    }
}
