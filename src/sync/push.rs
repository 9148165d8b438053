//! Push direction: object store -> SFTP.

use super::{ItemOutcome, NotificationRecord, S3Event, SyncReport, Syncer};
use crate::error::{Result, TransferError};
use crate::remote::{dirname, ensure_path, escapes_root, join_path, RemoteConnector, RemoteSession};
use tracing::{debug, error, info, warn};

impl<C: RemoteConnector> Syncer<C> {
    /// Transfer every new object named by `records` to the remote tree.
    ///
    /// Fails only if the credential or session cannot be set up; per-record
    /// failures end up in the report.
    pub async fn push(&self, records: &[NotificationRecord]) -> Result<SyncReport> {
        info!(records = records.len(), "Push sync started");

        let session = self.open_session().await?;
        let report = self.push_batch(&session, records).await;
        self.close_session(&session).await;

        Self::log_report("push", &report);
        Ok(report)
    }

    /// Push every record of a notification document
    pub async fn push_event(&self, event: &S3Event) -> Result<SyncReport> {
        debug!(event = %event.raw(), "Received S3 event");
        self.push(&event.records()).await
    }

    async fn push_batch(&self, session: &C::Session, records: &[NotificationRecord]) -> SyncReport {
        let mut report = SyncReport::default();

        for record in records {
            let Some(key) = record.object_key() else {
                warn!("No object key in record");
                report.malformed += 1;
                continue;
            };

            info!(key = %key, "Processing S3 object");
            let result = self.push_item(session, key).await;
            if let Err(e) = &result {
                error!(key = %key, error = %e, "Error during S3 -> SFTP transfer");
            }
            report.record(key, result);
        }

        report
    }

    async fn push_item(
        &self,
        session: &C::Session,
        key: &str,
    ) -> std::result::Result<ItemOutcome, TransferError> {
        if escapes_root(key) {
            return Err(TransferError::OutsideRoot(key.to_string()));
        }
        if self.ledger.get(key).await?.is_some() {
            info!(key = %key, "Skipping already processed file");
            return Ok(ItemOutcome::Skipped);
        }

        let bucket = &self.config.bucket;
        let data = self.objects.get_object(bucket, key).await?;

        let dest = join_path(&self.config.remote_root, key);
        if let Some(parent) = dirname(&dest) {
            ensure_path(session, parent).await?;
        }

        session.write_file(&dest, data).await?;
        info!(bucket = %bucket, key = %key, path = %dest, "Transferred S3 object to SFTP");

        self.ledger.put(key).await?;
        Ok(ItemOutcome::Transferred)
    }
}

#[cfg(test)]
mod tests {
    use crate::credential::MemorySecretStore;
    use crate::ledger::MemoryLedger;
    use crate::remote::{MemoryConnector, MemoryRemote, RemoteOp};
    use crate::store::MemoryObjectStore;
    use crate::sync::test_support::{fixture, fixture_with, BUCKET, ROOT, SECRET};
    use crate::sync::{NotificationRecord, S3Event, SyncReport};
    use crate::Error;

    #[tokio::test]
    async fn test_push_creates_directory_then_file() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "class1/roster.csv", "id,name\n"),
        );

        let report = f
            .syncer
            .push(&[NotificationRecord::new("class1/roster.csv")])
            .await
            .unwrap();

        assert_eq!(report.transferred, vec!["class1/roster.csv"]);
        assert_eq!(f.remote.mkdirs(), vec!["/home/ec2-user/sftp/class1"]);
        assert_eq!(
            f.remote.file("/home/ec2-user/sftp/class1/roster.csv").unwrap(),
            "id,name\n"
        );
        assert!(f.ledger.contains("class1/roster.csv"));
        assert_eq!(f.remote.close_count(), 1);

        // Directory is created before the file lands in it.
        let ops = f.remote.ops();
        let mkdir_at = ops
            .iter()
            .position(|op| matches!(op, RemoteOp::Mkdir(_)))
            .unwrap();
        let write_at = ops
            .iter()
            .position(|op| matches!(op, RemoteOp::Write(_)))
            .unwrap();
        assert!(mkdir_at < write_at);
    }

    #[tokio::test]
    async fn test_push_twice_writes_once() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new()
                .with_object(BUCKET, "a.csv", "a")
                .with_object(BUCKET, "b/c.csv", "c"),
        );
        let batch = [NotificationRecord::new("a.csv"), NotificationRecord::new("b/c.csv")];

        let first = f.syncer.push(&batch).await.unwrap();
        let second = f.syncer.push(&batch).await.unwrap();

        assert_eq!(first.transferred.len(), 2);
        assert!(second.transferred.is_empty());
        assert_eq!(second.skipped, vec!["a.csv", "b/c.csv"]);
        assert_eq!(f.remote.writes().len(), 2);
        assert_eq!(f.objects.reads().len(), 2);
        assert_eq!(f.ledger.len(), 2);
        assert_eq!(f.remote.close_count(), 2);
    }

    #[tokio::test]
    async fn test_ledger_gate_blocks_read_and_write() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::with_records(["done.csv"]),
            MemoryObjectStore::new().with_object(BUCKET, "done.csv", "x"),
        );

        let report = f
            .syncer
            .push(&[NotificationRecord::new("done.csv")])
            .await
            .unwrap();

        assert_eq!(report.skipped, vec!["done.csv"]);
        assert!(f.objects.reads().is_empty());
        assert!(f.remote.writes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_item_does_not_stop_batch() {
        let objects = MemoryObjectStore::new()
            .with_object(BUCKET, "one.csv", "1")
            .with_object(BUCKET, "three.csv", "3");
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            objects,
        );

        let report = f
            .syncer
            .push(&[
                NotificationRecord::new("one.csv"),
                NotificationRecord::new("missing.csv"),
                NotificationRecord::malformed(),
                NotificationRecord::new("three.csv"),
            ])
            .await
            .unwrap();

        assert_eq!(report.transferred, vec!["one.csv", "three.csv"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "missing.csv");
        assert_eq!(report.malformed, 1);
        assert!(!f.ledger.contains("missing.csv"));
        assert!(f.ledger.contains("three.csv"));
    }

    #[tokio::test]
    async fn test_write_failure_leaves_ledger_untouched() {
        let remote = MemoryRemote::new().with_dir(ROOT);
        remote.fail_at("/home/ec2-user/sftp/bad.csv");
        let f = fixture(
            remote,
            MemoryLedger::new(),
            MemoryObjectStore::new()
                .with_object(BUCKET, "bad.csv", "x")
                .with_object(BUCKET, "good.csv", "y"),
        );

        let report = f
            .syncer
            .push(&[NotificationRecord::new("bad.csv"), NotificationRecord::new("good.csv")])
            .await
            .unwrap();

        assert_eq!(report.failed[0].id, "bad.csv");
        assert!(!f.ledger.contains("bad.csv"));
        assert!(f.ledger.contains("good.csv"));
    }

    #[tokio::test]
    async fn test_ledger_write_failure_is_retried_next_run() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "a.csv", "a"),
        );
        f.ledger.fail_put("a.csv");

        let report = f.syncer.push(&[NotificationRecord::new("a.csv")]).await.unwrap();

        // Written but not recorded: the next delivery transfers it again.
        assert_eq!(report.failed[0].id, "a.csv");
        assert_eq!(f.remote.writes().len(), 1);
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_missing_private_key_aborts_before_connecting() {
        let remote = MemoryRemote::new().with_dir(ROOT);
        let f = fixture_with(
            MemoryConnector::new(remote.clone()),
            remote,
            MemorySecretStore::new().with_secret(SECRET, "{}"),
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "a.csv", "a"),
        );

        let result = f.syncer.push(&[NotificationRecord::new("a.csv")]).await;

        assert!(matches!(result, Err(Error::Credential(_))));
        assert_eq!(f.syncer.connector().open_count(), 0);
        assert!(f.remote.ops().is_empty());
        assert!(f.objects.reads().is_empty());
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure_is_fatal() {
        let remote = MemoryRemote::new().with_dir(ROOT);
        let secrets = MemorySecretStore::new()
            .with_secret(SECRET, crate::credential::tests::secret_payload());
        let f = fixture_with(
            MemoryConnector::refusing(remote.clone()),
            remote,
            secrets,
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "a.csv", "a"),
        );

        let result = f.syncer.push(&[NotificationRecord::new("a.csv")]).await;

        assert!(matches!(result, Err(Error::Connection(_))));
        assert_eq!(f.remote.close_count(), 0);
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_empty_batch_still_closes_session() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new(),
        );

        let report = f.syncer.push(&[]).await.unwrap();

        assert_eq!(report, SyncReport::default());
        assert_eq!(f.remote.close_count(), 1);
    }

    #[tokio::test]
    async fn test_push_event_transfers_document_records() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "class2/grades.csv", "g"),
        );
        let event = S3Event::from_json(
            r#"{"Records": [{"s3": {"object": {"key": "class2/grades.csv"}}}, {}]}"#,
        )
        .unwrap();

        let report = f.syncer.push_event(&event).await.unwrap();

        assert_eq!(report.transferred, vec!["class2/grades.csv"]);
        assert_eq!(report.malformed, 1);
    }

    #[tokio::test]
    async fn test_trailing_slash_key_materializes_directory() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "class1/", ""),
        );

        let report = f.syncer.push(&[NotificationRecord::new("class1/")]).await.unwrap();

        assert_eq!(f.remote.mkdirs(), vec!["/home/ec2-user/sftp/class1"]);
        assert_eq!(f.remote.writes(), vec!["/home/ec2-user/sftp/class1/"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "class1/");
        assert!(!f.ledger.contains("class1/"));
    }

    #[tokio::test]
    async fn test_ledger_read_failure_fails_item_only() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new()
                .with_object(BUCKET, "a.csv", "a")
                .with_object(BUCKET, "b.csv", "b"),
        );
        f.ledger.fail_get("a.csv");

        let report = f
            .syncer
            .push(&[NotificationRecord::new("a.csv"), NotificationRecord::new("b.csv")])
            .await
            .unwrap();

        assert_eq!(report.failed[0].id, "a.csv");
        assert_eq!(report.transferred, vec!["b.csv"]);
        assert_eq!(f.objects.reads().len(), 1);
        assert_eq!(f.remote.writes(), vec!["/home/ec2-user/sftp/b.csv"]);
        assert!(!f.ledger.contains("a.csv"));
    }

    #[tokio::test]
    async fn test_mkdir_failure_fails_item_only() {
        let remote = MemoryRemote::new().with_dir(ROOT);
        remote.fail_at("/home/ec2-user/sftp/locked");
        let f = fixture(
            remote,
            MemoryLedger::new(),
            MemoryObjectStore::new()
                .with_object(BUCKET, "locked/a.csv", "a")
                .with_object(BUCKET, "open/b.csv", "b"),
        );

        let report = f
            .syncer
            .push(&[
                NotificationRecord::new("locked/a.csv"),
                NotificationRecord::new("open/b.csv"),
            ])
            .await
            .unwrap();

        assert_eq!(report.failed[0].id, "locked/a.csv");
        assert_eq!(report.transferred, vec!["open/b.csv"]);
        assert_eq!(f.remote.writes(), vec!["/home/ec2-user/sftp/open/b.csv"]);
        assert!(!f.ledger.contains("locked/a.csv"));
        assert!(f.ledger.contains("open/b.csv"));
    }

    #[tokio::test]
    async fn test_parent_segment_key_is_rejected() {
        let f = fixture(
            MemoryRemote::new().with_dir(ROOT),
            MemoryLedger::new(),
            MemoryObjectStore::new().with_object(BUCKET, "../../escape.csv", "x"),
        );

        let report = f
            .syncer
            .push(&[NotificationRecord::new("../../escape.csv")])
            .await
            .unwrap();

        assert_eq!(report.failed[0].id, "../../escape.csv");
        assert!(f.objects.reads().is_empty());
        assert!(f.remote.ops().iter().all(|op| matches!(op, RemoteOp::Close)));
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_before_connecting() {
        let remote = MemoryRemote::new().with_dir(ROOT);
        let secrets = MemorySecretStore::new()
            .with_secret(SECRET, crate::credential::tests::secret_payload());
        let mut f = fixture_with(
            MemoryConnector::new(remote.clone()),
            remote,
            secrets,
            MemoryLedger::new(),
            MemoryObjectStore::new(),
        );
        f.syncer.config.bucket.clear();

        let result = f.syncer.push(&[NotificationRecord::new("a.csv")]).await;

        assert!(matches!(result, Err(Error::Config(_))));
        assert_eq!(f.syncer.connector().open_count(), 0);
        assert!(f.remote.ops().is_empty());
    }
}
