//! Sync drivers.
//!
//! Both directions share one run shape: resolve the credential, open one
//! remote session, walk the batch item by item, close the session. Every
//! item goes `ledger check -> read -> write -> record`; a failure anywhere
//! before `record` leaves the ledger untouched so the item stays eligible
//! for a later run.

use crate::config::SyncConfig;
use crate::credential::{CredentialProvider, SecretStore};
use crate::error::{Result, TransferError};
use crate::ledger::Ledger;
use crate::remote::{RemoteConnector, RemoteSession};
use crate::store::ObjectStore;
use crate::Error;
use std::sync::Arc;
use tracing::{error, info, warn};

pub mod event;
mod pull;
mod push;

pub use event::{NotificationRecord, S3Event};

/// Result of one work item that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Transferred,
    Skipped,
}

/// An item whose transfer failed and was not recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    pub id: String,
    pub reason: String,
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub transferred: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedItem>,
    /// Notification records that named no object
    pub malformed: usize,
}

impl SyncReport {
    fn record(&mut self, id: &str, result: std::result::Result<ItemOutcome, TransferError>) {
        match result {
            Ok(ItemOutcome::Transferred) => self.transferred.push(id.to_string()),
            Ok(ItemOutcome::Skipped) => self.skipped.push(id.to_string()),
            Err(e) => self.failed.push(FailedItem {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Runs push and pull syncs against injected stores
pub struct Syncer<C: RemoteConnector> {
    config: SyncConfig,
    connector: C,
    secrets: Arc<dyn SecretStore>,
    ledger: Arc<dyn Ledger>,
    objects: Arc<dyn ObjectStore>,
}

impl<C: RemoteConnector> Syncer<C> {
    pub fn new(
        config: SyncConfig,
        connector: C,
        secrets: Arc<dyn SecretStore>,
        ledger: Arc<dyn Ledger>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            connector,
            secrets,
            ledger,
            objects,
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Fetch the credential and open the run's session
    async fn open_session(&self) -> Result<C::Session> {
        self.config.validate()?;

        let credential =
            CredentialProvider::new(self.secrets.as_ref(), &self.config.secret_name)
                .fetch()
                .await?;

        self.connector
            .open(&self.config.session, &credential)
            .await
            .map_err(|e| {
                error!(
                    host = %self.config.session.host,
                    port = self.config.session.port,
                    error = %e,
                    "Failed to connect to SFTP"
                );
                Error::Connection(e)
            })
    }

    async fn close_session(&self, session: &C::Session) {
        if let Err(e) = session.close().await {
            warn!(error = %e, "SFTP session did not close cleanly");
        }
    }

    fn log_report(direction: &str, report: &SyncReport) {
        info!(
            direction,
            transferred = report.transferred.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            malformed = report.malformed,
            "Sync completed"
        );
    }
}
