//! Push and pull sync against in-memory stores
//!
//! Run with: cargo run --example memory_sync
//!
//! Environment variables:
//!   RUST_LOG - extra tracing directives (the crate logs at debug by default)
//!
//! No network access is needed: the secret store, ledger, bucket and SFTP
//! tree all live in memory, and the SSH key is generated on start.

use russh::keys::ssh_key::rand_core::OsRng;
use russh::keys::ssh_key::LineEnding;
use russh::keys::{Algorithm, PrivateKey};
use s3_sftp_sync::{
    MemoryConnector, MemoryLedger, MemoryObjectStore, MemoryRemote, MemorySecretStore,
    NotificationRecord, SyncConfig, SyncReport, Syncer,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const BUCKET: &str = "file-sync-bucket";
const SECRET: &str = "sftp-private-key";
const ROOT: &str = "/home/ec2-user/sftp";

fn print_report(direction: &str, report: &SyncReport) {
    println!(
        "{}: transferred {:?}, skipped {:?}, failed {:?}",
        direction,
        report.transferred,
        report.skipped,
        report.failed.iter().map(|f| &f.id).collect::<Vec<_>>()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("s3_sftp_sync=debug".parse()?))
        .init();

    let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)?;
    let payload = serde_json::json!({ "private_key": key.to_openssh(LineEnding::LF)?.as_str() });
    let secrets = MemorySecretStore::new().with_secret(SECRET, payload.to_string());

    let remote = MemoryRemote::new()
        .with_dir(ROOT)
        .with_file(&format!("{}/attendance.csv", ROOT), "id,present\n1,yes\n");
    let objects = Arc::new(
        MemoryObjectStore::new()
            .with_object(BUCKET, "class1/roster.csv", "id,name\n1,Ada\n")
            .with_object(BUCKET, "class2/grades.csv", "id,grade\n1,A\n"),
    );
    let ledger = Arc::new(MemoryLedger::new());

    let syncer = Syncer::new(
        SyncConfig::new("sftp.local", SECRET, BUCKET).remote_root(ROOT),
        MemoryConnector::new(remote.clone()),
        Arc::new(secrets),
        ledger.clone(),
        objects.clone(),
    );

    let batch = [
        NotificationRecord::new("class1/roster.csv"),
        NotificationRecord::new("class2/grades.csv"),
    ];
    print_report("push", &syncer.push(&batch).await?);
    // Same batch again: everything is already recorded.
    print_report("push again", &syncer.push(&batch).await?);
    print_report("pull", &syncer.pull().await?);

    println!("Directories created: {:?}", remote.mkdirs());
    println!(
        "Bucket copy of attendance.csv: {:?}",
        objects.object(BUCKET, "attendance.csv")
    );
    println!("Ledger holds {} file(s)", ledger.len());
    Ok(())
}
