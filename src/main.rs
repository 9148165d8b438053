//! Idempotent S3 <-> SFTP sync

use clap::{Parser, Subcommand};
use s3_sftp_sync::{
    DynamoLedger, S3Event, S3ObjectStore, SecretsManagerStore, SftpConnector, SyncConfig,
    SyncReport, Syncer,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "s3-sftp-sync")]
#[command(about = "Sync files between an S3 bucket and an SFTP directory, at most once each", long_about = None)]
struct Cli {
    /// SFTP server host
    #[arg(long, env = "SFTP_HOST")]
    host: String,

    /// SFTP server port
    #[arg(long, env = "SFTP_PORT", default_value_t = s3_sftp_sync::config::DEFAULT_PORT)]
    port: u16,

    /// SFTP user
    #[arg(long, env = "SFTP_USER", default_value = s3_sftp_sync::config::DEFAULT_USER)]
    user: String,

    /// Name of the secret holding {"private_key": "<PEM>"}
    #[arg(long, env = "SFTP_SECRET_NAME")]
    secret_name: String,

    /// Bucket on the object-store side
    #[arg(long, env = "FILE_SYNC_BUCKET")]
    bucket: String,

    /// DynamoDB table recording processed files
    #[arg(long, env = "PROCESSED_FILES_TABLE", default_value = s3_sftp_sync::config::DEFAULT_LEDGER_TABLE)]
    ledger_table: String,

    /// Remote directory mirrored with the bucket
    #[arg(long, env = "SFTP_REMOTE_ROOT", default_value = s3_sftp_sync::config::DEFAULT_REMOTE_ROOT)]
    remote_root: String,

    /// SSH connect timeout in seconds
    #[arg(long, env = "SFTP_CONNECT_TIMEOUT", default_value = "30")]
    connect_timeout: u64,

    /// S3 endpoint URL (for S3-compatible services)
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    /// AWS region, used with --endpoint
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,

    #[command(subcommand)]
    direction: Direction,
}

#[derive(Subcommand)]
enum Direction {
    /// Copy objects named by a storage event notification to the SFTP server
    Push {
        /// Event document path; reads stdin when omitted
        event: Option<PathBuf>,
    },
    /// Copy new files from the SFTP directory to the bucket
    Pull,
}

fn print_report(report: &SyncReport) {
    for item in &report.failed {
        eprintln!("failed: {} ({})", item.id, item.reason);
    }
    eprintln!(
        "{} transferred, {} skipped, {} failed",
        report.transferred.len(),
        report.skipped.len(),
        report.failed.len()
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("s3_sftp_sync=info".parse()?))
        .init();

    let config = SyncConfig::new(&cli.host, &cli.secret_name, &cli.bucket)
        .port(cli.port)
        .user(&cli.user)
        .ledger_table(&cli.ledger_table)
        .remote_root(&cli.remote_root)
        .connect_timeout(Duration::from_secs(cli.connect_timeout));
    config.validate()?;

    let objects = match cli.endpoint {
        Some(ref endpoint) => {
            eprintln!("Using custom S3 endpoint: {}", endpoint);
            S3ObjectStore::with_endpoint(endpoint, &cli.region).await
        }
        None => S3ObjectStore::from_env().await,
    };

    let syncer = Syncer::new(
        config.clone(),
        SftpConnector,
        Arc::new(SecretsManagerStore::from_env().await),
        Arc::new(DynamoLedger::from_env(&config.ledger_table).await),
        Arc::new(objects),
    );

    let report = match cli.direction {
        Direction::Push { event } => {
            let event = S3Event::load(event.as_deref()).await?;
            syncer.push_event(&event).await?
        }
        Direction::Pull => syncer.pull().await?,
    };

    print_report(&report);
    Ok(())
}
