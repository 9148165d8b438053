use super::{DirEntry, FileInfo, RemoteConnector, RemoteError, RemoteResult, RemoteSession, Stat};
use crate::config::SessionConfig;
use crate::credential::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use russh::client;
use russh::keys::{ssh_key, PrivateKeyWithHashAlg};
use russh_sftp::client::error::Error as SftpError;
use russh_sftp::client::SftpSession;
use russh_sftp::protocol::StatusCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info, warn};

/// SSH client handler for the sync session
struct ClientHandler {
    host: String,
    port: u16,
}

impl client::Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &ssh_key::PublicKey,
    ) -> Result<bool, Self::Error> {
        // The endpoint comes from operator configuration; its key is logged, not pinned.
        debug!(
            host = %self.host,
            port = self.port,
            fingerprint = %server_public_key.fingerprint(Default::default()),
            "Server host key"
        );
        Ok(true)
    }
}

/// Convert an SFTP client error to RemoteError
fn map_sftp_error(err: SftpError) -> RemoteError {
    match err {
        SftpError::Status(status) => match status.status_code {
            StatusCode::NoSuchFile => RemoteError::NotFound,
            StatusCode::PermissionDenied => RemoteError::PermissionDenied,
            StatusCode::NoConnection | StatusCode::ConnectionLost => {
                RemoteError::Connection(status.error_message)
            }
            _ => RemoteError::Other(format!(
                "{:?}: {}",
                status.status_code, status.error_message
            )),
        },
        other => RemoteError::Io(other.to_string()),
    }
}

fn map_io_error(err: std::io::Error) -> RemoteError {
    match err.kind() {
        std::io::ErrorKind::NotFound => RemoteError::NotFound,
        std::io::ErrorKind::PermissionDenied => RemoteError::PermissionDenied,
        _ => RemoteError::Io(err.to_string()),
    }
}

fn ssh_error(op: &str, config: &SessionConfig, err: russh::Error) -> RemoteError {
    RemoteError::Connection(format!(
        "SSH {} {}:{}: {}",
        op, config.host, config.port, err
    ))
}

/// An authenticated SFTP session over russh
pub struct SftpRemote {
    sftp: SftpSession,
    handle: client::Handle<ClientHandler>,
    closed: AtomicBool,
}

impl SftpRemote {
    /// Connect, authenticate with the credential and start the sftp subsystem
    pub async fn connect(config: &SessionConfig, credential: &Credential) -> RemoteResult<Self> {
        info!(
            user = %config.user,
            host = %config.host,
            port = config.port,
            "Connecting to SFTP"
        );

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: Some(config.inactivity_timeout),
            ..Default::default()
        });
        let handler = ClientHandler {
            host: config.host.clone(),
            port: config.port,
        };

        let addr = (config.host.as_str(), config.port);
        let mut handle = tokio::time::timeout(
            config.connect_timeout,
            client::connect(ssh_config, addr, handler),
        )
        .await
        .map_err(|_| {
            RemoteError::Connection(format!(
                "SSH connect to {}:{} timed out after {}s",
                config.host,
                config.port,
                config.connect_timeout.as_secs()
            ))
        })?
        .map_err(|e| ssh_error("connect", config, e))?;

        let hash_alg = handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| ssh_error("negotiate hash algorithm", config, e))?
            .flatten();

        let auth = handle
            .authenticate_publickey(
                &config.user,
                PrivateKeyWithHashAlg::new(credential.key(), hash_alg),
            )
            .await
            .map_err(|e| ssh_error("authenticate", config, e))?;

        if !auth.success() {
            return Err(RemoteError::Auth(format!(
                "public key rejected for user '{}' on {}:{}",
                config.user, config.host, config.port
            )));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| ssh_error("open channel", config, e))?;
        channel
            .request_subsystem(true, "sftp")
            .await
            .map_err(|e| ssh_error("request sftp subsystem", config, e))?;
        let sftp = SftpSession::new(channel.into_stream())
            .await
            .map_err(map_sftp_error)?;

        info!(host = %config.host, "SFTP connected");

        Ok(Self {
            sftp,
            handle,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> RemoteResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(RemoteError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteSession for SftpRemote {
    async fn stat(&self, path: &str) -> RemoteResult<Stat> {
        self.ensure_open()?;
        debug!(path = %path, "stat");

        match self.sftp.metadata(path).await {
            Ok(attrs) if attrs.is_dir() => Ok(Stat::Found(FileInfo::directory())),
            Ok(attrs) => Ok(Stat::Found(FileInfo::file(attrs.len()))),
            Err(e) => match map_sftp_error(e) {
                RemoteError::NotFound => Ok(Stat::NotFound),
                other => Err(other),
            },
        }
    }

    async fn mkdir(&self, path: &str) -> RemoteResult<()> {
        self.ensure_open()?;
        debug!(path = %path, "mkdir");

        self.sftp.create_dir(path).await.map_err(map_sftp_error)
    }

    async fn list_dir(&self, path: &str) -> RemoteResult<Vec<DirEntry>> {
        self.ensure_open()?;
        debug!(path = %path, "Listing directory");

        let entries = self.sftp.read_dir(path).await.map_err(map_sftp_error)?;
        Ok(entries
            .filter(|entry| {
                let name = entry.file_name();
                name != "." && name != ".."
            })
            .map(|entry| {
                let metadata = entry.metadata();
                let attrs = if metadata.is_dir() {
                    FileInfo::directory()
                } else {
                    FileInfo::file(metadata.len())
                };
                DirEntry {
                    name: entry.file_name(),
                    attrs,
                }
            })
            .collect())
    }

    async fn read_file(&self, path: &str) -> RemoteResult<Bytes> {
        self.ensure_open()?;
        debug!(path = %path, "Reading file");

        let mut file = self.sftp.open(path).await.map_err(map_sftp_error)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.map_err(map_io_error)?;
        file.shutdown().await.map_err(map_io_error)?;
        Ok(Bytes::from(buf))
    }

    async fn write_file(&self, path: &str, content: Bytes) -> RemoteResult<()> {
        self.ensure_open()?;
        debug!(path = %path, len = content.len(), "Writing file");

        // create() opens with CREATE | TRUNCATE | WRITE
        let mut file = self.sftp.create(path).await.map_err(map_sftp_error)?;
        file.write_all(&content).await.map_err(map_io_error)?;
        file.flush().await.map_err(map_io_error)?;
        file.shutdown().await.map_err(map_io_error)?;
        Ok(())
    }

    async fn close(&self) -> RemoteResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Closing SFTP session");

        if let Err(e) = self.sftp.close().await {
            warn!(error = %e, "SFTP channel did not close cleanly");
        }
        self.handle
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))
    }
}

/// Opens real SFTP sessions
#[derive(Debug, Clone, Copy, Default)]
pub struct SftpConnector;

#[async_trait]
impl RemoteConnector for SftpConnector {
    type Session = SftpRemote;

    async fn open(
        &self,
        config: &SessionConfig,
        credential: &Credential,
    ) -> RemoteResult<SftpRemote> {
        SftpRemote::connect(config, credential).await
    }
}
