use crate::config::SessionConfig;
use crate::credential::Credential;
use async_trait::async_trait;
use bytes::Bytes;

pub mod materialize;
pub mod memory;
pub mod sftp;

pub use materialize::ensure_path;
pub use memory::{MemoryConnector, MemoryRemote, RemoteOp};
pub use sftp::{SftpConnector, SftpRemote};

/// Result type for remote session operations
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors that can occur talking to the remote endpoint
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("File or directory not found")]
    NotFound,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("File already exists")]
    AlreadyExists,
    #[error("Is a directory")]
    IsADirectory,
    #[error("Session closed")]
    Closed,
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Remote error: {0}")]
    Other(String),
}

/// Directory entry returned by list_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub attrs: FileInfo,
}

/// File metadata information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub size: u64,
    pub is_dir: bool,
}

impl FileInfo {
    /// Create FileInfo for a directory
    pub fn directory() -> Self {
        Self {
            size: 0,
            is_dir: true,
        }
    }

    /// Create FileInfo for a regular file
    pub fn file(size: u64) -> Self {
        Self {
            size,
            is_dir: false,
        }
    }
}

/// Outcome of a `stat` call. Absence is a regular answer, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Found(FileInfo),
    NotFound,
}

/// An open, authenticated file session on the remote endpoint.
///
/// Paths are absolute slash-delimited strings as the server sees them.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    /// Get file or directory information
    async fn stat(&self, path: &str) -> RemoteResult<Stat>;

    /// Create exactly one directory level
    ///
    /// The parent must exist; creating an existing path fails.
    async fn mkdir(&self, path: &str) -> RemoteResult<()>;

    /// List directory contents
    ///
    /// Order is unspecified. "." and ".." are never returned.
    async fn list_dir(&self, path: &str) -> RemoteResult<Vec<DirEntry>>;

    /// Read entire file contents
    async fn read_file(&self, path: &str) -> RemoteResult<Bytes>;

    /// Creates or overwrites the file at `path` with `content`.
    async fn write_file(&self, path: &str, content: Bytes) -> RemoteResult<()>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&self) -> RemoteResult<()>;
}

/// Opens remote sessions for a run
#[async_trait]
pub trait RemoteConnector: Send + Sync + 'static {
    type Session: RemoteSession;

    async fn open(
        &self,
        config: &SessionConfig,
        credential: &Credential,
    ) -> RemoteResult<Self::Session>;
}

/// Join a relative identifier onto a remote directory
pub fn join_path(root: &str, relative: &str) -> String {
    let root = root.trim_end_matches('/');
    let relative = relative.trim_start_matches('/');
    if relative.is_empty() {
        if root.is_empty() {
            "/".to_string()
        } else {
            root.to_string()
        }
    } else {
        format!("{}/{}", root, relative)
    }
}

/// Parent directory of `path`, or `None` for a single relative component
/// or the root itself.
pub fn parent_dir(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return None;
    }
    let idx = trimmed.rfind('/')?;
    let parent = trimmed[..idx].trim_end_matches('/');
    if parent.is_empty() {
        Some("/")
    } else {
        Some(parent)
    }
}

/// Directory part of `path`, like POSIX `dirname` on the raw string.
///
/// A trailing slash keeps the last segment: `/a/b/` yields `/a/b`.
pub fn dirname(path: &str) -> Option<&str> {
    let idx = path.rfind('/')?;
    let dir = path[..idx].trim_end_matches('/');
    if dir.is_empty() {
        Some("/")
    } else {
        Some(dir)
    }
}

/// Whether a relative identifier climbs out of the directory it is joined to
pub fn escapes_root(relative: &str) -> bool {
    relative.split('/').any(|segment| segment == "..")
}

/// Whether `path` names the filesystem root
pub fn is_root(path: &str) -> bool {
    path.trim_matches('/').is_empty()
}

/// Normalize a path: trim leading/trailing slashes, handle empty as root
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() || trimmed == "." {
        String::new()
    } else {
        trimmed.to_string()
    }
}
