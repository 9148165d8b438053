use super::{
    normalize_path, DirEntry, FileInfo, RemoteConnector, RemoteError, RemoteResult, RemoteSession,
    Stat,
};
use crate::config::SessionConfig;
use crate::credential::Credential;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Operation recorded by the in-memory remote
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Stat(String),
    Mkdir(String),
    List(String),
    Read(String),
    Write(String),
    Close,
}

#[derive(Default)]
struct RemoteState {
    dirs: BTreeSet<String>,
    files: HashMap<String, Bytes>,
    ops: Vec<RemoteOp>,
    failing: HashSet<String>,
    failing_stat: HashSet<String>,
    closes: usize,
}

impl RemoteState {
    fn parent_exists(&self, normalized: &str) -> bool {
        match normalized.rsplit_once('/') {
            Some((parent, _)) => self.dirs.contains(parent),
            None => true,
        }
    }

    fn check_fault(&self, normalized: &str) -> RemoteResult<()> {
        if self.failing.contains(normalized) {
            Err(RemoteError::Io(format!("injected failure at /{}", normalized)))
        } else {
            Ok(())
        }
    }
}

/// In-memory remote filesystem for testing and development
///
/// Enforces the same primitive semantics as an SFTP server: `mkdir` creates a
/// single level and fails when the parent is missing or the path exists.
/// Clones share state, so a test can keep a handle while a run owns another.
#[derive(Clone, Default)]
pub struct MemoryRemote {
    state: Arc<RwLock<RemoteState>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create every level of `path` (setup helper, bypasses the op log)
    pub fn with_dir(self, path: &str) -> Self {
        {
            let mut state = self.state.write();
            let mut current = String::new();
            for part in normalize_path(path).split('/').filter(|p| !p.is_empty()) {
                if !current.is_empty() {
                    current.push('/');
                }
                current.push_str(part);
                state.dirs.insert(current.clone());
            }
        }
        self
    }

    /// Add a file; its parent directory must already have been created
    pub fn with_file(self, path: &str, content: impl Into<Bytes>) -> Self {
        self.state
            .write()
            .files
            .insert(normalize_path(path), content.into());
        self
    }

    /// Make any read, write, mkdir or listing of `path` fail
    pub fn fail_at(&self, path: &str) {
        self.state.write().failing.insert(normalize_path(path));
    }

    /// Make `stat` of `path` fail with an error other than absence
    pub fn fail_stat_at(&self, path: &str) {
        self.state.write().failing_stat.insert(normalize_path(path));
    }

    pub fn file(&self, path: &str) -> Option<Bytes> {
        self.state.read().files.get(&normalize_path(path)).cloned()
    }

    pub fn dir_exists(&self, path: &str) -> bool {
        let normalized = normalize_path(path);
        normalized.is_empty() || self.state.read().dirs.contains(&normalized)
    }

    pub fn ops(&self) -> Vec<RemoteOp> {
        self.state.read().ops.clone()
    }

    /// Directories created through `mkdir`, in call order
    pub fn mkdirs(&self) -> Vec<String> {
        self.filter_ops(|op| match op {
            RemoteOp::Mkdir(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn writes(&self) -> Vec<String> {
        self.filter_ops(|op| match op {
            RemoteOp::Write(p) => Some(p.clone()),
            _ => None,
        })
    }

    pub fn reads(&self) -> Vec<String> {
        self.filter_ops(|op| match op {
            RemoteOp::Read(p) => Some(p.clone()),
            _ => None,
        })
    }

    /// Number of times `close` was called
    pub fn close_count(&self) -> usize {
        self.state.read().closes
    }

    fn filter_ops(&self, f: impl Fn(&RemoteOp) -> Option<String>) -> Vec<String> {
        self.state.read().ops.iter().filter_map(f).collect()
    }

    fn record(&self, op: RemoteOp) {
        self.state.write().ops.push(op);
    }
}

#[async_trait]
impl RemoteSession for MemoryRemote {
    async fn stat(&self, path: &str) -> RemoteResult<Stat> {
        self.record(RemoteOp::Stat(path.to_string()));
        let normalized = normalize_path(path);
        let state = self.state.read();
        if state.failing_stat.contains(&normalized) {
            return Err(RemoteError::PermissionDenied);
        }

        if normalized.is_empty() || state.dirs.contains(&normalized) {
            return Ok(Stat::Found(FileInfo::directory()));
        }
        Ok(state
            .files
            .get(&normalized)
            .map(|data| Stat::Found(FileInfo::file(data.len() as u64)))
            .unwrap_or(Stat::NotFound))
    }

    async fn mkdir(&self, path: &str) -> RemoteResult<()> {
        self.record(RemoteOp::Mkdir(path.to_string()));
        let normalized = normalize_path(path);
        let mut state = self.state.write();
        state.check_fault(&normalized)?;

        if normalized.is_empty()
            || state.dirs.contains(&normalized)
            || state.files.contains_key(&normalized)
        {
            return Err(RemoteError::AlreadyExists);
        }
        if !state.parent_exists(&normalized) {
            return Err(RemoteError::NotFound);
        }
        state.dirs.insert(normalized);
        Ok(())
    }

    async fn list_dir(&self, path: &str) -> RemoteResult<Vec<DirEntry>> {
        self.record(RemoteOp::List(path.to_string()));
        let normalized = normalize_path(path);
        let state = self.state.read();
        state.check_fault(&normalized)?;

        if !normalized.is_empty() && !state.dirs.contains(&normalized) {
            return Err(RemoteError::NotFound);
        }
        let prefix = if normalized.is_empty() {
            String::new()
        } else {
            format!("{}/", normalized)
        };
        let child = |key: &str| -> Option<String> {
            let relative = key.strip_prefix(&prefix)?;
            (!relative.is_empty() && !relative.contains('/')).then(|| relative.to_string())
        };

        let dirs = state.dirs.iter().filter_map(|d| child(d.as_str())).map(|name| DirEntry {
            name,
            attrs: FileInfo::directory(),
        });
        let files = state.files.iter().filter_map(|(k, data)| {
            child(k.as_str()).map(|name| DirEntry {
                name,
                attrs: FileInfo::file(data.len() as u64),
            })
        });
        Ok(dirs.chain(files).collect())
    }

    async fn read_file(&self, path: &str) -> RemoteResult<Bytes> {
        self.record(RemoteOp::Read(path.to_string()));
        let normalized = normalize_path(path);
        let state = self.state.read();
        state.check_fault(&normalized)?;

        if state.dirs.contains(&normalized) {
            return Err(RemoteError::IsADirectory);
        }
        state
            .files
            .get(&normalized)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn write_file(&self, path: &str, content: Bytes) -> RemoteResult<()> {
        self.record(RemoteOp::Write(path.to_string()));
        let normalized = normalize_path(path);
        let mut state = self.state.write();
        state.check_fault(&normalized)?;

        if path.ends_with('/') || normalized.is_empty() || state.dirs.contains(&normalized) {
            return Err(RemoteError::IsADirectory);
        }
        if !state.parent_exists(&normalized) {
            return Err(RemoteError::NotFound);
        }
        state.files.insert(normalized, content);
        Ok(())
    }

    async fn close(&self) -> RemoteResult<()> {
        self.record(RemoteOp::Close);
        self.state.write().closes += 1;
        Ok(())
    }
}

/// Connector handing out sessions on a shared [`MemoryRemote`]
pub struct MemoryConnector {
    remote: MemoryRemote,
    refuse: bool,
    opens: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(remote: MemoryRemote) -> Self {
        Self {
            remote,
            refuse: false,
            opens: AtomicUsize::new(0),
        }
    }

    /// A connector whose every `open` fails
    pub fn refusing(remote: MemoryRemote) -> Self {
        Self {
            refuse: true,
            ..Self::new(remote)
        }
    }

    /// Number of sessions successfully opened
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteConnector for MemoryConnector {
    type Session = MemoryRemote;

    async fn open(
        &self,
        config: &SessionConfig,
        _credential: &Credential,
    ) -> RemoteResult<MemoryRemote> {
        if self.refuse {
            return Err(RemoteError::Connection(format!(
                "{}:{} refused connection",
                config.host, config.port
            )));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(self.remote.clone())
    }
}
