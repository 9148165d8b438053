//! Remote directory materialization.

use super::{is_root, parent_dir, RemoteResult, RemoteSession, Stat};
use tracing::{debug, info};

/// Ensure every directory level of `path` exists on the remote.
///
/// Walks from the leaf towards the root until it finds a level that exists,
/// then creates the missing levels root-to-leaf with single-level `mkdir`.
/// The root itself is assumed to exist and is never created. A fully
/// existing path costs one `stat` and creates nothing.
///
/// Two writers racing on the same prefix can make one of them fail, since
/// `mkdir` on an existing directory is an error.
pub async fn ensure_path<S>(session: &S, path: &str) -> RemoteResult<()>
where
    S: RemoteSession + ?Sized,
{
    let mut missing = Vec::new();
    let mut current = Some(path.trim_end_matches('/'));

    while let Some(dir) = current {
        if is_root(dir) {
            break;
        }
        match session.stat(dir).await? {
            Stat::Found(_) => {
                debug!(path = %dir, "Path exists");
                break;
            }
            Stat::NotFound => {
                missing.push(dir);
                current = parent_dir(dir);
            }
        }
    }

    for dir in missing.into_iter().rev() {
        session.mkdir(dir).await?;
        info!(path = %dir, "Created remote directory");
    }

    Ok(())
}
