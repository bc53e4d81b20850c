//! Per-file critical sections
//!
//! A process-wide registry hands out one mutex per absolute file path, so two
//! threads rewriting `pjsip.conf` run one after another while a thread
//! touching `extensions.conf` proceeds in parallel. Inside the mutex an `fs2`
//! exclusive lock on a sidecar `.<name>.lock` file keeps other processes out.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use fs2::FileExt;

use crate::Error;

static REGISTRY: LazyLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Run `f` while holding the exclusive lock for `path`.
///
/// The lock is not re-entrant: `f` must not call `with_file_lock` for the
/// same path again.
pub fn with_file_lock<T, E, F>(path: &Path, f: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
    E: From<Error>,
{
    let key = lock_key(path);
    let gate = {
        let mut registry = REGISTRY.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(registry.entry(key.clone()).or_default())
    };

    let _guard = gate.lock().unwrap_or_else(PoisonError::into_inner);
    let lock_file = open_lock_file(&key)?;
    lock_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed { path: key.clone() })?;
    tracing::trace!(path = %key.display(), "acquired file lock");

    // The advisory lock is released when `lock_file` is dropped
    f()
}

fn lock_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn lock_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.lock", name))
}

fn open_lock_file(path: &Path) -> Result<File, Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let lock_path = lock_path(path);
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| Error::io(&lock_path, e))
}
