//! Timestamped backups taken before whole-file rewrites
//!
//! Scoped managed-block replacement is surgical and needs no backup. Anything
//! that rewrites a whole engine file (bulk export, orphan pruning) copies the
//! current file to `<backup_dir>/<name>.<timestamp>.bak` first.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::{Error, Result};

/// Copy `path` into `backup_dir` under a timestamped name.
///
/// Returns `Ok(None)` when the source file does not exist yet.
pub fn backup_file(path: &Path, backup_dir: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    fs::create_dir_all(backup_dir).map_err(|e| Error::io(backup_dir, e))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "config".to_string());
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");

    let mut dest = backup_dir.join(format!("{}.{}.bak", name, stamp));
    let mut attempt = 1;
    while dest.exists() {
        dest = backup_dir.join(format!("{}.{}-{}.bak", name, stamp, attempt));
        attempt += 1;
    }

    fs::copy(path, &dest).map_err(|e| Error::io(&dest, e))?;
    tracing::info!(
        source = %path.display(),
        backup = %dest.display(),
        "backed up configuration file"
    );
    Ok(Some(dest))
}
