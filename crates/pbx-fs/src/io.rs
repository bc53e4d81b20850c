//! Atomic I/O operations

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use crate::{Error, Result};

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename so readers (including the PBX engine)
/// never observe a half-written configuration file. Callers that perform a
/// read-modify-write cycle must hold [`crate::with_file_lock`] for the path.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives in the same directory so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;
    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        Error::io(path, e)
    })?;

    tracing::trace!(path = %path.display(), bytes = content.len(), "wrote file atomically");
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Read text content, treating a missing file as empty.
///
/// Engine configuration files are created lazily on the first managed block
/// write, so absence is a normal state rather than an error.
pub fn read_text_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");

        write_text(&path, "[1001]\ntype=endpoint\n").unwrap();

        assert_eq!(read_text(&path).unwrap(), "[1001]\ntype=endpoint\n");
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("asterisk").join("extensions.conf");

        write_text(&path, "[from-internal]\n").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn write_leaves_no_temp_file_behind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");

        write_text(&path, "content").unwrap();

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn read_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let result = read_text(&dir.path().join("missing.conf"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn read_or_empty_treats_missing_file_as_empty() {
        let dir = tempdir().unwrap();
        let content = read_text_or_empty(&dir.path().join("missing.conf")).unwrap();
        assert!(content.is_empty());
    }
}
