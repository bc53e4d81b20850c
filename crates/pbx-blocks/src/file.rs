//! File-level managed block operations.
//!
//! Each function performs its whole read-modify-write cycle inside the
//! per-file critical section of [`pbx_fs::with_file_lock`], so concurrent
//! writers of different blocks in the same file never lose each other's
//! update.

use std::path::Path;

use pbx_fs::{compute_content_checksum, read_text_or_empty, with_file_lock, write_text};

use crate::error::{Error, Result};
use crate::parser::scan_blocks;
use crate::writer::{remove_managed_block, replace_managed_block};

/// Result of a file-level block operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Whether the file content was modified on disk.
    pub changed: bool,
    /// `sha256:<hex>` of the file content after the operation.
    pub checksum: String,
}

/// Replace or insert the block for `label` in the file at `path`.
///
/// A missing file is treated as empty and created. When the result equals
/// the current content nothing is written.
pub fn replace_block_in_file(path: &Path, label: &str, content: &str) -> Result<FileChange> {
    with_file_lock(path, || {
        let original = read_text_or_empty(path)?;
        let updated = replace_managed_block(&original, label, content)?;
        commit(path, label, &original, &updated)
    })
}

/// Remove the block for `label` from the file at `path`.
///
/// Missing files and absent labels are no-ops.
pub fn remove_block_from_file(path: &Path, label: &str) -> Result<FileChange> {
    with_file_lock(path, || {
        let original = read_text_or_empty(path)?;
        let updated = remove_managed_block(&original, label)?;
        commit(path, label, &original, &updated)
    })
}

/// List `(label, content)` of every managed block in the file.
pub fn read_blocks(path: &Path) -> Result<Vec<(String, String)>> {
    let text = read_text_or_empty(path)?;
    let blocks = scan_blocks(&text)?;
    Ok(blocks
        .into_iter()
        .map(|b| {
            let content = b.content_of(&text).to_string();
            (b.label, content)
        })
        .collect())
}

fn commit(path: &Path, label: &str, original: &str, updated: &str) -> Result<FileChange> {
    let checksum = compute_content_checksum(updated);
    if original == updated {
        tracing::debug!(path = %path.display(), label, "managed block unchanged");
        return Ok(FileChange {
            changed: false,
            checksum,
        });
    }
    write_text(path, updated).map_err(Error::from)?;
    tracing::debug!(path = %path.display(), label, %checksum, "managed block written");
    Ok(FileChange {
        changed: true,
        checksum,
    })
}
