//! SHA-256 checksum utilities
//!
//! Checksums use the canonical `sha256:<hex>` format and let callers tell a
//! real rewrite from a no-op.

use sha2::{Digest, Sha256};

const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of string content as `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{}{:x}", PREFIX, hasher.finalize())
}
