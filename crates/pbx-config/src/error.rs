//! Error types for pbx-config

/// Result type for pbx-config operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pbx-config operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed managed-block sentinels; the document cannot be edited safely.
    #[error(transparent)]
    Block(#[from] pbx_blocks::Error),
}
