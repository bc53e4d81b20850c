//! Error types for pbx-core

use std::path::PathBuf;

/// Result type for pbx-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in pbx-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration file not found at expected path
    #[error("Configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// Entity missing from the store or the engine file
    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    /// Create of an entity whose identity is taken
    #[error("{kind} '{key}' already exists")]
    AlreadyExists { kind: &'static str, key: String },

    /// The stored hash cannot be turned back into a password line
    #[error("No plaintext secret available for extension {number}; set a new secret to render it")]
    SecretUnavailable { number: String },

    /// Operation not available for this entity kind
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from pbx-fs
    #[error(transparent)]
    Fs(#[from] pbx_fs::Error),

    /// Malformed managed blocks from pbx-blocks
    #[error(transparent)]
    Blocks(#[from] pbx_blocks::Error),

    /// Document error from pbx-config
    #[error(transparent)]
    Config(#[from] pbx_config::Error),

    /// Entity failed generation preconditions
    #[error(transparent)]
    Validation(#[from] pbx_model::ValidationError),

    /// Engine communication error from pbx-engine
    #[error(transparent)]
    Engine(#[from] pbx_engine::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}
