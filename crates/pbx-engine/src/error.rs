//! Error types for pbx-engine

use std::time::Duration;

/// Result type for pbx-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Engine unreachable at {target}: {source}")]
    Unreachable {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {timeout:?} during {operation}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    #[error("Management protocol error: {0}")]
    Protocol(String),

    #[error("Engine command '{command}' failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("Authentication rejected: {0}")]
    AuthFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }
}
