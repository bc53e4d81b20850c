//! Error types for pbx-blocks

pub type Result<T> = std::result::Result<T, Error>;

/// Structural errors in managed-block sentinels.
///
/// All of these reject the whole file operation; there is no recovery.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] pbx_fs::Error),

    #[error("Managed block '{inner}' begins inside block '{outer}' at line {line}")]
    NestedBlock {
        outer: String,
        inner: String,
        line: usize,
    },

    #[error("END sentinel for '{label}' at line {line} has no matching BEGIN")]
    UnmatchedEnd { label: String, line: usize },

    #[error("Managed blocks overlap: expected END for '{expected}', found END for '{found}' at line {line}")]
    MismatchedEnd {
        expected: String,
        found: String,
        line: usize,
    },

    #[error("Managed block '{label}' opened at line {line} is never closed")]
    Unterminated { label: String, line: usize },

    #[error("Managed block '{label}' appears more than once (second copy at line {line})")]
    DuplicateBlock { label: String, line: usize },

    #[error("Invalid managed block label {label:?}: {reason}")]
    InvalidLabel { label: String, reason: String },
}
