//! Filesystem primitives for PBX configuration files
//!
//! Every read-modify-write cycle on an engine configuration file goes through
//! [`with_file_lock`], which serializes access per file path inside the
//! process and takes an advisory `fs2` lock for other processes. Writes are
//! atomic (temp file then rename) and whole-file rewrites can be preceded by
//! a timestamped [`backup_file`] copy.

pub mod backup;
pub mod checksum;
pub mod error;
pub mod io;
pub mod lock;

pub use backup::backup_file;
pub use checksum::compute_content_checksum;
pub use error::{Error, Result};
pub use io::{read_text, read_text_or_empty, write_atomic, write_text};
pub use lock::with_file_lock;
