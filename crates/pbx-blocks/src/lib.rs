//! Managed blocks for PBX configuration files.
//!
//! A managed block is a region of an engine configuration file owned and
//! fully regenerated by the reconciler. It is delimited by comment sentinels
//! carrying an opaque label:
//!
//! ```text
//! ; BEGIN MANAGED - Extension 1001
//! [1001]
//! type=endpoint
//! ; END MANAGED - Extension 1001
//! ```
//!
//! Everything outside the sentinels belongs to the administrator and is
//! never touched. Operations work on byte ranges so that replacing one block
//! leaves every other byte of the file identical.
//!
//! Structural problems (nested, overlapping, unterminated or duplicated
//! blocks) are fatal: the file is rejected rather than guessed at.

pub mod error;
pub mod file;
pub mod parser;
pub mod writer;

pub use error::{Error, Result};
pub use file::{read_blocks, remove_block_from_file, replace_block_in_file, FileChange};
pub use parser::{
    BEGIN_PREFIX, BlockSpan, END_PREFIX, begin_marker, end_marker, find_block, has_block,
    scan_blocks, validate_label,
};
pub use writer::{format_block, remove_managed_block, replace_managed_block};
