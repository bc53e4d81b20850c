//! Document model for section-based PBX configuration files
//!
//! Parses `pjsip.conf`/`extensions.conf` style text into an ordered tree of
//! comments, `[section]` headers with their entries, and managed blocks.
//! Parsing is best-effort: lines that fit no known shape are kept verbatim as
//! raw nodes, so rendering a parsed document reproduces its source. The only
//! fatal input is a structurally broken managed block.

pub mod diff;
pub mod document;
pub mod error;
pub mod section;

pub use diff::{TextChange, unified_diff};
pub use document::{Document, ManagedBlock, Node};
pub use error::{Error, Result};
pub use section::{Entry, Op, Pair, Section};
