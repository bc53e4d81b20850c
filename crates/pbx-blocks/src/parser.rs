//! Sentinel scanning for managed blocks.
//!
//! Parses label-tagged blocks in configuration text with the format:
//! ```text
//! ; BEGIN MANAGED - <label>
//! content here
//! ; END MANAGED - <label>
//! ```
//!
//! Sentinel matching is exact and case-sensitive on the trimmed line.

use std::collections::HashSet;
use std::ops::Range;

use crate::error::{Error, Result};

/// Prefix of an opening sentinel line.
pub const BEGIN_PREFIX: &str = "; BEGIN MANAGED - ";

/// Prefix of a closing sentinel line.
pub const END_PREFIX: &str = "; END MANAGED - ";

/// A managed block located in a text, with byte ranges into that text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    /// The label identifying this block.
    pub label: String,
    /// Byte range of the whole block, from the start of the BEGIN line to the
    /// end of the END line (including its newline when present).
    pub range: Range<usize>,
    /// Byte range of the content between the sentinel lines.
    pub content: Range<usize>,
    /// The 1-based line number of the BEGIN sentinel.
    pub start_line: usize,
    /// The 1-based line number of the END sentinel.
    pub end_line: usize,
}

impl BlockSpan {
    /// The content between the sentinels.
    pub fn content_of<'a>(&self, text: &'a str) -> &'a str {
        &text[self.content.clone()]
    }

    /// Whether a byte offset falls inside this block (sentinels included).
    pub fn contains(&self, offset: usize) -> bool {
        self.range.contains(&offset)
    }
}

/// Opening sentinel line for a label (without newline).
pub fn begin_marker(label: &str) -> String {
    format!("{}{}", BEGIN_PREFIX, label)
}

/// Closing sentinel line for a label (without newline).
pub fn end_marker(label: &str) -> String {
    format!("{}{}", END_PREFIX, label)
}

/// Check that a label can be embedded in a sentinel.
///
/// Labels must be non-empty single lines without surrounding whitespace and
/// must not contain sentinel text, otherwise a block could not be located
/// unambiguously.
pub fn validate_label(label: &str) -> Result<()> {
    let invalid = |reason: &str| {
        Err(Error::InvalidLabel {
            label: label.to_string(),
            reason: reason.to_string(),
        })
    };

    if label.is_empty() {
        return invalid("label is empty");
    }
    if label.contains('\n') || label.contains('\r') {
        return invalid("label spans multiple lines");
    }
    if label.trim() != label {
        return invalid("label has leading or trailing whitespace");
    }
    if label.contains("BEGIN MANAGED") || label.contains("END MANAGED") {
        return invalid("label contains sentinel text");
    }
    Ok(())
}

enum Sentinel<'a> {
    Begin(&'a str),
    End(&'a str),
}

fn classify_line(line: &str) -> Option<Sentinel<'_>> {
    let trimmed = line.trim();
    if let Some(label) = trimmed.strip_prefix(BEGIN_PREFIX) {
        return Some(Sentinel::Begin(label));
    }
    if let Some(label) = trimmed.strip_prefix(END_PREFIX) {
        return Some(Sentinel::End(label));
    }
    None
}

/// Scan all managed blocks in the given text, in order of appearance.
///
/// # Errors
///
/// Fails on nested, overlapping, unterminated, unmatched or duplicated
/// blocks. There is no partial result: a structurally broken file must not be
/// rewritten.
///
/// # Example
/// ```
/// use pbx_blocks::parser::scan_blocks;
///
/// let text = "[general]\n; BEGIN MANAGED - Extension 1001\n[1001]\n; END MANAGED - Extension 1001\n";
/// let blocks = scan_blocks(text).unwrap();
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].label, "Extension 1001");
/// assert_eq!(blocks[0].content_of(text), "[1001]\n");
/// ```
pub fn scan_blocks(text: &str) -> Result<Vec<BlockSpan>> {
    let mut blocks = Vec::new();
    let mut seen = HashSet::new();
    // (label, block start, content start, line number)
    let mut open: Option<(&str, usize, usize, usize)> = None;
    let mut offset = 0;

    for (index, line) in text.split_inclusive('\n').enumerate() {
        let line_no = index + 1;
        let line_start = offset;
        let line_end = offset + line.len();
        offset = line_end;

        match (classify_line(line), open) {
            (None, _) => {}
            (Some(Sentinel::Begin(inner)), Some((outer, ..))) => {
                return Err(Error::NestedBlock {
                    outer: outer.to_string(),
                    inner: inner.to_string(),
                    line: line_no,
                });
            }
            (Some(Sentinel::Begin(label)), None) => {
                open = Some((label, line_start, line_end, line_no));
            }
            (Some(Sentinel::End(label)), None) => {
                return Err(Error::UnmatchedEnd {
                    label: label.to_string(),
                    line: line_no,
                });
            }
            (Some(Sentinel::End(found)), Some((expected, ..))) if found != expected => {
                return Err(Error::MismatchedEnd {
                    expected: expected.to_string(),
                    found: found.to_string(),
                    line: line_no,
                });
            }
            (Some(Sentinel::End(label)), Some((_, start, content_start, start_line))) => {
                if !seen.insert(label) {
                    return Err(Error::DuplicateBlock {
                        label: label.to_string(),
                        line: start_line,
                    });
                }
                blocks.push(BlockSpan {
                    label: label.to_string(),
                    range: start..line_end,
                    content: content_start..line_start,
                    start_line,
                    end_line: line_no,
                });
                open = None;
            }
        }
    }

    if let Some((label, _, _, line)) = open {
        return Err(Error::Unterminated {
            label: label.to_string(),
            line,
        });
    }

    Ok(blocks)
}

/// Find a specific block by its label.
pub fn find_block(text: &str, label: &str) -> Result<Option<BlockSpan>> {
    Ok(scan_blocks(text)?.into_iter().find(|b| b.label == label))
}

/// Check if a block with the given label exists in the text.
pub fn has_block(text: &str, label: &str) -> Result<bool> {
    Ok(find_block(text, label)?.is_some())
}
