//! Managed block writing operations.
//!
//! All functions here are pure text transforms. Bytes outside the block being
//! replaced or removed are carried over unchanged.

use crate::error::Result;
use crate::parser::{BlockSpan, begin_marker, end_marker, scan_blocks, validate_label};

/// Render a complete block: BEGIN line, content, END line.
///
/// Trailing newlines of `content` are normalized so that the END sentinel
/// always sits on its own line directly after the content.
///
/// # Example
/// ```
/// use pbx_blocks::writer::format_block;
///
/// let block = format_block("Trunk carrier", "[carrier]\ntype=endpoint\n\n");
/// assert_eq!(
///     block,
///     "; BEGIN MANAGED - Trunk carrier\n[carrier]\ntype=endpoint\n; END MANAGED - Trunk carrier\n"
/// );
/// ```
pub fn format_block(label: &str, content: &str) -> String {
    let body = content.trim_end_matches(['\n', '\r']);
    let mut out = begin_marker(label);
    out.push('\n');
    if !body.is_empty() {
        out.push_str(body);
        out.push('\n');
    }
    out.push_str(&end_marker(label));
    out.push('\n');
    out
}

/// Replace or insert the block for `label`.
///
/// An existing block is replaced in place. A missing block is inserted right
/// before the first section header that does not belong to another managed
/// block, followed by one blank line. With no such header the block is
/// appended at the end of the file, separated from prior content by a blank
/// line.
///
/// Replacing a block with identical content returns the input unchanged.
///
/// # Errors
///
/// Returns an error if the label is invalid or the existing sentinels are
/// structurally broken.
///
/// # Example
/// ```
/// use pbx_blocks::writer::replace_managed_block;
///
/// let text = "[general]\nudp_bind=0.0.0.0\n";
/// let out = replace_managed_block(text, "Extension 1001", "[1001]\ntype=endpoint").unwrap();
/// assert!(out.starts_with("; BEGIN MANAGED - Extension 1001\n"));
/// assert!(out.ends_with("\n[general]\nudp_bind=0.0.0.0\n"));
/// ```
pub fn replace_managed_block(text: &str, label: &str, content: &str) -> Result<String> {
    validate_label(label)?;
    let blocks = scan_blocks(text)?;
    let block = format_block(label, content);

    if let Some(existing) = blocks.iter().find(|b| b.label == label) {
        let mut replacement = block.as_str();
        // Keep a missing final newline missing so identical content stays identical
        if !text[existing.range.clone()].ends_with('\n') {
            replacement = replacement.trim_end_matches('\n');
        }
        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..existing.range.start]);
        out.push_str(replacement);
        out.push_str(&text[existing.range.end..]);
        return Ok(out);
    }

    if let Some(offset) = first_unmanaged_header(text, &blocks) {
        tracing::debug!(label, offset, "inserting managed block before section header");
        let mut out = String::with_capacity(text.len() + block.len() + 1);
        out.push_str(&text[..offset]);
        out.push_str(&block);
        out.push('\n');
        out.push_str(&text[offset..]);
        return Ok(out);
    }

    tracing::debug!(label, "appending managed block at end of file");
    let mut out = String::with_capacity(text.len() + block.len() + 2);
    out.push_str(text);
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.ends_with("\n\n") {
            out.push('\n');
        }
    }
    out.push_str(&block);
    Ok(out)
}

/// Remove the block for `label` together with the blank line that follows it.
///
/// Removing an absent label is a no-op. When the block was the last thing in
/// the file, the blank separator in front of it goes too.
pub fn remove_managed_block(text: &str, label: &str) -> Result<String> {
    let blocks = scan_blocks(text)?;
    let Some(existing) = blocks.iter().find(|b| b.label == label) else {
        return Ok(text.to_string());
    };

    let mut end = existing.range.end;
    let rest = &text[end..];
    let next_line = rest.split_inclusive('\n').next().unwrap_or("");
    if !next_line.is_empty() && next_line.trim().is_empty() {
        end += next_line.len();
    }

    let mut head = &text[..existing.range.start];
    if end == text.len() && head.ends_with("\n\n") {
        head = &head[..head.len() - 1];
    }

    let mut out = String::with_capacity(text.len());
    out.push_str(head);
    out.push_str(&text[end..]);
    Ok(out)
}

/// Byte offset of the first `[section]` line outside every managed block.
fn first_unmanaged_header(text: &str, blocks: &[BlockSpan]) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if line.trim_start().starts_with('[') && !blocks.iter().any(|b| b.contains(start)) {
            return Some(start);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_block_empty_content() {
        assert_eq!(
            format_block("Outbound Routes", ""),
            "; BEGIN MANAGED - Outbound Routes\n; END MANAGED - Outbound Routes\n"
        );
    }

    #[test]
    fn test_insert_into_empty_text() {
        let out = replace_managed_block("", "A", "x=1").unwrap();
        assert_eq!(out, "; BEGIN MANAGED - A\nx=1\n; END MANAGED - A\n");
    }

    #[test]
    fn test_append_adds_blank_separator() {
        let out = replace_managed_block("; header comment\n", "A", "x=1").unwrap();
        assert_eq!(
            out,
            "; header comment\n\n; BEGIN MANAGED - A\nx=1\n; END MANAGED - A\n"
        );
    }

    #[test]
    fn test_insert_skips_headers_inside_blocks() {
        let text = "; BEGIN MANAGED - A\n[a]\n; END MANAGED - A\n\n[admin]\nx=1\n";
        let out = replace_managed_block(text, "B", "[b]").unwrap();
        assert_eq!(
            out,
            "; BEGIN MANAGED - A\n[a]\n; END MANAGED - A\n\n; BEGIN MANAGED - B\n[b]\n; END MANAGED - B\n\n[admin]\nx=1\n"
        );
    }

    #[test]
    fn test_replace_preserves_missing_final_newline() {
        let text = "[x]\n\n; BEGIN MANAGED - A\nold\n; END MANAGED - A";
        let out = replace_managed_block(text, "A", "old").unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let text = "[general]\n";
        assert_eq!(remove_managed_block(text, "A").unwrap(), text);
    }

    #[test]
    fn test_remove_last_block_drops_separator() {
        let text = "; admin notes\nx=1\n";
        let inserted = replace_managed_block(text, "A", "[a]").unwrap();
        assert_ne!(inserted, text);
        assert_eq!(remove_managed_block(&inserted, "A").unwrap(), text);
    }
}
