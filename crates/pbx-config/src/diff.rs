//! Line diffs between current and proposed file content

use similar::{ChangeTag, TextDiff};

/// Line counts of a text change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextChange {
    pub added: usize,
    pub removed: usize,
}

impl TextChange {
    /// Count inserted and deleted lines between `old` and `new`.
    pub fn compute(old: &str, new: &str) -> Self {
        let mut change = Self::default();
        for op in TextDiff::from_lines(old, new).iter_all_changes() {
            match op.tag() {
                ChangeTag::Insert => change.added += 1,
                ChangeTag::Delete => change.removed += 1,
                ChangeTag::Equal => {}
            }
        }
        change
    }

    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0
    }
}

/// Unified diff of `old` against `new`, with `name` in the file headers.
///
/// Returns an empty string when the texts are identical.
pub fn unified_diff(old: &str, new: &str, name: &str) -> String {
    if old == new {
        return String::new();
    }
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", name), &format!("b/{}", name))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_texts_have_no_diff() {
        assert_eq!(unified_diff("[a]\n", "[a]\n", "pjsip.conf"), "");
        assert!(TextChange::compute("[a]\n", "[a]\n").is_empty());
    }

    #[test]
    fn unified_diff_marks_changed_lines() {
        let diff = unified_diff("[1001]\ncontext=a\n", "[1001]\ncontext=b\n", "pjsip.conf");
        assert!(diff.contains("--- a/pjsip.conf"));
        assert!(diff.contains("+++ b/pjsip.conf"));
        assert!(diff.contains("-context=a"));
        assert!(diff.contains("+context=b"));
    }

    #[test]
    fn change_counts_lines() {
        let change = TextChange::compute("a\nb\n", "a\nc\nd\n");
        assert_eq!(change, TextChange { added: 2, removed: 1 });
    }
}
