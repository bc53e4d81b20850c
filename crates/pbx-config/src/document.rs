//! Configuration document tree

use tracing::{debug, warn};

use crate::error::Result;
use crate::section::{Entry, Section};

/// A block owned by the reconciler, delimited by sentinel comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedBlock {
    pub label: String,
    pub nodes: Vec<Node>,
    begin: String,
    end: String,
}

impl ManagedBlock {
    /// Sections inside this block.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Section(section) => Some(section),
            _ => None,
        })
    }

    /// The text between the sentinel lines.
    pub fn content(&self) -> String {
        let mut lines = Vec::new();
        for node in &self.nodes {
            node.render_into(&mut lines);
        }
        join_lines(&lines, true)
    }
}

/// A top-level element of a configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An empty or whitespace-only line outside any section.
    Blank(String),
    /// A comment line outside any section.
    Comment(String),
    Section(Section),
    Managed(ManagedBlock),
    /// A line before the first section that fits no other shape
    /// (`#include`, stray text), kept verbatim.
    Raw(String),
}

impl Node {
    fn render_into(&self, out: &mut Vec<String>) {
        match self {
            Self::Blank(line) | Self::Comment(line) | Self::Raw(line) => out.push(line.clone()),
            Self::Section(section) => section.render_into(out),
            Self::Managed(block) => {
                out.push(block.begin.clone());
                for node in &block.nodes {
                    node.render_into(out);
                }
                out.push(block.end.clone());
            }
        }
    }
}

/// A parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub nodes: Vec<Node>,
    trailing_newline: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Accumulates nodes at one nesting level (top level or inside a block).
#[derive(Default)]
struct Level {
    nodes: Vec<Node>,
    section: Option<Section>,
}

impl Level {
    fn close_section(&mut self) {
        if let Some(section) = self.section.take() {
            self.nodes.push(Node::Section(section));
        }
    }

    fn push_line(&mut self, line: &str) {
        if let Some(section) = Section::parse_header(line) {
            self.close_section();
            self.section = Some(section);
            return;
        }
        match &mut self.section {
            Some(section) => section.entries.push(Entry::from_line(line)),
            None => {
                let trimmed = line.trim();
                let node = if trimmed.is_empty() {
                    Node::Blank(line.to_string())
                } else if trimmed.starts_with(';') {
                    Node::Comment(line.to_string())
                } else {
                    Node::Raw(line.to_string())
                };
                self.nodes.push(node);
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        self.close_section();
        self.nodes
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            trailing_newline: true,
        }
    }

    /// Parse configuration text.
    ///
    /// # Errors
    ///
    /// Only malformed managed-block sentinels fail. Everything else is
    /// accepted and preserved.
    pub fn parse(text: &str) -> Result<Self> {
        let spans = pbx_blocks::scan_blocks(text)?;
        debug!(blocks = spans.len(), bytes = text.len(), "Parsing configuration document");

        let mut top = Level::default();
        let mut inner: Option<(String, String, Level)> = None;
        let mut spans = spans.iter().peekable();
        let mut offset = 0;

        for raw in text.split_inclusive('\n') {
            let line_start = offset;
            offset += raw.len();
            let line = raw.strip_suffix('\n').unwrap_or(raw);

            if let Some(span) = spans.peek()
                && span.range.start == line_start
            {
                top.close_section();
                inner = Some((span.label.clone(), line.to_string(), Level::default()));
                continue;
            }

            if let Some(span) = spans.peek()
                && span.content.end == line_start
                && let Some((label, begin, level)) = inner.take()
            {
                spans.next();
                top.nodes.push(Node::Managed(ManagedBlock {
                    label,
                    nodes: level.finish(),
                    begin,
                    end: line.to_string(),
                }));
                continue;
            }

            match &mut inner {
                Some((_, _, level)) => level.push_line(line),
                None => top.push_line(line),
            }
        }

        Ok(Self {
            nodes: top.finish(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
        })
    }

    /// Render the document back to text.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for node in &self.nodes {
            node.render_into(&mut lines);
        }
        join_lines(&lines, self.trailing_newline)
    }

    /// Every section in order, including those inside managed blocks.
    pub fn sections(&self) -> Vec<&Section> {
        let mut out = Vec::new();
        for node in &self.nodes {
            match node {
                Node::Section(section) => out.push(section),
                Node::Managed(block) => out.extend(block.sections()),
                _ => {}
            }
        }
        out
    }

    /// The first section named `name`.
    pub fn find_section(&self, name: &str) -> Option<&Section> {
        self.sections().into_iter().find(|s| s.name == name)
    }

    pub fn managed_blocks(&self) -> Vec<&ManagedBlock> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                Node::Managed(block) => Some(block),
                _ => None,
            })
            .collect()
    }

    pub fn block(&self, label: &str) -> Option<&ManagedBlock> {
        self.managed_blocks().into_iter().find(|b| b.label == label)
    }

    /// Replace or insert the managed block `label` with `sections_text`.
    ///
    /// Placement follows [`pbx_blocks::replace_managed_block`].
    pub fn replace_managed_block(&mut self, label: &str, sections_text: &str) -> Result<()> {
        let updated = pbx_blocks::replace_managed_block(&self.render(), label, sections_text)?;
        *self = Self::parse(&updated)?;
        Ok(())
    }

    /// Remove the managed block `label`. Returns whether anything was removed.
    pub fn remove_managed_block(&mut self, label: &str) -> bool {
        if self.block(label).is_none() {
            return false;
        }
        let text = self.render();
        let updated = match pbx_blocks::remove_managed_block(&text, label) {
            Ok(updated) => updated,
            Err(e) => {
                warn!(label, error = %e, "Could not remove managed block");
                return false;
            }
        };
        match Self::parse(&updated) {
            Ok(doc) => {
                *self = doc;
                true
            }
            Err(e) => {
                warn!(label, error = %e, "Document no longer parses after removal");
                false
            }
        }
    }
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline && !lines.is_empty() {
        out.push('\n');
    }
    out
}
