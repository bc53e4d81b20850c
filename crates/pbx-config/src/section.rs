//! Sections and their entries

use std::fmt;

/// Assignment operator of a `key=value` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `key=value`
    Assign,
    /// `key => value`, used by dialplan `exten` and `same` lines.
    Arrow,
}

impl Op {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "=",
            Self::Arrow => "=>",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed `key=value` line.
///
/// Pairs read from a file remember their source line and render it
/// unchanged. Pairs built in code, or modified after parsing, render in the
/// canonical `key=value` / `key => value` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub op: Op,
    pub value: String,
    source: Option<String>,
}

impl Pair {
    pub fn new(key: impl Into<String>, op: Op, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op,
            value: value.into(),
            source: None,
        }
    }

    /// Parse a single line. Returns `None` when the line has no operator or
    /// an empty key.
    ///
    /// Text after an unescaped `;` is an inline comment and is not part of
    /// the value.
    pub fn parse_line(line: &str) -> Option<Self> {
        let eq = line.find('=')?;
        let (key, op, rest) = if line[eq..].starts_with("=>") {
            (&line[..eq], Op::Arrow, &line[eq + 2..])
        } else {
            (&line[..eq], Op::Assign, &line[eq + 1..])
        };

        let key = key.trim();
        if key.is_empty() || key.starts_with(';') || key.contains(char::is_whitespace) {
            return None;
        }

        Some(Self {
            key: key.to_string(),
            op,
            value: strip_inline_comment(rest).trim().to_string(),
            source: Some(line.to_string()),
        })
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.source = None;
    }

    pub fn render(&self) -> String {
        match &self.source {
            Some(source) => source.clone(),
            None => match self.op {
                Op::Assign => format!("{}={}", self.key, self.value),
                Op::Arrow => format!("{} => {}", self.key, self.value),
            },
        }
    }
}

fn strip_inline_comment(value: &str) -> &str {
    let bytes = value.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b';' && (i == 0 || bytes[i - 1] != b'\\') {
            return &value[..i];
        }
    }
    value
}

/// One line inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Pair(Pair),
    /// A `;` comment line, verbatim.
    Comment(String),
    /// An empty or whitespace-only line, verbatim.
    Blank(String),
    /// Anything else, verbatim.
    Raw(String),
}

impl Entry {
    pub fn render(&self) -> String {
        match self {
            Self::Pair(pair) => pair.render(),
            Self::Comment(line) | Self::Blank(line) | Self::Raw(line) => line.clone(),
        }
    }

    pub(crate) fn from_line(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            Self::Blank(line.to_string())
        } else if trimmed.starts_with(';') {
            Self::Comment(line.to_string())
        } else {
            match Pair::parse_line(line) {
                Some(pair) => Self::Pair(pair),
                None => Self::Raw(line.to_string()),
            }
        }
    }
}

/// A `[name]` or `[name](options)` section with its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    /// Text inside the parentheses after the header, e.g. `!` for a template.
    pub options: Option<String>,
    pub entries: Vec<Entry>,
    header: Option<String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: None,
            entries: Vec::new(),
            header: None,
        }
    }

    /// Parse a section header line. Returns `None` if the line is not one.
    pub fn parse_header(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        let inner = trimmed.strip_prefix('[')?;
        let close = inner.find(']')?;
        let name = inner[..close].trim();
        if name.is_empty() {
            return None;
        }

        let rest = strip_inline_comment(&inner[close + 1..]).trim();
        let options = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .map(|o| o.trim().to_string());

        Some(Self {
            name: name.to_string(),
            options,
            entries: Vec::new(),
            header: Some(line.to_string()),
        })
    }

    /// Append a `key=value` pair.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .push(Entry::Pair(Pair::new(key, Op::Assign, value)));
    }

    /// Builder form of [`Section::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    /// Append a `key => value` pair.
    pub fn push_arrow(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push(Entry::Pair(Pair::new(key, Op::Arrow, value)));
    }

    /// Append a comment line. A leading `;` is added when missing.
    pub fn push_comment(&mut self, text: impl Into<String>) {
        let text = text.into();
        let line = if text.trim_start().starts_with(';') {
            text
        } else {
            format!("; {}", text)
        };
        self.entries.push(Entry::Comment(line));
    }

    pub fn push_blank(&mut self) {
        self.entries.push(Entry::Blank(String::new()));
    }

    /// Append a line verbatim.
    pub fn push_raw(&mut self, line: impl Into<String>) {
        self.entries.push(Entry::Raw(line.into()));
    }

    /// All key/value pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = &Pair> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Pair(pair) => Some(pair),
            _ => None,
        })
    }

    /// The first value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }

    /// Every value for `key`, in order. Keys such as `allow` repeat.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs()
            .filter(|p| p.key == key)
            .map(|p| p.value.as_str())
            .collect()
    }

    /// Set the first pair for `key`, or append one.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        for entry in &mut self.entries {
            if let Entry::Pair(pair) = entry
                && pair.key == key
            {
                pair.set_value(value);
                return;
            }
        }
        self.push(key, value);
    }

    pub fn header_line(&self) -> String {
        match (&self.header, &self.options) {
            (Some(header), _) => header.clone(),
            (None, Some(options)) => format!("[{}]({})", self.name, options),
            (None, None) => format!("[{}]", self.name),
        }
    }

    pub(crate) fn render_into(&self, out: &mut Vec<String>) {
        out.push(self.header_line());
        out.extend(self.entries.iter().map(Entry::render));
    }

    /// Render the section, one line per entry, each terminated by a newline.
    pub fn render(&self) -> String {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        self.render_into(&mut lines);
        let mut out = String::new();
        for line in lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_assign_pair() {
        let pair = Pair::parse_line("context = from-internal").unwrap();
        assert_eq!(pair.key, "context");
        assert_eq!(pair.op, Op::Assign);
        assert_eq!(pair.value, "from-internal");
        assert_eq!(pair.render(), "context = from-internal");
    }

    #[test]
    fn test_parse_arrow_pair() {
        let pair = Pair::parse_line("exten => 1001,1,Dial(PJSIP/1001,30)").unwrap();
        assert_eq!(pair.key, "exten");
        assert_eq!(pair.op, Op::Arrow);
        assert_eq!(pair.value, "1001,1,Dial(PJSIP/1001,30)");
    }

    #[test]
    fn test_inline_comment_is_not_value() {
        let pair = Pair::parse_line("context=lab ; keep").unwrap();
        assert_eq!(pair.value, "lab");
        let escaped = Pair::parse_line(r"callerid=A\;B").unwrap();
        assert_eq!(escaped.value, r"A\;B");
    }

    #[test]
    fn test_not_a_pair() {
        assert!(Pair::parse_line("just words").is_none());
        assert!(Pair::parse_line("=value").is_none());
        assert!(Pair::parse_line("#include other.conf").is_none());
    }

    #[test]
    fn test_modified_pair_renders_canonically() {
        let mut pair = Pair::parse_line("qualify_frequency =  30").unwrap();
        pair.set_value("60");
        assert_eq!(pair.render(), "qualify_frequency=60");
    }

    #[test]
    fn test_header_with_template_options() {
        let section = Section::parse_header("[endpoint-base](!)").unwrap();
        assert_eq!(section.name, "endpoint-base");
        assert_eq!(section.options.as_deref(), Some("!"));
        assert!(Section::parse_header("[]").is_none());
        assert!(Section::parse_header("type=endpoint").is_none());
    }

    #[test]
    fn test_builder_renders_canonical_lines() {
        let mut section = Section::new("1001-aor")
            .with("type", "aor")
            .with("max_contacts", "1");
        section.set("max_contacts", "2");
        assert_eq!(section.render(), "[1001-aor]\ntype=aor\nmax_contacts=2\n");
    }

    #[test]
    fn test_get_all_keeps_order() {
        let section = Section::new("1001")
            .with("allow", "ulaw")
            .with("allow", "g722");
        assert_eq!(section.get_all("allow"), vec!["ulaw", "g722"]);
        assert_eq!(section.get("allow"), Some("ulaw"));
        assert_eq!(section.get("missing"), None);
    }
}
