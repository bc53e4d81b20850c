//! Management protocol messages
//!
//! A message is a block of `Key: Value` lines terminated by an empty line.
//! Lines are CRLF-terminated on the wire; bare LF is accepted when reading.

/// One management protocol message (action, response or event).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmiMessage {
    headers: Vec<(String, String)>,
}

impl AmiMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an action message.
    pub fn action(name: &str) -> Self {
        Self::new().with("Action", name)
    }

    /// Append a header.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Parse a message from its header lines.
    ///
    /// Lines without a `:` separator are kept under the `Output` key.
    pub fn parse(block: &str) -> Self {
        let headers = block
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.is_empty())
            .map(|line| match line.split_once(':') {
                Some((key, value)) => (key.trim().to_string(), value.trim().to_string()),
                None => ("Output".to_string(), line.to_string()),
            })
            .collect();
        Self { headers }
    }

    /// First value for `key`, compared case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn action_id(&self) -> Option<&str> {
        self.get("ActionID")
    }

    pub fn event(&self) -> Option<&str> {
        self.get("Event")
    }

    pub fn response(&self) -> Option<&str> {
        self.get("Response")
    }

    pub fn is_success(&self) -> bool {
        self.response()
            .is_some_and(|r| r.eq_ignore_ascii_case("Success") || r.eq_ignore_ascii_case("Goodbye"))
    }

    /// The human-readable `Message` header, or an empty string.
    pub fn message(&self) -> &str {
        self.get("Message").unwrap_or_default()
    }

    /// Encode for the wire, including the terminating blank line.
    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.headers {
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out
    }
}
