//! Ordered codec lists

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults;

/// Allowed codecs in priority order.
///
/// Equality is order-sensitive: `ulaw,alaw` and `alaw,ulaw` negotiate
/// differently and compare unequal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodecList(Vec<String>);

impl CodecList {
    pub fn new<I, S>(codecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(codecs.into_iter().map(Into::into).collect())
    }

    /// Parse a comma-separated list, skipping empty items.
    pub fn from_csv(value: &str) -> Self {
        Self::new(
            value
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty()),
        )
    }

    pub fn extension_default() -> Self {
        Self::new(defaults::EXTENSION_CODECS.iter().copied())
    }

    pub fn trunk_default() -> Self {
        Self::new(defaults::TRUNK_CODECS.iter().copied())
    }

    pub fn push(&mut self, codec: impl Into<String>) {
        self.0.push(codec.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for CodecList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}
