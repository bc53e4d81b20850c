use std::fmt;

use pbx_model::EntityKind;
use serde::Serialize;

/// How a database entity relates to its engine-file counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Both sides agree, or a disabled entity is correctly absent.
    Match,
    /// Only the database has it; the file needs the block.
    DatabaseOnly,
    /// Only the file has it; a candidate for import.
    ExternalOnly,
    /// Both sides have it and at least one field differs.
    Mismatch,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Classification::Match => "match",
            Classification::DatabaseOnly => "database only",
            Classification::ExternalOnly => "external only",
            Classification::Mismatch => "mismatch",
        };
        f.write_str(text)
    }
}

/// One differing field, rendered as display strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDiff {
    pub field: String,
    pub database: String,
    pub external: String,
}

impl FieldDiff {
    pub fn new(field: &str, database: impl fmt::Display, external: impl fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            database: database.to_string(),
            external: external.to_string(),
        }
    }
}

impl fmt::Display for FieldDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: db={}, external={}", self.field, self.database, self.external)
    }
}

/// Classified pair for one identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncRecord {
    pub kind: EntityKind,
    /// Extension number or trunk name.
    pub key: String,
    pub classification: Classification,
    /// Empty unless `classification` is `Mismatch`.
    pub differences: Vec<FieldDiff>,
}

impl SyncRecord {
    pub fn is_match(&self) -> bool {
        self.classification == Classification::Match
    }
}

impl fmt::Display for SyncRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.key, self.classification)?;
        for diff in &self.differences {
            write!(f, "\n  {}", diff)?;
        }
        Ok(())
    }
}
