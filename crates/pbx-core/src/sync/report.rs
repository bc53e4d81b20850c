//! Outcomes of sync and reconcile operations

use std::fmt;
use std::str::FromStr;

use pbx_engine::ReloadOutcome;
use serde::Serialize;

use crate::diff::SyncRecord;

/// One entity, addressed by its natural identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "key", rename_all = "lowercase")]
pub enum EntityRef {
    /// By extension number.
    Extension(String),
    /// By trunk name.
    Trunk(String),
    /// Every rule in one dialplan context.
    Dialplan(String),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Extension(number) => write!(f, "extension {}", number),
            EntityRef::Trunk(name) => write!(f, "trunk {}", name),
            EntityRef::Dialplan(context) => write!(f, "dialplan {}", context),
        }
    }
}

impl FromStr for EntityRef {
    type Err = String;

    /// Accepts `extension:1001`, `trunk:carrier`, `dialplan:from-internal`,
    /// or a bare extension number.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let Some((kind, key)) = s.split_once(':') else {
            if pbx_model::is_extension_number(s) {
                return Ok(EntityRef::Extension(s.to_string()));
            }
            return Err(format!("expected <kind>:<key>, got '{}'", s));
        };
        if key.is_empty() {
            return Err(format!("missing key in '{}'", s));
        }
        match kind.to_lowercase().as_str() {
            "extension" | "ext" => Ok(EntityRef::Extension(key.to_string())),
            "trunk" => Ok(EntityRef::Trunk(key.to_string())),
            "dialplan" | "context" => Ok(EntityRef::Dialplan(key.to_string())),
            other => Err(format!("unknown entity kind '{}'", other)),
        }
    }
}

/// Report from a sync operation.
///
/// The three effects are tracked independently: a reload can fail after the
/// file was written, and the write stays in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub database_changed: bool,
    pub file_changed: bool,
    /// False if any reload failed. True when no reload was needed.
    pub reload_success: bool,
    pub reloads: Vec<ReloadOutcome>,
    /// Actions taken during the operation
    pub actions: Vec<String>,
    /// Errors encountered during the operation
    pub errors: Vec<String>,
}

/// Outcome of a create, update or delete.
pub type MutationOutcome = SyncReport;

impl Default for SyncReport {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncReport {
    pub fn new() -> Self {
        Self {
            database_changed: false,
            file_changed: false,
            reload_success: true,
            reloads: Vec::new(),
            actions: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// No errors and every reload succeeded.
    pub fn success(&self) -> bool {
        self.errors.is_empty() && self.reload_success
    }

    pub fn action(&mut self, action: impl Into<String>) {
        self.actions.push(action.into());
    }

    pub fn error(&mut self, error: impl fmt::Display) {
        self.errors.push(error.to_string());
    }

    pub fn record_reload(&mut self, outcome: ReloadOutcome) {
        if !outcome.success {
            self.reload_success = false;
        }
        self.reloads.push(outcome);
    }

    pub fn merge(&mut self, other: SyncReport) {
        self.database_changed |= other.database_changed;
        self.file_changed |= other.file_changed;
        self.reload_success &= other.reload_success;
        self.reloads.extend(other.reloads);
        self.actions.extend(other.actions);
        self.errors.extend(other.errors);
    }
}

/// Every classified pair, per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub extensions: Vec<SyncRecord>,
    pub trunks: Vec<SyncRecord>,
}

impl DiffReport {
    pub fn records(&self) -> impl Iterator<Item = &SyncRecord> {
        self.extensions.iter().chain(self.trunks.iter())
    }

    /// Every pair matches.
    pub fn is_clean(&self) -> bool {
        self.records().all(SyncRecord::is_match)
    }
}

/// Report from one automatic reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// False when the pass was skipped by the cooldown.
    pub ran: bool,
    /// Entities copied from the file into the database.
    pub imported: Vec<String>,
    /// Entities written from the database into the file.
    pub exported: Vec<String>,
    /// Mismatched pairs left untouched for an operator.
    pub conflicts: Vec<SyncRecord>,
    pub sync: SyncReport,
}

impl ReconcileReport {
    pub fn skipped() -> Self {
        Self {
            ran: false,
            ..Self::started()
        }
    }

    pub(crate) fn started() -> Self {
        Self {
            ran: true,
            imported: Vec::new(),
            exported: Vec::new(),
            conflicts: Vec::new(),
            sync: SyncReport::new(),
        }
    }
}
