//! [`TestPbx`] fixture for reconciliation scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory laid out like an engine configuration directory:
/// an endpoints file, a dialplan file, a backup directory and an inventory.
pub struct TestPbx {
    temp_dir: TempDir,
}

impl Default for TestPbx {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPbx {
    /// Empty directory; neither engine file exists yet.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Directory seeded with the administrator files from the crate root.
    pub fn with_admin_files() -> Self {
        let pbx = Self::new();
        pbx.write_endpoints(crate::ADMIN_ENDPOINTS);
        pbx.write_dialplan(crate::ADMIN_DIALPLAN);
        pbx
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn endpoints_path(&self) -> PathBuf {
        self.root().join("pjsip.conf")
    }

    pub fn dialplan_path(&self) -> PathBuf {
        self.root().join("extensions.conf")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root().join("backups")
    }

    pub fn inventory_path(&self) -> PathBuf {
        self.root().join("inventory.toml")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("pbx-reconciler.toml")
    }

    pub fn write_endpoints(&self, content: &str) {
        fs::write(self.endpoints_path(), content).unwrap();
    }

    pub fn write_dialplan(&self, content: &str) {
        fs::write(self.dialplan_path(), content).unwrap();
    }

    /// Current endpoints file text; empty if it does not exist.
    pub fn endpoints(&self) -> String {
        fs::read_to_string(self.endpoints_path()).unwrap_or_default()
    }

    /// Current dialplan file text; empty if it does not exist.
    pub fn dialplan(&self) -> String {
        fs::read_to_string(self.dialplan_path()).unwrap_or_default()
    }

    /// Write a reconciler config pointing at this directory. The command-line
    /// backend is `executable`, so tests can substitute `true` or `false`.
    pub fn write_config(&self, executable: &str) -> PathBuf {
        let config = format!(
            "[files]\n\
             endpoints = \"pjsip.conf\"\n\
             dialplan = \"extensions.conf\"\n\
             backup_dir = \"backups\"\n\
             \n\
             [store]\n\
             path = \"inventory.toml\"\n\
             \n\
             [engine.cli]\n\
             executable = \"{}\"\n\
             timeout_secs = 5\n\
             \n\
             [reconcile]\n\
             cooldown_secs = 60\n",
            executable
        );
        fs::write(self.config_path(), config).unwrap();
        self.config_path()
    }

    /// Number of backups taken so far.
    pub fn backup_count(&self) -> usize {
        fs::read_dir(self.backup_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// Assert that `haystack` contains `needle` exactly `times` times.
///
/// # Panics
/// Panics with the full text when the count differs.
pub fn assert_occurs(haystack: &str, needle: &str, times: usize) {
    let found = haystack.matches(needle).count();
    assert_eq!(
        found, times,
        "Expected {:?} {} time(s), found {} in:\n{}",
        needle, times, found, haystack
    );
}
