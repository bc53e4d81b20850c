//! Reconciler configuration file
//!
//! ```toml
//! [files]
//! endpoints = "/etc/asterisk/pjsip.conf"
//! dialplan = "/etc/asterisk/extensions.conf"
//! backup_dir = "backups"
//!
//! [store]
//! path = "inventory.toml"
//!
//! [engine.ami]
//! username = "reconciler"
//! secret = "letmein"
//!
//! [reconcile]
//! cooldown_secs = 60
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pbx_engine::{AmiClient, AmiConfig, CliConfig, CliInvoker, EngineControl, EngineQuery, ReloadCoordinator, StatusMonitor};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn default_endpoints() -> PathBuf {
    PathBuf::from("/etc/asterisk/pjsip.conf")
}

fn default_dialplan() -> PathBuf {
    PathBuf::from("/etc/asterisk/extensions.conf")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("backups")
}

fn default_store_path() -> PathBuf {
    PathBuf::from("inventory.toml")
}

fn default_true() -> bool {
    true
}

fn default_cooldown_secs() -> u64 {
    60
}

/// Engine configuration files the reconciler manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesConfig {
    /// SIP endpoint definitions.
    #[serde(default = "default_endpoints")]
    pub endpoints: PathBuf,
    /// Call routing rules.
    #[serde(default = "default_dialplan")]
    pub dialplan: PathBuf,
    /// Where whole-file backups go before a bulk push.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            dialplan: default_dialplan(),
            backup_dir: default_backup_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Inventory file holding the database side.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// How the engine is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Management interface; reloads go here first when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ami: Option<AmiConfig>,
    #[serde(default)]
    pub cli: CliConfig,
    /// Fall back to the command line when the management interface fails.
    #[serde(default = "default_true")]
    pub cli_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ami: None,
            cli: CliConfig::default(),
            cli_fallback: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Minimum seconds between two automatic reconciliation passes.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

impl ReconcileConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl ReconcilerConfig {
    /// Load from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] if the file does not exist, or a
    /// TOML error if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = pbx_fs::read_text(path)?;
        let mut config: ReconcilerConfig = toml::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.files.endpoints,
            &mut self.files.dialplan,
            &mut self.files.backup_dir,
            &mut self.store.path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Reload backends in fallback order.
    pub fn reload_backends(&self) -> Vec<Arc<dyn EngineControl>> {
        let mut backends: Vec<Arc<dyn EngineControl>> = Vec::new();
        if let Some(ami) = &self.engine.ami {
            backends.push(Arc::new(AmiClient::new(ami.clone())));
        }
        if self.engine.ami.is_none() || self.engine.cli_fallback {
            backends.push(Arc::new(CliInvoker::new(&self.engine.cli)));
        }
        backends
    }

    pub fn coordinator(&self) -> ReloadCoordinator {
        ReloadCoordinator::new(self.reload_backends())
    }

    /// Status monitor over the management interface, if one is configured.
    pub fn monitor(&self) -> StatusMonitor {
        let query = self
            .engine
            .ami
            .clone()
            .map(|ami| Arc::new(AmiClient::new(ami)) as Arc<dyn EngineQuery>);
        StatusMonitor::new(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: ReconcilerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ReconcilerConfig::default());
        assert_eq!(config.reconcile.cooldown_secs, 60);
        assert!(config.engine.ami.is_none());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pbx-reconciler.toml");
        std::fs::write(
            &path,
            "[files]\nendpoints = \"pjsip.conf\"\ndialplan = \"/etc/asterisk/extensions.conf\"\n\n\
             [engine.ami]\nusername = \"reconciler\"\nsecret = \"letmein\"\nport = 5039\n",
        )
        .unwrap();

        let config = ReconcilerConfig::load(&path).unwrap();

        assert_eq!(config.files.endpoints, dir.path().join("pjsip.conf"));
        assert_eq!(config.files.dialplan, PathBuf::from("/etc/asterisk/extensions.conf"));
        assert_eq!(config.store.path, dir.path().join("inventory.toml"));
        let ami = config.engine.ami.unwrap();
        assert_eq!(ami.port, 5039);
        assert_eq!(ami.host, "127.0.0.1");
    }

    #[test]
    fn test_missing_file() {
        let result = ReconcilerConfig::load(Path::new("/nonexistent/pbx-reconciler.toml"));
        assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
    }

    #[test]
    fn test_backend_order() {
        let mut config = ReconcilerConfig::default();
        assert_eq!(config.coordinator().backend_names(), vec!["cli"]);

        config.engine.ami = Some(AmiConfig::new("reconciler", "letmein"));
        assert_eq!(config.coordinator().backend_names(), vec!["ami", "cli"]);

        config.engine.cli_fallback = false;
        assert_eq!(config.coordinator().backend_names(), vec!["ami"]);
    }
}
