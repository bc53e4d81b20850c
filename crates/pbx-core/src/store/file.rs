use std::path::{Path, PathBuf};

use pbx_fs::{read_text_or_empty, with_file_lock, write_text};
use pbx_model::{DialplanRule, Extension, Trunk};
use tracing::debug;
use uuid::Uuid;

use super::{EntityStore, Inventory};
use crate::Result;

/// Store persisted as a TOML inventory file.
///
/// Every call loads the file under its lock, so several processes can share
/// one inventory. A missing file reads as empty and is created on the first
/// write.
#[derive(Debug, Clone)]
pub struct InventoryFile {
    path: PathBuf,
}

impl InventoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Inventory> {
        let content = read_text_or_empty(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Inventory::new());
        }
        Ok(toml::from_str(&content)?)
    }

    fn save(&self, inventory: &Inventory) -> Result<()> {
        let content = toml::to_string_pretty(inventory)?;
        write_text(&self.path, &content)?;
        debug!(path = %self.path.display(), "saved inventory");
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&Inventory) -> T) -> Result<T> {
        with_file_lock(&self.path, || Ok(f(&self.load()?)))
    }

    /// Load, apply `f` and write back only if something changed.
    fn modify<T>(&self, f: impl FnOnce(&mut Inventory) -> T) -> Result<T> {
        with_file_lock(&self.path, || {
            let before = self.load()?;
            let mut inventory = before.clone();
            let out = f(&mut inventory);
            if inventory != before {
                self.save(&inventory)?;
            }
            Ok(out)
        })
    }
}

impl EntityStore for InventoryFile {
    fn extensions(&self) -> Result<Vec<Extension>> {
        self.read(|inv| inv.extensions.clone())
    }

    fn extension(&self, number: &str) -> Result<Option<Extension>> {
        self.read(|inv| inv.extension(number).cloned())
    }

    fn upsert_extension(&self, ext: Extension) -> Result<Extension> {
        self.modify(|inv| inv.upsert_extension(ext))
    }

    fn delete_extension(&self, number: &str) -> Result<Option<Extension>> {
        self.modify(|inv| inv.delete_extension(number))
    }

    fn trunks(&self) -> Result<Vec<Trunk>> {
        self.read(|inv| inv.trunks.clone())
    }

    fn trunk(&self, name: &str) -> Result<Option<Trunk>> {
        self.read(|inv| inv.trunk(name).cloned())
    }

    fn upsert_trunk(&self, trunk: Trunk) -> Result<Trunk> {
        self.modify(|inv| inv.upsert_trunk(trunk))
    }

    fn delete_trunk(&self, name: &str) -> Result<Option<Trunk>> {
        self.modify(|inv| inv.delete_trunk(name))
    }

    fn rules(&self) -> Result<Vec<DialplanRule>> {
        self.read(|inv| inv.rules.clone())
    }

    fn rule(&self, id: Uuid) -> Result<Option<DialplanRule>> {
        self.read(|inv| inv.rule(id).cloned())
    }

    fn upsert_rule(&self, rule: DialplanRule) -> Result<DialplanRule> {
        self.modify(|inv| inv.upsert_rule(rule))
    }

    fn delete_rule(&self, id: Uuid) -> Result<Option<DialplanRule>> {
        self.modify(|inv| inv.delete_rule(id))
    }
}
