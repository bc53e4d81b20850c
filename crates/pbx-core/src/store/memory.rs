use std::sync::{Mutex, PoisonError};

use pbx_model::{DialplanRule, Extension, Trunk};
use uuid::Uuid;

use super::{EntityStore, Inventory};
use crate::Result;

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inventory: Mutex<Inventory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inventory(inventory: Inventory) -> Self {
        Self {
            inventory: Mutex::new(inventory),
        }
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inventory) -> T) -> Result<T> {
        let mut inventory = self.inventory.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(f(&mut inventory))
    }
}

impl EntityStore for MemoryStore {
    fn extensions(&self) -> Result<Vec<Extension>> {
        self.with(|inv| inv.extensions.clone())
    }

    fn extension(&self, number: &str) -> Result<Option<Extension>> {
        self.with(|inv| inv.extension(number).cloned())
    }

    fn upsert_extension(&self, ext: Extension) -> Result<Extension> {
        self.with(|inv| inv.upsert_extension(ext))
    }

    fn delete_extension(&self, number: &str) -> Result<Option<Extension>> {
        self.with(|inv| inv.delete_extension(number))
    }

    fn trunks(&self) -> Result<Vec<Trunk>> {
        self.with(|inv| inv.trunks.clone())
    }

    fn trunk(&self, name: &str) -> Result<Option<Trunk>> {
        self.with(|inv| inv.trunk(name).cloned())
    }

    fn upsert_trunk(&self, trunk: Trunk) -> Result<Trunk> {
        self.with(|inv| inv.upsert_trunk(trunk))
    }

    fn delete_trunk(&self, name: &str) -> Result<Option<Trunk>> {
        self.with(|inv| inv.delete_trunk(name))
    }

    fn rules(&self) -> Result<Vec<DialplanRule>> {
        self.with(|inv| inv.rules.clone())
    }

    fn rule(&self, id: Uuid) -> Result<Option<DialplanRule>> {
        self.with(|inv| inv.rule(id).cloned())
    }

    fn upsert_rule(&self, rule: DialplanRule) -> Result<DialplanRule> {
        self.with(|inv| inv.upsert_rule(rule))
    }

    fn delete_rule(&self, id: Uuid) -> Result<Option<DialplanRule>> {
        self.with(|inv| inv.delete_rule(id))
    }
}
