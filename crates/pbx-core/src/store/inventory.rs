use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pbx_model::{DialplanRule, Extension, Trunk};

fn default_version() -> String {
    "1.0".to_string()
}

/// Every entity the store holds, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    /// Inventory format version for forward compatibility
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub extensions: Vec<Extension>,
    #[serde(default)]
    pub trunks: Vec<Trunk>,
    #[serde(default)]
    pub rules: Vec<DialplanRule>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    pub fn new() -> Self {
        Self {
            version: default_version(),
            extensions: Vec::new(),
            trunks: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn extension(&self, number: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.number == number)
    }

    pub fn upsert_extension(&mut self, mut ext: Extension) -> Extension {
        match self.extensions.iter_mut().find(|e| e.number == ext.number) {
            Some(existing) => {
                ext.id = existing.id;
                *existing = ext.clone();
            }
            None => self.extensions.push(ext.clone()),
        }
        ext
    }

    pub fn delete_extension(&mut self, number: &str) -> Option<Extension> {
        let pos = self.extensions.iter().position(|e| e.number == number)?;
        Some(self.extensions.remove(pos))
    }

    pub fn trunk(&self, name: &str) -> Option<&Trunk> {
        self.trunks.iter().find(|t| t.name == name)
    }

    pub fn upsert_trunk(&mut self, mut trunk: Trunk) -> Trunk {
        match self.trunks.iter_mut().find(|t| t.name == trunk.name) {
            Some(existing) => {
                trunk.id = existing.id;
                *existing = trunk.clone();
            }
            None => self.trunks.push(trunk.clone()),
        }
        trunk
    }

    pub fn delete_trunk(&mut self, name: &str) -> Option<Trunk> {
        let pos = self.trunks.iter().position(|t| t.name == name)?;
        Some(self.trunks.remove(pos))
    }

    pub fn rule(&self, id: Uuid) -> Option<&DialplanRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn upsert_rule(&mut self, rule: DialplanRule) -> DialplanRule {
        match self.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => self.rules.push(rule.clone()),
        }
        rule
    }

    pub fn delete_rule(&mut self, id: Uuid) -> Option<DialplanRule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }
}
