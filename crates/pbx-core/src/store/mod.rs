//! Database side of reconciliation
//!
//! The sync engine talks to the entity database through [`EntityStore`].
//! Two implementations ship here: [`MemoryStore`] for embedding and tests,
//! and [`InventoryFile`], a TOML file guarded by a file lock, for the
//! command-line tool.

mod file;
mod inventory;
mod memory;

pub use file::InventoryFile;
pub use inventory::Inventory;
pub use memory::MemoryStore;

use pbx_model::{DialplanRule, Extension, Trunk};
use uuid::Uuid;

use crate::Result;

/// CRUD access to the entity database.
///
/// Upserts match on the natural identity (extension number, trunk name,
/// rule id) and keep the stored `id` of an existing row.
pub trait EntityStore: Send + Sync {
    fn extensions(&self) -> Result<Vec<Extension>>;
    fn extension(&self, number: &str) -> Result<Option<Extension>>;
    fn upsert_extension(&self, ext: Extension) -> Result<Extension>;
    fn delete_extension(&self, number: &str) -> Result<Option<Extension>>;

    fn trunks(&self) -> Result<Vec<Trunk>>;
    fn trunk(&self, name: &str) -> Result<Option<Trunk>>;
    fn upsert_trunk(&self, trunk: Trunk) -> Result<Trunk>;
    fn delete_trunk(&self, name: &str) -> Result<Option<Trunk>>;

    fn rules(&self) -> Result<Vec<DialplanRule>>;
    fn rule(&self, id: Uuid) -> Result<Option<DialplanRule>>;
    fn upsert_rule(&self, rule: DialplanRule) -> Result<DialplanRule>;
    fn delete_rule(&self, id: Uuid) -> Result<Option<DialplanRule>>;
}
