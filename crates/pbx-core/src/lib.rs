//! Configuration reconciliation between an entity store and a PBX engine
//!
//! This crate keeps the database view of extensions, trunks and dialplan
//! rules consistent with the engine's text configuration files:
//!
//! - [`generate`] renders entities into deterministic configuration text
//! - [`parse`] reads engine files back into normalized records
//! - [`diff`] classifies each identity as match, one-sided or mismatched
//! - [`store`] is the database side
//! - [`sync`] orchestrates writes into managed blocks and engine reloads
//!
//! Generated text only ever lands between managed-block sentinels, so
//! administrator edits elsewhere in the files survive every write.

pub mod config;
pub mod diff;
pub mod error;
pub mod generate;
pub mod parse;
pub mod store;
pub mod sync;

pub use config::{EngineConfig, FilesConfig, ReconcileConfig, ReconcilerConfig, StoreConfig};
pub use diff::{Classification, FieldDiff, SyncRecord};
pub use error::{Error, Result};
pub use parse::{ExternalExtension, ExternalState, ExternalTrunk};
pub use pbx_blocks::FileChange as WriteOutcome;
pub use store::{EntityStore, Inventory, InventoryFile, MemoryStore};
pub use sync::{
    DiffReport, EntityRef, MutationOutcome, ReconcileReport, ReconcileThrottle, SyncEngine,
    SyncReport, spawn_auto_reconcile,
};
