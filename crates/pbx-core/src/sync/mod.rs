//! Synchronization between the entity store and the engine files

mod engine;
mod lifecycle;
mod report;
mod throttle;

pub use engine::{SyncEngine, spawn_auto_reconcile};
pub use report::{DiffReport, EntityRef, MutationOutcome, ReconcileReport, SyncReport};
pub use throttle::ReconcileThrottle;
