//! Field-level comparison of database entities against the engine file
//!
//! Each identity present on either side gets one [`SyncRecord`] classifying
//! the pair. The comparison is order-sensitive for codec lists and never
//! exposes secret values: a differing secret shows up as a redacted field.

mod compare;
mod record;

pub use compare::{Comparable, classify, diff_extensions, diff_trunks};
pub use record::{Classification, FieldDiff, SyncRecord};
