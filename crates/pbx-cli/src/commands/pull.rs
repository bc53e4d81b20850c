//! Pull command implementation

use std::path::Path;

use super::{finish, open};
use crate::cli::Target;
use crate::error::Result;

/// Run the pull command
///
/// Imports from the endpoints file into the inventory. The engine files are
/// left as they are, so nothing is reloaded.
pub async fn run_pull(config: &Path, target: &Target, json: bool) -> Result<()> {
    let (_, engine) = open(config)?;
    let report = match target.entity() {
        Some(entity) => engine.sync_one_from_external(&entity).await,
        None => engine.sync_all_from_external().await,
    };
    finish(&report, json)
}
