//! Reload command implementation

use std::path::Path;

use colored::Colorize;
use pbx_core::ReconcilerConfig;
use pbx_engine::ReloadScope;

use crate::error::{CliError, Result};

/// Run the reload command
///
/// Tries each configured backend in order; the first success wins.
pub async fn run_reload(config: &Path, scope: ReloadScope) -> Result<()> {
    let config = ReconcilerConfig::load(config)?;
    let outcome = config.coordinator().reload(scope).await;

    if outcome.success {
        println!(
            "{} Reloaded {} via {}",
            "=>".blue().bold(),
            scope.to_string().cyan(),
            outcome.via.as_deref().unwrap_or("?")
        );
        if !outcome.output.trim().is_empty() {
            println!("{}", outcome.output.trim().dimmed());
        }
        return Ok(());
    }

    Err(CliError::user(format!(
        "reload {} failed: {}",
        scope,
        outcome.error.as_deref().unwrap_or("no backend configured")
    )))
}
