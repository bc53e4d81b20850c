//! Command implementations for pbx-cli

pub mod diff;
pub mod pull;
pub mod push;
pub mod reconcile;
pub mod reload;
pub mod render;
pub mod status;
pub mod watch;

pub use diff::run_diff;
pub use pull::run_pull;
pub use push::run_push;
pub use reconcile::run_reconcile;
pub use reload::run_reload;
pub use render::run_render;
pub use status::run_status;
pub use watch::run_watch;

use std::path::Path;

use colored::Colorize;
use pbx_core::{ReconcilerConfig, SyncEngine, SyncReport};

use crate::error::{CliError, Result};

/// Load the configuration and build an engine over it.
pub(crate) fn open(config: &Path) -> Result<(ReconcilerConfig, SyncEngine)> {
    let config = ReconcilerConfig::load(config)?;
    let engine = SyncEngine::from_config(&config);
    Ok((config, engine))
}

/// Print a sync report in human-readable form.
pub(crate) fn print_report(report: &SyncReport) {
    if report.actions.is_empty() && report.errors.is_empty() {
        println!("{} Nothing to change.", "OK".green().bold());
    }

    for action in &report.actions {
        let marker = if action.starts_with("Removed") || action.starts_with("Deleted") {
            "-".red()
        } else if action.starts_with("Backed up") {
            " ".normal()
        } else {
            "+".green()
        };
        println!("  {} {}", marker, action);
    }

    for outcome in &report.reloads {
        if outcome.success {
            println!(
                "  {} reloaded {} via {}",
                "=>".blue().bold(),
                outcome.scope.to_string().cyan(),
                outcome.via.as_deref().unwrap_or("?")
            );
        } else {
            println!(
                "  {} reload {} failed: {}",
                "!".yellow().bold(),
                outcome.scope.to_string().cyan(),
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("{}", "Errors:".red().bold());
        for error in &report.errors {
            println!("  {} {}", "!".red(), error);
        }
    }
}

/// Print a report as JSON or text, then turn failures into an exit status.
pub(crate) fn finish(report: &SyncReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print_report(report);
    }
    exit_status(report)
}

/// Errors fail the command; so does a reload that did not go through.
pub(crate) fn exit_status(report: &SyncReport) -> Result<()> {
    if !report.errors.is_empty() {
        return Err(CliError::user(format!(
            "finished with {} error(s)",
            report.errors.len()
        )));
    }
    if !report.reload_success {
        return Err(CliError::user("files were written but the engine reload failed"));
    }
    Ok(())
}
