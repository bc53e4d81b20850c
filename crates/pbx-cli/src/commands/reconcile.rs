//! Reconcile command implementation

use std::path::Path;

use colored::Colorize;
use pbx_core::ReconcileReport;

use super::{exit_status, open, print_report};
use crate::error::Result;

/// Run one reconciliation pass
///
/// A one-off invocation is never throttled: the cooldown only spans passes
/// within one process.
pub async fn run_reconcile(config: &Path, json: bool) -> Result<()> {
    let (_, engine) = open(config)?;
    let report = engine.auto_reconcile().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_reconcile(&report);
    }
    exit_status(&report.sync)
}

pub(crate) fn print_reconcile(report: &ReconcileReport) {
    if !report.ran {
        println!("{} Skipped, cooldown still running.", "--".dimmed());
        return;
    }
    for entity in &report.imported {
        println!("  {} imported {}", "<".cyan(), entity);
    }
    for entity in &report.exported {
        println!("  {} exported {}", ">".green(), entity);
    }
    for conflict in &report.conflicts {
        println!(
            "  {} conflict on {} {}",
            "~".yellow(),
            conflict.kind,
            conflict.key.yellow()
        );
        for difference in &conflict.differences {
            println!("      {}", difference);
        }
    }

    let quiet = report.imported.is_empty() && report.exported.is_empty();
    if quiet && report.conflicts.is_empty() && report.sync.errors.is_empty() {
        println!("{} Database and engine files agree.", "OK".green().bold());
    } else if !report.sync.reloads.is_empty() || !report.sync.errors.is_empty() {
        print_report(&report.sync);
    }
}
