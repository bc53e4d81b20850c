//! Diff command implementation
//!
//! Classifies every identity on both sides without changing anything.

use std::path::Path;

use colored::Colorize;
use pbx_core::{Classification, DiffReport, SyncRecord};

use super::open;
use crate::error::Result;

/// Run the diff command
pub fn run_diff(config: &Path, json: bool) -> Result<()> {
    let (_, engine) = open(config)?;
    let report = engine.diff()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_diff_output(&report);
    }
    Ok(())
}

fn print_diff_output(report: &DiffReport) {
    if report.is_clean() {
        println!(
            "{} Database and engine files agree.",
            "OK".green().bold()
        );
        return;
    }

    println!("{}", "Differences:".bold());
    println!();
    for record in report.records().filter(|r| !r.is_match()) {
        print_record(record);
    }

    println!();
    println!(
        "Run {} or {} to resolve one-sided entries.",
        "pbx push".cyan(),
        "pbx pull".cyan()
    );
}

fn print_record(record: &SyncRecord) {
    let who = format!("{} {}", record.kind, record.key);
    match record.classification {
        Classification::Match => {}
        Classification::DatabaseOnly => {
            println!("  {} {} ({})", "+".green(), who, "database only".green());
        }
        Classification::ExternalOnly => {
            println!("  {} {} ({})", "<".cyan(), who, "engine file only".cyan());
        }
        Classification::Mismatch => {
            println!("  {} {} ({})", "~".yellow(), who, "mismatch".yellow());
            for difference in &record.differences {
                println!("      {}", difference);
            }
        }
    }
}
