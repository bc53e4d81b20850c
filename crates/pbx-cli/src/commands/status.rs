//! Status command implementation

use std::path::Path;

use colored::Colorize;
use pbx_core::{Classification, EntityStore};
use pbx_engine::{Availability, DetailReport, EndpointReport};
use serde_json::json;

use super::open;
use crate::error::Result;

/// Run the status command
///
/// Engine status degrades to cached or unreachable rather than failing, so
/// this command succeeds whenever the configuration loads.
pub async fn run_status(config: &Path, endpoint: Option<&str>, json: bool) -> Result<()> {
    let (config, engine) = open(config)?;
    let monitor = config.monitor();

    if let Some(name) = endpoint {
        let report = monitor.endpoint_detail(name).await;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_detail(name, &report);
        }
        return Ok(());
    }

    let endpoints = monitor.list_endpoints().await;
    let store = engine.store();
    let (extensions, trunks, rules) = (store.extensions()?, store.trunks()?, store.rules()?);
    let diff = engine.diff()?;
    let pending = diff.records().filter(|r| !r.is_match()).count();
    let conflicts = diff
        .records()
        .filter(|r| r.classification == Classification::Mismatch)
        .count();

    if json {
        let output = json!({
            "engine": endpoints,
            "database": {
                "extensions": extensions.len(),
                "trunks": trunks.len(),
                "rules": rules.len(),
            },
            "out_of_sync": pending,
            "conflicts": conflicts,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "PBX Status".bold());
    println!();
    println!("{}:  {}", "Endpoints file".dimmed(), config.files.endpoints.display());
    println!("{}:  {}", "Dialplan file".dimmed(), config.files.dialplan.display());
    println!("{}:  {}", "Inventory".dimmed(), config.store.path.display());
    println!();

    println!("{}:", "Database".bold());
    println!("  {} extensions, {} trunks, {} dialplan rules", extensions.len(), trunks.len(), rules.len());
    if pending == 0 {
        println!("  {}", "in sync".green());
    } else {
        println!(
            "  {} out of sync, {} conflicts (see {})",
            pending.to_string().yellow(),
            conflicts.to_string().yellow(),
            "pbx diff".cyan()
        );
    }
    println!();

    print_endpoints(&endpoints);
    Ok(())
}

fn availability_label(availability: &Availability) -> String {
    match availability {
        Availability::Live => "live".green().to_string(),
        Availability::Cached { as_of, reason } => format!(
            "{} as of {} ({})",
            "cached".yellow(),
            as_of.format("%Y-%m-%d %H:%M:%S UTC"),
            reason
        ),
        Availability::Unreachable { reason } => format!("{} ({})", "unreachable".red(), reason),
    }
}

fn print_endpoints(report: &EndpointReport) {
    println!("{}: {}", "Engine".bold(), availability_label(&report.availability));
    if report.endpoints.is_empty() {
        println!("  {}", "No endpoints".dimmed());
        return;
    }
    for endpoint in &report.endpoints {
        let state = if endpoint.state.eq_ignore_ascii_case("unavailable") {
            endpoint.state.red()
        } else {
            endpoint.state.green()
        };
        println!("  {} {} ({})", "+".green(), endpoint.name.cyan(), state);
        for contact in &endpoint.contacts {
            println!("      {}", contact.dimmed());
        }
    }
}

fn print_detail(name: &str, report: &DetailReport) {
    println!("{} {}: {}", "Endpoint".bold(), name.cyan(), availability_label(&report.availability));
    let Some(detail) = &report.detail else {
        println!("  {}", "Not known to the engine".dimmed());
        return;
    };
    for (key, value) in &detail.fields {
        println!("  {}: {}", key.dimmed(), value);
    }
    for contact in &detail.contacts {
        println!("  {} {}", "contact".dimmed(), contact);
    }
}
