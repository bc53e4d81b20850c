//! Push command implementation
//!
//! Writes database entities into managed blocks and reloads the engine.

use std::collections::BTreeSet;
use std::path::Path;

use colored::Colorize;
use pbx_core::{EntityRef, EntityStore, SyncEngine};
use serde_json::json;

use super::{finish, open};
use crate::cli::Target;
use crate::error::Result;

/// Run the push command
pub async fn run_push(config: &Path, target: &Target, dry_run: bool, json: bool) -> Result<()> {
    let (_, engine) = open(config)?;

    if dry_run {
        return preview(&engine, target, json);
    }

    let report = match target.entity() {
        Some(entity) => engine.sync_one_to_external(&entity).await,
        None => engine.sync_all_to_external().await,
    };
    finish(&report, json)
}

/// Every entity a push of `target` would touch.
fn entities(engine: &SyncEngine, target: &Target) -> Result<Vec<EntityRef>> {
    if let Some(entity) = target.entity() {
        return Ok(vec![entity]);
    }
    let store = engine.store();
    let mut entities: Vec<EntityRef> = store
        .extensions()?
        .into_iter()
        .map(|e| EntityRef::Extension(e.number))
        .collect();
    entities.extend(store.trunks()?.into_iter().map(|t| EntityRef::Trunk(t.name)));
    let contexts: BTreeSet<String> = store.rules()?.into_iter().map(|r| r.context).collect();
    entities.extend(contexts.into_iter().map(EntityRef::Dialplan));
    Ok(entities)
}

fn preview(engine: &SyncEngine, target: &Target, json: bool) -> Result<()> {
    let mut previews = Vec::new();
    for entity in entities(engine, target)? {
        let diff = engine.preview_to_external(&entity)?;
        if !diff.is_empty() {
            previews.push((entity, diff));
        }
    }

    if json {
        let output = json!({
            "has_changes": !previews.is_empty(),
            "changes": previews
                .iter()
                .map(|(entity, diff)| json!({ "entity": entity.to_string(), "diff": diff }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if previews.is_empty() {
        println!("{} No changes needed. Engine files are in sync.", "OK".green().bold());
        return Ok(());
    }
    for (entity, diff) in &previews {
        println!("{} {}", "=>".blue().bold(), entity.to_string().bold());
        for line in diff.lines() {
            if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else {
                println!("{}", line);
            }
        }
        println!();
    }
    println!("Run {} to apply these changes.", "pbx push".cyan());
    Ok(())
}
