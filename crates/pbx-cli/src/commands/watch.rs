//! Watch command implementation

use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use pbx_core::spawn_auto_reconcile;

use super::open;
use crate::error::Result;

/// Reconcile once per cooldown until Ctrl-C
pub async fn run_watch(config: &Path) -> Result<()> {
    let (config, engine) = open(config)?;
    let engine = Arc::new(engine);

    println!(
        "{} Reconciling {} and {} every {}s. Press Ctrl-C to stop.",
        "=>".blue().bold(),
        config.files.endpoints.display().to_string().yellow(),
        config.files.dialplan.display().to_string().yellow(),
        config.reconcile.cooldown_secs.max(1)
    );

    let handle = spawn_auto_reconcile(engine);
    tokio::signal::ctrl_c().await?;
    handle.abort();

    println!("{} Stopped.", "=>".blue().bold());
    Ok(())
}
