//! PBX Reconciler CLI
//!
//! The command-line interface for keeping extensions, trunks and dialplan
//! rules in step with the engine's configuration files.
//!
//! # Environment Variables
//!
//! - `PBX_RECONCILER_CONFIG`: configuration file (default: `pbx-reconciler.toml`)
//! - `RUST_LOG`: log filter; logs go to stderr

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(cli: &Cli) {
    let default = match (&cli.command, cli.verbose) {
        (_, true) => "debug",
        (Some(Commands::Watch), false) => "info",
        _ => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(cli.verbose)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

async fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help hint
        println!("{} PBX configuration reconciler", "pbx".green().bold());
        println!();
        println!("Run {} for available commands.", "pbx --help".cyan());
        return Ok(());
    };

    let config = cli.config.as_path();
    match command {
        Commands::Diff { json } => commands::run_diff(config, json),
        Commands::Push {
            target,
            dry_run,
            json,
        } => commands::run_push(config, &target, dry_run, json).await,
        Commands::Pull { target, json } => commands::run_pull(config, &target, json).await,
        Commands::Reconcile { json } => commands::run_reconcile(config, json).await,
        Commands::Watch => commands::run_watch(config).await,
        Commands::Reload { scope } => commands::run_reload(config, scope).await,
        Commands::Render { what } => commands::run_render(config, &what),
        Commands::Status { endpoint, json } => {
            commands::run_status(config, endpoint.as_deref(), json).await
        }
    }
}
