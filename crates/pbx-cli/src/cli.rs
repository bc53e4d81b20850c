//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pbx_core::EntityRef;
use pbx_engine::ReloadScope;

/// PBX Reconciler - Keep the entity database and the engine's configuration files in step
#[derive(Parser, Debug)]
#[command(name = "pbx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Reconciler configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "PBX_RECONCILER_CONFIG",
        default_value = "pbx-reconciler.toml"
    )]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Classify every extension and trunk on both sides
    Diff {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Write database entities into the engine files and reload
    ///
    /// Examples:
    ///   pbx push --extension 1001      # One extension
    ///   pbx push --all                 # Every entity, after a backup
    ///   pbx push --all --dry-run       # Show the file changes only
    Push {
        #[command(flatten)]
        target: Target,

        /// Show the file changes without writing them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Import hand-edited engine sections into the database
    Pull {
        #[command(flatten)]
        target: Target,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Run one reconciliation pass
    ///
    /// One-sided entities are copied across; mismatches are reported as
    /// conflicts and left alone.
    Reconcile {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Reconcile periodically until interrupted
    Watch,

    /// Ask the engine to reload its configuration
    Reload {
        /// endpoints, dialplan or full
        #[arg(default_value = "full")]
        scope: ReloadScope,
    },

    /// Print the configuration text generated for an entity
    Render {
        #[command(subcommand)]
        what: RenderTarget,
    },

    /// Show engine endpoint status and the database summary
    Status {
        /// Endpoint to show in detail
        endpoint: Option<String>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },
}

/// Which entities a push or pull acts on
#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Extension number
    #[arg(long, value_name = "NUMBER")]
    pub extension: Option<String>,

    /// Trunk name
    #[arg(long, value_name = "NAME")]
    pub trunk: Option<String>,

    /// Dialplan context
    #[arg(long, value_name = "CONTEXT")]
    pub dialplan: Option<String>,

    /// Every entity
    #[arg(long)]
    pub all: bool,
}

impl Target {
    /// The single entity named, or `None` for `--all`.
    pub fn entity(&self) -> Option<EntityRef> {
        if let Some(number) = &self.extension {
            return Some(EntityRef::Extension(number.clone()));
        }
        if let Some(name) = &self.trunk {
            return Some(EntityRef::Trunk(name.clone()));
        }
        self.dialplan.clone().map(EntityRef::Dialplan)
    }
}

/// Entities `pbx render` can print
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum RenderTarget {
    /// Endpoint, auth and aor sections for one extension
    Extension { number: String },

    /// Endpoint, auth, aor and identify sections for one trunk
    Trunk { name: String },

    /// Dialplan contexts; every context when none is given
    Dialplan { context: Option<String> },
}
