//! Command-line interface backend
//!
//! Runs `<executable> -rx "<command>"` as a subprocess. The command is one of
//! a fixed set of strings chosen by [`ReloadScope`] and is passed as a single
//! argument, never through a shell.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::control::EngineControl;
use crate::error::{Error, Result};
use crate::scope::ReloadScope;

/// Output the CLI prints when the engine is not running.
const NOT_RUNNING: &str = "Unable to connect to remote asterisk";

fn default_executable() -> PathBuf {
    PathBuf::from("/usr/sbin/asterisk")
}

fn default_timeout_secs() -> u64 {
    10
}

/// Subprocess settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Runs engine commands through the command-line interface.
#[derive(Debug, Clone)]
pub struct CliInvoker {
    executable: PathBuf,
    timeout: Duration,
}

impl CliInvoker {
    pub fn new(config: &CliConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run one remote command and return its standard output.
    ///
    /// The child is killed if the timeout elapses.
    pub async fn run(&self, command: &str) -> Result<String> {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-rx")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(executable = %self.executable.display(), command, "running engine command");
        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| Error::timeout(format!("'{}'", command), self.timeout))?
            .map_err(|source| Error::Unreachable {
                target: self.executable.display().to_string(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let code = output.status.code().unwrap_or(-1);
            return Err(Error::CommandFailed {
                command: command.to_string(),
                message: format!("exit code {}: {}", code, if stderr.is_empty() { &stdout } else { &stderr }),
            });
        }
        if stdout.starts_with(NOT_RUNNING) {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                message: stdout,
            });
        }
        Ok(stdout)
    }
}

#[async_trait]
impl EngineControl for CliInvoker {
    fn name(&self) -> &str {
        "cli"
    }

    async fn reload(&self, scope: ReloadScope) -> Result<String> {
        let output = self.run(scope.cli_command()).await?;
        info!(%scope, "engine reloaded through command line");
        Ok(output)
    }
}
