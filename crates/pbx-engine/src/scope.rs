//! Reload granularity

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What the engine should re-read.
///
/// Scoped reloads are cheaper and less disruptive than a full reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadScope {
    /// SIP endpoint, auth, aor and identify definitions.
    Endpoints,
    /// The dialplan.
    Dialplan,
    /// Everything.
    Full,
}

impl ReloadScope {
    pub const ALL: [ReloadScope; 3] = [ReloadScope::Endpoints, ReloadScope::Dialplan, ReloadScope::Full];

    /// Module named in a management-protocol `Reload` action. `None` reloads all.
    pub fn ami_module(&self) -> Option<&'static str> {
        match self {
            ReloadScope::Endpoints => Some("res_pjsip.so"),
            ReloadScope::Dialplan => Some("pbx_config.so"),
            ReloadScope::Full => None,
        }
    }

    /// Equivalent command-line command.
    pub fn cli_command(&self) -> &'static str {
        match self {
            ReloadScope::Endpoints => "pjsip reload",
            ReloadScope::Dialplan => "dialplan reload",
            ReloadScope::Full => "core reload",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            ReloadScope::Endpoints => 0,
            ReloadScope::Dialplan => 1,
            ReloadScope::Full => 2,
        }
    }
}

impl FromStr for ReloadScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "endpoints" | "endpoint" | "pjsip" => Ok(ReloadScope::Endpoints),
            "dialplan" | "extensions" => Ok(ReloadScope::Dialplan),
            "full" | "all" | "core" => Ok(ReloadScope::Full),
            _ => Err(format!("unknown reload scope '{}'", s)),
        }
    }
}

impl fmt::Display for ReloadScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadScope::Endpoints => write!(f, "endpoints"),
            ReloadScope::Dialplan => write!(f, "dialplan"),
            ReloadScope::Full => write!(f, "full"),
        }
    }
}
