//! Engine backend traits

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::scope::ReloadScope;

/// A way to make the engine re-read its configuration.
#[async_trait]
pub trait EngineControl: Send + Sync {
    /// Short backend name used in outcomes and logs.
    fn name(&self) -> &str;

    /// Reload `scope`, returning the engine's response text.
    async fn reload(&self, scope: ReloadScope) -> Result<String>;
}

/// Registration state of one endpoint as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointStatus {
    pub name: String,
    /// Device state, e.g. `Not in use`, `Unavailable`.
    pub state: String,
    /// Registered contact URIs.
    pub contacts: Vec<String>,
}

/// Detailed engine view of one endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDetail {
    pub name: String,
    /// Effective endpoint options as `(key, value)` in report order.
    pub fields: Vec<(String, String)>,
    pub contacts: Vec<String>,
}

impl EndpointDetail {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Runtime queries against the engine.
#[async_trait]
pub trait EngineQuery: Send + Sync {
    /// All configured endpoints with their state.
    async fn list_endpoints(&self) -> Result<Vec<EndpointStatus>>;

    /// Detail for one endpoint, `None` when the engine does not know it.
    async fn endpoint_detail(&self, name: &str) -> Result<Option<EndpointDetail>>;
}
