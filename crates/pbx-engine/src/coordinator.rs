//! Reload coordination with fallback

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::control::EngineControl;
use crate::scope::ReloadScope;

/// Result of a reload request.
///
/// A failed reload never fails the operation that asked for it: the file
/// write already happened and the engine catches up on the next successful
/// reload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadOutcome {
    pub scope: ReloadScope,
    pub success: bool,
    /// Engine response text of the backend that succeeded.
    pub output: String,
    /// Every backend failure, joined, when no backend succeeded.
    pub error: Option<String>,
    /// Name of the backend that succeeded.
    pub via: Option<String>,
}

impl ReloadOutcome {
    fn succeeded(scope: ReloadScope, via: &str, output: String) -> Self {
        Self {
            scope,
            success: true,
            output,
            error: None,
            via: Some(via.to_string()),
        }
    }

    fn failed(scope: ReloadScope, error: String) -> Self {
        Self {
            scope,
            success: false,
            output: String::new(),
            error: Some(error),
            via: None,
        }
    }
}

/// Issues reloads through a primary backend with a fallback.
///
/// Reloads of the same scope are serialized; different scopes may run
/// concurrently.
pub struct ReloadCoordinator {
    backends: Vec<Arc<dyn EngineControl>>,
    locks: [Mutex<()>; 3],
}

impl ReloadCoordinator {
    /// Backends are tried in the given order.
    pub fn new(backends: Vec<Arc<dyn EngineControl>>) -> Self {
        Self {
            backends,
            locks: Default::default(),
        }
    }

    /// Primary backend with a fallback, the usual management-protocol then
    /// command-line arrangement.
    pub fn with_fallback(primary: Arc<dyn EngineControl>, fallback: Arc<dyn EngineControl>) -> Self {
        Self::new(vec![primary, fallback])
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub async fn reload(&self, scope: ReloadScope) -> ReloadOutcome {
        let _guard = self.locks[scope.index()].lock().await;

        if self.backends.is_empty() {
            warn!(%scope, "no reload backend configured");
            return ReloadOutcome::failed(scope, "no reload backend configured".to_string());
        }

        let mut errors = Vec::new();
        for backend in &self.backends {
            match backend.reload(scope).await {
                Ok(output) => {
                    if !errors.is_empty() {
                        info!(%scope, via = backend.name(), "reload succeeded on fallback");
                    }
                    return ReloadOutcome::succeeded(scope, backend.name(), output);
                }
                Err(e) => {
                    warn!(%scope, backend = backend.name(), error = %e, "reload attempt failed");
                    errors.push(format!("{}: {}", backend.name(), e));
                }
            }
        }

        ReloadOutcome::failed(scope, errors.join("; "))
    }
}
