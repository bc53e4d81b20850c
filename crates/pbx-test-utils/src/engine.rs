//! [`RecordingEngine`] reload backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pbx_engine::{EngineControl, Error, ReloadCoordinator, ReloadScope, Result};

/// Reload backend that records each requested scope and can be told to
/// fail.
#[derive(Default)]
pub struct RecordingEngine {
    scopes: Mutex<Vec<ReloadScope>>,
    failing: AtomicBool,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A coordinator whose only backend is `engine`.
    pub fn coordinator(engine: &Arc<Self>) -> Arc<ReloadCoordinator> {
        Arc::new(ReloadCoordinator::new(vec![
            Arc::clone(engine) as Arc<dyn EngineControl>
        ]))
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Scopes requested so far, in order.
    pub fn scopes(&self) -> Vec<ReloadScope> {
        self.scopes.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.scopes.lock().unwrap().clear();
    }
}

#[async_trait]
impl EngineControl for RecordingEngine {
    fn name(&self) -> &str {
        "recording"
    }

    async fn reload(&self, scope: ReloadScope) -> Result<String> {
        self.scopes.lock().unwrap().push(scope);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Protocol("engine is down".to_string()));
        }
        Ok(format!("{} reloaded", scope))
    }
}
