//! Endpoint status with cached fallback
//!
//! A failed query never reaches the caller as an error: it degrades to the
//! last state seen, marked as cached, or to an unreachable report.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::control::{EndpointDetail, EndpointStatus, EngineQuery};

/// Freshness of a status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Availability {
    /// Answered by the engine just now.
    Live,
    /// The engine is unreachable; this is the last state seen.
    Cached { as_of: DateTime<Utc>, reason: String },
    /// The engine is unreachable and nothing is cached.
    Unreachable { reason: String },
}

impl Availability {
    pub fn is_live(&self) -> bool {
        matches!(self, Availability::Live)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointReport {
    pub availability: Availability,
    pub endpoints: Vec<EndpointStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailReport {
    pub availability: Availability,
    pub detail: Option<EndpointDetail>,
}

#[derive(Default)]
struct Cache {
    endpoints: Option<(DateTime<Utc>, Vec<EndpointStatus>)>,
    details: HashMap<String, (DateTime<Utc>, Option<EndpointDetail>)>,
}

/// Runtime status queries that survive engine outages.
pub struct StatusMonitor {
    query: Option<Arc<dyn EngineQuery>>,
    cache: Mutex<Cache>,
}

impl StatusMonitor {
    /// `None` means no query backend is configured; every report is
    /// unreachable.
    pub fn new(query: Option<Arc<dyn EngineQuery>>) -> Self {
        Self {
            query,
            cache: Mutex::new(Cache::default()),
        }
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn list_endpoints(&self) -> EndpointReport {
        let reason = match &self.query {
            None => "no management connection configured".to_string(),
            Some(query) => match query.list_endpoints().await {
                Ok(endpoints) => {
                    self.cache().endpoints = Some((Utc::now(), endpoints.clone()));
                    return EndpointReport {
                        availability: Availability::Live,
                        endpoints,
                    };
                }
                Err(e) => {
                    warn!(error = %e, "endpoint list unavailable");
                    e.to_string()
                }
            },
        };

        match self.cache().endpoints.clone() {
            Some((as_of, endpoints)) => EndpointReport {
                availability: Availability::Cached { as_of, reason },
                endpoints,
            },
            None => EndpointReport {
                availability: Availability::Unreachable { reason },
                endpoints: Vec::new(),
            },
        }
    }

    pub async fn endpoint_detail(&self, name: &str) -> DetailReport {
        let reason = match &self.query {
            None => "no management connection configured".to_string(),
            Some(query) => match query.endpoint_detail(name).await {
                Ok(detail) => {
                    self.cache()
                        .details
                        .insert(name.to_string(), (Utc::now(), detail.clone()));
                    return DetailReport {
                        availability: Availability::Live,
                        detail,
                    };
                }
                Err(e) => {
                    warn!(endpoint = name, error = %e, "endpoint detail unavailable");
                    e.to_string()
                }
            },
        };

        match self.cache().details.get(name).cloned() {
            Some((as_of, detail)) => DetailReport {
                availability: Availability::Cached { as_of, reason },
                detail,
            },
            None => DetailReport {
                availability: Availability::Unreachable { reason },
                detail: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Flaky {
        up: AtomicBool,
    }

    #[async_trait]
    impl EngineQuery for Flaky {
        async fn list_endpoints(&self) -> Result<Vec<EndpointStatus>> {
            if !self.up.load(Ordering::SeqCst) {
                return Err(Error::Protocol("connection closed by engine".to_string()));
            }
            Ok(vec![EndpointStatus {
                name: "1001".to_string(),
                state: "Not in use".to_string(),
                contacts: vec![],
            }])
        }

        async fn endpoint_detail(&self, name: &str) -> Result<Option<EndpointDetail>> {
            if !self.up.load(Ordering::SeqCst) {
                return Err(Error::Protocol("connection closed by engine".to_string()));
            }
            Ok(Some(EndpointDetail {
                name: name.to_string(),
                fields: vec![("Context".to_string(), "from-internal".to_string())],
                contacts: vec![],
            }))
        }
    }

    #[tokio::test]
    async fn test_live_then_cached() {
        let backend = Arc::new(Flaky { up: AtomicBool::new(true) });
        let monitor = StatusMonitor::new(Some(backend.clone() as Arc<dyn EngineQuery>));

        let live = monitor.list_endpoints().await;
        assert!(live.availability.is_live());
        assert_eq!(live.endpoints.len(), 1);

        backend.up.store(false, Ordering::SeqCst);
        let cached = monitor.list_endpoints().await;
        assert!(matches!(cached.availability, Availability::Cached { .. }));
        assert_eq!(cached.endpoints, live.endpoints);
    }

    #[tokio::test]
    async fn test_unreachable_without_cache() {
        let monitor = StatusMonitor::new(Some(Arc::new(Flaky {
            up: AtomicBool::new(false),
        }) as Arc<dyn EngineQuery>));

        let report = monitor.endpoint_detail("1001").await;

        assert!(matches!(report.availability, Availability::Unreachable { .. }));
        assert!(report.detail.is_none());
    }

    #[tokio::test]
    async fn test_detail_cache_is_per_endpoint() {
        let backend = Arc::new(Flaky { up: AtomicBool::new(true) });
        let monitor = StatusMonitor::new(Some(backend.clone() as Arc<dyn EngineQuery>));
        monitor.endpoint_detail("1001").await;
        backend.up.store(false, Ordering::SeqCst);

        let cached = monitor.endpoint_detail("1001").await;
        let unknown = monitor.endpoint_detail("1002").await;

        assert_eq!(cached.detail.unwrap().get("context"), Some("from-internal"));
        assert!(matches!(unknown.availability, Availability::Unreachable { .. }));
    }

    #[tokio::test]
    async fn test_no_backend_is_unreachable() {
        let report = StatusMonitor::new(None).list_endpoints().await;
        assert!(matches!(report.availability, Availability::Unreachable { .. }));
    }
}
