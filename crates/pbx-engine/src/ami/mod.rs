//! Management protocol (AMI) backend
//!
//! Each operation opens a connection, logs in, performs one action and logs
//! off. Reloads are rare and short, so there is no connection to keep alive
//! or reconnect.

mod message;
mod session;

pub use message::AmiMessage;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::control::{EndpointDetail, EndpointStatus, EngineControl, EngineQuery};
use crate::error::{Error, Result};
use crate::scope::ReloadScope;
use session::AmiSession;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5038
}

fn default_timeout_secs() -> u64 {
    5
}

/// Connection settings for the management interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    pub secret: String,
    /// Limit for each connect, read and write step.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AmiConfig {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: username.into(),
            secret: secret.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Management protocol client.
#[derive(Debug, Clone)]
pub struct AmiClient {
    config: AmiConfig,
}

impl AmiClient {
    pub fn new(config: AmiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AmiConfig {
        &self.config
    }
}

fn parse_contacts(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl EngineControl for AmiClient {
    fn name(&self) -> &str {
        "ami"
    }

    async fn reload(&self, scope: ReloadScope) -> Result<String> {
        let mut session = AmiSession::open(&self.config).await?;

        let mut action = AmiMessage::action("Reload");
        if let Some(module) = scope.ami_module() {
            action = action.with("Module", module);
        }
        let response = session.request(action).await?;
        session.logoff().await;

        if !response.is_success() {
            return Err(Error::CommandFailed {
                command: format!("Reload {}", scope.ami_module().unwrap_or("all")),
                message: response.message().to_string(),
            });
        }

        let message = match response.message() {
            "" => format!("{} reload requested", scope),
            text => text.to_string(),
        };
        info!(%scope, response = %message, "engine reloaded through management interface");
        Ok(message)
    }
}

#[async_trait]
impl EngineQuery for AmiClient {
    async fn list_endpoints(&self) -> Result<Vec<EndpointStatus>> {
        let mut session = AmiSession::open(&self.config).await?;
        let (response, events) = session
            .collect(AmiMessage::action("PJSIPShowEndpoints"), "EndpointListComplete")
            .await?;
        session.logoff().await;

        if !response.is_success() {
            // The engine answers an empty endpoint list with an error
            if response.message().to_lowercase().contains("no endpoints") {
                return Ok(Vec::new());
            }
            return Err(Error::CommandFailed {
                command: "PJSIPShowEndpoints".to_string(),
                message: response.message().to_string(),
            });
        }

        let endpoints: Vec<_> = events
            .iter()
            .filter(|e| e.event() == Some("EndpointList"))
            .filter_map(|e| {
                let name = e.get("ObjectName")?;
                Some(EndpointStatus {
                    name: name.to_string(),
                    state: e.get("DeviceState").unwrap_or("Unknown").to_string(),
                    contacts: parse_contacts(e.get("Contacts").unwrap_or_default()),
                })
            })
            .collect();
        debug!(count = endpoints.len(), "listed endpoints");
        Ok(endpoints)
    }

    async fn endpoint_detail(&self, name: &str) -> Result<Option<EndpointDetail>> {
        let mut session = AmiSession::open(&self.config).await?;
        let action = AmiMessage::action("PJSIPShowEndpoint").with("Endpoint", name);
        let (response, events) = session.collect(action, "EndpointDetailComplete").await?;
        session.logoff().await;

        if !response.is_success() {
            debug!(endpoint = name, message = response.message(), "endpoint not known to engine");
            return Ok(None);
        }

        let mut detail = EndpointDetail {
            name: name.to_string(),
            fields: Vec::new(),
            contacts: Vec::new(),
        };
        for event in &events {
            match event.event() {
                Some("EndpointDetail") => {
                    detail.fields = event
                        .headers()
                        .iter()
                        .filter(|(k, _)| k != "Event" && k != "ActionID")
                        .cloned()
                        .collect();
                }
                Some("ContactStatusDetail") => {
                    if let Some(uri) = event.get("URI") {
                        detail.contacts.push(uri.to_string());
                    }
                }
                _ => {}
            }
        }
        Ok(Some(detail))
    }
}
