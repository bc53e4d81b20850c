//! Database-side entities

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::CodecList;
use crate::defaults;
use crate::secret::hash_secret;
use crate::transport::Transport;

/// Kind of a reconciled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Extension,
    Trunk,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Extension => write!(f, "extension"),
            EntityKind::Trunk => write!(f, "trunk"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_extension_context() -> String {
    defaults::EXTENSION_CONTEXT.to_string()
}

fn default_trunk_context() -> String {
    defaults::TRUNK_CONTEXT.to_string()
}

fn default_max_contacts() -> u32 {
    defaults::MAX_CONTACTS
}

fn default_qualify_frequency() -> u32 {
    defaults::QUALIFY_FREQUENCY
}

fn default_trunk_port() -> u16 {
    defaults::TRUNK_PORT
}

fn default_trunk_priority() -> u32 {
    defaults::TRUNK_PRIORITY
}

fn default_rule_priority() -> u32 {
    defaults::RULE_PRIORITY
}

/// A SIP endpoint for a local phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Digits only; doubles as the engine section name.
    pub number: String,
    #[serde(default)]
    pub name: String,
    /// SHA-256 hex digest of the SIP password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_hash: Option<String>,
    #[serde(default = "default_extension_context")]
    pub context: String,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "CodecList::extension_default")]
    pub codecs: CodecList,
    #[serde(default = "default_max_contacts")]
    pub max_contacts: u32,
    #[serde(default = "default_qualify_frequency")]
    pub qualify_frequency: u32,
    #[serde(default)]
    pub direct_media: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Extension {
    /// A new extension with every optional field at its default.
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: number.into(),
            name: name.into(),
            secret_hash: None,
            context: default_extension_context(),
            transport: Transport::default(),
            codecs: CodecList::extension_default(),
            max_contacts: defaults::MAX_CONTACTS,
            qualify_frequency: defaults::QUALIFY_FREQUENCY,
            direct_media: false,
            enabled: true,
        }
    }

    /// Store the hash of `plaintext` as the secret.
    pub fn with_secret(mut self, plaintext: &str) -> Self {
        self.secret_hash = Some(hash_secret(plaintext));
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// An upstream SIP peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trunk {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub host: String,
    #[serde(default = "default_trunk_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Plaintext; the engine needs it to authenticate upstream.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default = "CodecList::trunk_default")]
    pub codecs: CodecList,
    #[serde(default = "default_trunk_context")]
    pub context: String,
    #[serde(default = "default_trunk_priority")]
    pub priority: u32,
    #[serde(default)]
    pub dial_prefix: String,
    #[serde(default)]
    pub strip_digits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_channels: Option<u32>,
    /// Emit an identify section matching inbound traffic by source host.
    #[serde(default = "default_true")]
    pub match_inbound: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Trunk {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            host: host.into(),
            port: defaults::TRUNK_PORT,
            username: None,
            password: None,
            transport: Transport::default(),
            codecs: CodecList::trunk_default(),
            context: default_trunk_context(),
            priority: defaults::TRUNK_PRIORITY,
            dial_prefix: String::new(),
            strip_digits: 0,
            max_channels: None,
            match_inbound: true,
            enabled: true,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Whether an auth section is generated for this trunk.
    pub fn has_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// One line of call-routing logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialplanRule {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    pub context: String,
    pub pattern: String,
    #[serde(default = "default_rule_priority")]
    pub priority: u32,
    pub application: String,
    #[serde(default)]
    pub arguments: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Classification tag; does not affect rendering beyond the comment.
    #[serde(default)]
    pub rule_type: String,
    #[serde(default)]
    pub description: String,
    /// Ordering key within a context, independent of `priority`.
    #[serde(default)]
    pub sort_order: i32,
}

impl DialplanRule {
    pub fn new(
        name: impl Into<String>,
        context: impl Into<String>,
        pattern: impl Into<String>,
        application: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            context: context.into(),
            pattern: pattern.into(),
            priority: defaults::RULE_PRIORITY,
            application: application.into(),
            arguments: arguments.into(),
            enabled: true,
            rule_type: String::new(),
            description: String::new(),
            sort_order: 0,
        }
    }

    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extension_defaults() {
        let ext = Extension::new("1001", "Ann");
        assert_eq!(ext.context, "from-internal");
        assert_eq!(ext.transport, Transport::Udp);
        assert_eq!(ext.codecs.to_string(), "ulaw,alaw,g722");
        assert_eq!(ext.max_contacts, 1);
        assert_eq!(ext.qualify_frequency, 60);
        assert!(!ext.direct_media);
        assert!(ext.enabled);
        assert!(ext.secret_hash.is_none());
    }

    #[test]
    fn test_with_secret_stores_hash_only() {
        let ext = Extension::new("1001", "Ann").with_secret("correcthorse");
        let hash = ext.secret_hash.unwrap();
        assert!(hash.starts_with("sha256$"));
        assert!(!hash.contains("correcthorse"));
        assert!(crate::secret_matches("correcthorse", &hash));
    }

    #[test]
    fn test_extension_deserializes_with_defaults() {
        let ext: Extension = toml::from_str("number = \"1001\"").unwrap();
        assert_eq!(ext.context, "from-internal");
        assert_eq!(ext.codecs, CodecList::extension_default());
        assert!(ext.enabled);
    }

    #[test]
    fn test_trunk_defaults() {
        let trunk = Trunk::new("carrier", "sip.example.net");
        assert_eq!(trunk.port, 5060);
        assert_eq!(trunk.context, "from-trunk");
        assert_eq!(trunk.priority, 10);
        assert_eq!(trunk.codecs.to_string(), "ulaw,alaw");
        assert!(trunk.match_inbound);
        assert!(!trunk.has_credentials());
        assert!(trunk.with_credentials("acct", "pw").has_credentials());
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::Extension.to_string(), "extension");
        assert_eq!(EntityKind::Trunk.to_string(), "trunk");
    }
}
