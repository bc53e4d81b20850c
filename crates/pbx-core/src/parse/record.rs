//! Normalized records read from the engine file

use serde::Serialize;

use pbx_model::{CodecList, Transport, defaults};
use tracing::debug;

/// An extension as the engine file defines it.
///
/// Fields absent from the file hold the same defaults the generator uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalExtension {
    pub number: String,
    /// From the `callerid` display name; `None` when the file has none.
    pub name: Option<String>,
    /// Plaintext from the auth section.
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub context: String,
    pub transport: Transport,
    pub codecs: CodecList,
    pub max_contacts: u32,
    pub qualify_frequency: u32,
    pub direct_media: bool,
}

/// A trunk as the engine file defines it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalTrunk {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub transport: Transport,
    pub codecs: CodecList,
    pub context: String,
    pub max_channels: Option<u32>,
    pub match_inbound: bool,
}

/// Everything parsed from the endpoints file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExternalState {
    pub extensions: Vec<ExternalExtension>,
    pub trunks: Vec<ExternalTrunk>,
}

impl ExternalState {
    pub fn extension(&self, number: &str) -> Option<&ExternalExtension> {
        self.extensions.iter().find(|e| e.number == number)
    }

    pub fn trunk(&self, name: &str) -> Option<&ExternalTrunk> {
        self.trunks.iter().find(|t| t.name == name)
    }
}

/// Accumulated values for one identity across its sections.
#[derive(Debug, Default)]
pub(crate) struct RawEndpoint {
    pub sections: u32,
    pub rejected: u32,
    /// An endpoint section declared `type=endpoint`.
    pub confirmed: bool,
    pub context: Option<String>,
    pub transport: Option<String>,
    pub codecs: Option<CodecList>,
    pub callerid: Option<String>,
    pub direct_media: Option<bool>,
    pub from_domain: Option<String>,
    pub outbound_auth: bool,
    pub busy_at: Option<u32>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub max_contacts: Option<u32>,
    pub qualify_frequency: Option<u32>,
    pub contact: Option<String>,
    pub identify_match: Option<String>,
    pub identified: bool,
}

impl RawEndpoint {
    pub fn apply_endpoint(&mut self, key: &str, value: &str) {
        match key {
            "context" => self.context = Some(value.to_string()),
            "transport" => self.transport = Some(value.to_string()),
            "disallow" if value.eq_ignore_ascii_case("all") => self.codecs = Some(CodecList::default()),
            "allow" => {
                let codecs = self.codecs.get_or_insert_with(CodecList::default);
                for codec in CodecList::from_csv(value).iter() {
                    if !codec.eq_ignore_ascii_case("all") {
                        codecs.push(codec.to_lowercase());
                    }
                }
            }
            "callerid" => self.callerid = Some(value.to_string()),
            "direct_media" => self.direct_media = parse_bool(value),
            "from_domain" => self.from_domain = Some(value.to_string()),
            "outbound_auth" => self.outbound_auth = !value.is_empty(),
            "device_state_busy_at" => self.busy_at = value.parse().ok(),
            _ => {}
        }
    }

    pub fn apply_auth(&mut self, key: &str, value: &str) {
        match key {
            "username" => self.username = Some(value.to_string()),
            "password" => self.password = Some(value.to_string()),
            _ => {}
        }
    }

    pub fn apply_aor(&mut self, key: &str, value: &str) {
        match key {
            "max_contacts" => self.max_contacts = value.parse().ok(),
            "qualify_frequency" => self.qualify_frequency = value.parse().ok(),
            "contact" => self.contact = Some(value.to_string()),
            _ => {}
        }
    }

    pub fn apply_identify(&mut self, key: &str, value: &str) {
        self.identified = true;
        if key == "match" {
            self.identify_match = Some(value.to_string());
        }
    }

    /// Something only an upstream peer carries: a contact to dial, an
    /// outbound credential or a `from_domain`.
    pub fn has_trunk_evidence(&self) -> bool {
        self.contact.is_some() || self.outbound_auth || self.from_domain.is_some()
    }

    fn transport(&self) -> Transport {
        match self.transport.as_deref().map(str::parse::<Transport>) {
            Some(Ok(transport)) => transport,
            Some(Err(e)) => {
                debug!(error = %e, "unrecognized transport, using default");
                Transport::default()
            }
            None => Transport::default(),
        }
    }

    pub fn into_extension(self, number: String) -> ExternalExtension {
        let transport = self.transport();
        ExternalExtension {
            name: self.callerid.as_deref().map(callerid_name),
            password: self.password,
            context: self
                .context
                .unwrap_or_else(|| defaults::EXTENSION_CONTEXT.to_string()),
            transport,
            codecs: self
                .codecs
                .filter(|c| !c.is_empty())
                .unwrap_or_else(CodecList::extension_default),
            max_contacts: self.max_contacts.unwrap_or(defaults::MAX_CONTACTS),
            qualify_frequency: self.qualify_frequency.unwrap_or(defaults::QUALIFY_FREQUENCY),
            direct_media: self.direct_media.unwrap_or(false),
            number,
        }
    }

    pub fn into_trunk(self, name: String) -> ExternalTrunk {
        let transport = self.transport();
        let (contact_host, contact_port) = match self.contact.as_deref().map(parse_contact) {
            Some((host, port)) => (Some(host), port),
            None => (None, None),
        };
        ExternalTrunk {
            host: contact_host
                .or(self.from_domain)
                .or(self.identify_match)
                .unwrap_or_default(),
            port: contact_port.unwrap_or(defaults::TRUNK_PORT),
            username: self.username,
            password: self.password,
            transport,
            codecs: self
                .codecs
                .filter(|c| !c.is_empty())
                .unwrap_or_else(CodecList::trunk_default),
            context: self
                .context
                .unwrap_or_else(|| defaults::TRUNK_CONTEXT.to_string()),
            max_channels: self.busy_at,
            match_inbound: self.identified,
            name,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "yes" | "true" | "on" | "1" => Some(true),
        "no" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

/// Display name from `"Name" <number>` or `Name <number>`.
fn callerid_name(value: &str) -> String {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix('"') {
        return rest.split('"').next().unwrap_or_default().to_string();
    }
    match value.find('<') {
        Some(i) => value[..i].trim().to_string(),
        None => value.to_string(),
    }
}

/// Host and port from `sip:[user@]host[:port][;params]`.
fn parse_contact(value: &str) -> (String, Option<u16>) {
    let rest = value
        .trim()
        .strip_prefix("sips:")
        .or_else(|| value.trim().strip_prefix("sip:"))
        .unwrap_or(value.trim());
    let rest = rest.split(';').next().unwrap_or_default();
    let rest = rest.rsplit_once('@').map(|(_, h)| h).unwrap_or(rest);
    match rest.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host.to_string(), Some(port)),
            Err(_) => (rest.to_string(), None),
        },
        None => (rest.to_string(), None),
    }
}
