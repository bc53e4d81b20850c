use pbx_config::Section;
use pbx_model::{Trunk, defaults};

use super::join_sections;

/// Endpoint, optional auth, aor and optional identify sections for a trunk.
pub fn render_trunk(trunk: &Trunk) -> String {
    let name = trunk.name.as_str();
    let mut sections = Vec::with_capacity(4);

    let mut endpoint = Section::new(name)
        .with("type", "endpoint")
        .with("context", &trunk.context)
        .with("disallow", "all");
    for codec in trunk.codecs.iter() {
        endpoint.push("allow", codec);
    }
    endpoint.push("transport", trunk.transport.section_name());
    if trunk.has_credentials() {
        endpoint.push("outbound_auth", format!("{}-auth", name));
    }
    endpoint.push("aors", format!("{}-aor", name));
    endpoint.push("from_domain", &trunk.host);
    if let Some(max) = trunk.max_channels {
        endpoint.push("device_state_busy_at", max.to_string());
    }
    sections.push(endpoint);

    if trunk.has_credentials() {
        let mut auth = Section::new(format!("{}-auth", name))
            .with("type", "auth")
            .with("auth_type", "userpass")
            .with("username", trunk.username.as_deref().unwrap_or_default());
        if let Some(password) = &trunk.password {
            auth.push("password", password);
        }
        sections.push(auth);
    }

    sections.push(
        Section::new(format!("{}-aor", name))
            .with("type", "aor")
            .with("contact", format!("sip:{}:{}", trunk.host, trunk.port))
            .with("qualify_frequency", defaults::QUALIFY_FREQUENCY.to_string()),
    );

    if trunk.match_inbound {
        sections.push(
            Section::new(format!("{}-identify", name))
                .with("type", "identify")
                .with("endpoint", name)
                .with("match", &trunk.host),
        );
    }

    join_sections(&sections)
}
