//! Section state machine
//!
//! Each header moves the machine into the state for its section type, bound
//! to the identity the header names. Key/value lines are then routed to
//! that identity's record through a per-state key table. A `type=` line that
//! disagrees with the header's role drops the machine into `Ignored` until
//! the next header.

use std::collections::BTreeMap;

use pbx_config::{Pair, Section};
use pbx_model::{is_extension_number, is_trunk_name};
use tracing::trace;

use super::record::RawEndpoint;

/// Which identities a scan collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentityKind {
    Extension,
    Trunk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Before the first header.
    None,
    Endpoint,
    Auth,
    Aor,
    Identify,
    /// Inside a section that belongs to nobody we track.
    Ignored,
}

impl State {
    fn expected_type(&self) -> Option<&'static str> {
        match self {
            State::Endpoint => Some("endpoint"),
            State::Auth => Some("auth"),
            State::Aor => Some("aor"),
            State::Identify => Some("identify"),
            State::None | State::Ignored => None,
        }
    }
}

/// Classify a header into a state and the identity it belongs to.
fn classify_header(kind: IdentityKind, section: &Section) -> (State, Option<String>) {
    // Templates carry `(!)` and never define a concrete endpoint
    if section.options.as_deref().is_some_and(|o| o.contains('!')) {
        return (State::Ignored, None);
    }

    let name = section.name.as_str();
    let (state, base) = if let Some(base) = name.strip_suffix("-auth") {
        (State::Auth, base)
    } else if let Some(base) = name.strip_suffix("-aor") {
        (State::Aor, base)
    } else if let Some(base) = name.strip_suffix("-identify") {
        (State::Identify, base)
    } else {
        (State::Endpoint, name)
    };

    let owned = match kind {
        IdentityKind::Extension => is_extension_number(base) && state != State::Identify,
        IdentityKind::Trunk => is_trunk_name(base),
    };
    if owned {
        (state, Some(base.to_string()))
    } else {
        (State::Ignored, None)
    }
}

/// Walk `text` and collect one raw record per identity seen.
///
/// Extensions are reported whenever at least one of their sections was
/// accepted. Any section name could be a trunk name, so a trunk is reported
/// only once an endpoint section confirmed it with `type=endpoint` and the
/// record carries trunk evidence (an aor `contact`, `outbound_auth` or
/// `from_domain`). A plain endpoint such as `[anonymous]` is not a trunk.
pub(crate) fn scan(text: &str, kind: IdentityKind) -> BTreeMap<String, RawEndpoint> {
    let mut records: BTreeMap<String, RawEndpoint> = BTreeMap::new();
    let mut state = State::None;
    let mut identity: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        if let Some(section) = Section::parse_header(trimmed) {
            (state, identity) = classify_header(kind, &section);
            if let Some(id) = &identity {
                records.entry(id.clone()).or_default().sections += 1;
            }
            continue;
        }

        let Some(id) = identity.as_deref() else {
            continue;
        };
        let Some(pair) = Pair::parse_line(trimmed) else {
            trace!(line = trimmed, "skipping malformed line");
            continue;
        };
        let key = pair.key.to_lowercase();
        let value = pair.value.trim();
        let record = records.entry(id.to_string()).or_default();

        if key == "type" {
            if state.expected_type().is_some_and(|t| t.eq_ignore_ascii_case(value)) {
                if state == State::Endpoint {
                    record.confirmed = true;
                }
            } else {
                trace!(identity = id, found = value, "section type contradicts header");
                record.rejected += 1;
                state = State::Ignored;
                identity = None;
            }
            continue;
        }

        match state {
            State::Endpoint => record.apply_endpoint(&key, value),
            State::Auth => record.apply_auth(&key, value),
            State::Aor => record.apply_aor(&key, value),
            State::Identify => record.apply_identify(&key, value),
            State::None | State::Ignored => {}
        }
    }

    records.retain(|_, raw| match kind {
        IdentityKind::Extension => raw.sections > raw.rejected,
        IdentityKind::Trunk => raw.confirmed && raw.has_trunk_evidence(),
    });
    records
}
