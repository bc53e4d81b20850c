//! Engine configuration back into normalized records
//!
//! The engine file is read with a line-oriented state machine (see
//! [`fsm`]) rather than the managed-block layer: sections written by hand
//! outside any block are exactly what an import needs to find. Parsing
//! never fails; unrecognized or malformed lines are skipped.

mod fsm;
mod record;

pub use record::{ExternalExtension, ExternalState, ExternalTrunk};

use fsm::{IdentityKind, scan};

/// Every extension defined in `text`, ordered by number.
pub fn parse_extensions(text: &str) -> Vec<ExternalExtension> {
    scan(text, IdentityKind::Extension)
        .into_iter()
        .map(|(number, raw)| raw.into_extension(number))
        .collect()
}

/// Every trunk defined in `text`, ordered by name.
pub fn parse_trunks(text: &str) -> Vec<ExternalTrunk> {
    scan(text, IdentityKind::Trunk)
        .into_iter()
        .map(|(name, raw)| raw.into_trunk(name))
        .collect()
}

/// Both entity kinds from one endpoints file.
pub fn parse_endpoints(text: &str) -> ExternalState {
    ExternalState {
        extensions: parse_extensions(text),
        trunks: parse_trunks(text),
    }
}
