//! Engine configuration text from database entities
//!
//! Generation is pure and deterministic: the same entity always renders to
//! the same bytes, so rewriting an unchanged block is a no-op. Callers
//! validate entities first; nothing here fails.

mod dialplan;
mod extension;
mod trunk;

pub use dialplan::{render_dialplan, render_local_extensions, render_outbound_routes};
pub use extension::render_extension;
pub use trunk::render_trunk;

use pbx_config::Section;

/// Managed block holding the generated local dial targets.
pub const LOCAL_EXTENSIONS_LABEL: &str = "Local Extensions";

/// Managed block holding the generated outbound trunk routes.
pub const OUTBOUND_ROUTES_LABEL: &str = "Outbound Routes";

const EXTENSION_PREFIX: &str = "Extension ";
const TRUNK_PREFIX: &str = "Trunk ";
const DIALPLAN_PREFIX: &str = "Dialplan ";

pub fn extension_label(number: &str) -> String {
    format!("{}{}", EXTENSION_PREFIX, number)
}

pub fn trunk_label(name: &str) -> String {
    format!("{}{}", TRUNK_PREFIX, name)
}

pub fn dialplan_label(context: &str) -> String {
    format!("{}{}", DIALPLAN_PREFIX, context)
}

/// What a managed block label refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOwner {
    Extension(String),
    Trunk(String),
    Dialplan(String),
    LocalExtensions,
    OutboundRoutes,
    /// A block this program did not write.
    Foreign,
}

impl BlockOwner {
    pub fn from_label(label: &str) -> Self {
        if label == LOCAL_EXTENSIONS_LABEL {
            BlockOwner::LocalExtensions
        } else if label == OUTBOUND_ROUTES_LABEL {
            BlockOwner::OutboundRoutes
        } else if let Some(number) = label.strip_prefix(EXTENSION_PREFIX) {
            BlockOwner::Extension(number.to_string())
        } else if let Some(name) = label.strip_prefix(TRUNK_PREFIX) {
            BlockOwner::Trunk(name.to_string())
        } else if let Some(context) = label.strip_prefix(DIALPLAN_PREFIX) {
            BlockOwner::Dialplan(context.to_string())
        } else {
            BlockOwner::Foreign
        }
    }
}

/// Render sections separated by one blank line.
fn join_sections(sections: &[Section]) -> String {
    sections
        .iter()
        .map(Section::render)
        .collect::<Vec<_>>()
        .join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
