//! Field defaults shared by generation, parsing and diffing

/// Dialplan context for extensions.
pub const EXTENSION_CONTEXT: &str = "from-internal";

/// Dialplan context for inbound trunk calls.
pub const TRUNK_CONTEXT: &str = "from-trunk";

pub const EXTENSION_CODECS: &[&str] = &["ulaw", "alaw", "g722"];

pub const TRUNK_CODECS: &[&str] = &["ulaw", "alaw"];

pub const MAX_CONTACTS: u32 = 1;

/// Seconds between OPTIONS keepalives.
pub const QUALIFY_FREQUENCY: u32 = 60;

pub const TRUNK_PORT: u16 = 5060;

/// Lower dials first.
pub const TRUNK_PRIORITY: u32 = 10;

/// Execution priority of a dialplan rule line.
pub const RULE_PRIORITY: u32 = 1;

/// Context holding the generated outbound routes.
pub const OUTBOUND_CONTEXT: &str = "outbound-routes";

/// Minimum length of a plaintext extension secret.
pub const MIN_SECRET_LEN: usize = 8;
