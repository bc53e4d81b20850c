//! Shared test utilities for the pbx-reconciler workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`pbx`]: [`pbx::TestPbx`], a temporary engine configuration directory
//! - [`engine`]: [`engine::RecordingEngine`], a reload backend that records
//!   what it was asked to do

pub mod engine;
pub mod pbx;

/// A hand-maintained endpoints file with no managed blocks.
pub const ADMIN_ENDPOINTS: &str = "\
; Administrator-maintained SIP configuration
[global]
type=global
user_agent=Office PBX

[transport-udp]
type=transport
protocol=udp
bind=0.0.0.0:5060
";

/// A hand-maintained dialplan with no managed blocks.
pub const ADMIN_DIALPLAN: &str = "\
[general]
static=yes
writeprotect=no

[globals]
OPERATOR=1000
";
