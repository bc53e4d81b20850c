//! Entity model for the PBX reconciler
//!
//! The database side of reconciliation: [`Extension`], [`Trunk`] and
//! [`DialplanRule`]. Field defaults live in [`defaults`] and are shared by
//! the config generator and the config parser, so an entity rendered with
//! defaults parses back to an equal record.

pub mod codec;
pub mod defaults;
pub mod entity;
pub mod error;
pub mod secret;
pub mod transport;
pub mod validate;

pub use codec::CodecList;
pub use entity::{DialplanRule, EntityKind, Extension, Trunk};
pub use error::ValidationError;
pub use secret::{hash_secret, hash_secret_with_salt, secret_matches};
pub use transport::Transport;
pub use validate::{Validate, is_extension_number, is_trunk_name, validate_secret};
