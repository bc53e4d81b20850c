//! Generation preconditions
//!
//! Entities are validated before they reach the generator; generation itself
//! has no error path.

use std::sync::LazyLock;

use regex::Regex;

use crate::codec::CodecList;
use crate::defaults;
use crate::entity::{DialplanRule, Extension, Trunk};
use crate::error::ValidationError;

static EXTENSION_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+$").expect("Invalid regex"));

static TRUNK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_.\-]*$").expect("Invalid regex"));

static CODEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]+$").expect("Invalid regex"));

static DIAL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9*#+]*$").expect("Invalid regex"));

static APPLICATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("Invalid regex"));

/// Suffixes the generator appends to entity names for companion sections.
pub const RESERVED_SUFFIXES: &[&str] = &["-auth", "-aor", "-identify"];

/// Whether `name` is a valid extension number (and thus section name).
pub fn is_extension_number(name: &str) -> bool {
    EXTENSION_NUMBER.is_match(name)
}

/// Whether `name` is a valid trunk name.
pub fn is_trunk_name(name: &str) -> bool {
    TRUNK_NAME.is_match(name) && !RESERVED_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Check an entity against the generator's preconditions.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

fn validate_codecs(codecs: &CodecList) -> Result<(), ValidationError> {
    if codecs.is_empty() {
        return Err(ValidationError::EmptyField {
            entity: "codec list",
            field: "codecs",
        });
    }
    match codecs.iter().find(|c| !CODEC.is_match(c)) {
        Some(bad) => Err(ValidationError::InvalidCodec(bad.to_string())),
        None => Ok(()),
    }
}

fn validate_context(context: &str) -> Result<(), ValidationError> {
    if context.is_empty()
        || context.contains(char::is_whitespace)
        || context.contains(['[', ']', ';'])
    {
        return Err(ValidationError::InvalidContext(context.to_string()));
    }
    Ok(())
}

/// Check a plaintext secret before it is hashed.
pub fn validate_secret(plaintext: &str) -> Result<(), ValidationError> {
    if plaintext.chars().count() < defaults::MIN_SECRET_LEN {
        return Err(ValidationError::WeakSecret {
            min: defaults::MIN_SECRET_LEN,
        });
    }
    Ok(())
}

impl Validate for Extension {
    fn validate(&self) -> Result<(), ValidationError> {
        if !is_extension_number(&self.number) {
            return Err(ValidationError::InvalidExtensionNumber(self.number.clone()));
        }
        validate_context(&self.context)?;
        validate_codecs(&self.codecs)
    }
}

impl Validate for Trunk {
    fn validate(&self) -> Result<(), ValidationError> {
        if !TRUNK_NAME.is_match(&self.name) {
            return Err(ValidationError::InvalidTrunkName {
                name: self.name.clone(),
                reason: "must start with a letter and contain only letters, digits, '_', '.' or '-'"
                    .to_string(),
            });
        }
        if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| self.name.ends_with(*s)) {
            return Err(ValidationError::InvalidTrunkName {
                name: self.name.clone(),
                reason: format!("suffix '{}' is reserved", suffix),
            });
        }
        if self.host.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                entity: "trunk",
                field: "host",
            });
        }
        if !DIAL_PREFIX.is_match(&self.dial_prefix) {
            return Err(ValidationError::InvalidPattern(self.dial_prefix.clone()));
        }
        validate_context(&self.context)?;
        validate_codecs(&self.codecs)
    }
}

impl Validate for DialplanRule {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_context(&self.context)?;
        if self.pattern.is_empty() || self.pattern.contains(char::is_whitespace) {
            return Err(ValidationError::InvalidPattern(self.pattern.clone()));
        }
        if !APPLICATION.is_match(&self.application) {
            return Err(ValidationError::InvalidApplication(self.application.clone()));
        }
        Ok(())
    }
}
