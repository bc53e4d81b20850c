//! Validation errors for pbx-model

/// An entity fails the preconditions for config generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Extension number '{0}' must contain only digits")]
    InvalidExtensionNumber(String),

    #[error("Trunk name '{name}' is invalid: {reason}")]
    InvalidTrunkName { name: String, reason: String },

    #[error("{entity} field '{field}' must not be empty")]
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Codec '{0}' is not a valid codec name")]
    InvalidCodec(String),

    #[error("Dialplan context '{0}' is invalid")]
    InvalidContext(String),

    #[error("Dialplan pattern '{0}' is invalid")]
    InvalidPattern(String),

    #[error("Dialplan application '{0}' is invalid")]
    InvalidApplication(String),

    #[error("Secret must be at least {min} characters")]
    WeakSecret { min: usize },

    #[error("Unknown transport '{0}'")]
    UnknownTransport(String),
}
