use thiserror::Error;

use crate::types::IdentifierKind;

/// A label, relationship type, or property name that cannot be placed in a
/// statement safely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid {kind} {value:?}: expected a non-empty name made of [A-Za-z0-9_]")]
pub struct ValidationError {
    pub kind: IdentifierKind,
    pub value: String,
}

/// A descriptor or setting that is structurally valid but cannot be upserted.
///
/// These are never retryable: rerunning the same input fails the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Node {label} is missing its unique property '{key}'")]
    MissingUniqueKey { label: String, key: String },

    #[error("Relationship {rel_type} has no identity properties for its {endpoint} node")]
    EmptyEndpointIdentity {
        rel_type: String,
        endpoint: &'static str,
    },

    #[error("Configured unique key is unusable: {0}")]
    InvalidUniqueKey(ValidationError),
}
