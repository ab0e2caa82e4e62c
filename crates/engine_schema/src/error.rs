//! Schema error types.

use thiserror::Error;

use crate::field::FieldKind;

/// Errors raised while building, validating or reading a schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema JSON does not have the expected shape.
    #[error("invalid schema json: {0}")]
    Json(#[from] serde_json::Error),

    /// A field is misconfigured, or can never be resolved (circular or
    /// unsatisfiable condition).
    #[error("configuration error on field '{field}': {reason}")]
    Configuration { field: String, reason: String },

    /// A JSON value cannot be converted to the field's kind.
    #[error("expected a {kind} value, got {value}")]
    InvalidValue { kind: FieldKind, value: String },

    /// A condition literal or an undescribed record value is not a scalar.
    #[error("expected a scalar literal, got {0}")]
    InvalidLiteral(String),
}

impl SchemaError {
    pub(crate) fn configuration(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}
