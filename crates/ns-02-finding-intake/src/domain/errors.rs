//! # Domain Errors
//!
//! Ways an inbound finding can fail to yield a block request.

use thiserror::Error;

/// Intake error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    /// Payload is not a JSON object of the expected shape.
    #[error("Malformed finding JSON: {0}")]
    MalformedJson(String),

    /// A required field is absent or blank.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// The remote address is not an IPv4 literal.
    #[error("Invalid host IP at {path}: {value:?}")]
    InvalidHostIp {
        /// Field the value was read from
        path: &'static str,
        /// Raw value
        value: String,
    },

    /// The event carries no usable finding type.
    #[error("Unsupported finding shape: {0}")]
    UnsupportedShape(String),
}

impl From<serde_json::Error> for IntakeError {
    fn from(err: serde_json::Error) -> Self {
        IntakeError::MalformedJson(err.to_string())
    }
}
