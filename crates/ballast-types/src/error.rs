use thiserror::Error;

/// Errors produced by type parsing and conversion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid base64 string: {0}")]
    InvalidBase64(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid address {0:?}: expected 32 base32 characters")]
    InvalidAddress(String),

    #[error("malformed definition: {0}")]
    MalformedDefinition(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
