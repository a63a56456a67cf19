/// Errors from ledger store lookups.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not answer (connection lost, database locked, ...).
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),

    /// The backend does not support this predicate shape.
    #[error("unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
