use ballast_crypto::CanonicalError;
use ballast_store::StoreError;
use ballast_types::Address;

/// Errors from definition evaluation and resolution.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    /// The authentifiers do not satisfy the definition.
    #[error("authentifiers of {address} do not satisfy its definition")]
    InvalidSignature { address: Address },

    /// An inline or stored definition does not hash to its claimed chash.
    #[error("definition claimed for {expected} hashes to {computed}")]
    ChashMismatch { expected: Address, computed: Address },

    #[error("unknown opcode {op:?} at {path}")]
    UnknownOpcode { op: String, path: String },

    /// Structurally parseable but not acceptable.
    #[error("invalid definition at {path}: {reason}")]
    InvalidDefinition { path: String, reason: String },

    /// A `seen` or `in data feed` node where no ledger may be consulted.
    #[error("{op} at {path} needs ledger references, which are not allowed here")]
    ReferencesNotAllowed { op: &'static str, path: String },

    /// The ledger could not answer a predicate. Never retried.
    #[error("{op} at {path} could not be evaluated")]
    OraclePredicateUnavailable {
        op: &'static str,
        path: String,
        #[source]
        source: StoreError,
    },

    /// No definition is known for this chash.
    #[error("no definition found for chash {chash}")]
    NotFound { chash: Address },

    /// A ledger lookup failed, as opposed to finding nothing.
    #[error("definition lookup for {key} failed")]
    Lookup {
        key: Address,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Canonical(#[from] CanonicalError),
}

/// Result alias for definition operations.
pub type DefinitionResult<T> = Result<T, DefinitionError>;
