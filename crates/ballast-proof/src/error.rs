use std::fmt;

use ballast_crypto::CanonicalError;
use ballast_definition::DefinitionError;
use ballast_store::StoreError;
use ballast_types::{Address, BallHash, Base64Hash, UnitHash};

/// Which hash of a record failed to reproduce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashKind {
    Unit,
    /// Ball of the ball-chain record at this index.
    Ball { record: usize },
    /// Inline payload of the message at this index.
    Payload { message: usize },
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit => write!(f, "unit"),
            Self::Ball { record } => write!(f, "ball (record {record})"),
            Self::Payload { message } => write!(f, "payload (message {message})"),
        }
    }
}

/// Terminal failure of a proof verification.
///
/// Every variant aborts the whole batch. Variants name the unit (or ball)
/// at fault wherever one exists.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("malformed witness set: {reason}")]
    MalformedWitnessSet { reason: String },

    #[error("{kind} hash mismatch for {unit}: computed {computed}")]
    HashMismatch {
        unit: UnitHash,
        kind: HashKind,
        computed: Base64Hash,
    },

    #[error("broken linkage at {unit}: {reason}")]
    BrokenLinkage { unit: UnitHash, reason: String },

    #[error("conflicting last ball for {unit}: {first} and {second}")]
    ConflictingCheckpoint {
        unit: UnitHash,
        first: BallHash,
        second: BallHash,
    },

    #[error("definition of {address} in {unit} hashes to {computed}, expected {expected}")]
    ChashMismatch {
        unit: UnitHash,
        address: Address,
        expected: Address,
        computed: Address,
    },

    #[error("unit {unit} carries neither a witness definition nor a definition change")]
    MissingDefinitionOrChange { unit: UnitHash },

    #[error("invalid signature by {address} in {unit}")]
    InvalidSignature { unit: UnitHash, address: Address },

    #[error("no definition known for {address} (chash {chash}) in {unit}")]
    UnresolvedDefinition {
        unit: UnitHash,
        address: Address,
        chash: Address,
    },

    #[error("ledger lookup for {key} failed")]
    DefinitionResolutionFailed {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("could not seed definition of witness {address}")]
    SeedFailed {
        address: Address,
        #[source]
        source: DefinitionError,
    },

    #[error("only {found} distinct witnesses found, {required} required")]
    InsufficientWitnessMajority { found: usize, required: usize },

    #[error("witness majority reached but no joint after it references a last ball")]
    NoCheckpoint,

    #[error("unstable main chain unit {unit} already has a ball")]
    UnexpectedBall { unit: UnitHash },

    #[error("definition or change unit {unit} has no ball")]
    MissingBall { unit: UnitHash },

    #[error("unit {unit} is not authored by any witness")]
    NotAuthoredByWitness { unit: UnitHash },

    #[error("malformed address definition change in {unit}: {reason}")]
    MalformedDefinitionChange { unit: UnitHash, reason: String },

    #[error("ball {ball} of {unit} is not proven by the ball chain")]
    UnprovenBall { unit: UnitHash, ball: BallHash },

    #[error("malformed joint {unit}: {reason}")]
    MalformedJoint { unit: UnitHash, reason: String },

    #[error("definition error in {unit}")]
    Definition {
        unit: UnitHash,
        #[source]
        source: DefinitionError,
    },

    #[error("cannot hash {unit}")]
    Canonical {
        unit: UnitHash,
        #[source]
        source: CanonicalError,
    },
}

/// Result alias for proof operations.
pub type ProofResult<T> = Result<T, ProofError>;

impl ProofError {
    /// The unit the failure is attributed to, if any.
    pub fn unit(&self) -> Option<&UnitHash> {
        match self {
            Self::HashMismatch { unit, .. }
            | Self::BrokenLinkage { unit, .. }
            | Self::ConflictingCheckpoint { unit, .. }
            | Self::ChashMismatch { unit, .. }
            | Self::MissingDefinitionOrChange { unit }
            | Self::InvalidSignature { unit, .. }
            | Self::UnresolvedDefinition { unit, .. }
            | Self::UnexpectedBall { unit }
            | Self::MissingBall { unit }
            | Self::NotAuthoredByWitness { unit }
            | Self::MalformedDefinitionChange { unit, .. }
            | Self::UnprovenBall { unit, .. }
            | Self::MalformedJoint { unit, .. }
            | Self::Definition { unit, .. }
            | Self::Canonical { unit, .. } => Some(unit),
            Self::MalformedWitnessSet { .. }
            | Self::DefinitionResolutionFailed { .. }
            | Self::SeedFailed { .. }
            | Self::InsufficientWitnessMajority { .. }
            | Self::NoCheckpoint => None,
        }
    }

    /// Attribute a definition failure to `unit`.
    pub(crate) fn from_definition(unit: &UnitHash, err: DefinitionError) -> Self {
        match err {
            DefinitionError::InvalidSignature { address } => Self::InvalidSignature {
                unit: unit.clone(),
                address,
            },
            DefinitionError::Lookup { key, source } => Self::DefinitionResolutionFailed {
                key: key.to_string(),
                source,
            },
            DefinitionError::Canonical(source) => Self::Canonical {
                unit: unit.clone(),
                source,
            },
            other => Self::Definition {
                unit: unit.clone(),
                source: other,
            },
        }
    }
}
