//! Light client proof verification for Ballast.
//!
//! A light client holds no ledger history, yet must accept a full node's
//! word about which units are stable. It does so in two steps: a witness
//! proof shows that a majority of the 12 witnesses built on recent main
//! chain units, which yields trusted checkpoint balls; a ball chain then
//! extends that trust down to the balls of the units the client asked for.
//!
//! # Key Types
//!
//! - [`WitnessProofVerifier`]: majority walk, witness definition tracking and signature checks
//! - [`BallChainVerifier`]: ball records linked from a trusted set
//! - [`LightHistoryVerifier`]: both of the above over a [`LightHistory`]
//! - [`VerifierConfig`]: seeding mode, reference predicates, stable MCI bound
//! - [`ProofError`]: terminal failure naming the offending unit

pub mod ball_chain;
pub mod config;
pub mod error;
pub mod history;
mod integrity;
pub mod session;
pub mod witness;
pub mod witness_proof;

pub use ball_chain::{BallChainOutcome, BallChainVerifier};
pub use config::{ConfigError, SeedMode, VerifierConfig};
pub use error::{HashKind, ProofError, ProofResult};
pub use history::{HistoryOutcome, LightHistory, LightHistoryVerifier, VerifiedJoint};
pub use session::VerificationSession;
pub use witness::WitnessList;
pub use witness_proof::{WitnessProof, WitnessProofOutcome, WitnessProofVerifier};
