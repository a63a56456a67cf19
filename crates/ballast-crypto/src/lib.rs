//! Cryptographic primitives for Ballast.
//!
//! Provides the canonical source-string encoding every ledger hash is built
//! on, unit identity and signing hashes, ball hashes, 160-bit checksummed
//! address hashes (chash), and secp256k1 signature verification.
//!
//! All primitives wrap established libraries.

pub mod ball;
pub mod canonical;
pub mod chash;
pub mod signer;
pub mod unit;

pub use ball::BallHasher;
pub use canonical::{
    base64_hash, digest_to_base64, sha256, source_string, CanonicalError, CanonicalResult,
};
pub use chash::{chash160, chash160_of_value, is_valid_chash};
pub use signer::{verify_base64, Signature, SignatureError, SigningKey, VerifyingKey};
pub use unit::UnitHasher;
