//! Foundation types for Ballast, the verification core of a DAG ledger light client.
//!
//! Every other Ballast crate depends on `ballast-types`. The types here mirror
//! the ledger's wire format field-for-field so that canonical hashing over
//! their JSON form reproduces the hashes computed by full nodes.
//!
//! # Key Types
//!
//! - [`Base64Hash`]: SHA-256 content hash in base64 text form ([`UnitHash`], [`BallHash`])
//! - [`Address`]: 32-character base32 checksummed definition hash
//! - [`Unit`]: Immutable, content-addressed ledger record
//! - [`Joint`]: A unit plus its optional ball
//! - [`BallRecord`]: One link of a ball-chain proof
//! - [`Definition`]: Address definition expression tree
//! - [`MciBound`]: Upper bound on main chain index for stable lookups

pub mod address;
pub mod definition;
pub mod error;
pub mod hash;
pub mod joint;
pub mod mci;
pub mod unit;

pub use address::Address;
pub use definition::{DataFeedPredicate, Definition, SeenPredicate, SigDefinition};
pub use error::TypeError;
pub use hash::{BallHash, Base64Hash, UnitHash};
pub use joint::{BallRecord, Joint};
pub use mci::MciBound;
pub use unit::{Author, Message, Unit, APP_ADDRESS_DEFINITION_CHANGE};

/// Number of witnesses every unit's witness list must contain.
pub const COUNT_WITNESSES: usize = 12;

/// Distinct witnesses required for a majority (strictly more than half).
pub const MAJORITY_OF_WITNESSES: usize = COUNT_WITNESSES / 2 + 1;

/// Authentifier path of the root of an address definition.
pub const ROOT_AUTHENTIFIER_PATH: &str = "r";
