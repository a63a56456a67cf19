//! Address definitions for Ballast.
//!
//! An address is the chash of a definition, a small boolean expression tree
//! over signatures and ledger predicates. This crate evaluates a definition
//! against an author's authentifiers ([`DefinitionEngine`]) and finds the
//! definition currently in force for an address ([`DefinitionResolver`]).
//!
//! # Authentifier paths
//!
//! Signatures are looked up by their position in the tree. The root is `"r"`
//! and child `i` of an `and`/`or` node at path `p` is `"p.i"`. A `not` node
//! evaluates its child at its own path.

pub mod engine;
pub mod error;
pub mod resolver;

pub use engine::{child_path, DefinitionEngine};
pub use error::{DefinitionError, DefinitionResult};
pub use resolver::{DefinitionResolver, ResolvedDefinition, SharedDefinitionCache};
