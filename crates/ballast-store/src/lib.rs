//! Ledger store query boundary for Ballast.
//!
//! The verifiers never own ledger state. Everything they need from the full
//! DAG (stored definitions, definition changes, unit stability, and the
//! answers to `seen` / `in data feed` predicates) is asked through the
//! [`LedgerStore`] trait. Lookups are read-only and synchronous from the
//! caller's side; a backend may block on I/O underneath.
//!
//! # Backends
//!
//! - [`InMemoryLedgerStore`]: `HashMap`-based store for tests and embedding
//!
//! # Rules
//!
//! 1. "Not found" is `Ok(None)` / `Ok(false)`. `Err` always means the lookup
//!    itself failed, and callers must not treat it as absence.
//! 2. Stable lookups honor the supplied [`MciBound`](ballast_types::MciBound).
//! 3. The store never retries; retry policy belongs to the backend's owner.

pub mod error;
pub mod memory;
pub mod records;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryLedgerStore;
pub use records::{DataFeedEntry, DefinitionChange, SeenOutput, StoredDefinition, UnitStatus};
pub use traits::LedgerStore;
