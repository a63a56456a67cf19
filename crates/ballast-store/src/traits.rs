use ballast_types::{Address, DataFeedPredicate, Definition, MciBound, SeenPredicate, UnitHash};

use crate::error::StoreResult;

/// Read-only query interface to the full ledger.
///
/// All implementations must satisfy these invariants:
/// - A definition stored under a chash hashes to that chash. Content
///   addressing makes the mapping immutable, so answers may be cached.
/// - Absence is reported as `Ok(None)` or `Ok(false)`, never as `Err`.
/// - Bounded lookups see only stable, accepted units at or below the bound.
pub trait LedgerStore: Send + Sync {
    /// Look up a definition by its chash, regardless of when it was revealed.
    fn definition(&self, chash: &Address) -> StoreResult<Option<Definition>>;

    /// Look up a definition revealed by a stable unit within `max_stable_mci`.
    ///
    /// Default implementation ignores the bound. Backends that track reveal
    /// MCIs should override it.
    fn definition_at(
        &self,
        chash: &Address,
        max_stable_mci: MciBound,
    ) -> StoreResult<Option<Definition>> {
        let _ = max_stable_mci;
        self.definition(chash)
    }

    /// The chash `address` was most recently moved to by a stable, accepted
    /// `address_definition_change` within `max_stable_mci`, if any.
    fn definition_change_for_address(
        &self,
        address: &Address,
        max_stable_mci: MciBound,
    ) -> StoreResult<Option<Address>>;

    /// Returns `true` if the unit is stable and was not voided.
    fn is_unit_stable_and_accepted(&self, unit: &UnitHash) -> StoreResult<bool>;

    /// Evaluate a `seen` predicate against stable history.
    fn evaluate_seen_predicate(&self, predicate: &SeenPredicate) -> StoreResult<bool>;

    /// Evaluate an `in data feed` predicate against stable oracle posts.
    fn evaluate_data_feed_predicate(&self, predicate: &DataFeedPredicate) -> StoreResult<bool>;
}
