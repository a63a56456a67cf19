use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use ballast_crypto::chash160;
use ballast_types::{Address, DataFeedPredicate, Definition, MciBound, SeenPredicate, UnitHash};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::records::{DataFeedEntry, DefinitionChange, SeenOutput, StoredDefinition, UnitStatus};
use crate::traits::LedgerStore;

/// The only `seen` target the in-memory store can answer.
const SEEN_OUTPUT: &str = "output";

#[derive(Default)]
struct Tables {
    definitions: HashMap<Address, StoredDefinition>,
    changes: HashMap<Address, Vec<DefinitionChange>>,
    units: HashMap<UnitHash, UnitStatus>,
    outputs: Vec<SeenOutput>,
    feeds: Vec<DataFeedEntry>,
}

/// In-memory, HashMap-based ledger store.
///
/// Intended for tests and embedding. All tables live behind one `RwLock`,
/// rows are cloned on read.
pub struct InMemoryLedgerStore {
    tables: RwLock<Tables>,
}

impl InMemoryLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Store a definition under its chash and return the chash.
    ///
    /// Storing the same definition twice keeps the earliest reveal MCI.
    pub fn insert_definition(
        &self,
        definition: Definition,
        mci: Option<u64>,
    ) -> StoreResult<Address> {
        let chash =
            chash160(&definition).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut tables = self.tables.write().expect("lock poisoned");
        tables
            .definitions
            .entry(chash.clone())
            .and_modify(|stored| {
                stored.mci = match (stored.mci, mci) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    _ => None,
                }
            })
            .or_insert(StoredDefinition { definition, mci });
        debug!(chash = %chash, "stored definition");
        Ok(chash)
    }

    /// Record a stable definition change. The carrying unit is marked stable
    /// and accepted unless its status is already known.
    pub fn insert_definition_change(&self, change: DefinitionChange) {
        let mut tables = self.tables.write().expect("lock poisoned");
        tables
            .units
            .entry(change.unit.clone())
            .or_insert(UnitStatus::stable(change.mci));
        tables
            .changes
            .entry(change.address.clone())
            .or_default()
            .push(change);
    }

    /// Set the stability state of a unit.
    pub fn set_unit_status(&self, unit: UnitHash, status: UnitStatus) {
        self.tables
            .write()
            .expect("lock poisoned")
            .units
            .insert(unit, status);
    }

    /// Record a payment output visible to `seen` predicates.
    pub fn insert_output(&self, output: SeenOutput) {
        self.tables
            .write()
            .expect("lock poisoned")
            .outputs
            .push(output);
    }

    /// Record an oracle post visible to `in data feed` predicates.
    pub fn insert_data_feed(&self, entry: DataFeedEntry) {
        self.tables.write().expect("lock poisoned").feeds.push(entry);
    }

    /// Number of stored definitions.
    pub fn definition_count(&self) -> usize {
        self.tables.read().expect("lock poisoned").definitions.len()
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore for InMemoryLedgerStore {
    fn definition(&self, chash: &Address) -> StoreResult<Option<Definition>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables
            .definitions
            .get(chash)
            .map(|stored| stored.definition.clone()))
    }

    fn definition_at(
        &self,
        chash: &Address,
        max_stable_mci: MciBound,
    ) -> StoreResult<Option<Definition>> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables
            .definitions
            .get(chash)
            .filter(|stored| stored.mci.map_or(true, |mci| max_stable_mci.admits(mci)))
            .map(|stored| stored.definition.clone()))
    }

    fn definition_change_for_address(
        &self,
        address: &Address,
        max_stable_mci: MciBound,
    ) -> StoreResult<Option<Address>> {
        let tables = self.tables.read().expect("lock poisoned");
        let Some(changes) = tables.changes.get(address) else {
            return Ok(None);
        };
        Ok(changes
            .iter()
            .filter(|c| max_stable_mci.admits(c.mci))
            .filter(|c| {
                tables
                    .units
                    .get(&c.unit)
                    .is_some_and(|s| s.is_stable && s.is_accepted)
            })
            .max_by_key(|c| c.mci)
            .map(|c| c.definition_chash.clone()))
    }

    fn is_unit_stable_and_accepted(&self, unit: &UnitHash) -> StoreResult<bool> {
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables
            .units
            .get(unit)
            .is_some_and(|s| s.is_stable && s.is_accepted))
    }

    fn evaluate_seen_predicate(&self, predicate: &SeenPredicate) -> StoreResult<bool> {
        if predicate.what != SEEN_OUTPUT {
            return Err(StoreError::UnsupportedPredicate(format!(
                "seen {}",
                predicate.what
            )));
        }
        if let Some(field) = predicate.extra.keys().next() {
            return Err(StoreError::UnsupportedPredicate(format!(
                "seen filter {field}"
            )));
        }
        let tables = self.tables.read().expect("lock poisoned");
        Ok(tables.outputs.iter().any(|o| {
            o.address == predicate.address
                && o.asset == predicate.asset
                && predicate.amount.map_or(true, |amount| o.amount == amount)
        }))
    }

    fn evaluate_data_feed_predicate(&self, predicate: &DataFeedPredicate) -> StoreResult<bool> {
        let tables = self.tables.read().expect("lock poisoned");
        for entry in &tables.feeds {
            if entry.feed_name != predicate.feed_name
                || !predicate.oracles.contains(&entry.oracle)
                || predicate.min_mci.is_some_and(|min| entry.mci < min)
            {
                continue;
            }
            if relation_holds(&entry.value, &predicate.relation, &predicate.value)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Compare a posted value against the predicate's value. Numbers compare
/// numerically and strings lexically; mixed types are only ever unequal.
fn relation_holds(posted: &Value, relation: &str, expected: &Value) -> StoreResult<bool> {
    let ordering = match (posted, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    let holds = match relation {
        "=" => ordering == Some(Ordering::Equal),
        "!=" => ordering != Some(Ordering::Equal),
        ">" => ordering == Some(Ordering::Greater),
        ">=" => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        "<" => ordering == Some(Ordering::Less),
        "<=" => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        other => {
            return Err(StoreError::UnsupportedPredicate(format!(
                "relation {other}"
            )))
        }
    };
    Ok(holds)
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read().expect("lock poisoned");
        f.debug_struct("InMemoryLedgerStore")
            .field("definitions", &tables.definitions.len())
            .field("units", &tables.units.len())
            .finish()
    }
}
