//! Rows held by the in-memory ledger store.

use ballast_types::{Address, Definition, UnitHash};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A definition revealed on the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDefinition {
    pub definition: Definition,
    /// MCI of the stable unit that first revealed it. `None` for definitions
    /// known out of band (e.g. shipped with the client).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mci: Option<u64>,
}

/// An `address_definition_change` that has become stable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionChange {
    pub address: Address,
    pub definition_chash: Address,
    pub unit: UnitHash,
    pub mci: u64,
}

/// Stability state of a unit known to the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitStatus {
    /// Main chain index, once assigned.
    pub mci: Option<u64>,
    pub is_stable: bool,
    /// `false` for units that lost a double-spend and were voided.
    pub is_accepted: bool,
}

impl UnitStatus {
    pub fn stable(mci: u64) -> Self {
        Self {
            mci: Some(mci),
            is_stable: true,
            is_accepted: true,
        }
    }
}

/// A payment output, as far as `seen` predicates can observe it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenOutput {
    pub address: String,
    /// `None` for the base currency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<String>,
    pub amount: u64,
    pub mci: u64,
}

/// A value posted by an oracle under a feed name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataFeedEntry {
    pub oracle: Address,
    pub feed_name: String,
    pub value: Value,
    pub mci: u64,
}
