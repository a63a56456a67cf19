use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::Address;
use crate::definition::Definition;
use crate::hash::{BallHash, Base64Hash, UnitHash};

/// App name of messages that move an address to a new definition.
pub const APP_ADDRESS_DEFINITION_CHANGE: &str = "address_definition_change";

/// An immutable, content-addressed ledger record.
///
/// Field names follow the wire format exactly. `headers_commission`,
/// `payload_commission`, `main_chain_index` and `timestamp` are assigned or
/// finalized after authoring and take no part in the unit's hash. Fields this
/// type does not model are kept in `extra` so that hashing still sees them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// The unit's own hash, which is also its identity.
    pub unit: UnitHash,
    pub version: String,
    pub alt: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parent_units: Vec<UnitHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ball: Option<BallHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_ball_unit: Option<UnitHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness_list_unit: Option<UnitHash>,
    /// Explicit witness list, only on units that do not reference one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub witnesses: Vec<Address>,
    pub authors: Vec<Author>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<Message>,
    /// Present only on units whose payloads were stripped after the fact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<Base64Hash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers_commission: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_commission: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_chain_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Unit {
    /// Returns `true` if the unit has no parents.
    pub fn is_genesis(&self) -> bool {
        self.parent_units.is_empty()
    }

    /// Author addresses in declaration order.
    pub fn author_addresses(&self) -> impl Iterator<Item = &Address> {
        self.authors.iter().map(|a| &a.address)
    }

    /// Returns `true` if `address` is among the unit's authors.
    pub fn is_authored_by(&self, address: &Address) -> bool {
        self.authors.iter().any(|a| &a.address == address)
    }

    /// The author entry for `address`, if any.
    pub fn author(&self, address: &Address) -> Option<&Author> {
        self.authors.iter().find(|a| &a.address == address)
    }

    /// Messages with the given app name.
    pub fn messages_of<'a>(&'a self, app: &'a str) -> impl Iterator<Item = &'a Message> {
        self.messages.iter().filter(move |m| m.app == app)
    }
}

/// One author of a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub address: Address,
    /// Signature values keyed by authentifier path (`"r"` for the root).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub authentifiers: BTreeMap<String, String>,
    /// Inline definition, present the first time an address (or a new
    /// definition of it) is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<Definition>,
}

impl Author {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            authentifiers: BTreeMap::new(),
            definition: None,
        }
    }
}

/// An application message carried by a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub app: String,
    pub payload_location: String,
    pub payload_hash: Base64Hash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_uri: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Message {
    /// A string field of an inline object payload.
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.as_ref()?.get(key)?.as_str()
    }
}
