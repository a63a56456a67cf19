//! Address definitions.
//!
//! A definition is a small boolean expression tree, carried on the wire as a
//! JSON array `[opcode, args]`. The address of a definition is the chash of
//! its canonical form, so the AST must convert back to *exactly* the JSON it
//! was parsed from. Opcodes outside the closed set are kept verbatim in
//! [`Definition::Unknown`], which evaluation always rejects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::address::Address;
use crate::error::TypeError;

pub const OP_SIG: &str = "sig";
pub const OP_AND: &str = "and";
pub const OP_OR: &str = "or";
pub const OP_NOT: &str = "not";
pub const OP_SEEN: &str = "seen";
pub const OP_IN_DATA_FEED: &str = "in data feed";

/// Signature algorithm accepted for `sig` leaves.
pub const ALGO_SECP256K1: &str = "secp256k1";

/// An address definition tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum Definition {
    /// A single signature by `pubkey` at the current authentifier path.
    Sig(SigDefinition),
    /// All children must hold.
    And(Vec<Definition>),
    /// At least one child must hold.
    Or(Vec<Definition>),
    /// The child must not hold.
    Not(Box<Definition>),
    /// Predicate on a previously seen output, answered by the ledger.
    Seen(SeenPredicate),
    /// Predicate on oracle-posted data, answered by the ledger.
    InDataFeed(DataFeedPredicate),
    /// Unrecognized opcode, kept as raw JSON. Never satisfied.
    Unknown(Value),
}

/// Arguments of a `sig` leaf.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SigDefinition {
    /// Base64 compressed public key.
    pub pubkey: String,
    /// Optional algorithm tag; absent means secp256k1.
    pub algo: Option<String>,
}

/// Arguments of a `seen` predicate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeenPredicate {
    pub what: String,
    pub address: String,
    pub asset: Option<String>,
    pub amount: Option<u64>,
    /// Any further filter fields, passed through to the ledger untouched.
    pub extra: Map<String, Value>,
}

/// Arguments of an `in data feed` predicate:
/// `[[oracles...], feed_name, relation, value, min_mci?]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataFeedPredicate {
    pub oracles: Vec<Address>,
    pub feed_name: String,
    pub relation: String,
    pub value: Value,
    pub min_mci: Option<u64>,
}

impl Definition {
    /// Convenience constructor for a single-signature definition.
    pub fn single_sig(pubkey: impl Into<String>) -> Self {
        Self::Sig(SigDefinition {
            pubkey: pubkey.into(),
            algo: None,
        })
    }

    /// The opcode text of this node.
    pub fn opcode(&self) -> &str {
        match self {
            Self::Sig(_) => OP_SIG,
            Self::And(_) => OP_AND,
            Self::Or(_) => OP_OR,
            Self::Not(_) => OP_NOT,
            Self::Seen(_) => OP_SEEN,
            Self::InDataFeed(_) => OP_IN_DATA_FEED,
            Self::Unknown(raw) => raw
                .get(0)
                .and_then(Value::as_str)
                .unwrap_or("<malformed>"),
        }
    }

    /// Returns `true` if evaluating this tree needs ledger lookups.
    pub fn has_references(&self) -> bool {
        match self {
            Self::Seen(_) | Self::InDataFeed(_) => true,
            Self::And(children) | Self::Or(children) => {
                children.iter().any(Definition::has_references)
            }
            Self::Not(inner) => inner.has_references(),
            Self::Sig(_) | Self::Unknown(_) => false,
        }
    }

    /// The wire JSON form.
    pub fn to_value(&self) -> Value {
        self.clone().into()
    }

    fn parse_children(op: &str, args: &Value) -> Result<Vec<Definition>, TypeError> {
        let items = args
            .as_array()
            .ok_or_else(|| malformed(format!("{op} expects an array of definitions")))?;
        if items.len() < 2 {
            return Err(malformed(format!("{op} must have at least 2 options")));
        }
        items.iter().cloned().map(Definition::try_from).collect()
    }
}

fn malformed(reason: impl Into<String>) -> TypeError {
    TypeError::MalformedDefinition(reason.into())
}

impl TryFrom<Value> for Definition {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let pair = value
            .as_array()
            .filter(|items| items.len() == 2)
            .ok_or_else(|| malformed("definition must be a two-element array"))?;
        let op = pair[0]
            .as_str()
            .ok_or_else(|| malformed("definition opcode must be a string"))?;
        let args = &pair[1];

        match op {
            OP_SIG => Ok(Self::Sig(SigDefinition::try_from(args)?)),
            OP_AND => Ok(Self::And(Self::parse_children(op, args)?)),
            OP_OR => Ok(Self::Or(Self::parse_children(op, args)?)),
            OP_NOT => Ok(Self::Not(Box::new(Definition::try_from(args.clone())?))),
            OP_SEEN => Ok(Self::Seen(SeenPredicate::try_from(args)?)),
            OP_IN_DATA_FEED => Ok(Self::InDataFeed(DataFeedPredicate::try_from(args)?)),
            _ => Ok(Self::Unknown(value)),
        }
    }
}

impl From<Definition> for Value {
    fn from(definition: Definition) -> Self {
        let (op, args) = match definition {
            Definition::Unknown(raw) => return raw,
            Definition::Sig(sig) => (OP_SIG, sig.into()),
            Definition::And(children) => (
                OP_AND,
                Value::Array(children.into_iter().map(Value::from).collect()),
            ),
            Definition::Or(children) => (
                OP_OR,
                Value::Array(children.into_iter().map(Value::from).collect()),
            ),
            Definition::Not(inner) => (OP_NOT, Value::from(*inner)),
            Definition::Seen(seen) => (OP_SEEN, seen.into()),
            Definition::InDataFeed(feed) => (OP_IN_DATA_FEED, feed.into()),
        };
        Value::Array(vec![Value::String(op.to_owned()), args])
    }
}

impl TryFrom<&Value> for SigDefinition {
    type Error = TypeError;

    fn try_from(args: &Value) -> Result<Self, Self::Error> {
        let obj = args
            .as_object()
            .ok_or_else(|| malformed("sig expects an object"))?;
        let pubkey = obj
            .get("pubkey")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("sig requires a string pubkey"))?
            .to_owned();
        let algo = match obj.get("algo") {
            None => None,
            Some(Value::String(algo)) => Some(algo.clone()),
            Some(_) => return Err(malformed("sig algo must be a string")),
        };
        if obj.keys().any(|k| k != "pubkey" && k != "algo") {
            return Err(malformed("unknown fields in sig"));
        }
        Ok(Self { pubkey, algo })
    }
}

impl From<SigDefinition> for Value {
    fn from(sig: SigDefinition) -> Self {
        let mut obj = Map::new();
        if let Some(algo) = sig.algo {
            obj.insert("algo".into(), Value::String(algo));
        }
        obj.insert("pubkey".into(), Value::String(sig.pubkey));
        Value::Object(obj)
    }
}

impl TryFrom<&Value> for SeenPredicate {
    type Error = TypeError;

    fn try_from(args: &Value) -> Result<Self, Self::Error> {
        let mut obj = args
            .as_object()
            .cloned()
            .ok_or_else(|| malformed("seen expects an object"))?;
        let mut take_str = |key: &str| match obj.remove(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(malformed(format!("seen.{key} must be a string"))),
        };
        let what = take_str("what")?.ok_or_else(|| malformed("seen requires what"))?;
        let address = take_str("address")?.ok_or_else(|| malformed("seen requires address"))?;
        let asset = take_str("asset")?;
        let amount = match obj.remove("amount") {
            None => None,
            Some(v) => Some(
                v.as_u64()
                    .ok_or_else(|| malformed("seen.amount must be a non-negative integer"))?,
            ),
        };
        Ok(Self {
            what,
            address,
            asset,
            amount,
            extra: obj,
        })
    }
}

impl From<SeenPredicate> for Value {
    fn from(seen: SeenPredicate) -> Self {
        let mut obj = seen.extra;
        obj.insert("what".into(), Value::String(seen.what));
        obj.insert("address".into(), Value::String(seen.address));
        if let Some(asset) = seen.asset {
            obj.insert("asset".into(), Value::String(asset));
        }
        if let Some(amount) = seen.amount {
            obj.insert("amount".into(), Value::from(amount));
        }
        Value::Object(obj)
    }
}

impl TryFrom<&Value> for DataFeedPredicate {
    type Error = TypeError;

    fn try_from(args: &Value) -> Result<Self, Self::Error> {
        let items = args
            .as_array()
            .filter(|items| items.len() == 4 || items.len() == 5)
            .ok_or_else(|| malformed("in data feed expects 4 or 5 arguments"))?;
        let oracles = items[0]
            .as_array()
            .filter(|oracles| !oracles.is_empty())
            .ok_or_else(|| malformed("in data feed needs a non-empty oracle list"))?
            .iter()
            .map(|o| {
                o.as_str()
                    .ok_or_else(|| malformed("oracle must be an address string"))
                    .and_then(Address::parse)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let feed_name = items[1]
            .as_str()
            .ok_or_else(|| malformed("feed name must be a string"))?
            .to_owned();
        let relation = items[2]
            .as_str()
            .filter(|r| matches!(*r, "=" | "!=" | ">" | ">=" | "<" | "<="))
            .ok_or_else(|| malformed("unknown data feed relation"))?
            .to_owned();
        let value = items[3].clone();
        if !(value.is_string() || value.is_number()) {
            return Err(malformed("data feed value must be a string or number"));
        }
        let min_mci = match items.get(4) {
            None => None,
            Some(v) => Some(
                v.as_u64()
                    .ok_or_else(|| malformed("min_mci must be a non-negative integer"))?,
            ),
        };
        Ok(Self {
            oracles,
            feed_name,
            relation,
            value,
            min_mci,
        })
    }
}

impl From<DataFeedPredicate> for Value {
    fn from(feed: DataFeedPredicate) -> Self {
        let mut items = vec![
            Value::Array(
                feed.oracles
                    .into_iter()
                    .map(|o| Value::String(o.into()))
                    .collect(),
            ),
            Value::String(feed.feed_name),
            Value::String(feed.relation),
            feed.value,
        ];
        if let Some(min_mci) = feed.min_mci {
            items.push(Value::from(min_mci));
        }
        Value::Array(items)
    }
}
