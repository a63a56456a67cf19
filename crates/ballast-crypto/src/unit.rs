use ballast_types::{Unit, UnitHash};
use serde_json::{Map, Value};

use crate::canonical::{base64_hash, sha256, source_string, CanonicalError, CanonicalResult};

/// Fields assigned or finalized by the network after a unit is authored.
const VOLATILE_FIELDS: [&str; 5] = [
    "unit",
    "headers_commission",
    "payload_commission",
    "main_chain_index",
    "timestamp",
];

/// Unit identity and signing hashes.
///
/// The identity hash is two-staged: the *content hash* commits to the naked
/// unit (volatile fields removed, message payloads replaced by their
/// `payload_hash`), and the unit hash commits to the content hash plus the
/// header fields a stripped unit must keep. A unit whose payloads were
/// already stripped carries `content_hash` and hashes its naked form
/// directly, which yields the same value.
pub struct UnitHasher;

impl UnitHasher {
    /// The unit's identity hash.
    pub fn unit_hash(unit: &Unit) -> CanonicalResult<UnitHash> {
        if unit.content_hash.is_some() {
            return base64_hash(&Self::naked_unit(unit)?);
        }

        let mut stripped = Map::new();
        stripped.insert(
            "content_hash".into(),
            Value::String(Self::content_hash(unit)?.into()),
        );
        stripped.insert("version".into(), Value::String(unit.version.clone()));
        stripped.insert("alt".into(), Value::String(unit.alt.clone()));
        stripped.insert(
            "authors".into(),
            Value::Array(
                unit.authors
                    .iter()
                    .map(|a| {
                        let mut author = Map::new();
                        author.insert("address".into(), Value::String(a.address.to_string()));
                        Value::Object(author)
                    })
                    .collect(),
            ),
        );
        match &unit.witness_list_unit {
            Some(wlu) => {
                stripped.insert("witness_list_unit".into(), Value::String(wlu.to_string()));
            }
            None if !unit.witnesses.is_empty() => {
                stripped.insert("witnesses".into(), to_value(&unit.witnesses)?);
            }
            None => return Err(CanonicalError::MissingField("witnesses")),
        }
        if !unit.parent_units.is_empty() {
            let last_ball = unit
                .last_ball
                .as_ref()
                .ok_or(CanonicalError::MissingField("last_ball"))?;
            let last_ball_unit = unit
                .last_ball_unit
                .as_ref()
                .ok_or(CanonicalError::MissingField("last_ball_unit"))?;
            stripped.insert("parent_units".into(), to_value(&unit.parent_units)?);
            stripped.insert("last_ball".into(), Value::String(last_ball.to_string()));
            stripped.insert(
                "last_ball_unit".into(),
                Value::String(last_ball_unit.to_string()),
            );
        }
        base64_hash(&Value::Object(stripped))
    }

    /// Hash of the naked unit.
    pub fn content_hash(unit: &Unit) -> CanonicalResult<UnitHash> {
        base64_hash(&Self::naked_unit(unit)?)
    }

    /// The 32-byte digest authors sign: the naked unit with every author's
    /// authentifiers removed. Inline definitions stay in.
    pub fn signing_hash(unit: &Unit) -> CanonicalResult<[u8; 32]> {
        let mut naked = Self::naked_unit(unit)?;
        if let Some(Value::Array(authors)) = naked.get_mut("authors") {
            for author in authors.iter_mut().filter_map(Value::as_object_mut) {
                author.remove("authentifiers");
            }
        }
        let source = source_string(&naked)?;
        Ok(sha256(source.as_bytes()))
    }

    /// Returns `true` if the unit's declared hash matches its content.
    pub fn verify(unit: &Unit) -> CanonicalResult<bool> {
        Ok(Self::unit_hash(unit)? == unit.unit)
    }

    /// The unit's JSON form without volatile fields or message payloads.
    pub fn naked_unit(unit: &Unit) -> CanonicalResult<Value> {
        let mut value = to_value(unit)?;
        let obj = value
            .as_object_mut()
            .ok_or_else(|| CanonicalError::Serialization("unit is not an object".into()))?;
        for field in VOLATILE_FIELDS {
            obj.remove(field);
        }
        if let Some(Value::Array(messages)) = obj.get_mut("messages") {
            for message in messages.iter_mut().filter_map(Value::as_object_mut) {
                message.remove("payload");
                message.remove("payload_uri");
            }
        }
        Ok(value)
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> CanonicalResult<Value> {
    serde_json::to_value(value).map_err(|e| CanonicalError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn compose_unit() -> Unit {
        serde_json::from_value(json!({
            "unit": "J9s98BJvW4SgS4ectpa1h3cQ9EJN3gtdv31mmRlM6HU=",
            "version": "1.0",
            "alt": "1",
            "messages": [{
                "app": "payment",
                "payload_location": "inline",
                "payload_hash": "nHQakA7qoqv7ZYCqwXP4wrbkv2kJLFexGNp13bGTU0M=",
                "payload": {
                    "outputs": [
                        {"address": "4JFF2HIQYHC2S7ZX7ZRYHIJV4P7VGX2F", "amount": 1896},
                        {"address": "LBHFYR6CFTC5VGZXMIYJCITQZAOJXSNN", "amount": 502}
                    ],
                    "inputs": [
                        {"unit": "fML9UFInRrLze9bht/ISm7Hs0vv0amvQbZFfNXKXSz8=", "message_index": 0, "output_index": 0},
                        {"unit": "qXncju7HMKeW6FERulsWwK035GPD0U2Z2A8uYWjl7Do=", "message_index": 0, "output_index": 0}
                    ]
                }
            }],
            "authors": [{
                "address": "4JFF2HIQYHC2S7ZX7ZRYHIJV4P7VGX2F",
                "authentifiers": {"r": "EmwDHUHYKIfXR7gDdDBEGTNTwcpPzwiEDRHl4dxngspVg0QGQtV7Jp2cou96+wlJrcogttXgBAVb6NvjGm3Otw=="}
            }],
            "parent_units": ["GWy5KPFAuMWO/VPwSutnG9CGW/IaKf1bhnU0nUU8bNY="],
            "last_ball": "Wc8J321UtBTi83InoPUmSJVZD+BOEPvUGG0bFg1SUgU=",
            "last_ball_unit": "/aI5a4xoVF+zO+goazLfV1pDqPmwl1+padr59ahOTzs=",
            "witness_list_unit": "oj8yEksX9Ubq7lLc+p6F2uyHUuynugeVq4+ikT67X6E=",
            "headers_commission": 344,
            "payload_commission": 257,
            "timestamp": 1512444274
        }))
        .unwrap()
    }

    #[test]
    fn reproduces_ledger_unit_hash() {
        let unit = compose_unit();
        assert_eq!(UnitHasher::unit_hash(&unit).unwrap(), unit.unit);
        assert!(UnitHasher::verify(&unit).unwrap());
    }

    #[test]
    fn volatile_fields_do_not_change_hash() {
        let mut unit = compose_unit();
        let before = UnitHasher::unit_hash(&unit).unwrap();
        unit.main_chain_index = Some(99_999);
        unit.headers_commission = Some(1);
        unit.payload_commission = None;
        unit.timestamp = Some(0);
        assert_eq!(UnitHasher::unit_hash(&unit).unwrap(), before);
        assert_eq!(
            UnitHasher::signing_hash(&unit).unwrap(),
            UnitHasher::signing_hash(&compose_unit()).unwrap()
        );
    }

    #[test]
    fn payload_is_committed_through_its_hash_only() {
        let mut unit = compose_unit();
        unit.messages[0].payload = Some(json!("replaced"));
        assert!(UnitHasher::verify(&unit).unwrap());

        let mut unit = compose_unit();
        unit.messages[0].app = "text".into();
        assert!(!UnitHasher::verify(&unit).unwrap());
    }

    #[test]
    fn header_change_breaks_hash() {
        let mut unit = compose_unit();
        unit.alt = "2".into();
        assert!(!UnitHasher::verify(&unit).unwrap());
    }

    #[test]
    fn signing_hash_ignores_authentifiers() {
        let mut unit = compose_unit();
        let before = UnitHasher::signing_hash(&unit).unwrap();
        unit.authors[0]
            .authentifiers
            .insert("r".into(), "tampered".into());
        assert_eq!(UnitHasher::signing_hash(&unit).unwrap(), before);
        // ...but the identity hash commits to them.
        assert!(!UnitHasher::verify(&unit).unwrap());
    }

    #[test]
    fn stripped_unit_hashes_to_same_identity() {
        let unit = compose_unit();
        let mut stripped = unit.clone();
        stripped.content_hash = Some(UnitHasher::content_hash(&unit).unwrap());
        stripped.messages.clear();
        stripped.authors[0].authentifiers.clear();
        assert_eq!(UnitHasher::unit_hash(&stripped).unwrap(), unit.unit);
    }

    #[test]
    fn missing_last_ball_is_rejected() {
        let mut unit = compose_unit();
        unit.last_ball = None;
        assert_eq!(
            UnitHasher::unit_hash(&unit).unwrap_err(),
            CanonicalError::MissingField("last_ball")
        );
    }
}
