use ballast_crypto::{base64_hash, UnitHasher};
use ballast_types::Unit;

use crate::error::{HashKind, ProofError, ProofResult};

const INLINE: &str = "inline";

/// Check that a unit's declared hash matches its content and that every
/// inline payload matches its `payload_hash`.
pub(crate) fn check_unit_hash(unit: &Unit) -> ProofResult<()> {
    let computed = UnitHasher::unit_hash(unit).map_err(|source| ProofError::Canonical {
        unit: unit.unit.clone(),
        source,
    })?;
    if computed != unit.unit {
        return Err(ProofError::HashMismatch {
            unit: unit.unit.clone(),
            kind: HashKind::Unit,
            computed,
        });
    }
    check_payload_hashes(unit)
}

/// The unit hash commits to payloads only through `payload_hash`.
fn check_payload_hashes(unit: &Unit) -> ProofResult<()> {
    // Stripped units carry no payloads.
    if unit.content_hash.is_some() {
        return Ok(());
    }
    for (index, message) in unit.messages.iter().enumerate() {
        let malformed = |reason: String| ProofError::MalformedJoint {
            unit: unit.unit.clone(),
            reason: format!("message {index}: {reason}"),
        };
        match (&message.payload, message.payload_location == INLINE) {
            (Some(payload), true) => {
                let computed = base64_hash(payload).map_err(|source| ProofError::Canonical {
                    unit: unit.unit.clone(),
                    source,
                })?;
                if computed != message.payload_hash {
                    return Err(ProofError::HashMismatch {
                        unit: unit.unit.clone(),
                        kind: HashKind::Payload { message: index },
                        computed,
                    });
                }
            }
            (None, true) => return Err(malformed("inline payload missing".into())),
            (Some(_), false) => {
                return Err(malformed(format!(
                    "payload present with location {}",
                    message.payload_location
                )))
            }
            (None, false) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use ballast_types::{Message, UnitHash};
    use serde_json::json;

    use super::*;

    fn unit_with(message: Message) -> Unit {
        let mut unit: Unit = serde_json::from_value(json!({
            "unit": UnitHash::from_digest([0; 32]).as_str(),
            "version": "1.0",
            "alt": "1",
            "authors": [{"address": "BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW3"}],
            "witness_list_unit": UnitHash::from_digest([1; 32]).as_str(),
        }))
        .unwrap();
        unit.messages = vec![message];
        unit.unit = UnitHasher::unit_hash(&unit).unwrap();
        unit
    }

    fn text(payload: serde_json::Value, declared: &serde_json::Value) -> Message {
        serde_json::from_value(json!({
            "app": "text",
            "payload_location": "inline",
            "payload_hash": base64_hash(declared).unwrap().as_str(),
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn matching_payload_passes() {
        let payload = json!("hello");
        check_unit_hash(&unit_with(text(payload.clone(), &payload))).unwrap();
    }

    #[test]
    fn swapped_payload_is_hash_mismatch() {
        let unit = unit_with(text(json!("forged"), &json!("hello")));
        let err = check_unit_hash(&unit).unwrap_err();
        assert!(matches!(
            err,
            ProofError::HashMismatch { kind: HashKind::Payload { message: 0 }, .. }
        ));
    }

    #[test]
    fn inline_message_without_payload_is_malformed() {
        let mut message = text(json!("hello"), &json!("hello"));
        message.payload = None;
        let err = check_unit_hash(&unit_with(message)).unwrap_err();
        assert!(matches!(err, ProofError::MalformedJoint { .. }));
    }

    #[test]
    fn external_payload_must_not_be_inlined() {
        let mut message = text(json!("hello"), &json!("hello"));
        message.payload_location = "uri".into();
        let err = check_unit_hash(&unit_with(message)).unwrap_err();
        assert!(matches!(err, ProofError::MalformedJoint { .. }));

        let mut message = text(json!("hello"), &json!("hello"));
        message.payload_location = "none".into();
        message.payload = None;
        check_unit_hash(&unit_with(message)).unwrap();
    }
}
