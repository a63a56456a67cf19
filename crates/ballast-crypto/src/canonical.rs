//! Canonical source-string encoding.
//!
//! Every hash in the ledger is computed over the *source string* of a JSON
//! value: a flat list of components joined by `\0`. Strings contribute
//! `"s", value`, numbers `"n", decimal`, booleans `"b", "true"|"false"`,
//! arrays `"["`, elements, `"]"`, and objects each key in ascending order
//! followed by its value. `null`, empty arrays and empty objects have no
//! encoding and are rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ballast_types::Base64Hash;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};

const COMPONENT_SEPARATOR: char = '\0';

/// Errors from canonical encoding.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("null value at {path}")]
    Null { path: String },

    #[error("empty array at {path}")]
    EmptyArray { path: String },

    #[error("empty object at {path}")]
    EmptyObject { path: String },

    #[error("non-finite number at {path}")]
    NonFiniteNumber { path: String },

    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type CanonicalResult<T> = Result<T, CanonicalError>;

/// Encode a JSON value as its canonical source string.
pub fn source_string(value: &Value) -> CanonicalResult<String> {
    let mut components = Vec::new();
    extract_components(value, "$", &mut components)?;
    let mut out = String::new();
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            out.push(COMPONENT_SEPARATOR);
        }
        out.push_str(component);
    }
    Ok(out)
}

fn extract_components(value: &Value, path: &str, out: &mut Vec<String>) -> CanonicalResult<()> {
    match value {
        Value::Null => {
            return Err(CanonicalError::Null {
                path: path.to_owned(),
            })
        }
        Value::String(s) => {
            out.push("s".into());
            out.push(s.clone());
        }
        Value::Number(n) => {
            out.push("n".into());
            out.push(number_text(n, path)?);
        }
        Value::Bool(b) => {
            out.push("b".into());
            out.push(b.to_string());
        }
        Value::Array(items) => {
            if items.is_empty() {
                return Err(CanonicalError::EmptyArray {
                    path: path.to_owned(),
                });
            }
            out.push("[".into());
            for (i, item) in items.iter().enumerate() {
                extract_components(item, &format!("{path}[{i}]"), out)?;
            }
            out.push("]".into());
        }
        Value::Object(map) => {
            if map.is_empty() {
                return Err(CanonicalError::EmptyObject {
                    path: path.to_owned(),
                });
            }
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            for (key, item) in entries {
                out.push(key.clone());
                extract_components(item, &format!("{path}.{key}"), out)?;
            }
        }
    }
    Ok(())
}

fn number_text(n: &Number, path: &str) -> CanonicalResult<String> {
    if let Some(u) = n.as_u64() {
        return Ok(u.to_string());
    }
    if let Some(i) = n.as_i64() {
        return Ok(i.to_string());
    }
    match n.as_f64() {
        // Shortest round-trip form without a trailing ".0" for integral values.
        Some(f) if f.is_finite() => Ok(format!("{f}")),
        _ => Err(CanonicalError::NonFiniteNumber {
            path: path.to_owned(),
        }),
    }
}

/// Raw SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Base64 SHA-256 hash of a value's source string.
pub fn base64_hash(value: &Value) -> CanonicalResult<Base64Hash> {
    let source = source_string(value)?;
    Ok(Base64Hash::from_digest(sha256(source.as_bytes())))
}

/// Base64 text of a raw digest, as used in logs and CLI output.
pub fn digest_to_base64(digest: &[u8; 32]) -> String {
    STANDARD.encode(digest)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn encodes_scalars() {
        assert_eq!(source_string(&json!("x")).unwrap(), "s\0x");
        assert_eq!(source_string(&json!(42)).unwrap(), "n\042");
        assert_eq!(source_string(&json!(-7)).unwrap(), "n\0-7");
        assert_eq!(source_string(&json!(true)).unwrap(), "b\0true");
        assert_eq!(source_string(&json!(2.5)).unwrap(), "n\02.5");
    }

    #[test]
    fn objects_are_key_sorted() {
        let a = source_string(&json!({"b": 1, "a": "x"})).unwrap();
        assert_eq!(a, "a\0s\0x\0b\0n\01");
    }

    #[test]
    fn key_order_is_bytewise() {
        let mut map = serde_json::Map::new();
        map.insert("b".into(), json!(1));
        map.insert("B".into(), json!(2));
        map.insert("a".into(), json!(3));
        let s = source_string(&Value::Object(map)).unwrap();
        assert_eq!(s, "B\0n\02\0a\0n\03\0b\0n\01");
    }

    #[test]
    fn arrays_are_bracketed_and_ordered() {
        let s = source_string(&json!(["sig", {"pubkey": "k"}])).unwrap();
        assert_eq!(s, "[\0s\0sig\0pubkey\0s\0k\0]");
        assert_ne!(
            source_string(&json!([1, 2])).unwrap(),
            source_string(&json!([2, 1])).unwrap()
        );
    }

    #[test]
    fn rejects_null_and_empty_containers() {
        assert_eq!(
            source_string(&json!({"a": null})).unwrap_err(),
            CanonicalError::Null { path: "$.a".into() }
        );
        assert_eq!(
            source_string(&json!({"a": [1, []]})).unwrap_err(),
            CanonicalError::EmptyArray { path: "$.a[1]".into() }
        );
        assert!(matches!(
            source_string(&json!({})),
            Err(CanonicalError::EmptyObject { .. })
        ));
    }

    #[test]
    fn base64_hash_is_deterministic() {
        let v = json!({"unit": "x", "parent_balls": ["a", "b"]});
        assert_eq!(base64_hash(&v).unwrap(), base64_hash(&v).unwrap());
        assert_eq!(base64_hash(&v).unwrap().as_str().len(), 44);
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
