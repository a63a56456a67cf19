use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length in bytes of the digest behind every unit and ball hash.
pub const HASH_LENGTH: usize = 32;

/// SHA-256 content hash kept in its canonical base64 text form.
///
/// Units and balls are identified on the wire by the padded, standard-alphabet
/// base64 encoding of a 32-byte digest. The text form is what gets fed back
/// into canonical hashing (a ball commits to its unit's *string*), and it is
/// also the ordering used when hash lists are sorted, so the string is the
/// stored representation. Construction always validates that the text
/// decodes to exactly 32 bytes and re-encodes to itself.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Base64Hash(String);

/// Identity hash of a unit.
pub type UnitHash = Base64Hash;

/// Finalization hash of a stable unit and its ancestry.
pub type BallHash = Base64Hash;

impl Base64Hash {
    /// Wrap a raw digest.
    pub fn from_digest(digest: [u8; HASH_LENGTH]) -> Self {
        Self(STANDARD.encode(digest))
    }

    /// Parse and validate base64 text.
    pub fn from_base64(s: &str) -> Result<Self, TypeError> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|e| TypeError::InvalidBase64(e.to_string()))?;
        if bytes.len() != HASH_LENGTH {
            return Err(TypeError::InvalidLength {
                expected: HASH_LENGTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// The base64 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decoded digest bytes.
    pub fn to_digest(&self) -> [u8; HASH_LENGTH] {
        let mut out = [0u8; HASH_LENGTH];
        // Validated on construction.
        if let Ok(bytes) = STANDARD.decode(&self.0) {
            out.copy_from_slice(&bytes);
        }
        out
    }

    /// Short representation (first 8 characters) for logs.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Debug for Base64Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base64Hash({})", self.short())
    }
}

impl fmt::Display for Base64Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Base64Hash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}

impl TryFrom<String> for Base64Hash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64(&value)
    }
}

impl From<Base64Hash> for String {
    fn from(hash: Base64Hash) -> Self {
        hash.0
    }
}
