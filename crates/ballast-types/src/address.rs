use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Length of an address in base32 characters (160 bits).
pub const ADDRESS_LENGTH: usize = 32;

/// A ledger address: the 160-bit checksummed hash ("chash") of an address
/// definition, encoded as 32 uppercase RFC 4648 base32 characters.
///
/// The same type is used for definition chashes, since an address is simply
/// the chash of its original definition. Parsing only checks the shape; the
/// embedded checksum is verified by `ballast_crypto::chash::is_valid`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse an address, validating length and alphabet.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let well_formed = s.len() == ADDRESS_LENGTH
            && s
                .bytes()
                .all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b));
        if !well_formed {
            return Err(TypeError::InvalidAddress(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// The base32 text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}
