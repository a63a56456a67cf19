//! 160-bit checksummed hashes ("chash") used as addresses.
//!
//! `ripemd160` of the definition's source string is truncated to its last 16
//! bytes, a 32-bit checksum (bytes 5, 13, 21 and 29 of the clean data's
//! SHA-256) is interleaved bit by bit at fixed offsets, and the resulting 20
//! bytes are base32-encoded.

use ballast_types::{Address, Definition};
use data_encoding::BASE32;
use ripemd::{Digest, Ripemd160};
use serde_json::Value;

use crate::canonical::{sha256, source_string, CanonicalError, CanonicalResult};

const CLEAN_BYTES: usize = 16;
const CHASH_BYTES: usize = 20;
const CHASH_BITS: usize = CHASH_BYTES * 8;

/// Bit positions of the 32 checksum bits, derived from the digits of pi.
const CHECKSUM_OFFSETS: [usize; 32] = [
    1, 5, 6, 11, 20, 22, 28, 33, 36, 41, 49, 58, 65, 74, 77, 79, 82, 90, 94, 100, 102, 108, 112,
    115, 118, 126, 129, 131, 138, 147, 152, 154,
];

/// Address of a definition.
pub fn chash160(definition: &Definition) -> CanonicalResult<Address> {
    chash160_of_value(&definition.to_value())
}

/// Chash of an arbitrary JSON value's source string.
pub fn chash160_of_value(value: &Value) -> CanonicalResult<Address> {
    let source = source_string(value)?;
    let digest = Ripemd160::digest(source.as_bytes());
    let mut clean = [0u8; CLEAN_BYTES];
    clean.copy_from_slice(&digest[digest.len() - CLEAN_BYTES..]);
    let mixed = mix_checksum(&clean, &checksum(&clean));
    Address::parse(&BASE32.encode(&mixed))
        .map_err(|e| CanonicalError::Serialization(e.to_string()))
}

/// Returns `true` if the address's embedded checksum matches its data.
pub fn is_valid_chash(address: &Address) -> bool {
    let Ok(bytes) = BASE32.decode(address.as_str().as_bytes()) else {
        return false;
    };
    if bytes.len() != CHASH_BYTES {
        return false;
    }
    let mut clean = [0u8; CLEAN_BYTES];
    let mut embedded = [0u8; 4];
    let (mut clean_bit, mut checksum_bit) = (0, 0);
    for pos in 0..CHASH_BITS {
        let bit = read_bit(&bytes, pos);
        if checksum_bit < CHECKSUM_OFFSETS.len() && CHECKSUM_OFFSETS[checksum_bit] == pos {
            write_bit(&mut embedded, checksum_bit, bit);
            checksum_bit += 1;
        } else {
            write_bit(&mut clean, clean_bit, bit);
            clean_bit += 1;
        }
    }
    checksum(&clean) == embedded
}

fn checksum(clean: &[u8; CLEAN_BYTES]) -> [u8; 4] {
    let full = sha256(clean);
    [full[5], full[13], full[21], full[29]]
}

fn mix_checksum(clean: &[u8; CLEAN_BYTES], checksum: &[u8; 4]) -> [u8; CHASH_BYTES] {
    let mut out = [0u8; CHASH_BYTES];
    let (mut clean_bit, mut checksum_bit) = (0, 0);
    for pos in 0..CHASH_BITS {
        let bit = if checksum_bit < CHECKSUM_OFFSETS.len() && CHECKSUM_OFFSETS[checksum_bit] == pos
        {
            checksum_bit += 1;
            read_bit(checksum, checksum_bit - 1)
        } else {
            clean_bit += 1;
            read_bit(clean, clean_bit - 1)
        };
        write_bit(&mut out, pos, bit);
    }
    out
}

fn read_bit(bytes: &[u8], index: usize) -> bool {
    bytes[index / 8] & (0x80 >> (index % 8)) != 0
}

fn write_bit(bytes: &mut [u8], index: usize, bit: bool) {
    if bit {
        bytes[index / 8] |= 0x80 >> (index % 8);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reproduces_witness_addresses() {
        let cases = [
            ("A/2sUkxKT6bo5KvTO2b4iprDKdyTlszuRh+O2A1KKn1I", "BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW3"),
            ("AwTz/u/JbunP3JmxrC3+cPO4ttIYzbYkUvCm7t5Mavib", "DJMMI5JYA5BWQYSXDPRZJVLW3UGL3GJS"),
            ("A3mDugbotUTdc90pnOC9LCkEJPNm3OOTRx3f6SlqpJF+", "UENJPVZ7HVHM6QGVGT6MWOJGGRTUTJXQ"),
        ];
        for (pubkey, address) in cases {
            let def = Definition::single_sig(pubkey);
            assert_eq!(chash160(&def).unwrap().as_str(), address);
        }
    }

    #[test]
    fn generated_chash_has_valid_checksum() {
        let addr = chash160_of_value(&json!(["sig", {"pubkey": "anything"}])).unwrap();
        assert!(is_valid_chash(&addr));
    }

    #[test]
    fn witness_addresses_validate() {
        for a in [
            "BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW3",
            "TKT4UESIKTTRALRRLWS4SENSTJX6ODCW",
            "4JFF2HIQYHC2S7ZX7ZRYHIJV4P7VGX2F",
        ] {
            assert!(is_valid_chash(&Address::parse(a).unwrap()), "{a}");
        }
    }

    #[test]
    fn corrupted_address_fails_checksum() {
        // Flip one character of a valid address.
        let addr = Address::parse("BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW4").unwrap();
        assert!(!is_valid_chash(&addr));
    }

    #[test]
    fn different_definitions_different_addresses() {
        let a = chash160(&Definition::single_sig("a")).unwrap();
        let b = chash160(&Definition::single_sig("b")).unwrap();
        assert_ne!(a, b);
    }
}
