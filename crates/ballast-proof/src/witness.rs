use std::collections::HashSet;

use ballast_crypto::is_valid_chash;
use ballast_types::{Address, COUNT_WITNESSES};
use serde::{Deserialize, Serialize};

use crate::error::{ProofError, ProofResult};

/// The fixed, ordered set of witnesses a proof is checked against.
///
/// Always exactly [`COUNT_WITNESSES`] distinct addresses with valid checksums.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
pub struct WitnessList(Vec<Address>);

impl WitnessList {
    pub fn new(addresses: Vec<Address>) -> ProofResult<Self> {
        if addresses.len() != COUNT_WITNESSES {
            return Err(malformed(format!(
                "expected {COUNT_WITNESSES} witnesses, got {}",
                addresses.len()
            )));
        }
        let mut seen = HashSet::with_capacity(COUNT_WITNESSES);
        for address in &addresses {
            if !seen.insert(address) {
                return Err(malformed(format!("duplicate witness {address}")));
            }
            if !is_valid_chash(address) {
                return Err(malformed(format!("bad checksum in witness {address}")));
            }
        }
        Ok(Self(addresses))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.0.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Address] {
        &self.0
    }
}

fn malformed(reason: String) -> ProofError {
    ProofError::MalformedWitnessSet { reason }
}

impl TryFrom<Vec<Address>> for WitnessList {
    type Error = ProofError;

    fn try_from(addresses: Vec<Address>) -> Result<Self, Self::Error> {
        Self::new(addresses)
    }
}

impl From<WitnessList> for Vec<Address> {
    fn from(list: WitnessList) -> Self {
        list.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS_WITNESSES: [&str; 12] = [
        "BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW3",
        "DJMMI5JYA5BWQYSXDPRZJVLW3UGL3GJS",
        "FOPUBEUPBC6YLIQDLKL6EW775BMV7YOH",
        "GFK3RDAPQLLNCMQEVGGD2KCPZTLSG3HN",
        "H5EZTQE7ABFH27AUDTQFMZIALANK6RBG",
        "I2ADHGP4HL6J37NQAD73J7E5SKFIXJOT",
        "JEDZYC2HMGDBIDQKG3XSTXUSHMCBK725",
        "JPQKPRI5FMTQRJF4ZZMYZYDQVRD55OTC",
        "OYW2XTDKSNKGSEZ27LMGNOPJSYIXHBHC",
        "S7N5FE42F6ONPNDQLCF64E2MGFYKQR2I",
        "TKT4UESIKTTRALRRLWS4SENSTJX6ODCW",
        "UENJPVZ7HVHM6QGVGT6MWOJGGRTUTJXQ",
    ];

    fn genesis() -> Vec<Address> {
        GENESIS_WITNESSES
            .iter()
            .map(|a| Address::parse(a).unwrap())
            .collect()
    }

    #[test]
    fn accepts_genesis_witnesses() {
        let list = WitnessList::new(genesis()).unwrap();
        assert!(list.contains(&genesis()[11]));
        assert_eq!(list.iter().count(), 12);
    }

    #[test]
    fn rejects_wrong_count() {
        let mut short = genesis();
        short.pop();
        assert!(matches!(
            WitnessList::new(short),
            Err(ProofError::MalformedWitnessSet { .. })
        ));
    }

    #[test]
    fn rejects_duplicates() {
        let mut dup = genesis();
        dup[11] = dup[0].clone();
        assert!(matches!(
            WitnessList::new(dup),
            Err(ProofError::MalformedWitnessSet { .. })
        ));
    }

    #[test]
    fn rejects_bad_checksum() {
        let mut bad = genesis();
        bad[3] = Address::parse("BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW4").unwrap();
        assert!(WitnessList::new(bad).is_err());
    }

    #[test]
    fn deserializes_with_validation() {
        let json = serde_json::to_string(&GENESIS_WITNESSES).unwrap();
        let list: WitnessList = serde_json::from_str(&json).unwrap();
        assert_eq!(list.as_slice(), genesis().as_slice());
        assert!(serde_json::from_str::<WitnessList>("[\"BVVJ2K7ENPZZ3VYZFWQWK7ISPCATFIW3\"]").is_err());
    }
}
