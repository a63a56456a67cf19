use std::collections::{BTreeMap, BTreeSet, HashMap};

use ballast_crypto::BallHasher;
use ballast_types::{BallHash, BallRecord, Unit, UnitHash};
use serde::Serialize;
use tracing::debug;

use crate::error::{HashKind, ProofError, ProofResult};
use crate::integrity::check_unit_hash;

/// Units whose balls a ball chain proved.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BallChainOutcome {
    /// `unit -> ball` for every verified record.
    pub proven: BTreeMap<UnitHash, BallHash>,
    /// Proven units marked nonserial.
    pub nonserial: BTreeSet<UnitHash>,
    pub records_verified: usize,
}

impl BallChainOutcome {
    pub fn is_proven(&self, unit: &UnitHash) -> bool {
        self.proven.contains_key(unit)
    }
}

/// Verifies chains of ball records against a set of trusted balls.
///
/// Records are checked in the order given. Each record must recompute to its
/// own ball and that ball must already be known, either trusted up front or
/// referenced as a parent or skiplist ball by an earlier record.
pub struct BallChainVerifier;

impl BallChainVerifier {
    pub fn verify_chain(
        records: &[BallRecord],
        trusted: &BTreeSet<BallHash>,
    ) -> ProofResult<BallChainOutcome> {
        Self::verify_chain_with_units(records, trusted, std::iter::empty())
    }

    /// Like [`verify_chain`](Self::verify_chain), also checking the hash of
    /// every supplied unit body that a record refers to.
    pub fn verify_chain_with_units<'a>(
        records: &[BallRecord],
        trusted: &BTreeSet<BallHash>,
        units: impl IntoIterator<Item = &'a Unit>,
    ) -> ProofResult<BallChainOutcome> {
        let bodies: HashMap<&UnitHash, &Unit> =
            units.into_iter().map(|u| (&u.unit, u)).collect();
        let mut known = trusted.clone();
        let mut outcome = BallChainOutcome::default();

        for (index, record) in records.iter().enumerate() {
            if let Some(unit) = bodies.get(&record.unit) {
                check_unit_hash(unit)?;
            }
            let computed =
                BallHasher::record_hash(record).map_err(|source| ProofError::Canonical {
                    unit: record.unit.clone(),
                    source,
                })?;
            if computed != record.ball {
                return Err(ProofError::HashMismatch {
                    unit: record.unit.clone(),
                    kind: HashKind::Ball { record: index },
                    computed,
                });
            }
            if !known.contains(&record.ball) {
                return Err(ProofError::BrokenLinkage {
                    unit: record.unit.clone(),
                    reason: format!(
                        "ball {} is neither trusted nor referenced by an earlier record",
                        record.ball
                    ),
                });
            }

            known.extend(record.referenced_balls().cloned());
            outcome.proven.insert(record.unit.clone(), record.ball.clone());
            if record.is_nonserial {
                outcome.nonserial.insert(record.unit.clone());
            }
            outcome.records_verified += 1;
        }

        debug!(
            records = outcome.records_verified,
            known_balls = known.len(),
            "ball chain verified"
        );
        Ok(outcome)
    }
}
