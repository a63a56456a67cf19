use std::collections::BTreeMap;

use ballast_crypto::{chash160, is_valid_chash};
use ballast_definition::{
    DefinitionEngine, DefinitionError, DefinitionResolver, SharedDefinitionCache,
};
use ballast_store::LedgerStore;
use ballast_types::{
    Address, BallHash, Joint, Unit, UnitHash, APP_ADDRESS_DEFINITION_CHANGE,
    MAJORITY_OF_WITNESSES,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{SeedMode, VerifierConfig};
use crate::error::{ProofError, ProofResult};
use crate::integrity::check_unit_hash;
use crate::session::VerificationSession;
use crate::witness::WitnessList;

/// A witness proof as sent by a full node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessProof {
    /// Recent main chain units, tip first. None of them is stable yet.
    pub unstable_mc_joints: Vec<Joint>,
    /// Stable units that define or redefine witness addresses.
    pub witness_change_and_definition_joints: Vec<Joint>,
}

/// What an accepted witness proof attests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WitnessProofOutcome {
    /// `last_ball_unit -> last_ball` pairs vouched for by a witness majority.
    pub checkpoints: BTreeMap<UnitHash, BallHash>,
    /// The `last_ball_unit`s in walk order, duplicates included.
    pub last_ball_units: Vec<UnitHash>,
    /// Witness-authored main chain units, oldest first.
    pub witness_joints: Vec<UnitHash>,
    /// Distinct witnesses found, in discovery order.
    pub found_witnesses: Vec<Address>,
}

/// Verifies witness proofs against a fixed witness list.
///
/// Verification is strictly sequential. Witness definitions are tracked
/// from oldest unit to newest, since a definition change in one unit decides
/// which key must sign the next.
pub struct WitnessProofVerifier<'s> {
    witnesses: WitnessList,
    config: VerifierConfig,
    store: Option<&'s dyn LedgerStore>,
    shared_cache: Option<SharedDefinitionCache>,
}

impl<'s> WitnessProofVerifier<'s> {
    pub fn new(witnesses: WitnessList, config: VerifierConfig) -> Self {
        Self {
            witnesses,
            config,
            store: None,
            shared_cache: None,
        }
    }

    /// Consult `store` for definitions, stability and reference predicates.
    pub fn with_store(mut self, store: &'s dyn LedgerStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Share resolved definitions with other verification calls.
    pub fn with_shared_cache(mut self, cache: SharedDefinitionCache) -> Self {
        self.shared_cache = Some(cache);
        self
    }

    pub fn witnesses(&self) -> &WitnessList {
        &self.witnesses
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a witness proof bundle.
    pub fn verify(&self, proof: &WitnessProof) -> ProofResult<WitnessProofOutcome> {
        self.verify_joints(
            &proof.unstable_mc_joints,
            &proof.witness_change_and_definition_joints,
        )
    }

    /// Verify a witness proof given as its two joint lists.
    pub fn verify_joints(
        &self,
        unstable_mc_joints: &[Joint],
        definition_joints: &[Joint],
    ) -> ProofResult<WitnessProofOutcome> {
        let mut session = VerificationSession::new(self.resolver());

        self.walk_main_chain(unstable_mc_joints, &mut session)?;
        if session.found_witnesses.len() < MAJORITY_OF_WITNESSES {
            return Err(ProofError::InsufficientWitnessMajority {
                found: session.found_witnesses.len(),
                required: MAJORITY_OF_WITNESSES,
            });
        }
        if session.checkpoints.is_empty() {
            return Err(ProofError::NoCheckpoint);
        }
        self.check_definition_joints(definition_joints)?;

        self.seed(&mut session)?;
        let engine = self.engine();
        for joint in definition_joints {
            if self.already_stable(&joint.unit.unit)? {
                debug!(unit = %joint.unit.unit, "definition unit already stable, skipping");
                continue;
            }
            self.validate_unit(&joint.unit, true, &engine, &mut session)?;
        }

        // Collected tip first.
        let chronological: Vec<usize> = session.witness_joints.iter().rev().copied().collect();
        for &index in &chronological {
            self.validate_unit(&unstable_mc_joints[index].unit, false, &engine, &mut session)?;
        }

        info!(
            checkpoints = session.checkpoints.len(),
            witnesses = session.found_witnesses.len(),
            witness_units = chronological.len(),
            "witness proof verified"
        );
        Ok(WitnessProofOutcome {
            checkpoints: session.checkpoints,
            last_ball_units: session.last_ball_units,
            witness_joints: chronological
                .iter()
                .map(|&index| unstable_mc_joints[index].unit.unit.clone())
                .collect(),
            found_witnesses: session.found_witnesses,
        })
    }

    fn resolver(&self) -> DefinitionResolver<'s> {
        let resolver = match self.store {
            Some(store) => DefinitionResolver::new(store),
            None => DefinitionResolver::detached(),
        };
        match &self.shared_cache {
            Some(cache) => resolver.with_shared_cache(cache.clone()),
            None => resolver,
        }
    }

    fn engine(&self) -> DefinitionEngine<'s> {
        let engine = match self.store {
            Some(store) => DefinitionEngine::with_store(store),
            None => DefinitionEngine::new(),
        };
        engine.allow_references(self.config.allow_references)
    }

    /// Walk the main chain from the tip, checking hashes and parent links
    /// and collecting witnesses and checkpoints.
    fn walk_main_chain(
        &self,
        joints: &[Joint],
        session: &mut VerificationSession<'s>,
    ) -> ProofResult<()> {
        let mut previous: Option<&Unit> = None;
        for (index, joint) in joints.iter().enumerate() {
            let unit = &joint.unit;
            if joint.ball.is_some() {
                return Err(ProofError::UnexpectedBall {
                    unit: unit.unit.clone(),
                });
            }
            check_unit_hash(unit)?;
            if let Some(child) = previous {
                if !child.parent_units.contains(&unit.unit) {
                    return Err(ProofError::BrokenLinkage {
                        unit: unit.unit.clone(),
                        reason: format!("not a parent of {}", child.unit),
                    });
                }
            }

            let mut authored_by_witness = false;
            for address in unit.author_addresses() {
                if self.witnesses.contains(address) {
                    if session.record_witness(address) {
                        debug!(
                            witness = %address,
                            unit = %unit.unit,
                            found = session.found_witnesses.len(),
                            "found witness"
                        );
                    }
                    authored_by_witness = true;
                }
            }
            if authored_by_witness {
                session.witness_joints.push(index);
            }

            if session.found_witnesses.len() >= MAJORITY_OF_WITNESSES {
                if let (Some(last_ball_unit), Some(last_ball)) =
                    (&unit.last_ball_unit, &unit.last_ball)
                {
                    session.record_checkpoint(last_ball_unit, last_ball)?;
                }
            }
            previous = Some(unit);
        }
        Ok(())
    }

    fn check_definition_joints(&self, joints: &[Joint]) -> ProofResult<()> {
        for joint in joints {
            let unit = &joint.unit;
            if joint.ball.is_none() {
                return Err(ProofError::MissingBall {
                    unit: unit.unit.clone(),
                });
            }
            check_unit_hash(unit)?;
            if !unit.author_addresses().any(|a| self.witnesses.contains(a)) {
                return Err(ProofError::NotAuthoredByWitness {
                    unit: unit.unit.clone(),
                });
            }
        }
        Ok(())
    }

    /// Set every witness's starting definition chash.
    fn seed(&self, session: &mut VerificationSession<'s>) -> ProofResult<()> {
        for witness in self.witnesses.iter() {
            let chash = match self.config.seed {
                SeedMode::Bootstrap => witness.clone(),
                SeedMode::Ledger => {
                    match session
                        .resolver()
                        .resolve(witness, self.config.max_stable_mci)
                    {
                        Ok(resolved) => resolved.chash,
                        Err(DefinitionError::NotFound { chash }) => chash,
                        Err(DefinitionError::Lookup { key, source }) => {
                            return Err(ProofError::DefinitionResolutionFailed {
                                key: key.to_string(),
                                source,
                            })
                        }
                        Err(source) => {
                            return Err(ProofError::SeedFailed {
                                address: witness.clone(),
                                source,
                            })
                        }
                    }
                }
            };
            session.track(witness.clone(), chash);
        }
        debug!(seed = ?self.config.seed, max_stable_mci = %self.config.max_stable_mci, "seeded witness definitions");
        Ok(())
    }

    fn already_stable(&self, unit: &UnitHash) -> ProofResult<bool> {
        let Some(store) = self.store else {
            return Ok(false);
        };
        if self.config.seed != SeedMode::Ledger {
            return Ok(false);
        }
        store
            .is_unit_stable_and_accepted(unit)
            .map_err(|source| ProofError::DefinitionResolutionFailed {
                key: unit.to_string(),
                source,
            })
    }

    /// Authenticate every witness author of `unit` and apply any definition
    /// change it makes.
    fn validate_unit(
        &self,
        unit: &Unit,
        require_definition_or_change: bool,
        engine: &DefinitionEngine<'s>,
        session: &mut VerificationSession<'s>,
    ) -> ProofResult<()> {
        let mut found = false;
        for author in &unit.authors {
            let address = &author.address;
            if !self.witnesses.contains(address) {
                continue;
            }
            let chash = session.tracked(address).cloned().ok_or_else(|| {
                ProofError::UnresolvedDefinition {
                    unit: unit.unit.clone(),
                    address: address.clone(),
                    chash: address.clone(),
                }
            })?;

            if let Some(definition) = &author.definition {
                let computed = chash160(definition).map_err(|source| ProofError::Canonical {
                    unit: unit.unit.clone(),
                    source,
                })?;
                if computed != chash {
                    return Err(ProofError::ChashMismatch {
                        unit: unit.unit.clone(),
                        address: address.clone(),
                        expected: chash,
                        computed,
                    });
                }
                session.resolver().remember(chash.clone(), definition.clone());
                found = true;
            }

            let definition = session
                .resolver()
                .definition_by_chash(&chash)
                .map_err(|e| ProofError::from_definition(&unit.unit, e))?
                .ok_or_else(|| ProofError::UnresolvedDefinition {
                    unit: unit.unit.clone(),
                    address: address.clone(),
                    chash: chash.clone(),
                })?;
            engine
                .authenticate(author, &definition, unit)
                .map_err(|e| ProofError::from_definition(&unit.unit, e))?;

            if let Some(new_chash) = definition_change(unit, address)? {
                debug!(witness = %address, unit = %unit.unit, chash = %new_chash, "witness definition changed");
                session.track(address.clone(), new_chash);
                found = true;
            }
        }

        if require_definition_or_change && !found {
            return Err(ProofError::MissingDefinitionOrChange {
                unit: unit.unit.clone(),
            });
        }
        Ok(())
    }
}

/// The chash `unit` moves `address` to, if it does.
///
/// A change applies to the address named in its payload, or to the sole
/// author of a single-author unit. The last applicable message wins.
fn definition_change(unit: &Unit, address: &Address) -> ProofResult<Option<Address>> {
    let sole_author = unit.authors.len() == 1 && &unit.authors[0].address == address;
    let mut latest = None;
    for message in unit.messages_of(APP_ADDRESS_DEFINITION_CHANGE) {
        if !(sole_author || message.payload_str("address") == Some(address.as_str())) {
            continue;
        }
        let malformed = |reason: String| ProofError::MalformedDefinitionChange {
            unit: unit.unit.clone(),
            reason,
        };
        let raw = message
            .payload_str("definition_chash")
            .ok_or_else(|| malformed("missing definition_chash".into()))?;
        let chash = Address::parse(raw).map_err(|e| malformed(e.to_string()))?;
        if !is_valid_chash(&chash) {
            return Err(malformed(format!("bad checksum in {chash}")));
        }
        latest = Some(chash);
    }
    Ok(latest)
}
