use std::collections::{BTreeMap, HashMap};

use ballast_definition::DefinitionResolver;
use ballast_types::{Address, BallHash, UnitHash};

use crate::error::{ProofError, ProofResult};

/// State threaded through one witness proof verification.
///
/// Lives exactly as long as one `verify` call. The only state that may
/// outlive it is a shared definition cache the caller handed to the
/// resolver.
#[derive(Debug)]
pub struct VerificationSession<'s> {
    /// Distinct witnesses seen so far, in discovery order.
    pub found_witnesses: Vec<Address>,
    /// Witness-authored unstable joints, tip first, as indices into the
    /// proof's joint list.
    pub witness_joints: Vec<usize>,
    /// `last_ball_unit`s collected after the majority was reached.
    pub last_ball_units: Vec<UnitHash>,
    /// The attested `last_ball_unit -> last_ball` checkpoints.
    pub checkpoints: BTreeMap<UnitHash, BallHash>,
    /// Definition chash currently in force for each witness.
    tracked_chashes: HashMap<Address, Address>,
    resolver: DefinitionResolver<'s>,
}

impl<'s> VerificationSession<'s> {
    pub fn new(resolver: DefinitionResolver<'s>) -> Self {
        Self {
            found_witnesses: Vec::new(),
            witness_joints: Vec::new(),
            last_ball_units: Vec::new(),
            checkpoints: BTreeMap::new(),
            tracked_chashes: HashMap::new(),
            resolver,
        }
    }

    /// Note `address` as a found witness. Returns `true` the first time.
    pub fn record_witness(&mut self, address: &Address) -> bool {
        if self.found_witnesses.contains(address) {
            return false;
        }
        self.found_witnesses.push(address.clone());
        true
    }

    /// Record a checkpoint. A unit has one ball, so two different
    /// `last_ball`s for the same `last_ball_unit` reject the proof.
    pub fn record_checkpoint(
        &mut self,
        last_ball_unit: &UnitHash,
        last_ball: &BallHash,
    ) -> ProofResult<()> {
        if let Some(existing) = self.checkpoints.get(last_ball_unit) {
            if existing != last_ball {
                return Err(ProofError::ConflictingCheckpoint {
                    unit: last_ball_unit.clone(),
                    first: existing.clone(),
                    second: last_ball.clone(),
                });
            }
        } else {
            self.checkpoints.insert(last_ball_unit.clone(), last_ball.clone());
        }
        self.last_ball_units.push(last_ball_unit.clone());
        Ok(())
    }

    pub fn track(&mut self, address: Address, chash: Address) {
        self.tracked_chashes.insert(address, chash);
    }

    pub fn tracked(&self, address: &Address) -> Option<&Address> {
        self.tracked_chashes.get(address)
    }

    pub fn resolver(&mut self) -> &mut DefinitionResolver<'s> {
        &mut self.resolver
    }
}
