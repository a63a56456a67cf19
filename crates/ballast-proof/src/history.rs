use std::collections::{BTreeMap, BTreeSet};

use ballast_types::{BallHash, BallRecord, Joint, UnitHash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ball_chain::BallChainVerifier;
use crate::error::{ProofError, ProofResult};
use crate::integrity::check_unit_hash;
use crate::witness_proof::{WitnessProofOutcome, WitnessProofVerifier};

/// A light client's history response: a witness proof, the requested joints
/// and the ball chain linking them to the proof's checkpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightHistory {
    pub unstable_mc_joints: Vec<Joint>,
    #[serde(default)]
    pub witness_change_and_definition_joints: Vec<Joint>,
    #[serde(default)]
    pub joints: Vec<Joint>,
    #[serde(default)]
    pub proofchain_balls: Vec<BallRecord>,
}

/// One joint of a verified history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerifiedJoint {
    pub unit: UnitHash,
    /// The proven ball, for stable joints.
    pub ball: Option<BallHash>,
    pub is_stable: bool,
    pub is_nonserial: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryOutcome {
    pub witness_proof: WitnessProofOutcome,
    pub proven_balls: BTreeMap<UnitHash, BallHash>,
    pub joints: Vec<VerifiedJoint>,
}

impl HistoryOutcome {
    pub fn checkpoints(&self) -> &BTreeMap<UnitHash, BallHash> {
        &self.witness_proof.checkpoints
    }

    pub fn stable_joints(&self) -> impl Iterator<Item = &VerifiedJoint> {
        self.joints.iter().filter(|j| j.is_stable)
    }
}

/// Verifies a [`LightHistory`] end to end.
pub struct LightHistoryVerifier<'s> {
    witness_proof: WitnessProofVerifier<'s>,
    trusted: BTreeSet<BallHash>,
}

impl<'s> LightHistoryVerifier<'s> {
    pub fn new(witness_proof: WitnessProofVerifier<'s>) -> Self {
        Self {
            witness_proof,
            trusted: BTreeSet::new(),
        }
    }

    /// Balls the caller already holds as stable.
    pub fn with_trusted_balls(mut self, balls: impl IntoIterator<Item = BallHash>) -> Self {
        self.trusted.extend(balls);
        self
    }

    pub fn verify(&self, history: &LightHistory) -> ProofResult<HistoryOutcome> {
        let witness_proof = self.witness_proof.verify_joints(
            &history.unstable_mc_joints,
            &history.witness_change_and_definition_joints,
        )?;

        let mut known = self.trusted.clone();
        known.extend(witness_proof.checkpoints.values().cloned());
        let chain = BallChainVerifier::verify_chain_with_units(
            &history.proofchain_balls,
            &known,
            history.joints.iter().map(|j| &j.unit),
        )?;

        let mut joints = Vec::with_capacity(history.joints.len());
        for joint in &history.joints {
            let unit = &joint.unit.unit;
            check_unit_hash(&joint.unit)?;
            let proven = chain.proven.get(unit);
            if let Some(ball) = &joint.ball {
                if proven != Some(ball) {
                    return Err(ProofError::UnprovenBall {
                        unit: unit.clone(),
                        ball: ball.clone(),
                    });
                }
            }
            debug!(unit = %unit, stable = proven.is_some(), "history joint verified");
            joints.push(VerifiedJoint {
                unit: unit.clone(),
                ball: proven.cloned(),
                is_stable: proven.is_some(),
                is_nonserial: chain.nonserial.contains(unit),
            });
        }

        info!(
            joints = joints.len(),
            stable = joints.iter().filter(|j| j.is_stable).count(),
            proven_balls = chain.proven.len(),
            "light history verified"
        );
        Ok(HistoryOutcome {
            witness_proof,
            proven_balls: chain.proven,
            joints,
        })
    }
}
