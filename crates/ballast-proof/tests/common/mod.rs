//! Shared fixtures for ballast-proof integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use ballast_crypto::{base64_hash, chash160, BallHasher, SigningKey, UnitHasher};
use ballast_proof::{LightHistory, WitnessList, WitnessProof};
use ballast_types::{
    Address, Author, BallHash, Definition, Joint, Message, Unit, UnitHash,
    APP_ADDRESS_DEFINITION_CHANGE, COUNT_WITNESSES, ROOT_AUTHENTIFIER_PATH,
};
use serde_json::{json, Value};

/// The recorded mainnet light history response.
pub fn recorded_history() -> LightHistory {
    serde_json::from_value(recorded_value()).unwrap()
}

pub fn recorded_value() -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/light_history.json");
    let text = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&text).unwrap()
}

pub fn recorded_witnesses() -> WitnessList {
    serde_json::from_value(recorded_value()["witnesses"].clone()).unwrap()
}

pub fn unit_hash(s: &str) -> UnitHash {
    UnitHash::from_base64(s).unwrap()
}

/// A synthetic, correctly signed main chain over 12 generated witnesses.
///
/// The genesis unit is authored by every witness with inline definitions and
/// is the only unit with a ball. Every later unit has a single author,
/// builds on the previous one, and references genesis as its last ball.
pub struct ChainBuilder {
    pub keys: Vec<SigningKey>,
    pub addresses: Vec<Address>,
    pub genesis: Joint,
    /// Units after genesis, oldest first.
    pub units: Vec<Unit>,
    /// Definition each witness must reveal inline on its next unit.
    pending: Vec<Option<Definition>>,
    key_seed: u8,
}

pub fn sig_definition(key: &SigningKey) -> Definition {
    Definition::single_sig(key.verifying_key().to_base64())
}

fn text_message(text: &str) -> Message {
    let payload = Value::String(text.to_string());
    serde_json::from_value(json!({
        "app": "text",
        "payload_location": "inline",
        "payload_hash": base64_hash(&payload).unwrap().as_str(),
        "payload": payload,
    }))
    .unwrap()
}

/// An `address_definition_change` moving `address` to `definition_chash`.
pub fn definition_change_message(address: &Address, definition_chash: &str) -> Message {
    let payload = json!({
        "address": address.as_str(),
        "definition_chash": definition_chash,
    });
    serde_json::from_value(json!({
        "app": APP_ADDRESS_DEFINITION_CHANGE,
        "payload_location": "inline",
        "payload_hash": base64_hash(&payload).unwrap().as_str(),
        "payload": payload,
    }))
    .unwrap()
}

/// Fill in authentifiers and the unit hash.
fn seal(unit: &mut Unit, signers: &[&SigningKey]) {
    let digest = UnitHasher::signing_hash(unit).unwrap();
    for (author, key) in unit.authors.iter_mut().zip(signers) {
        author
            .authentifiers
            .insert(ROOT_AUTHENTIFIER_PATH.to_string(), key.authentifier(&digest).unwrap());
    }
    unit.unit = UnitHasher::unit_hash(unit).unwrap();
}

fn blank_unit() -> Unit {
    serde_json::from_value(json!({
        "unit": UnitHash::from_digest([0; 32]).as_str(),
        "version": "1.0",
        "alt": "1",
        "authors": [],
    }))
    .unwrap()
}

impl ChainBuilder {
    pub fn new() -> Self {
        let keys: Vec<SigningKey> = (1..=COUNT_WITNESSES as u8)
            .map(|i| SigningKey::from_bytes([i; 32]).unwrap())
            .collect();
        let definitions: Vec<Definition> = keys.iter().map(sig_definition).collect();
        let addresses: Vec<Address> = definitions.iter().map(|d| chash160(d).unwrap()).collect();

        let mut genesis = blank_unit();
        genesis.witnesses = addresses.clone();
        genesis.authors = addresses
            .iter()
            .zip(&definitions)
            .map(|(address, definition)| {
                let mut author = Author::new(address.clone());
                author.definition = Some(definition.clone());
                author
            })
            .collect();
        genesis.messages = vec![text_message("genesis")];
        seal(&mut genesis, &keys.iter().collect::<Vec<_>>());
        let ball = BallHasher::ball_hash(&genesis.unit, &[], &[], false).unwrap();

        Self {
            keys,
            addresses,
            genesis: Joint::with_ball(genesis, ball),
            units: Vec::new(),
            pending: vec![None; COUNT_WITNESSES],
            key_seed: 100,
        }
    }

    pub fn witness_list(&self) -> WitnessList {
        WitnessList::new(self.addresses.clone()).unwrap()
    }

    pub fn genesis_ball(&self) -> &BallHash {
        self.genesis.ball.as_ref().unwrap()
    }

    /// Append a unit authored by witness `author`, signed by `key`, with an
    /// optional inline definition.
    pub fn push(
        &mut self,
        author: usize,
        key: &SigningKey,
        definition: Option<Definition>,
        messages: Vec<Message>,
    ) -> &Unit {
        let parent = self
            .units
            .last()
            .map_or_else(|| self.genesis.unit.unit.clone(), |u| u.unit.clone());

        let mut unit = blank_unit();
        unit.witness_list_unit = Some(self.genesis.unit.unit.clone());
        unit.parent_units = vec![parent];
        unit.last_ball_unit = Some(self.genesis.unit.unit.clone());
        unit.last_ball = self.genesis.ball.clone();
        let mut entry = Author::new(self.addresses[author].clone());
        entry.definition = definition;
        unit.authors = vec![entry];
        unit.messages = if messages.is_empty() {
            vec![text_message(&format!("unit {}", self.units.len() + 1))]
        } else {
            messages
        };
        seal(&mut unit, &[key]);
        self.units.push(unit);
        self.units.last().unwrap()
    }

    /// Append a unit by witness `author` with its current key.
    pub fn append(&mut self, author: usize) -> &Unit {
        let key = self.keys[author].clone();
        let definition = self.pending[author].take();
        self.push(author, &key, definition, vec![])
    }

    /// Append units by each of `authors` in turn.
    pub fn append_all(&mut self, authors: impl IntoIterator<Item = usize>) {
        for author in authors {
            self.append(author);
        }
    }

    /// Move witness `author` to a fresh key: append a unit, signed with the
    /// old key, that changes the address's definition. The next unit by
    /// `author` reveals the new definition inline and signs with the new key.
    pub fn change_definition(&mut self, author: usize) -> Definition {
        let new_key = self.next_key();
        let new_definition = sig_definition(&new_key);
        let chash = chash160(&new_definition).unwrap();
        let message = definition_change_message(&self.addresses[author], chash.as_str());
        let old_key = self.keys[author].clone();
        let definition = self.pending[author].take();
        self.push(author, &old_key, definition, vec![message]);
        self.keys[author] = new_key;
        self.pending[author] = Some(new_definition.clone());
        new_definition
    }

    /// Edit the unit at `index` and re-sign it and every later unit,
    /// relinking parents. Witnesses sign with their current keys.
    pub fn rewrite(&mut self, index: usize, edit: impl FnOnce(&mut Unit)) {
        edit(&mut self.units[index]);
        for i in index..self.units.len() {
            if i > index {
                self.units[i].parent_units = vec![self.units[i - 1].unit.clone()];
            }
            let author = self
                .addresses
                .iter()
                .position(|a| *a == self.units[i].authors[0].address)
                .unwrap();
            let key = self.keys[author].clone();
            seal(&mut self.units[i], &[&key]);
        }
    }

    /// A signing key no witness uses yet.
    pub fn next_key(&mut self) -> SigningKey {
        self.key_seed += 1;
        SigningKey::from_bytes([self.key_seed; 32]).unwrap()
    }

    /// Unstable main chain joints, tip first.
    pub fn unstable_joints(&self) -> Vec<Joint> {
        self.units.iter().rev().cloned().map(Joint::new).collect()
    }

    pub fn proof(&self) -> WitnessProof {
        WitnessProof {
            unstable_mc_joints: self.unstable_joints(),
            witness_change_and_definition_joints: vec![self.genesis.clone()],
        }
    }
}
