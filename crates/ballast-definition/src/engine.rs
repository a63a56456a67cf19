use std::collections::BTreeMap;

use ballast_crypto::{chash160, verify_base64, UnitHasher};
use ballast_store::{LedgerStore, StoreError};
use ballast_types::definition::ALGO_SECP256K1;
use ballast_types::{Address, Author, Definition, Unit, ROOT_AUTHENTIFIER_PATH};
use tracing::debug;

use crate::error::{DefinitionError, DefinitionResult};

/// Path of child `index` under `path`.
pub fn child_path(path: &str, index: usize) -> String {
    format!("{path}.{index}")
}

/// Evaluates definitions against authentifiers.
///
/// Evaluation happens in two passes. The whole tree is first checked for
/// shape (unknown opcodes, `sig` under `not`, unsupported algorithms,
/// references where none are allowed) so that a malformed branch is rejected
/// even if a sibling would have satisfied an `or`. The tree is then evaluated
/// depth-first in declaration order, `and` and `or` short-circuiting.
#[derive(Clone, Copy)]
pub struct DefinitionEngine<'s> {
    store: Option<&'s dyn LedgerStore>,
    allow_references: bool,
}

impl<'s> DefinitionEngine<'s> {
    /// An engine that can only evaluate signature-based definitions.
    pub fn new() -> Self {
        Self {
            store: None,
            allow_references: false,
        }
    }

    /// An engine that answers `seen` and `in data feed` through `store`.
    pub fn with_store(store: &'s dyn LedgerStore) -> Self {
        Self {
            store: Some(store),
            allow_references: true,
        }
    }

    /// Enable or disable reference predicates.
    pub fn allow_references(mut self, allow: bool) -> Self {
        self.allow_references = allow;
        self
    }

    /// Check that `definition` hashes to `address`.
    pub fn check_chash(address: &Address, definition: &Definition) -> DefinitionResult<()> {
        let computed = chash160(definition)?;
        if &computed != address {
            return Err(DefinitionError::ChashMismatch {
                expected: address.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Evaluate `definition` against `authentifiers` for `unit`.
    ///
    /// `Ok(false)` means the authentifiers do not satisfy the definition.
    /// `Err` means the definition could not be evaluated at all.
    pub fn validate_authentifiers(
        &self,
        definition: &Definition,
        authentifiers: &BTreeMap<String, String>,
        unit: &Unit,
    ) -> DefinitionResult<bool> {
        let signing_hash = UnitHasher::signing_hash(unit)?;
        self.validate_with_hash(definition, authentifiers, &signing_hash)
    }

    /// As [`validate_authentifiers`](Self::validate_authentifiers), with the
    /// signing hash already computed.
    pub fn validate_with_hash(
        &self,
        definition: &Definition,
        authentifiers: &BTreeMap<String, String>,
        signing_hash: &[u8; 32],
    ) -> DefinitionResult<bool> {
        self.check_shape(definition, ROOT_AUTHENTIFIER_PATH, false)?;
        self.evaluate(definition, ROOT_AUTHENTIFIER_PATH, authentifiers, signing_hash)
    }

    /// Authenticate one author of `unit` against `definition`.
    pub fn authenticate(
        &self,
        author: &Author,
        definition: &Definition,
        unit: &Unit,
    ) -> DefinitionResult<()> {
        if self.validate_authentifiers(definition, &author.authentifiers, unit)? {
            Ok(())
        } else {
            debug!(address = %author.address, unit = %unit.unit, "authentifiers rejected");
            Err(DefinitionError::InvalidSignature {
                address: author.address.clone(),
            })
        }
    }

    fn check_shape(
        &self,
        definition: &Definition,
        path: &str,
        under_not: bool,
    ) -> DefinitionResult<()> {
        match definition {
            Definition::Sig(sig) => {
                if under_not {
                    return Err(invalid(path, "sig cannot be negated"));
                }
                match sig.algo.as_deref() {
                    None | Some(ALGO_SECP256K1) => Ok(()),
                    Some(other) => Err(invalid(path, format!("unsupported algo {other}"))),
                }
            }
            Definition::And(children) | Definition::Or(children) => children
                .iter()
                .enumerate()
                .try_for_each(|(i, c)| self.check_shape(c, &child_path(path, i), under_not)),
            Definition::Not(inner) => self.check_shape(inner, path, true),
            Definition::Seen(_) | Definition::InDataFeed(_) => {
                if self.allow_references {
                    Ok(())
                } else {
                    Err(DefinitionError::ReferencesNotAllowed {
                        op: reference_op(definition),
                        path: path.to_owned(),
                    })
                }
            }
            Definition::Unknown(_) => Err(DefinitionError::UnknownOpcode {
                op: definition.opcode().to_owned(),
                path: path.to_owned(),
            }),
        }
    }

    fn evaluate(
        &self,
        definition: &Definition,
        path: &str,
        authentifiers: &BTreeMap<String, String>,
        signing_hash: &[u8; 32],
    ) -> DefinitionResult<bool> {
        match definition {
            Definition::Sig(sig) => Ok(authentifiers
                .get(path)
                .is_some_and(|signature| verify_base64(signing_hash, signature, &sig.pubkey))),
            Definition::And(children) => {
                for (i, child) in children.iter().enumerate() {
                    if !self.evaluate(child, &child_path(path, i), authentifiers, signing_hash)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Definition::Or(children) => {
                for (i, child) in children.iter().enumerate() {
                    if self.evaluate(child, &child_path(path, i), authentifiers, signing_hash)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Definition::Not(inner) => Ok(!self.evaluate(inner, path, authentifiers, signing_hash)?),
            Definition::Seen(predicate) => self
                .store(definition, path)?
                .evaluate_seen_predicate(predicate)
                .map_err(|source| unavailable(definition, path, source)),
            Definition::InDataFeed(predicate) => self
                .store(definition, path)?
                .evaluate_data_feed_predicate(predicate)
                .map_err(|source| unavailable(definition, path, source)),
            Definition::Unknown(_) => Err(DefinitionError::UnknownOpcode {
                op: definition.opcode().to_owned(),
                path: path.to_owned(),
            }),
        }
    }

    fn store(&self, definition: &Definition, path: &str) -> DefinitionResult<&'s dyn LedgerStore> {
        self.store.ok_or_else(|| {
            unavailable(
                definition,
                path,
                StoreError::Unavailable("no ledger store attached".into()),
            )
        })
    }
}

impl Default for DefinitionEngine<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn reference_op(definition: &Definition) -> &'static str {
    match definition {
        Definition::Seen(_) => ballast_types::definition::OP_SEEN,
        _ => ballast_types::definition::OP_IN_DATA_FEED,
    }
}

fn unavailable(definition: &Definition, path: &str, source: StoreError) -> DefinitionError {
    DefinitionError::OraclePredicateUnavailable {
        op: reference_op(definition),
        path: path.to_owned(),
        source,
    }
}

fn invalid(path: &str, reason: impl Into<String>) -> DefinitionError {
    DefinitionError::InvalidDefinition {
        path: path.to_owned(),
        reason: reason.into(),
    }
}
