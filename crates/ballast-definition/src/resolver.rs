use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ballast_store::LedgerStore;
use ballast_types::{Address, Definition, MciBound};
use tracing::debug;

use crate::engine::DefinitionEngine;
use crate::error::{DefinitionError, DefinitionResult};

/// Caller-owned `chash -> definition` cache shared across verification calls.
///
/// Entries are only ever inserted. A chash fixes its definition's content, so
/// concurrent writers of the same key always write the same value.
pub type SharedDefinitionCache = Arc<RwLock<HashMap<Address, Definition>>>;

/// A definition together with the chash it was resolved through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDefinition {
    pub chash: Address,
    pub definition: Definition,
}

/// Finds the definition in force for an address.
///
/// An address starts out defined by the definition whose chash is the address
/// itself. A stable `address_definition_change` moves it to another chash.
/// Lookups go to the ledger store. Every definition seen during one
/// verification session is remembered so the store is asked at most once per
/// chash.
pub struct DefinitionResolver<'s> {
    store: Option<&'s dyn LedgerStore>,
    session: HashMap<Address, Definition>,
    shared: Option<SharedDefinitionCache>,
}

impl<'s> DefinitionResolver<'s> {
    /// A resolver backed by `store`.
    pub fn new(store: &'s dyn LedgerStore) -> Self {
        Self {
            store: Some(store),
            session: HashMap::new(),
            shared: None,
        }
    }

    /// A resolver with no ledger behind it. Only definitions handed to
    /// [`remember`](Self::remember) or found in a shared cache resolve.
    pub fn detached() -> Self {
        Self {
            store: None,
            session: HashMap::new(),
            shared: None,
        }
    }

    /// Also read from and write to a caller-owned cache.
    pub fn with_shared_cache(mut self, cache: SharedDefinitionCache) -> Self {
        self.shared = Some(cache);
        self
    }

    /// The chash currently in force for `address` within `max_stable_mci`.
    pub fn effective_chash(
        &self,
        address: &Address,
        max_stable_mci: MciBound,
    ) -> DefinitionResult<Address> {
        let Some(store) = self.store else {
            return Ok(address.clone());
        };
        let changed = store
            .definition_change_for_address(address, max_stable_mci)
            .map_err(|source| DefinitionError::Lookup {
                key: address.clone(),
                source,
            })?;
        if let Some(chash) = &changed {
            debug!(address = %address, chash = %chash, "address definition was changed");
        }
        Ok(changed.unwrap_or_else(|| address.clone()))
    }

    /// The definition in force for `address` within `max_stable_mci`.
    ///
    /// Fails with [`DefinitionError::NotFound`] carrying the effective chash
    /// when that chash has no known definition.
    pub fn resolve(
        &mut self,
        address: &Address,
        max_stable_mci: MciBound,
    ) -> DefinitionResult<ResolvedDefinition> {
        let chash = self.effective_chash(address, max_stable_mci)?;
        let definition = self.resolve_at_chash(&chash, max_stable_mci)?;
        Ok(ResolvedDefinition { chash, definition })
    }

    /// The definition stored under `chash`, revealed within `max_stable_mci`.
    pub fn resolve_at_chash(
        &mut self,
        chash: &Address,
        max_stable_mci: MciBound,
    ) -> DefinitionResult<Definition> {
        if let Some(definition) = self.cached(chash) {
            return Ok(definition);
        }
        let stored = match self.store {
            Some(store) => store.definition_at(chash, max_stable_mci),
            None => Ok(None),
        };
        self.admit(chash, stored)?
            .ok_or_else(|| DefinitionError::NotFound {
                chash: chash.clone(),
            })
    }

    /// The definition stored under `chash` regardless of when it was
    /// revealed, or `None`.
    pub fn definition_by_chash(&mut self, chash: &Address) -> DefinitionResult<Option<Definition>> {
        if let Some(definition) = self.cached(chash) {
            return Ok(Some(definition));
        }
        let stored = match self.store {
            Some(store) => store.definition(chash),
            None => Ok(None),
        };
        self.admit(chash, stored)
    }

    /// Record a definition already checked against `chash`.
    pub fn remember(&mut self, chash: Address, definition: Definition) {
        if let Some(shared) = &self.shared {
            shared
                .write()
                .expect("lock poisoned")
                .insert(chash.clone(), definition.clone());
        }
        self.session.insert(chash, definition);
    }

    /// Number of definitions remembered in this session.
    pub fn session_len(&self) -> usize {
        self.session.len()
    }

    fn cached(&self, chash: &Address) -> Option<Definition> {
        if let Some(definition) = self.session.get(chash) {
            return Some(definition.clone());
        }
        self.shared
            .as_ref()
            .and_then(|shared| shared.read().expect("lock poisoned").get(chash).cloned())
    }

    /// Check a store answer against its key before caching it.
    fn admit(
        &mut self,
        chash: &Address,
        stored: ballast_store::StoreResult<Option<Definition>>,
    ) -> DefinitionResult<Option<Definition>> {
        let stored = stored.map_err(|source| DefinitionError::Lookup {
            key: chash.clone(),
            source,
        })?;
        let Some(definition) = stored else {
            return Ok(None);
        };
        DefinitionEngine::check_chash(chash, &definition)?;
        debug!(chash = %chash, "definition loaded from store");
        self.remember(chash.clone(), definition.clone());
        Ok(Some(definition))
    }
}

impl std::fmt::Debug for DefinitionResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionResolver")
            .field("has_store", &self.store.is_some())
            .field("session", &self.session.len())
            .field("shared", &self.shared.is_some())
            .finish()
    }
}
