//! Shared store of item definitions and their resolved runtime handles.
//!
//! Readers load an immutable snapshot and never block. Writers take one coarse
//! lock, copy the current snapshot, apply their change and publish the copy, so
//! a reader sees either the whole change or none of it. Two concurrent
//! registrations of the same identifier therefore cannot both succeed.
//!
//! The registry is constructed explicitly and shared by reference; there is no
//! global instance.

use crate::definition::{Category, ItemDefinition, ItemKey};
use crate::error::RegisterError;
use crate::handle::{ImageHandle, RuntimeHandle};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
/// One registered definition plus the handle resolution attached to it.
pub struct RegistryEntry {
    pub definition: Arc<ItemDefinition>,
    pub handle: Option<RuntimeHandle>,
}

#[derive(Clone, Debug, Default)]
struct Snapshot {
    entries: BTreeMap<ItemKey, Arc<RegistryEntry>>,
}

#[derive(Debug)]
/// Concurrency-safe `identifier -> definition/handle` store.
pub struct Registry {
    snap: ArcSwap<Snapshot>,
    writer: Mutex<()>,
    /// Entries some resolution batch is currently creating.
    claims: Mutex<BTreeSet<ItemKey>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            snap: ArcSwap::from_pointee(Snapshot::default()),
            writer: Mutex::new(()),
            claims: Mutex::new(BTreeSet::new()),
        }
    }

    /// Register a definition, reporting why it was refused.
    ///
    /// The first registration of an identifier wins; later ones (in any
    /// casing) are rejected rather than overwriting it.
    pub fn try_register(&self, definition: ItemDefinition) -> Result<(), RegisterError> {
        definition.validate()?;
        let key = definition.key();

        let _guard = self.writer.lock();
        let current = self.snap.load_full();
        if current.entries.contains_key(&key) {
            return Err(RegisterError::Duplicate(definition.identifier));
        }
        let mut next = Snapshot::clone(&current);
        next.entries.insert(
            key,
            Arc::new(RegistryEntry {
                definition: Arc::new(definition),
                handle: None,
            }),
        );
        self.snap.store(Arc::new(next));
        Ok(())
    }

    /// Register a definition; `false` (and a warning) when it is invalid or its
    /// identifier is taken.
    pub fn register(&self, definition: ItemDefinition) -> bool {
        let identifier = definition.identifier.clone();
        match self.try_register(definition) {
            Ok(()) => {
                debug!(id = %identifier, "registered item");
                true
            }
            Err(err) => {
                warn!(id = %identifier, phase = "register", "rejected item: {err}");
                false
            }
        }
    }

    /// Attach the runtime handle produced by resolution. Unknown identifiers
    /// are ignored; returns whether an entry was updated.
    pub fn attach_runtime_handle(&self, identifier: &str, handle: RuntimeHandle) -> bool {
        self.update(identifier, |entry| entry.handle = Some(handle))
    }

    /// Record the icon resolved for an entry. Unknown identifiers are ignored.
    pub fn attach_icon(&self, identifier: &str, icon: ImageHandle) -> bool {
        self.update(identifier, |entry| {
            let mut definition = ItemDefinition::clone(&entry.definition);
            definition.icon = Some(icon);
            entry.definition = Arc::new(definition);
        })
    }

    /// Reserve an unresolved entry for creation.
    ///
    /// `None` when the entry is unknown, already has a handle, or is held by
    /// another claim. The reservation ends when the claim is dropped; attach
    /// the handle before that so later claimants see the entry as resolved.
    pub fn claim_resolution(&self, identifier: &str) -> Option<ResolutionClaim<'_>> {
        let key = ItemKey::new(identifier);
        let mut claims = self.claims.lock();
        let entry = self.entry(identifier)?;
        if entry.handle.is_some() || !claims.insert(key.clone()) {
            return None;
        }
        Some(ResolutionClaim {
            registry: self,
            key,
            entry,
        })
    }

    /// Remove a definition and its handle. Idempotent.
    pub fn unregister(&self, identifier: &str) -> bool {
        let key = ItemKey::new(identifier);
        let _guard = self.writer.lock();
        let current = self.snap.load_full();
        if !current.entries.contains_key(&key) {
            return false;
        }
        let mut next = Snapshot::clone(&current);
        next.entries.remove(&key);
        self.snap.store(Arc::new(next));
        true
    }

    pub fn get(&self, identifier: &str) -> Option<Arc<ItemDefinition>> {
        self.entry(identifier).map(|entry| entry.definition.clone())
    }

    pub fn handle(&self, identifier: &str) -> Option<RuntimeHandle> {
        self.entry(identifier).and_then(|entry| entry.handle.clone())
    }

    pub fn entry(&self, identifier: &str) -> Option<Arc<RegistryEntry>> {
        self.snap.load().entries.get(&ItemKey::new(identifier)).cloned()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.snap
            .load()
            .entries
            .contains_key(&ItemKey::new(identifier))
    }

    pub fn count(&self) -> usize {
        self.snap.load().entries.len()
    }

    /// Every definition, ordered by folded identifier.
    pub fn all(&self) -> Vec<Arc<ItemDefinition>> {
        self.filtered(|_| true)
    }

    pub fn by_category(&self, category: Category) -> Vec<Arc<ItemDefinition>> {
        self.filtered(|entry| entry.definition.category == category)
    }

    pub fn consumables(&self) -> Vec<Arc<ItemDefinition>> {
        self.filtered(|entry| entry.definition.consumable)
    }

    /// Consumables that name an on-use effect.
    pub fn with_effect_link(&self) -> Vec<Arc<ItemDefinition>> {
        self.filtered(|entry| entry.definition.effect_link().is_some())
    }

    /// Definitions that have no runtime handle yet.
    pub fn unresolved(&self) -> Vec<Arc<ItemDefinition>> {
        self.filtered(|entry| entry.handle.is_none())
    }

    fn filtered(&self, keep: impl Fn(&RegistryEntry) -> bool) -> Vec<Arc<ItemDefinition>> {
        self.snap
            .load()
            .entries
            .values()
            .filter(|entry| keep(entry))
            .map(|entry| entry.definition.clone())
            .collect()
    }

    fn update(&self, identifier: &str, apply: impl FnOnce(&mut RegistryEntry)) -> bool {
        let key = ItemKey::new(identifier);
        let _guard = self.writer.lock();
        let current = self.snap.load_full();
        let Some(existing) = current.entries.get(&key) else {
            return false;
        };
        let mut entry = RegistryEntry::clone(existing);
        apply(&mut entry);
        let mut next = Snapshot::clone(&current);
        next.entries.insert(key, Arc::new(entry));
        self.snap.store(Arc::new(next));
        true
    }
}

/// Exclusive right to create the runtime object for one entry.
#[derive(Debug)]
pub struct ResolutionClaim<'r> {
    registry: &'r Registry,
    key: ItemKey,
    entry: Arc<RegistryEntry>,
}

impl ResolutionClaim<'_> {
    /// The entry as it was when claimed.
    pub fn entry(&self) -> &RegistryEntry {
        &self.entry
    }
}

impl Drop for ResolutionClaim<'_> {
    fn drop(&mut self) {
        self.registry.claims.lock().remove(&self.key);
    }
}
