//! Lookup strategies that map an actor to its cache entry.
//!
//! - [`KeyedStore`] keeps entries in an external map keyed by the actor's
//!   stable identifier. Entries live until the caller invalidates them.
//! - [`AttachedStore`] reads the entry out of a [`CacheSlot`] carried by the
//!   actor itself, so the cache lives exactly as long as the actor object.
//!
//! Custom strategies implement [`EntryStore`].

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, OnceLock, RwLock};

use crate::cache::CacheEntry;
use crate::error::{Error, Result};

/// Finds or creates the cache entry for an actor.
pub trait EntryStore<A, C>: Send + Sync {
    /// Returns the stable entry for this actor, creating an empty one on
    /// first use. Repeated calls for the same actor return the same entry.
    fn acquire(&self, actor_type: &str, actor: &A, context: Option<&C>) -> Result<Arc<CacheEntry>>;
}

impl<A, C, S> EntryStore<A, C> for Arc<S>
where
    S: EntryStore<A, C> + ?Sized,
{
    fn acquire(&self, actor_type: &str, actor: &A, context: Option<&C>) -> Result<Arc<CacheEntry>> {
        (**self).acquire(actor_type, actor, context)
    }
}

/// An actor with a stable identifier, usable as a [`KeyedStore`] key.
pub trait Actor {
    type Id: Eq + Hash + Clone + Send + Sync + 'static;

    fn actor_id(&self) -> Self::Id;
}

// ============================================================================
// Keyed Store
// ============================================================================

/// Entries keyed by actor identifier.
///
/// One entry is shared by every actor type evaluated for the same actor; the
/// per-type initialization markers inside the entry keep them apart. The
/// context does not take part in the key.
#[derive(Debug)]
pub struct KeyedStore<K> {
    entries: RwLock<HashMap<K, Arc<CacheEntry>>>,
}

impl<K: Eq + Hash> KeyedStore<K> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drops the entry for `id`. Returns whether one existed.
    ///
    /// Callers still holding the old `Arc` keep reading it; the next lookup
    /// starts from an empty entry.
    pub fn invalidate(&self, id: &K) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::poisoned("cache store"))?;
        Ok(entries.remove(id).is_some())
    }

    /// Drops every entry.
    pub fn clear(&self) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| Error::poisoned("cache store"))?
            .clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self
            .entries
            .read()
            .map_err(|_| Error::poisoned("cache store"))?
            .len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<K: Eq + Hash> Default for KeyedStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, C> EntryStore<A, C> for KeyedStore<A::Id>
where
    A: Actor,
{
    fn acquire(&self, _actor_type: &str, actor: &A, _context: Option<&C>) -> Result<Arc<CacheEntry>> {
        let id = actor.actor_id();

        {
            let entries = self
                .entries
                .read()
                .map_err(|_| Error::poisoned("cache store"))?;
            if let Some(entry) = entries.get(&id) {
                return Ok(Arc::clone(entry));
            }
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|_| Error::poisoned("cache store"))?;
        Ok(Arc::clone(entries.entry(id).or_default()))
    }
}

// ============================================================================
// Attached Store
// ============================================================================

/// Cache entry storage embedded in an actor object.
///
/// The entry is created on first access. Cloning an actor gives the clone a
/// fresh, empty slot: the clone is a different object with its own cache.
#[derive(Debug, Default)]
pub struct CacheSlot {
    entry: OnceLock<Arc<CacheEntry>>,
}

impl CacheSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry, creating it on first access.
    pub fn entry(&self) -> Arc<CacheEntry> {
        Arc::clone(self.entry.get_or_init(Arc::default))
    }

    /// Returns whether an entry has been created yet.
    pub fn is_empty(&self) -> bool {
        self.entry.get().is_none()
    }

    /// Discards the entry; the next access starts from scratch.
    pub fn clear(&mut self) {
        self.entry.take();
    }
}

impl Clone for CacheSlot {
    fn clone(&self) -> Self {
        Self::new()
    }
}

/// An actor that carries its own [`CacheSlot`].
pub trait HasCacheSlot {
    fn cache_slot(&self) -> &CacheSlot;
}

/// Reads cache entries out of the actor's own [`CacheSlot`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AttachedStore;

impl<A, C> EntryStore<A, C> for AttachedStore
where
    A: HasCacheSlot,
{
    fn acquire(&self, _actor_type: &str, actor: &A, _context: Option<&C>) -> Result<Arc<CacheEntry>> {
        Ok(actor.cache_slot().entry())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Account {
        id: u64,
        abac: CacheSlot,
    }

    impl Actor for Account {
        type Id = u64;

        fn actor_id(&self) -> u64 {
            self.id
        }
    }

    impl HasCacheSlot for Account {
        fn cache_slot(&self) -> &CacheSlot {
            &self.abac
        }
    }

    fn account(id: u64) -> Account {
        Account {
            id,
            abac: CacheSlot::new(),
        }
    }

    #[test]
    fn test_keyed_store_returns_stable_entry() {
        let store = KeyedStore::<u64>::new();
        let alice = account(1);

        let first = EntryStore::<Account, ()>::acquire(&store, "user", &alice, None).unwrap();
        first.set_attribute("age", 30);
        let second = EntryStore::<Account, ()>::acquire(&store, "org", &alice, None).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_keyed_store_separates_actors() {
        let store = KeyedStore::<u64>::new();
        let a = EntryStore::<Account, ()>::acquire(&store, "user", &account(1), None).unwrap();
        let b = EntryStore::<Account, ()>::acquire(&store, "user", &account(2), None).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_keyed_store_invalidate() {
        let store = KeyedStore::<u64>::new();
        let alice = account(1);

        let before = EntryStore::<Account, ()>::acquire(&store, "user", &alice, None).unwrap();
        assert!(store.invalidate(&1).unwrap());
        assert!(!store.invalidate(&1).unwrap());
        let after = EntryStore::<Account, ()>::acquire(&store, "user", &alice, None).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));

        store.clear().unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_attached_store_uses_actor_slot() {
        let mut alice = account(1);
        assert!(alice.abac.is_empty());

        let first = EntryStore::<Account, ()>::acquire(&AttachedStore, "user", &alice, None).unwrap();
        let second = EntryStore::<Account, ()>::acquire(&AttachedStore, "user", &alice, None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(!alice.abac.is_empty());

        alice.abac.clear();
        let third = EntryStore::<Account, ()>::acquire(&AttachedStore, "user", &alice, None).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_cloned_slot_starts_empty() {
        let slot = CacheSlot::new();
        slot.entry().set_attribute("age", 30);

        let copy = slot.clone();
        assert!(copy.is_empty());
        assert_eq!(copy.entry().get_attribute("age"), None);
    }

    #[test]
    fn test_shared_store_through_arc() {
        let store = Arc::new(KeyedStore::<u64>::new());
        let handle: Arc<KeyedStore<u64>> = Arc::clone(&store);
        let entry = EntryStore::<Account, ()>::acquire(&handle, "user", &account(7), None).unwrap();
        entry.set_attribute("age", 30);

        assert_eq!(store.len().unwrap(), 1);
    }
}
