//! # Least Recently Used (LRU) Engine
//!
//! Keeps entries in exact recency order and evicts the one touched longest
//! ago. Every successful `get` and every `put` moves the entry to the front.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────────┐
//!   │                           LruCache<E>                                    │
//!   │                                                                          │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │                    Arc<Mutex<LruCore<E>>>                          │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   │                                  │                                       │
//!   │                                  ▼                                       │
//!   │   ┌────────────────────────────────────────────────────────────────────┐ │
//!   │   │                           LruCore<E>                               │ │
//!   │   │                                                                    │ │
//!   │   │   ┌──────────────────────────────────────────────────────────────┐ │ │
//!   │   │   │  FxHashMap<String, SlotId> (index into the list arena)       │ │ │
//!   │   │   │                                                              │ │ │
//!   │   │   │  ┌─────────┬────────────────────────────────────────────┐    │ │ │
//!   │   │   │  │   Key   │  SlotId                                    │    │ │ │
//!   │   │   │  ├─────────┼────────────────────────────────────────────┤    │ │ │
//!   │   │   │  │  "k1"   │  ────────────────────────────────────────┐ │    │ │ │
//!   │   │   │  │  "k2"   │  ──────────────────────────────────┐     │ │    │ │ │
//!   │   │   │  │  "k3"   │  ────────────────────────────┐     │     │ │    │ │ │
//!   │   │   │  └─────────┴──────────────────────────────┼─────┼─────┼─┘    │ │ │
//!   │   │   └───────────────────────────────────────────┼─────┼─────┼──────┘ │ │
//!   │   │                                               │     │     │        │ │
//!   │   │   ┌───────────────────────────────────────────┼─────┼─────┼──────┐ │ │
//!   │   │   │  RecencyList<E>                           ▼     ▼     ▼      │ │ │
//!   │   │   │                                                              │ │ │
//!   │   │   │ newest ─► ┌──────┐ ◄──► ┌──────┐ ◄──► ┌──────┐ ◄─ oldest     │ │ │
//!   │   │   │    (MRU)  │ k3,E │      │ k2,E │      │ k1,E │   (LRU)       │ │ │
//!   │   │   │           └──────┘      └──────┘      └──────┘               │ │ │
//!   │   │   └──────────────────────────────────────────────────────────────┘ │ │
//!   │   │                                                                    │ │
//!   │   │   capacity: usize (fixed, > 0)   factory: EntryFactory<E>          │ │
//!   │   └────────────────────────────────────────────────────────────────────┘ │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The list owns every entry together with the engine's copy of its key. The
//! index only stores `SlotId` locators, and a key is in the index exactly
//! when its node is in the list.
//!
//! ## Key Components
//!
//! | Component        | Description                                        |
//! |------------------|----------------------------------------------------|
//! | `LruCore<E>`     | Single-threaded engine: list + index + factory     |
//! | `LruCache<E>`    | Thread-safe wrapper with `parking_lot::Mutex`      |
//! | `RecencyList<E>` | Nodes newest to oldest, each with its key copy     |
//!
//! ## Operations
//!
//! | Method          | Complexity | Description                              |
//! |-----------------|------------|------------------------------------------|
//! | `get(k)`        | O(1)       | Return value, move to front              |
//! | `put(k, v)`     | O(1)       | Update + move, or insert (evict tail)    |
//! | `peek(k)`       | O(1)       | Return value, order untouched            |
//! | `remove(k)`     | O(1)       | Unlink and return the entry              |
//! | `snapshot()`    | O(n)       | Values front (MRU) to back (LRU)         |
//!
//! ## Example Usage
//!
//! ```
//! use crp::entry::Record;
//! use crp::policy::lru::LruCache;
//! use crp::traits::ReplacementPolicy;
//!
//! let cache = LruCache::new(3, Record::new).unwrap();
//! cache.put("k1", "v1").unwrap();
//! cache.put("k2", "v2").unwrap();
//! cache.put("k3", "v3").unwrap();
//! assert_eq!(cache.snapshot(), vec!["v3", "v2", "v1"]);
//!
//! cache.get("k1").unwrap();
//! assert_eq!(cache.snapshot(), vec!["v1", "v3", "v2"]);
//!
//! // k2 is now least recently used
//! cache.put("k4", "v4").unwrap();
//! assert_eq!(cache.snapshot(), vec!["v4", "v1", "v3"]);
//! ```
//!
//! ## Thread Safety
//!
//! - `LruCore`: **NOT thread-safe**; single owner only
//! - `LruCache`: every call, `snapshot` included, runs under one
//!   `parking_lot::Mutex`. The lock does not poison, and caller panics inside
//!   entry hooks are converted to errors before the structure changes.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::{RecencyList, SlotId};
use crate::error::{CacheError, InvariantError};
use crate::guard::call_entry_hook;
use crate::traits::{CacheEntry, ConcurrentCache, EntryFactory, ReplacementPolicy};

/// Single-threaded LRU engine.
///
/// See the module-level documentation for the layout.
pub struct LruCore<E: CacheEntry> {
    index: FxHashMap<String, SlotId>,
    list: RecencyList<E>,
    capacity: usize,
    factory: EntryFactory<E>,
}

impl<E: CacheEntry> LruCore<E> {
    /// Creates an engine holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use crp::entry::Record;
    /// use crp::policy::lru::LruCore;
    ///
    /// let mut cache = LruCore::new(2, Record::new).unwrap();
    /// cache.put("a", 1).unwrap();
    /// assert_eq!(cache.get("a"), Ok(&1));
    /// ```
    pub fn new<F>(capacity: usize, factory: F) -> Result<Self, CacheError>
    where
        F: Fn(&str, E::Value) -> E + Send + Sync + 'static,
    {
        Self::with_factory(capacity, Box::new(factory))
    }

    /// Creates an engine from an already boxed factory.
    pub fn with_factory(capacity: usize, factory: EntryFactory<E>) -> Result<Self, CacheError> {
        if capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }
        Ok(LruCore {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: RecencyList::with_capacity(capacity),
            capacity,
            factory,
        })
    }

    /// Returns the value for `key` and moves it to the front.
    ///
    /// # Errors
    ///
    /// [`CacheError::NotFound`] if `key` is absent. A miss changes nothing.
    pub fn get(&mut self, key: &str) -> Result<&E::Value, CacheError> {
        let Some(&id) = self.index.get(key) else {
            tracing::trace!(policy = "lru", key, "miss");
            return Err(CacheError::NotFound);
        };
        self.list.promote(id);
        self.list
            .get(id)
            .map(|entry| entry.value())
            .ok_or(CacheError::NotFound)
    }

    /// Stores `value` under `key`.
    ///
    /// An existing key has its value replaced and moves to the front. A new
    /// key is built with the factory; if the cache is full the back entry is
    /// evicted before the new one is linked at the front.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidCapacity`] if the capacity is zero.
    /// - [`CacheError::CallerPanic`] if the factory or `set_value` panics.
    ///   Order and contents are left as they were.
    pub fn put(&mut self, key: &str, value: E::Value) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }

        if let Some(&id) = self.index.get(key)
            && let Some(entry) = self.list.get_mut(id)
        {
            call_entry_hook("set_value", || entry.set_value(value))?;
            self.list.promote(id);
            return Ok(());
        }

        let entry = call_entry_hook("construct", || (self.factory)(key, value))?;
        if self.list.len() >= self.capacity {
            self.evict();
        }
        let id = self.list.push_newest(key.to_owned(), entry);
        self.index.insert(key.to_owned(), id);
        Ok(())
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<&E::Value> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| entry.value())
    }

    /// Returns `true` if `key` is present. Does not touch recency.
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Removes `key` and hands its entry back to the caller.
    pub fn remove(&mut self, key: &str) -> Option<E> {
        let id = self.index.remove(key)?;
        self.list.remove(id).map(|(_, entry)| entry)
    }

    /// Returns the entry that the next eviction would remove.
    pub fn peek_lru(&self) -> Option<&E> {
        self.list.oldest().map(|(_, entry)| entry)
    }

    /// Iterates entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.list.iter().map(|(_, _, entry)| entry)
    }

    /// Values from most to least recently used.
    pub fn snapshot(&self) -> Vec<&E::Value> {
        self.iter().map(|entry| entry.value()).collect()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry. Capacity and factory are kept.
    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    /// Verifies that index, list and capacity agree.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.validate()?;
        if self.index.len() != self.list.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but list holds {} entries",
                self.index.len(),
                self.list.len()
            )));
        }
        if self.list.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.list.len(),
                self.capacity
            )));
        }
        for (id, key, entry) in self.list.iter() {
            if self.index.get(key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "index locator for {key:?} is stale"
                )));
            }
            if entry.key() != key {
                return Err(InvariantError::new(format!(
                    "entry stored under {key:?} reports key {:?}",
                    entry.key()
                )));
            }
        }
        Ok(())
    }

    fn evict(&mut self) -> Option<E> {
        let (key, entry) = self.list.pop_oldest()?;
        self.index.remove(&key);
        tracing::debug!(policy = "lru", key = %key, "evicted");
        Some(entry)
    }
}

impl<E: CacheEntry> fmt::Debug for LruCore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

/// Thread-safe LRU cache.
///
/// Clones share the same underlying engine.
pub struct LruCache<E: CacheEntry> {
    inner: Arc<Mutex<LruCore<E>>>,
}

impl<E: CacheEntry> LruCache<E> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidCapacity`] if `capacity` is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use crp::entry::Record;
    /// use crp::policy::lru::LruCache;
    /// use crp::traits::ReplacementPolicy;
    ///
    /// let cache: LruCache<Record<String>> = LruCache::new(100, Record::new).unwrap();
    /// assert_eq!(cache.capacity(), 100);
    /// assert!(cache.is_empty());
    /// ```
    pub fn new<F>(capacity: usize, factory: F) -> Result<Self, CacheError>
    where
        F: Fn(&str, E::Value) -> E + Send + Sync + 'static,
    {
        Ok(Self::from_core(LruCore::new(capacity, factory)?))
    }

    /// Wraps an existing engine.
    pub fn from_core(core: LruCore<E>) -> Self {
        LruCache {
            inner: Arc::new(Mutex::new(core)),
        }
    }

    /// Returns the value for `key` without touching recency.
    pub fn peek(&self, key: &str) -> Option<E::Value>
    where
        E::Value: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    /// Removes `key` and returns its entry.
    pub fn remove(&self, key: &str) -> Option<E> {
        self.inner.lock().remove(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Maps every entry, most recently used first.
    ///
    /// `f` runs while the cache lock is held. Calling back into this cache,
    /// or any clone of it, from inside `f` deadlocks.
    ///
    /// # Example
    ///
    /// ```
    /// use crp::entry::Record;
    /// use crp::policy::lru::LruCache;
    /// use crp::traits::{CacheEntry, ReplacementPolicy};
    ///
    /// let cache = LruCache::new(2, Record::new).unwrap();
    /// cache.put("a", 1).unwrap();
    /// cache.put("b", 2).unwrap();
    ///
    /// let keys = cache.snapshot_with(|e| e.key().to_string());
    /// assert_eq!(keys, vec!["b", "a"]);
    /// ```
    pub fn snapshot_with<R>(&self, f: impl FnMut(&E) -> R) -> Vec<R> {
        self.inner.lock().iter().map(f).collect()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }
}

impl<E: CacheEntry> ReplacementPolicy for LruCache<E>
where
    E::Value: Clone,
{
    type Value = E::Value;

    fn get(&self, key: &str) -> Result<E::Value, CacheError> {
        self.inner.lock().get(key).cloned()
    }

    fn put(&self, key: &str, value: E::Value) -> Result<(), CacheError> {
        self.inner.lock().put(key, value)
    }

    fn snapshot(&self) -> Vec<E::Value> {
        self.inner.lock().iter().map(|e| e.value().clone()).collect()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

impl<E: CacheEntry> Clone for LruCache<E> {
    fn clone(&self) -> Self {
        LruCache {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: CacheEntry> fmt::Debug for LruCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.lock();
        f.debug_struct("LruCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

impl<E: CacheEntry + Send> ConcurrentCache for LruCache<E> {}


#[cfg(test)]
mod property_tests {
    use super::*;
    use crate::entry::Record;
    use proptest::prelude::*;

    proptest! {
        /// Property: size never exceeds capacity and invariants always hold
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_capacity_bound(
            capacity in 1usize..8,
            ops in prop::collection::vec((0u8..3, 0u8..16), 0..200)
        ) {
            let mut cache = LruCore::new(capacity, Record::new).unwrap();
            for (op, key) in ops {
                let key = key.to_string();
                match op {
                    0 => {
                        let was_full = cache.len() == capacity;
                        let existed = cache.contains(&key);
                        cache.put(&key, key.clone()).unwrap();
                        if was_full && !existed {
                            prop_assert_eq!(cache.len(), capacity);
                        }
                    },
                    1 => { let _ = cache.get(&key); },
                    _ => { cache.remove(&key); },
                }
                prop_assert!(cache.len() <= capacity);
                prop_assert!(cache.check_invariants().is_ok());
            }
        }

        /// Property: the evicted entry is always the previous back of the list
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_evicts_least_recent(
            keys in prop::collection::vec(0u8..12, 1..120)
        ) {
            let mut cache = LruCore::new(4, Record::new).unwrap();
            for key in keys {
                let key = key.to_string();
                let victim = if cache.len() == 4 && !cache.contains(&key) {
                    cache.peek_lru().map(|e| e.key().to_string())
                } else {
                    None
                };
                cache.put(&key, ()).unwrap();
                if let Some(victim) = victim {
                    prop_assert!(!cache.contains(&victim));
                }
                prop_assert_eq!(cache.iter().next().map(|e| e.key()), Some(key.as_str()));
            }
        }
    }
}
