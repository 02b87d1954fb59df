//! # Least Frequently Used (LFU) Engine
//!
//! Evicts the entry with the fewest accesses. Entries with equal counts are
//! ordered by recency, so the victim is the least recently touched entry of
//! the lowest frequency.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                             LfuCore<E>                                   │
//! │                                                                          │
//! │   index: FxHashMap<String, SlotId>                                       │
//! │   ┌─────────┬────────┐                                                   │
//! │   │  "hot"  │ id_0 ──┼──────────────────────────────┐                    │
//! │   │  "warm" │ id_1 ──┼──────────────────┐           │                    │
//! │   │  "cold" │ id_2 ──┼──────┐           │           │                    │
//! │   └─────────┴────────┘      │           │           │                    │
//! │                             ▼           ▼           ▼                    │
//! │   buckets: FrequencyBuckets<Slot<E>>                                     │
//! │                                                                          │
//! │   min_freq=1                                                             │
//! │       │                                                                  │
//! │       ▼                                                                  │
//! │   freq=1: [cold]          ◄── victim: tail of the min bucket             │
//! │   freq=2: [warm]                                                         │
//! │   freq=5: [hot]                                                          │
//! │                                                                          │
//! │   capacity: usize (fixed, > 0)   factory: EntryFactory<E>                │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Frequency Bookkeeping
//!
//! The bucket a node sits in is the authoritative count. Each promotion first
//! writes the new count to the caller's entry through
//! [`FrequencyEntry::set_frequency`], then relinks the node one bucket up.
//! Writing first means a panicking `set_frequency` leaves the buckets as
//! they were. On an update `put` the new value is stored before that write,
//! so a `set_frequency` panic there reports an error with the new value
//! already in place at the old frequency.
//!
//! Counts saturate at `u64::MAX`: a saturated entry stays in its bucket and
//! only moves to the front.
//!
//! ## Operations
//!
//! | Method          | Complexity | Description                                 |
//! |-----------------|------------|---------------------------------------------|
//! | `get(k)`        | O(1)       | Return value, promote one bucket            |
//! | `put(k, v)`     | O(1)       | Update + promote, or insert at freq 1       |
//! | `peek(k)`       | O(1)       | Return value, counts untouched              |
//! | `frequency(k)`  | O(1)       | Current access count                        |
//! | `remove(k)`     | O(1)       | Unlink and return the entry                 |
//! | `snapshot()`    | O(n)       | Ascending frequency, MRU first within each  |
//!
//! ## Example Usage
//!
//! ```
//! use crp::entry::Record;
//! use crp::policy::lfu::LfuCache;
//! use crp::traits::ReplacementPolicy;
//!
//! let cache = LfuCache::new(3, Record::new).unwrap();
//! cache.put("1", "1").unwrap();
//! cache.put("2", "2").unwrap();
//! cache.put("3", "3").unwrap();
//!
//! cache.get("1").unwrap();
//! cache.get("2").unwrap();
//! cache.get("3").unwrap();
//! assert_eq!(cache.snapshot(), vec!["3", "2", "1"]);
//!
//! // every entry is at frequency 2, "1" was touched longest ago
//! cache.put("4", "4").unwrap();
//! assert_eq!(cache.snapshot(), vec!["4", "3", "2"]);
//! assert_eq!(cache.frequency("4"), Some(1));
//! ```
//!
//! ## Thread Safety
//!
//! - `LfuCore`: **NOT thread-safe**
//! - `LfuCache`: same coarse `parking_lot::Mutex` discipline as
//!   [`LruCache`](crate::policy::lru::LruCache), `snapshot` included

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::{FrequencyBuckets, SlotId};
use crate::error::{CacheError, InvariantError};
use crate::guard::call_entry_hook;
use crate::traits::{CacheEntry, ConcurrentCache, EntryFactory, FrequencyEntry, ReplacementPolicy};

// The engine's own copy of the key, so evicting never calls into the entry.
#[derive(Debug)]
struct Slot<E> {
    key: String,
    entry: E,
}

/// Single-threaded LFU engine.
pub struct LfuCore<E: FrequencyEntry> {
    index: FxHashMap<String, SlotId>,
    buckets: FrequencyBuckets<Slot<E>>,
    capacity: usize,
    factory: EntryFactory<E>,
}

impl<E: FrequencyEntry> LfuCore<E> {
    /// Creates an engine holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidCapacity`] if `capacity` is zero.
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
        Ok(LfuCore {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FrequencyBuckets::with_capacity(capacity),
            capacity,
            factory,
        })
    }

    /// Returns the value for `key` and bumps its frequency by one.
    ///
    /// # Errors
    ///
    /// - [`CacheError::NotFound`] if `key` is absent. A miss changes nothing.
    /// - [`CacheError::CallerPanic`] if the entry's `set_frequency` panics;
    ///   the entry keeps its bucket.
    pub fn get(&mut self, key: &str) -> Result<&E::Value, CacheError> {
        let Some(&id) = self.index.get(key) else {
            tracing::trace!(policy = "lfu", key, "miss");
            return Err(CacheError::NotFound);
        };
        self.promote(id)?;
        self.buckets
            .get(id)
            .map(|slot| slot.entry.value())
            .ok_or(CacheError::NotFound)
    }

    /// Stores `value` under `key`.
    ///
    /// Updating an existing key replaces the value and then promotes it
    /// exactly like [`get`](Self::get). A new key is built with the factory,
    /// starts at frequency 1, and displaces the tail of the minimum-frequency
    /// bucket when the cache is full.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidCapacity`] if the capacity is zero.
    /// - [`CacheError::CallerPanic`] if the factory, `set_value` or
    ///   `set_frequency` panics. A panicking factory or `set_value` changes
    ///   nothing. A panicking `set_frequency` during an update leaves the new
    ///   value stored but the frequency and bucket position unchanged.
    pub fn put(&mut self, key: &str, value: E::Value) -> Result<(), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }

        if let Some(&id) = self.index.get(key)
            && let Some(slot) = self.buckets.get_mut(id)
        {
            call_entry_hook("set_value", || slot.entry.set_value(value))?;
            return self.promote(id);
        }

        let entry = call_entry_hook("construct", || {
            let mut entry = (self.factory)(key, value);
            entry.set_frequency(1);
            entry
        })?;
        if self.buckets.len() >= self.capacity {
            self.evict();
        }
        let id = self.buckets.insert(Slot {
            key: key.to_owned(),
            entry,
        });
        self.index.insert(key.to_owned(), id);
        Ok(())
    }

    /// Returns the value for `key` without changing its frequency.
    pub fn peek(&self, key: &str) -> Option<&E::Value> {
        let id = *self.index.get(key)?;
        self.buckets.get(id).map(|slot| slot.entry.value())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Returns the access count of `key`.
    pub fn frequency(&self, key: &str) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.buckets.frequency(id)
    }

    /// Removes `key` and hands its entry back to the caller.
    pub fn remove(&mut self, key: &str) -> Option<E> {
        let id = self.index.remove(key)?;
        self.buckets.remove(id).map(|(slot, _)| slot.entry)
    }

    /// Returns the next eviction victim and its frequency.
    pub fn peek_lfu(&self) -> Option<(&E, u64)> {
        self.buckets.peek_min().map(|(slot, freq)| (&slot.entry, freq))
    }

    /// Iterates `(entry, frequency)` in ascending frequency, most recently
    /// touched first within a frequency.
    pub fn iter(&self) -> impl Iterator<Item = (&E, u64)> {
        self.buckets.iter().map(|(_, slot, freq)| (&slot.entry, freq))
    }

    /// Values in ascending frequency, most recently touched first within a
    /// frequency.
    pub fn snapshot(&self) -> Vec<&E::Value> {
        self.iter().map(|(entry, _)| entry.value()).collect()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.index.clear();
    }

    /// Verifies buckets, index, capacity and the counts stored on entries.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.buckets.validate()?;
        if self.index.len() != self.buckets.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but buckets hold {} entries",
                self.index.len(),
                self.buckets.len()
            )));
        }
        if self.buckets.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                self.buckets.len(),
                self.capacity
            )));
        }
        for (id, slot, freq) in self.buckets.iter() {
            if self.index.get(&slot.key) != Some(&id) {
                return Err(InvariantError::new(format!(
                    "index locator for {:?} is stale",
                    slot.key
                )));
            }
            if slot.entry.key() != slot.key {
                return Err(InvariantError::new(format!(
                    "entry stored under {:?} reports key {:?}",
                    slot.key,
                    slot.entry.key()
                )));
            }
            if slot.entry.frequency() != freq {
                return Err(InvariantError::new(format!(
                    "entry {:?} records frequency {} but sits in bucket {freq}",
                    slot.key,
                    slot.entry.frequency()
                )));
            }
        }
        Ok(())
    }

    fn promote(&mut self, id: SlotId) -> Result<(), CacheError> {
        let Some(current) = self.buckets.frequency(id) else {
            return Ok(());
        };
        let next = current.saturating_add(1);
        if let Some(slot) = self.buckets.get_mut(id) {
            call_entry_hook("set_frequency", || slot.entry.set_frequency(next))?;
        }
        self.buckets.touch(id);
        Ok(())
    }

    fn evict(&mut self) -> Option<E> {
        let (slot, freq) = self.buckets.pop_min()?;
        self.index.remove(&slot.key);
        tracing::debug!(policy = "lfu", key = %slot.key, frequency = freq, "evicted");
        Some(slot.entry)
    }
}

impl<E: FrequencyEntry> fmt::Debug for LfuCore<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCore")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("min_freq", &self.buckets.min_freq())
            .finish_non_exhaustive()
    }
}

/// Thread-safe LFU cache.
///
/// Clones share the same underlying engine.
pub struct LfuCache<E: FrequencyEntry> {
    inner: Arc<Mutex<LfuCore<E>>>,
}

impl<E: FrequencyEntry> LfuCache<E> {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidCapacity`] if `capacity` is zero.
    pub fn new<F>(capacity: usize, factory: F) -> Result<Self, CacheError>
    where
        F: Fn(&str, E::Value) -> E + Send + Sync + 'static,
    {
        Ok(Self::from_core(LfuCore::new(capacity, factory)?))
    }

    /// Wraps an existing engine.
    pub fn from_core(core: LfuCore<E>) -> Self {
        LfuCache {
            inner: Arc::new(Mutex::new(core)),
        }
    }

    pub fn peek(&self, key: &str) -> Option<E::Value>
    where
        E::Value: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn frequency(&self, key: &str) -> Option<u64> {
        self.inner.lock().frequency(key)
    }

    pub fn remove(&self, key: &str) -> Option<E> {
        self.inner.lock().remove(key)
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Maps every `(entry, frequency)` pair in snapshot order.
    ///
    /// `f` runs while the cache lock is held. Calling back into this cache,
    /// or any clone of it, from inside `f` deadlocks.
    ///
    /// # Example
    ///
    /// ```
    /// use crp::entry::Record;
    /// use crp::policy::lfu::LfuCache;
    /// use crp::traits::{CacheEntry, ReplacementPolicy};
    ///
    /// let cache = LfuCache::new(4, Record::new).unwrap();
    /// cache.put("a", 1).unwrap();
    /// cache.put("b", 2).unwrap();
    /// cache.get("a").unwrap();
    ///
    /// let seen = cache.snapshot_with(|e, freq| (e.key().to_string(), freq));
    /// assert_eq!(seen, vec![("b".to_string(), 1), ("a".to_string(), 2)]);
    /// ```
    pub fn snapshot_with<R>(&self, mut f: impl FnMut(&E, u64) -> R) -> Vec<R> {
        self.inner
            .lock()
            .iter()
            .map(|(entry, freq)| f(entry, freq))
            .collect()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }
}

impl<E: FrequencyEntry> ReplacementPolicy for LfuCache<E>
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
        self.inner
            .lock()
            .iter()
            .map(|(entry, _)| entry.value().clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}

impl<E: FrequencyEntry> Clone for LfuCache<E> {
    fn clone(&self) -> Self {
        LfuCache {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: FrequencyEntry> fmt::Debug for LfuCache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.inner.lock();
        f.debug_struct("LfuCache")
            .field("len", &cache.len())
            .field("capacity", &cache.capacity())
            .finish_non_exhaustive()
    }
}

impl<E: FrequencyEntry + Send> ConcurrentCache for LfuCache<E> {}
