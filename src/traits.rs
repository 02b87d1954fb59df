//! # Cache Trait Hierarchy
//!
//! This module defines the capability contracts of the crate: what a caller's
//! entry type must provide, and what every replacement policy exposes.
//!
//! ## Architecture
//!
//! ```text
//!   Caller side                               Engine side
//!   ═══════════                               ═══════════
//!
//!   ┌──────────────────────────────┐          ┌─────────────────────────────────────┐
//!   │       CacheEntry             │          │       ReplacementPolicy             │
//!   │                              │          │                                     │
//!   │  key(&) → &str               │          │  get(&, &str) → Result<V>           │
//!   │  value(&) → &Value           │◄─────────│  put(&, &str, V) → Result<()>       │
//!   │  set_value(&mut, Value)      │  stores  │  snapshot(&) → Vec<V>               │
//!   └──────────────┬───────────────┘          │  len / is_empty / capacity          │
//!                  │                          └──────────────────┬──────────────────┘
//!                  ▼                                             │
//!   ┌──────────────────────────────┐                ┌────────────┴────────────┐
//!   │       FrequencyEntry         │                ▼                         ▼
//!   │                              │       ┌─────────────────┐      ┌─────────────────┐
//!   │  frequency(&) → u64          │       │ LruCache<E>     │      │ LfuCache<E>     │
//!   │  set_frequency(&mut, u64)    │       │ E: CacheEntry   │      │ E: Frequency-   │
//!   └──────────────────────────────┘       │                 │      │    Entry        │
//!                                          └─────────────────┘      └─────────────────┘
//! ```
//!
//! ## Entry Factory
//!
//! Engines never build a caller entry on their own. They are handed an
//! [`EntryFactory`] (`Fn(&str, Value) -> E`) at construction and call it once
//! per distinct key. [`Record::new`](crate::entry::Record::new) fits that
//! signature directly.
//!
//! ## Thread Safety
//!
//! - [`LruCache`](crate::policy::lru::LruCache) and
//!   [`LfuCache`](crate::policy::lfu::LfuCache) serialize every call through
//!   one `parking_lot::Mutex` and implement [`ConcurrentCache`].
//! - [`LruCore`](crate::policy::lru::LruCore) and
//!   [`LfuCore`](crate::policy::lfu::LfuCore) are single-threaded; wrap them
//!   yourself if you need sharing.

use crate::error::CacheError;

/// Minimal capability a caller's value holder must provide.
///
/// The engine reads the key, reads and replaces the value, and otherwise
/// treats the payload as opaque.
///
/// # Example
///
/// ```
/// use crp::traits::CacheEntry;
///
/// struct Page {
///     id: String,
///     bytes: Vec<u8>,
/// }
///
/// impl CacheEntry for Page {
///     type Value = Vec<u8>;
///
///     fn key(&self) -> &str {
///         &self.id
///     }
///
///     fn value(&self) -> &Vec<u8> {
///         &self.bytes
///     }
///
///     fn set_value(&mut self, value: Vec<u8>) {
///         self.bytes = value;
///     }
/// }
/// ```
pub trait CacheEntry {
    /// The opaque payload stored under a key.
    type Value;

    /// Returns the key this entry was created for.
    fn key(&self) -> &str;

    /// Returns the stored payload.
    fn value(&self) -> &Self::Value;

    /// Replaces the stored payload in place.
    fn set_value(&mut self, value: Self::Value);
}

/// Entry capability required by frequency-based policies.
///
/// The engine writes the frequency through [`set_frequency`](Self::set_frequency)
/// whenever it moves the entry to another bucket; [`frequency`](Self::frequency)
/// must report the last value written.
pub trait FrequencyEntry: CacheEntry {
    /// Returns the access count recorded on this entry.
    fn frequency(&self) -> u64;

    /// Records a new access count.
    fn set_frequency(&mut self, frequency: u64);
}

/// Caller-supplied constructor for new entries.
pub type EntryFactory<E> = Box<dyn Fn(&str, <E as CacheEntry>::Value) -> E + Send + Sync>;

/// The uniform contract every replacement policy satisfies.
///
/// All methods take `&self`; implementations synchronize internally.
///
/// # Example
///
/// ```
/// use crp::entry::Record;
/// use crp::policy::lfu::LfuCache;
/// use crp::policy::lru::LruCache;
/// use crp::traits::ReplacementPolicy;
///
/// fn warm<P: ReplacementPolicy<Value = u32>>(cache: &P, data: &[(&str, u32)]) {
///     for (key, value) in data {
///         cache.put(key, *value).unwrap();
///     }
/// }
///
/// let lru = LruCache::new(8, Record::new).unwrap();
/// let lfu = LfuCache::new(8, Record::new).unwrap();
/// warm(&lru, &[("a", 1), ("b", 2)]);
/// warm(&lfu, &[("a", 1), ("b", 2)]);
///
/// assert_eq!(lru.snapshot(), vec![2, 1]);
/// assert_eq!(lfu.snapshot(), vec![2, 1]);
/// ```
pub trait ReplacementPolicy {
    /// The opaque payload type.
    type Value;

    /// Returns the current value for `key` and records the access.
    ///
    /// # Errors
    ///
    /// [`CacheError::NotFound`] if the key is absent; nothing is mutated in
    /// that case.
    fn get(&self, key: &str) -> Result<Self::Value, CacheError>;

    /// Stores `value` under `key`.
    ///
    /// Updating an existing key counts as an access. Inserting a new key into
    /// a full cache evicts exactly one entry first.
    ///
    /// # Errors
    ///
    /// [`CacheError::InvalidCapacity`] if the capacity is zero, and
    /// [`CacheError::CallerPanic`] if entry code panics. Links and bucket
    /// positions are unchanged; an LFU update may already hold the new value.
    fn put(&self, key: &str, value: Self::Value) -> Result<(), CacheError>;

    /// Returns every live value in the policy's natural order.
    ///
    /// Read-only: no recency or frequency bookkeeping changes.
    fn snapshot(&self) -> Vec<Self::Value>;

    /// Returns the current number of entries.
    fn len(&self) -> usize;

    /// Returns `true` if the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the fixed capacity.
    fn capacity(&self) -> usize;
}

/// Marker trait for caches that are safe to share across threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use crp::entry::Record;
/// use crp::policy::lru::LruCache;
/// use crp::traits::{ConcurrentCache, ReplacementPolicy};
///
/// fn share<C: ReplacementPolicy<Value = u64> + ConcurrentCache + 'static>(cache: Arc<C>) {
///     let handles: Vec<_> = (0..4u64)
///         .map(|t| {
///             let cache = Arc::clone(&cache);
///             thread::spawn(move || cache.put(&t.to_string(), t).unwrap())
///         })
///         .collect();
///     for h in handles {
///         h.join().unwrap();
///     }
/// }
///
/// let cache = Arc::new(LruCache::new(16, Record::new).unwrap());
/// share(Arc::clone(&cache));
/// assert_eq!(cache.len(), 4);
/// ```
pub trait ConcurrentCache: Send + Sync {}
