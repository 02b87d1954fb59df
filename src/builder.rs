//! Unified cache builder for both replacement policies.
//!
//! Collects a capacity and an entry factory, validates them, and produces
//! either a concrete engine or a [`Cache`] that picks its policy at runtime.
//!
//! ## Example
//!
//! ```rust
//! use crp::builder::{CacheBuilder, CachePolicy};
//! use crp::entry::Record;
//! use crp::traits::ReplacementPolicy;
//!
//! let cache = CacheBuilder::<Record<String>>::new(100)
//!     .entry_factory(Record::new)
//!     .build(CachePolicy::Lru)
//!     .unwrap();
//! cache.put("greeting", "hello".to_string()).unwrap();
//! assert_eq!(cache.get("greeting"), Ok("hello".to_string()));
//! ```

use std::fmt;

use crate::error::{CacheError, InvariantError};
use crate::policy::lfu::{LfuCache, LfuCore};
use crate::policy::lru::{LruCache, LruCore};
use crate::traits::{CacheEntry, ConcurrentCache, EntryFactory, FrequencyEntry, ReplacementPolicy};

/// Available replacement policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction, LRU among equal counts.
    Lfu,
}

/// Cache wrapper that dispatches to the policy chosen at build time.
pub struct Cache<E: FrequencyEntry> {
    inner: CacheInner<E>,
}

enum CacheInner<E: FrequencyEntry> {
    Lru(LruCache<E>),
    Lfu(LfuCache<E>),
}

impl<E: FrequencyEntry> Cache<E> {
    /// The policy this cache was built with.
    pub fn policy(&self) -> CachePolicy {
        match &self.inner {
            CacheInner::Lru(_) => CachePolicy::Lru,
            CacheInner::Lfu(_) => CachePolicy::Lfu,
        }
    }

    /// Check if a key exists without recording an access.
    pub fn contains(&self, key: &str) -> bool {
        match &self.inner {
            CacheInner::Lru(lru) => lru.contains(key),
            CacheInner::Lfu(lfu) => lfu.contains(key),
        }
    }

    /// Remove a key, returning its entry.
    pub fn remove(&self, key: &str) -> Option<E> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.remove(key),
            CacheInner::Lfu(lfu) => lfu.remove(key),
        }
    }

    /// Clear all entries.
    pub fn clear(&self) {
        match &self.inner {
            CacheInner::Lru(lru) => lru.clear(),
            CacheInner::Lfu(lfu) => lfu.clear(),
        }
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.check_invariants(),
            CacheInner::Lfu(lfu) => lfu.check_invariants(),
        }
    }
}

impl<E: FrequencyEntry> ReplacementPolicy for Cache<E>
where
    E::Value: Clone,
{
    type Value = E::Value;

    fn get(&self, key: &str) -> Result<E::Value, CacheError> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.get(key),
            CacheInner::Lfu(lfu) => lfu.get(key),
        }
    }

    fn put(&self, key: &str, value: E::Value) -> Result<(), CacheError> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.put(key, value),
            CacheInner::Lfu(lfu) => lfu.put(key, value),
        }
    }

    fn snapshot(&self) -> Vec<E::Value> {
        match &self.inner {
            CacheInner::Lru(lru) => lru.snapshot(),
            CacheInner::Lfu(lfu) => lfu.snapshot(),
        }
    }

    fn len(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.len(),
            CacheInner::Lfu(lfu) => lfu.len(),
        }
    }

    fn capacity(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(lru) => lru.capacity(),
            CacheInner::Lfu(lfu) => lfu.capacity(),
        }
    }
}

impl<E: FrequencyEntry> Clone for Cache<E> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            CacheInner::Lru(lru) => CacheInner::Lru(lru.clone()),
            CacheInner::Lfu(lfu) => CacheInner::Lfu(lfu.clone()),
        };
        Cache { inner }
    }
}

impl<E: FrequencyEntry> fmt::Debug for Cache<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            CacheInner::Lru(lru) => f.debug_tuple("Cache").field(lru).finish(),
            CacheInner::Lfu(lfu) => f.debug_tuple("Cache").field(lfu).finish(),
        }
    }
}

impl<E: FrequencyEntry + Send> ConcurrentCache for Cache<E> {}

/// Builder for creating cache instances.
pub struct CacheBuilder<E: CacheEntry> {
    capacity: usize,
    factory: Option<EntryFactory<E>>,
}

impl<E: CacheEntry> CacheBuilder<E> {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            factory: None,
        }
    }

    /// Set the function that turns a `(key, value)` pair into a new entry.
    pub fn entry_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str, E::Value) -> E + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(factory));
        self
    }

    fn parts(self) -> Result<(usize, EntryFactory<E>), CacheError> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity);
        }
        let factory = self
            .factory
            .ok_or_else(|| CacheError::construction("entry factory missing"))?;
        Ok((self.capacity, factory))
    }

    /// Build a locked LRU cache.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InvalidCapacity`] if the capacity is zero.
    /// - [`CacheError::Construction`] if no entry factory was set.
    pub fn build_lru(self) -> Result<LruCache<E>, CacheError> {
        let (capacity, factory) = self.parts()?;
        Ok(LruCache::from_core(LruCore::with_factory(capacity, factory)?))
    }

    /// Build a locked LFU cache.
    ///
    /// # Errors
    ///
    /// Same as [`build_lru`](Self::build_lru).
    pub fn build_lfu(self) -> Result<LfuCache<E>, CacheError>
    where
        E: FrequencyEntry,
    {
        let (capacity, factory) = self.parts()?;
        Ok(LfuCache::from_core(LfuCore::with_factory(capacity, factory)?))
    }

    /// Build a cache with the specified policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use crp::builder::{CacheBuilder, CachePolicy};
    /// use crp::entry::Record;
    /// use crp::error::CacheError;
    ///
    /// let cache = CacheBuilder::<Record<u64>>::new(10)
    ///     .entry_factory(Record::new)
    ///     .build(CachePolicy::Lfu)
    ///     .unwrap();
    /// assert_eq!(cache.policy(), CachePolicy::Lfu);
    ///
    /// // a factory is mandatory
    /// let err = CacheBuilder::<Record<u64>>::new(10)
    ///     .build(CachePolicy::Lru)
    ///     .unwrap_err();
    /// assert!(matches!(err, CacheError::Construction(_)));
    /// ```
    pub fn build(self, policy: CachePolicy) -> Result<Cache<E>, CacheError>
    where
        E: FrequencyEntry,
    {
        let inner = match policy {
            CachePolicy::Lru => CacheInner::Lru(self.build_lru()?),
            CachePolicy::Lfu => CacheInner::Lfu(self.build_lfu()?),
        };
        Ok(Cache { inner })
    }
}

impl<E: CacheEntry> fmt::Debug for CacheBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("capacity", &self.capacity)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}
