//! Ready-made entry type.
//!
//! [`Record`] implements both [`CacheEntry`] and [`FrequencyEntry`], so it
//! works with every policy. `Record::new` has the factory signature, which
//! makes `LruCache::new(capacity, Record::new)` the shortest way to get a
//! working cache.

use crate::traits::{CacheEntry, FrequencyEntry};

/// Key, payload and access count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<V> {
    key: String,
    value: V,
    frequency: u64,
}

impl<V> Record<V> {
    /// Creates a record at frequency 1.
    ///
    /// # Example
    ///
    /// ```
    /// use crp::entry::Record;
    /// use crp::traits::{CacheEntry, FrequencyEntry};
    ///
    /// let record = Record::new("k", 10);
    /// assert_eq!(record.key(), "k");
    /// assert_eq!(*record.value(), 10);
    /// assert_eq!(record.frequency(), 1);
    /// ```
    pub fn new(key: &str, value: V) -> Self {
        Self {
            key: key.to_owned(),
            value,
            frequency: 1,
        }
    }

    /// Consumes the record and returns its payload.
    pub fn into_value(self) -> V {
        self.value
    }
}

impl<V> CacheEntry for Record<V> {
    type Value = V;

    fn key(&self) -> &str {
        &self.key
    }

    fn value(&self) -> &V {
        &self.value
    }

    fn set_value(&mut self, value: V) {
        self.value = value;
    }
}

impl<V> FrequencyEntry for Record<V> {
    fn frequency(&self) -> u64 {
        self.frequency
    }

    fn set_frequency(&mut self, frequency: u64) {
        self.frequency = frequency;
    }
}
