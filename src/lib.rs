//! crp: pluggable cache replacement policies.
//!
//! Two O(1) engines, LRU and LFU, behind one [`ReplacementPolicy`]
//! contract. Callers keep their own entry type; the engine only needs the
//! small capability traits in [`traits`] and a factory that builds a new
//! entry from a key and a value.
//!
//! ```
//! use crp::prelude::*;
//!
//! let cache = LruCache::new(2, Record::new).unwrap();
//! cache.put("a", 1).unwrap();
//! cache.put("b", 2).unwrap();
//! cache.get("a").unwrap();
//! cache.put("c", 3).unwrap(); // evicts "b"
//!
//! assert_eq!(cache.snapshot(), vec![3, 1]);
//! assert_eq!(cache.get("b"), Err(CacheError::NotFound));
//! ```
//!
//! Both engines store entries in a slot arena and link them by `SlotId`
//! (see [`ds`]); the key index never owns an entry.

pub mod builder;
pub mod ds;
pub mod entry;
pub mod error;
mod guard;
pub mod policy;
pub mod prelude;
pub mod traits;

pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::error::CacheError;
pub use crate::policy::lfu::LfuCache;
pub use crate::policy::lru::LruCache;
pub use crate::traits::ReplacementPolicy;
