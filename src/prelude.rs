pub use crate::builder::{Cache, CacheBuilder, CachePolicy};
pub use crate::entry::Record;
pub use crate::error::{CacheError, InvariantError};
pub use crate::policy::lfu::{LfuCache, LfuCore};
pub use crate::policy::lru::{LruCache, LruCore};
pub use crate::traits::{CacheEntry, ConcurrentCache, EntryFactory, FrequencyEntry, ReplacementPolicy};
