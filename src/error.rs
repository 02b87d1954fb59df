//! Error types for the crp library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: Returned by engine construction, `get` and `put`.
//! - [`InvariantError`]: Returned by `check_invariants` when the internal
//!   index and ordering structures disagree.
//!
//! ## Example Usage
//!
//! ```
//! use crp::entry::Record;
//! use crp::error::CacheError;
//! use crp::policy::lru::LruCache;
//! use crp::traits::ReplacementPolicy;
//!
//! // Zero capacity is rejected up front
//! let err = LruCache::<Record<i32>>::new(0, Record::new).unwrap_err();
//! assert_eq!(err, CacheError::InvalidCapacity);
//!
//! // A miss is an ordinary, recoverable error
//! let cache: LruCache<Record<String>> = LruCache::new(2, Record::new).unwrap();
//! assert_eq!(cache.get("missing"), Err(CacheError::NotFound));
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// CacheError
// ---------------------------------------------------------------------------

/// Errors returned by cache engines.
///
/// Every variant is returned by value to the immediate caller. Nothing is
/// retried inside the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CacheError {
    /// The key is not present. Expected and recoverable.
    NotFound,
    /// The engine was configured (or is being used) with a capacity of zero.
    InvalidCapacity,
    /// A required collaborator was missing when the engine was built.
    Construction(String),
    /// Caller-supplied entry code panicked during a mutating call.
    ///
    /// The engine's structure is left as it was before the call.
    CallerPanic {
        /// The entry hook that panicked (`"construct"`, `"set_value"`, ...).
        operation: &'static str,
        /// The panic payload, when it was a string.
        message: String,
    },
}

impl CacheError {
    /// Creates a [`CacheError::Construction`] with the given description.
    #[inline]
    pub fn construction(msg: impl Into<String>) -> Self {
        Self::Construction(msg.into())
    }

    /// Returns `true` for [`CacheError::NotFound`].
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => f.write_str("not found"),
            Self::InvalidCapacity => f.write_str("capacity must be > 0"),
            Self::Construction(msg) => write!(f, "cannot build cache: {msg}"),
            Self::CallerPanic { operation, message } => {
                write!(f, "entry {operation} panicked: {message}")
            },
        }
    }
}

impl std::error::Error for CacheError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
///
/// Produced by `check_invariants` on the engines and by the `validate`
/// methods of the data structures in [`ds`](crate::ds). Carries a
/// human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
