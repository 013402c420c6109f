//! Error types for the page cache.

use std::collections::TryReserveError;

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All recoverable errors returned by the page cache.
///
/// A lookup that finds nothing is not an error: `fetch` reports it as
/// `Ok(None)`. Broken internal invariants (a reference count going negative,
/// a frame missing from its hash bucket) are not represented here either;
/// they panic, because continuing would risk handing out a frame bound to
/// two identities.
#[derive(Debug, Error)]
pub enum Error {
    /// The cache was opened with unusable sizes.
    #[error("invalid page cache configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Frame memory could not be allocated while opening the cache.
    ///
    /// No partially built cache survives this error.
    #[error("failed to allocate {bytes} bytes of frame memory")]
    AllocationFailed {
        bytes: usize,
        #[source]
        source: TryReserveError,
    },

    /// Allocation was requested, but every frame is pinned.
    ///
    /// The free list is empty and the LRU list holds nothing to recycle.
    /// The caller may retry once some handles have been released.
    #[error("all {cache_size} frames are pinned, nothing to recycle")]
    ResourceExhausted { cache_size: usize },

    /// The cache was closed while handles were still pinning frames.
    ///
    /// Only reachable if a handle was leaked (e.g. with `std::mem::forget`).
    #[error("page cache closed with {pinned} pinned frames")]
    PinnedOnClose { pinned: usize },
}

impl Error {
    /// Creates a configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns true if the operation may succeed when retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceExhausted { .. })
    }
}
