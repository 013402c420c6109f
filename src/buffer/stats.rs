//! Page cache statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics tracked by the page cache.
///
/// All fields are atomic for lock-free, thread-safe updates.
///
/// # Memory Ordering
/// We use `Ordering::Relaxed` for all operations because:
/// - We only need atomicity (no partial updates)
/// - We don't need synchronization between different counters
/// - Statistics are "eventually consistent" - exact ordering doesn't matter
///
/// # Example
/// ```
/// use pagecache::CacheStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = CacheStats::new();
/// stats.hits.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.hits.load(Ordering::Relaxed), 1);
/// ```
#[derive(Debug)]
pub struct CacheStats {
    /// Fetches that found the identity already bound.
    pub hits: AtomicU64,

    /// Fetches that did not find the identity (lookup-only or allocating).
    pub misses: AtomicU64,

    /// Frames taken from the free list.
    pub allocations: AtomicU64,

    /// Frames recycled from the LRU tail.
    pub evictions: AtomicU64,

    /// Allocating fetches that failed because every frame was pinned.
    pub exhausted: AtomicU64,
}

impl CacheStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            allocations: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            exhausted: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            allocations: self.allocations.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.allocations.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
        self.exhausted.store(0, Ordering::Relaxed);
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time snapshot of page cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub allocations: u64,
    pub evictions: u64,
    pub exhausted: u64,
}

impl StatsSnapshot {
    /// Calculate hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, allocations: {}, evictions: {}, exhausted: {}, hit_rate: {:.2}% }}",
            self.hits,
            self.misses,
            self.allocations,
            self.evictions,
            self.exhausted,
            self.hit_rate() * 100.0
        )
    }
}

/// How the frames of a cache are currently distributed.
///
/// Read under a single acquisition of the cache lock, so
/// `free + pages == cache_size` always holds for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupancy {
    /// Frames on the free list (`nFree`).
    pub free: usize,
    /// Frames bound to an identity, pinned or not (`nPage`).
    pub pages: usize,
    /// Bound frames with no pins, eligible for eviction (`nRecyclable`).
    pub recyclable: usize,
    /// Total frames.
    pub cache_size: usize,
}

impl Occupancy {
    /// Bound frames currently pinned.
    pub fn pinned(&self) -> usize {
        self.pages - self.recyclable
    }
}
