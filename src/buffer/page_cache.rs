//! Page Cache - the frame allocator beneath the pager.
//!
//! The [`PageCache`] provides:
//! - A fixed set of frames allocated once at open
//! - Identity-based lookup through a chained hash index
//! - Pin-based reference counting with RAII handles
//! - Recycling of the least recently released unpinned frame
//!
//! It never performs I/O and never decides when pages are written back; that
//! is the pager's job.

use parking_lot::Mutex;

use crate::buffer::free_list::FreeList;
use crate::buffer::frame::Frame;
use crate::buffer::hash_index::HashIndex;
use crate::buffer::replacer::LruReplacer;
use crate::buffer::{CacheStats, Occupancy, PageHandle};
use crate::common::{Error, FrameId, PageCacheConfig, PageId, Result};

/// Structural state, mutated only under the cache mutex.
#[derive(Debug)]
struct CacheState {
    /// Bound frames (`nPage` = `hash.len()`).
    hash: HashIndex,
    /// Unpinned bound frames (`nRecyclable` = `lru.size()`).
    lru: LruReplacer,
    /// Unbound frames (`nFree` = `free.len()`).
    free: FreeList,
}

/// A fixed-size cache of page frames.
///
/// # Architecture
/// ```text
/// ┌─────────────────────────────────────────────────────────────┐
/// │                         PageCache                           │
/// │  ┌──────────────────────────┐  ┌─────────────────────────┐  │
/// │  │ Mutex<CacheState>        │  │  frames: Vec<Frame>     │  │
/// │  │  hash: PageId → FrameId  │─▶│ [Frame0] [Frame1] ...   │  │
/// │  │  lru:  LruReplacer       │  │  data / extra / refcnt  │  │
/// │  │  free: FreeList          │  └─────────────────────────┘  │
/// │  └──────────────────────────┘                               │
/// └─────────────────────────────────────────────────────────────┘
/// ```
///
/// Every frame is in exactly one of three states:
/// - *free*: on the free list, not in the hash index, ref count 0
/// - *pinned*: in the hash index, ref count > 0, not on the LRU list
/// - *recyclable*: in the hash index, ref count 0, on the LRU list
///
/// # Thread Safety
/// - `state`: one `Mutex` serializes every structural change (hash insert
///   and remove, LRU link and unlink, free-list pop). No I/O happens under
///   it.
/// - `frames`: no lock, fixed size; each `Frame` has its own content locks
///   and an atomic reference count.
/// - `stats`: no lock, all atomic counters.
///
/// # Usage
/// ```
/// use pagecache::{FileId, PageCache, PageId};
///
/// let cache = PageCache::open(4096, 16, 32)?;
/// let pid = PageId::new(FileId::new([7, 0, 0, 0, 0, 0]), 3);
///
/// // Lookup only: nothing cached yet.
/// assert!(cache.fetch(&pid, false)?.is_none());
///
/// // Materialize a frame for the page.
/// let handle = cache.fetch(&pid, true)?.expect("allocating fetch");
/// assert!(handle.is_new());
/// drop(handle);
///
/// cache.close()?;
/// # Ok::<(), pagecache::Error>(())
/// ```
pub struct PageCache {
    /// Fixed arena of frames allocated at open.
    frames: Vec<Frame>,

    /// Hash index, LRU list and free list.
    state: Mutex<CacheState>,

    /// Performance statistics.
    stats: CacheStats,

    /// Sizes, immutable after open.
    config: PageCacheConfig,
}

impl PageCache {
    /// Open a cache of `cache_size` frames of `page_size` bytes, each with an
    /// `extra_size`-byte region reserved for the pager.
    ///
    /// # Errors
    /// - `Error::InvalidConfig` if `page_size` or `cache_size` is 0
    /// - `Error::AllocationFailed` if frame memory or the bookkeeping tables
    ///   cannot be allocated; no partial cache is left behind
    pub fn open(page_size: usize, cache_size: usize, extra_size: usize) -> Result<Self> {
        Self::with_config(
            PageCacheConfig::new(cache_size)
                .with_page_size(page_size)
                .with_extra_size(extra_size),
        )
    }

    /// Open a cache from a [`PageCacheConfig`].
    ///
    /// # Errors
    /// Same as [`open`](Self::open).
    pub fn with_config(config: PageCacheConfig) -> Result<Self> {
        config.validate()?;
        let cache_size = config.cache_size;

        let state = CacheState {
            hash: HashIndex::new(cache_size, cache_size)?,
            lru: LruReplacer::new(cache_size)?,
            free: FreeList::full(cache_size)?,
        };

        let mut frames = Vec::new();
        frames
            .try_reserve_exact(cache_size)
            .map_err(|source| Error::AllocationFailed {
                bytes: cache_size.saturating_mul(std::mem::size_of::<Frame>()),
                source,
            })?;
        for _ in 0..cache_size {
            frames.push(Frame::new(config.page_size, config.extra_size)?);
        }

        tracing::debug!(
            page_size = config.page_size,
            cache_size,
            extra_size = config.extra_size,
            bytes = config.memory_usage().unwrap_or(usize::MAX),
            "page cache opened"
        );

        Ok(Self {
            frames,
            state: Mutex::new(state),
            stats: CacheStats::new(),
            config,
        })
    }

    /// Close the cache and release all frame memory.
    ///
    /// Handles borrow the cache, so none can outlive this call. A frame can
    /// only still be pinned here if a handle was leaked.
    ///
    /// # Errors
    /// `Error::PinnedOnClose` if any frame is still pinned. The memory is
    /// released either way.
    pub fn close(self) -> Result<()> {
        let pinned = self.frames.iter().filter(|f| f.is_pinned()).count();
        if pinned > 0 {
            tracing::warn!(pinned, "page cache closed with pinned frames");
            return Err(Error::PinnedOnClose { pinned });
        }
        tracing::debug!(cache_size = self.config.cache_size, "page cache closed");
        Ok(())
    }

    // ========================================================================
    // Public API: Fetch
    // ========================================================================

    /// Fetch the frame bound to `page_id`, pinning it.
    ///
    /// - If the identity is bound (pinned or recyclable), pins that frame
    ///   and returns it with `is_new() == false`.
    /// - Otherwise, if `allow_allocate` is false, returns `Ok(None)` without
    ///   touching the free list or the LRU list.
    /// - Otherwise takes a frame from the free list, or failing that recycles
    ///   the least recently released unpinned frame, binds it to `page_id`
    ///   with zeroed regions and returns it with `is_new() == true`.
    ///
    /// The whole check-then-bind sequence runs under the cache lock, so two
    /// concurrent fetches of the same new identity bind exactly one frame.
    ///
    /// # Errors
    /// `Error::ResourceExhausted` if allocation was requested and every
    /// frame is pinned.
    pub fn fetch(&self, page_id: &PageId, allow_allocate: bool) -> Result<Option<PageHandle<'_>>> {
        let mut state = self.state.lock();

        // 1. Hash lookup.
        if let Some(frame_id) = state.hash.lookup(page_id) {
            state.lru.pin(frame_id);
            self.frames[frame_id.index()].pin();
            CacheStats::record(&self.stats.hits);
            tracing::trace!(%page_id, %frame_id, "page cache hit");
            return Ok(Some(PageHandle::new(self, frame_id, *page_id, false)));
        }

        CacheStats::record(&self.stats.misses);
        if !allow_allocate {
            return Ok(None);
        }

        // 2. Free list, then 3. the LRU tail.
        let frame_id = if let Some(frame_id) = state.free.pop() {
            CacheStats::record(&self.stats.allocations);
            tracing::trace!(%page_id, %frame_id, "frame taken from free list");
            frame_id
        } else if let Some(frame_id) = state.lru.evict() {
            let evicted = state.hash.remove(frame_id);
            CacheStats::record(&self.stats.evictions);
            tracing::trace!(%page_id, %frame_id, %evicted, "frame recycled");
            frame_id
        } else {
            CacheStats::record(&self.stats.exhausted);
            tracing::debug!(%page_id, cache_size = self.config.cache_size, "all frames pinned");
            return Err(Error::ResourceExhausted {
                cache_size: self.config.cache_size,
            });
        };

        // 4. Bind.
        let frame = &self.frames[frame_id.index()];
        frame.reset();
        state.hash.insert(frame_id, *page_id);
        let ref_count = frame.pin();
        if ref_count != 1 {
            tracing::error!(%frame_id, ref_count, "recycled frame was still referenced");
            panic!("{} bound with reference count {}", frame_id, ref_count);
        }

        Ok(Some(PageHandle::new(self, frame_id, *page_id, true)))
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Size of each frame's data region.
    #[inline]
    pub fn page_size(&self) -> usize {
        self.config.page_size
    }

    /// Size of each frame's extra region.
    #[inline]
    pub fn extra_size(&self) -> usize {
        self.config.extra_size
    }

    /// Number of frames.
    #[inline]
    pub fn cache_size(&self) -> usize {
        self.config.cache_size
    }

    /// The sizes this cache was opened with.
    #[inline]
    pub fn config(&self) -> &PageCacheConfig {
        &self.config
    }

    /// Get cache statistics.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Frame distribution, read under one lock acquisition.
    pub fn occupancy(&self) -> Occupancy {
        let state = self.state.lock();
        Occupancy {
            free: state.free.len(),
            pages: state.hash.len(),
            recyclable: state.lru.size(),
            cache_size: self.config.cache_size,
        }
    }

    /// Number of frames on the free list.
    pub fn free_count(&self) -> usize {
        self.state.lock().free.len()
    }

    /// Number of frames bound to an identity.
    pub fn page_count(&self) -> usize {
        self.state.lock().hash.len()
    }

    /// Number of bound frames with no pins.
    pub fn recyclable_count(&self) -> usize {
        self.state.lock().lru.size()
    }

    /// Check whether `page_id` is bound, without pinning it.
    pub fn contains(&self, page_id: &PageId) -> bool {
        self.state.lock().hash.lookup(page_id).is_some()
    }

    /// Reference count of the frame bound to `page_id`, or `None` if the
    /// identity is not cached.
    pub fn pin_count(&self, page_id: &PageId) -> Option<u32> {
        let state = self.state.lock();
        state
            .hash
            .lookup(page_id)
            .map(|frame_id| self.frames[frame_id.index()].ref_count())
    }

    /// Recyclable identities from most recently released to next victim.
    pub fn lru_order(&self) -> Vec<PageId> {
        let state = self.state.lock();
        state
            .lru
            .iter()
            .filter_map(|frame_id| state.hash.page_of(frame_id))
            .collect()
    }

    /// Verify every structural invariant, panicking on the first violation.
    ///
    /// Checks the free/pinned/recyclable partition, identity uniqueness,
    /// `free + pages == cache_size` and `recyclable == LRU length`. Must be
    /// called when no fetch or release is in flight on other threads, since
    /// reference counts are read outside their updates.
    pub fn check_invariants(&self) {
        let state = self.state.lock();
        let cache_size = self.config.cache_size;

        assert_eq!(
            state.free.len() + state.hash.len(),
            cache_size,
            "free + pages must equal cache_size"
        );
        assert_eq!(
            state.lru.iter().count(),
            state.lru.size(),
            "LRU length disagrees with recyclable count"
        );

        let mut seen = std::collections::HashSet::new();
        for (frame_id, page_id) in state.hash.iter() {
            assert!(seen.insert(page_id), "{} bound to more than one frame", page_id);
            assert_eq!(
                state.hash.lookup(&page_id),
                Some(frame_id),
                "{} not reachable from its bucket",
                frame_id
            );
        }

        for (i, frame) in self.frames.iter().enumerate() {
            let frame_id = FrameId::new(i);
            let free = state.free.contains(frame_id);
            let bound = state.hash.page_of(frame_id).is_some();
            let linked = state.lru.is_evictable(frame_id);
            let pinned = frame.is_pinned();

            if free {
                assert!(!bound && !linked && !pinned, "{} free but in use", frame_id);
            } else {
                assert!(bound, "{} neither free nor bound", frame_id);
                assert_eq!(
                    linked, !pinned,
                    "{} must be on the LRU list exactly when unpinned",
                    frame_id
                );
            }
        }
    }

    // ========================================================================
    // Internal: Called by PageHandle
    // ========================================================================

    #[inline]
    pub(crate) fn frame(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.index()]
    }

    /// Release one pin on a frame. Called by `PageHandle` on drop.
    ///
    /// The decrement happens without the cache lock. Only the thread that
    /// observes the count reach zero takes the lock, and it re-checks under
    /// the lock: a concurrent fetch may have re-pinned the frame, or another
    /// releaser may already have linked it.
    pub(crate) fn unpin_frame(&self, frame_id: FrameId) {
        if self.frames[frame_id.index()].unpin() == 0 {
            self.make_recyclable(frame_id);
        }
    }

    /// Link a frame whose count was seen reaching zero into the LRU list.
    ///
    /// Does nothing if the frame was re-pinned or already linked since the
    /// unlocked decrement.
    pub(crate) fn make_recyclable(&self, frame_id: FrameId) {
        let mut state = self.state.lock();
        if self.frames[frame_id.index()].ref_count() == 0 && !state.lru.is_evictable(frame_id) {
            state.lru.unpin(frame_id);
        }
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("config", &self.config)
            .field("occupancy", &self.occupancy())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::FileId;

    fn pid(pgno: u32) -> PageId {
        PageId::new(FileId::default(), pgno)
    }

    fn create_cache(cache_size: usize) -> PageCache {
        PageCache::open(128, cache_size, 8).unwrap()
    }

    #[test]
    fn test_open_all_frames_free() {
        let cache = create_cache(4);
        let occupancy = cache.occupancy();
        assert_eq!(occupancy.free, 4);
        assert_eq!(occupancy.pages, 0);
        assert_eq!(occupancy.recyclable, 0);
        assert_eq!(cache.page_size(), 128);
        assert_eq!(cache.extra_size(), 8);
        cache.check_invariants();
    }

    #[test]
    fn test_open_rejects_zero_sizes() {
        assert!(matches!(
            PageCache::open(0, 4, 0),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(matches!(
            PageCache::open(128, 0, 0),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_open_reports_table_allocation_failure() {
        // Frame payload fits in usize, the hash buckets do not.
        let cache_size = usize::MAX / 16;
        let err = PageCache::open(1, cache_size, 0).unwrap_err();
        assert!(matches!(
            err,
            Error::AllocationFailed { bytes, .. }
                if bytes == cache_size * std::mem::size_of::<Option<FrameId>>()
        ));
    }

    #[test]
    fn test_release_skips_frame_repinned_before_lock() {
        let cache = create_cache(2);
        let handle = cache.fetch(&pid(1), true).unwrap().unwrap();
        let frame_id = handle.frame_id();
        std::mem::forget(handle);

        // Unlocked half of a release: the count reaches zero.
        assert_eq!(cache.frame(frame_id).unpin(), 0);

        // Another fetch re-pins before the releaser takes the lock.
        let again = cache.fetch(&pid(1), false).unwrap().unwrap();
        assert_eq!(again.frame_id(), frame_id);
        assert!(!again.is_new());

        cache.make_recyclable(frame_id);
        assert_eq!(cache.recyclable_count(), 0);
        assert_eq!(cache.pin_count(&pid(1)), Some(1));
        cache.check_invariants();

        drop(again);
        assert_eq!(cache.recyclable_count(), 1);
        cache.check_invariants();
    }

    #[test]
    fn test_release_skips_frame_already_linked() {
        let cache = create_cache(2);
        let handle = cache.fetch(&pid(1), true).unwrap().unwrap();
        let frame_id = handle.frame_id();
        std::mem::forget(handle);

        assert_eq!(cache.frame(frame_id).unpin(), 0);
        // A second releaser that also saw zero got the lock first.
        cache.make_recyclable(frame_id);
        cache.make_recyclable(frame_id);

        assert_eq!(cache.recyclable_count(), 1);
        assert_eq!(cache.lru_order(), vec![pid(1)]);
        cache.check_invariants();
    }

    #[test]
    fn test_fetch_allocates_then_hits() {
        let cache = create_cache(4);

        let first = cache.fetch(&pid(1), true).unwrap().unwrap();
        assert!(first.is_new());
        assert_eq!(first.ref_count(), 1);

        let second = cache.fetch(&pid(1), true).unwrap().unwrap();
        assert!(!second.is_new());
        assert_eq!(second.frame_id(), first.frame_id());
        assert_eq!(cache.pin_count(&pid(1)), Some(2));
        assert_eq!(cache.free_count(), 3);

        drop(first);
        assert_eq!(cache.pin_count(&pid(1)), Some(1));
        assert_eq!(cache.recyclable_count(), 0);

        drop(second);
        assert_eq!(cache.pin_count(&pid(1)), Some(0));
        assert_eq!(cache.recyclable_count(), 1);
        cache.check_invariants();
    }

    #[test]
    fn test_lookup_only_miss() {
        let cache = create_cache(2);
        assert!(cache.fetch(&pid(9), false).unwrap().is_none());
        assert_eq!(cache.free_count(), 2);
        assert_eq!(cache.stats().snapshot().misses, 1);
    }

    #[test]
    fn test_lookup_only_hit_repins_recyclable() {
        let cache = create_cache(2);
        cache.fetch(&pid(1), true).unwrap().unwrap().release();
        assert_eq!(cache.recyclable_count(), 1);

        let handle = cache.fetch(&pid(1), false).unwrap().unwrap();
        assert!(!handle.is_new());
        assert_eq!(cache.recyclable_count(), 0);
        cache.check_invariants();
    }

    #[test]
    fn test_fresh_frame_is_zeroed() {
        let cache = create_cache(1);

        {
            let handle = cache.fetch(&pid(1), true).unwrap().unwrap();
            handle.data_mut()[0] = 0xAA;
            handle.extra_mut()[0] = 0xBB;
            handle.set_dirty_next(Some(FrameId::new(0)));
        }

        // Recycles the only frame.
        let handle = cache.fetch(&pid(2), true).unwrap().unwrap();
        assert!(handle.is_new());
        assert_eq!(handle.data()[0], 0);
        assert_eq!(handle.extra()[0], 0);
        assert_eq!(handle.dirty_next(), None);
    }

    #[test]
    fn test_exhausted_when_all_pinned() {
        let cache = create_cache(1);
        let _held = cache.fetch(&pid(1), true).unwrap().unwrap();

        let err = cache.fetch(&pid(2), true).unwrap_err();
        assert!(matches!(err, Error::ResourceExhausted { cache_size: 1 }));
        assert!(err.is_retryable());
        assert_eq!(cache.stats().snapshot().exhausted, 1);
        // The pinned page is untouched.
        assert!(cache.contains(&pid(1)));
        assert!(!cache.contains(&pid(2)));
    }

    #[test]
    fn test_lru_order_tracks_releases() {
        let cache = create_cache(3);
        let a = cache.fetch(&pid(1), true).unwrap().unwrap();
        let b = cache.fetch(&pid(2), true).unwrap().unwrap();
        let c = cache.fetch(&pid(3), true).unwrap().unwrap();

        drop(b);
        drop(a);
        drop(c);
        assert_eq!(cache.lru_order(), vec![pid(3), pid(1), pid(2)]);
    }

    #[test]
    fn test_close_clean() {
        let cache = create_cache(2);
        cache.fetch(&pid(1), true).unwrap().unwrap().release();
        assert!(cache.close().is_ok());
    }

    #[test]
    fn test_close_with_leaked_pin() {
        let cache = create_cache(2);
        std::mem::forget(cache.fetch(&pid(1), true).unwrap().unwrap());

        let err = cache.close().unwrap_err();
        assert!(matches!(err, Error::PinnedOnClose { pinned: 1 }));
    }

    #[test]
    fn test_stats_counts() {
        let cache = create_cache(1);
        cache.fetch(&pid(1), true).unwrap().unwrap().release();
        cache.fetch(&pid(1), true).unwrap().unwrap().release();
        cache.fetch(&pid(2), true).unwrap().unwrap().release();

        let snapshot = cache.stats().snapshot();
        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.misses, 2);
        assert_eq!(snapshot.allocations, 1);
        assert_eq!(snapshot.evictions, 1);
    }
}
