//! Frame - a slot in the page cache.
//!
//! A [`Frame`] holds one page worth of bytes plus the bookkeeping the cache
//! and the pager need:
//! - The page data region (`page_size` bytes)
//! - The extra region reserved for pager metadata (`extra_size` bytes)
//! - Reference count (pin count)
//! - The pager's dirty-list link
//!
//! Which identity a frame is bound to, and its hash/LRU/free-list links, live
//! in the cache's locked state, not here: they only change under the cache
//! mutex.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::{Error, FrameId, Result};

/// Allocate a `Vec` of `len` copies of `value`, reporting allocation failure
/// as an error instead of aborting.
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|source| Error::AllocationFailed {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
            source,
        })?;
    buf.resize(len, value);
    Ok(buf)
}

/// Allocate a zeroed byte buffer, reporting allocation failure as an error.
pub(crate) fn alloc_zeroed(len: usize) -> Result<Box<[u8]>> {
    try_vec(len, 0u8).map(Vec::into_boxed_slice)
}

/// A frame in the page cache.
///
/// The cache allocates all frames at open and recycles them until close.
///
/// # Thread Safety
/// All fields use interior mutability for safe concurrent access:
/// - `data`, `extra`: `RwLock` for content-level synchronization between
///   the pin holders of the same frame (the cache itself never takes them
///   while a frame is pinned)
/// - `ref_count`: `AtomicU32`, decremented outside the cache lock
/// - `dirty_next`: `Mutex`, owned by the pager
pub struct Frame {
    /// Page contents.
    data: RwLock<Box<[u8]>>,

    /// Pager-owned metadata region.
    extra: RwLock<Box<[u8]>>,

    /// Number of outstanding pins. `> 0` exactly when pinned.
    ref_count: AtomicU32,

    /// Next frame on the pager's write-back list.
    dirty_next: Mutex<Option<FrameId>>,
}

impl Frame {
    /// Create a new unbound frame with zeroed regions.
    ///
    /// # Errors
    /// `Error::AllocationFailed` if either region cannot be allocated.
    pub fn new(page_size: usize, extra_size: usize) -> Result<Self> {
        Ok(Self {
            data: RwLock::new(alloc_zeroed(page_size)?),
            extra: RwLock::new(alloc_zeroed(extra_size)?),
            ref_count: AtomicU32::new(0),
            dirty_next: Mutex::new(None),
        })
    }

    // ========================================================================
    // Content access (RwLock)
    // ========================================================================

    /// Acquire read lock on the page data.
    #[inline]
    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.data.read()
    }

    /// Acquire write lock on the page data.
    #[inline]
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.data.write()
    }

    /// Acquire read lock on the extra region.
    #[inline]
    pub fn extra(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.extra.read()
    }

    /// Acquire write lock on the extra region.
    #[inline]
    pub fn extra_mut(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.extra.write()
    }

    // ========================================================================
    // Reference count (Atomic)
    // ========================================================================

    /// Increment the reference count. Returns the new count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.ref_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement the reference count. Returns the new count.
    ///
    /// # Panics
    /// Panics if the count is already 0, leaving it at 0. This is an
    /// internal-consistency fault and is checked in release builds too.
    #[inline]
    pub fn unpin(&self) -> u32 {
        match self
            .ref_count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1))
        {
            Ok(old) => old - 1,
            Err(_) => {
                tracing::error!("reference count underflow on frame release");
                panic!("reference count underflow");
            }
        }
    }

    /// Get the current reference count.
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::Acquire)
    }

    /// Check if the frame is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.ref_count() > 0
    }

    // ========================================================================
    // Dirty-list link (pager-owned)
    // ========================================================================

    /// Next frame on the pager's dirty list.
    #[inline]
    pub fn dirty_next(&self) -> Option<FrameId> {
        *self.dirty_next.lock()
    }

    /// Set the next frame on the pager's dirty list.
    #[inline]
    pub fn set_dirty_next(&self, next: Option<FrameId>) {
        *self.dirty_next.lock() = next;
    }

    /// Clear pager-owned state to the empty baseline.
    ///
    /// Called when the frame is bound to a new identity. Zeroes both regions
    /// and the dirty link; the reference count is left to the caller.
    pub fn reset(&self) {
        self.data.write().fill(0);
        self.extra.write().fill(0);
        self.set_dirty_next(None);
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("ref_count", &self.ref_count())
            .field("page_size", &self.data.read().len())
            .field("extra_size", &self.extra.read().len())
            .finish()
    }
}
