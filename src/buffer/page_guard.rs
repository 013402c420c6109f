//! RAII pin handle for a cached page.
//!
//! [`PageHandle`] is what [`PageCache::fetch`] returns. While it lives, its
//! frame is pinned and cannot be evicted; dropping it (or calling
//! [`PageHandle::release`]) releases the pin.
//!
//! The handle does not lock page contents. Each frame carries its own
//! `RwLock`s over the data and extra regions, which the pager takes through
//! [`PageHandle::data`] / [`PageHandle::data_mut`] when it needs them.

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::buffer::frame::Frame;
use crate::buffer::page_cache::PageCache;
use crate::common::{FrameId, PageId};

/// A pin on one cached page.
///
/// Several handles may pin the same frame at once (one per `fetch`); the
/// frame becomes recyclable after the last of them is released.
///
/// # Example
/// ```
/// use pagecache::{FileId, PageCache, PageId};
///
/// let cache = PageCache::open(128, 4, 0).unwrap();
/// let pid = PageId::new(FileId::default(), 1);
///
/// let handle = cache.fetch(&pid, true).unwrap().unwrap();
/// assert!(handle.is_new());
/// handle.data_mut()[0] = 0xAB;
/// drop(handle); // unpinned, now recyclable
///
/// let handle = cache.fetch(&pid, true).unwrap().unwrap();
/// assert!(!handle.is_new());
/// assert_eq!(handle.data()[0], 0xAB);
/// ```
#[must_use = "dropping a PageHandle releases the pin immediately"]
pub struct PageHandle<'a> {
    /// Reference back to the cache for unpin on drop.
    cache: &'a PageCache,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Identity the frame was bound to when fetched.
    page_id: PageId,
    /// True if the frame was bound by this fetch (no prior content).
    is_new: bool,
}

impl<'a> PageHandle<'a> {
    /// Called by `PageCache::fetch()` after it has pinned the frame.
    pub(crate) fn new(
        cache: &'a PageCache,
        frame_id: FrameId,
        page_id: PageId,
        is_new: bool,
    ) -> Self {
        Self {
            cache,
            frame_id,
            page_id,
            is_new,
        }
    }

    #[inline]
    fn frame(&self) -> &'a Frame {
        self.cache.frame(self.frame_id)
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// True if this fetch bound a fresh frame to the identity.
    ///
    /// A fresh frame's data and extra regions are zeroed; the pager is
    /// expected to populate them. False means a cache hit with whatever
    /// content the previous holders left.
    #[inline]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Current number of pins on the frame, this one included.
    #[inline]
    pub fn ref_count(&self) -> u32 {
        self.frame().ref_count()
    }

    /// Shared access to the page bytes.
    #[inline]
    pub fn data(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.frame().data()
    }

    /// Exclusive access to the page bytes.
    #[inline]
    pub fn data_mut(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.frame().data_mut()
    }

    /// Shared access to the pager's extra region.
    #[inline]
    pub fn extra(&self) -> RwLockReadGuard<'_, Box<[u8]>> {
        self.frame().extra()
    }

    /// Exclusive access to the pager's extra region.
    #[inline]
    pub fn extra_mut(&self) -> RwLockWriteGuard<'_, Box<[u8]>> {
        self.frame().extra_mut()
    }

    /// Next frame on the pager's dirty list.
    #[inline]
    pub fn dirty_next(&self) -> Option<FrameId> {
        self.frame().dirty_next()
    }

    /// Link this frame to the next one on the pager's dirty list.
    #[inline]
    pub fn set_dirty_next(&self, next: Option<FrameId>) {
        self.frame().set_dirty_next(next);
    }

    /// Release the pin now. Same as dropping the handle.
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for PageHandle<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageHandle")
            .field("page_id", &self.page_id)
            .field("frame_id", &self.frame_id)
            .field("is_new", &self.is_new)
            .finish()
    }
}

impl Drop for PageHandle<'_> {
    fn drop(&mut self) {
        self.cache.unpin_frame(self.frame_id);
    }
}
