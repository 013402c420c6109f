//! pagecache - the page cache beneath a disk-oriented storage engine.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Pager / storage engine (caller)                │
//! │      reads and writes pages, owns the on-disk format and        │
//! │      decides when dirty pages are written back                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                 fetch(PageId, allow_allocate) │ ▲ PageHandle
//!                                               ▼ │ (unpin on drop)
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Page Cache (buffer/)                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐   │
//! │  │  HashIndex   │  │ LruReplacer  │  │      FreeList        │   │
//! │  │PageId → Fid  │  │ unpinned,    │  │  never-bound frames  │   │
//! │  │              │  │ by release   │  │                      │   │
//! │  └──────────────┘  └──────────────┘  └──────────────────────┘   │
//! │        frames: Vec<Frame>  (data | extra | refcount | dirty)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, FrameId, Error, config)
//! - [`buffer`] - The page cache and its building blocks
//!
//! # Quick Start
//! ```
//! use pagecache::{FileId, PageCache, PageId};
//!
//! let cache = PageCache::open(4096, 64, 16).unwrap();
//! let pid = PageId::new(FileId::new([1, 2, 3, 4, 5, 6]), 0);
//!
//! let handle = cache.fetch(&pid, true).unwrap().unwrap();
//! if handle.is_new() {
//!     // Fresh frame: the pager fills it from disk.
//!     handle.data_mut()[..4].copy_from_slice(b"page");
//! }
//! ```

pub mod buffer;
pub mod common;

// Re-export commonly used items at crate root for convenience
pub use common::config::{DEFAULT_PAGE_SIZE, FILE_ID_WORDS};
pub use common::{Error, FileId, FrameId, PageCacheConfig, PageId, Result};

pub use buffer::{CacheStats, Frame, Occupancy, PageCache, PageHandle, StatsSnapshot};
