//! Page cache management.
//!
//! The page cache is the in-memory frame allocator between the pager and
//! disk. It owns a fixed pool of frames and binds them to page identities
//! on demand.
//!
//! # Components
//! - [`PageCache`] - The cache: fetch, release, open, close
//! - [`PageHandle`] - RAII pin on a fetched page
//! - [`Frame`] - A slot holding page data, extra region and pin count
//! - `HashIndex` (internal) - Identity → frame lookup
//! - `FreeList` (internal) - Frames not yet bound
//! - [`replacer`] - Recycling order for unpinned frames
//! - [`CacheStats`] - Performance statistics

mod free_list;
mod frame;
mod hash_index;
mod page_cache;
mod page_guard;
pub mod replacer;
mod stats;

pub use frame::Frame;
pub use page_cache::PageCache;
pub use page_guard::PageHandle;
pub use stats::{CacheStats, Occupancy, StatsSnapshot};
