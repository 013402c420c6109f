//! Replacement policy for recycling unpinned frames.
//!
//! - [`LruReplacer`] - evicts the least recently released frame

mod lru;

pub use lru::LruReplacer;
