//! Common types shared across the page cache.
//!
//! This module contains the fundamental primitives:
//! - Configuration constants and [`PageCacheConfig`]
//! - Error types
//! - Identifiers ([`PageId`], [`FileId`], [`FrameId`])

pub mod config;
pub mod error;
mod frame_id;
mod page_id;

pub use config::PageCacheConfig;
pub use error::{Error, Result};
pub use frame_id::FrameId;
pub use page_id::{FileId, PageId};
