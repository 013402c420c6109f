//! Configuration for the page cache.

use crate::common::{Error, Result};

/// Default size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems. Storage engines with larger
/// pages pass their own size through [`PageCacheConfig::with_page_size`].
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of frames in a cache.
pub const DEFAULT_CACHE_SIZE: usize = 256;

/// Default size of the per-frame region reserved for the pager.
pub const DEFAULT_EXTRA_SIZE: usize = 0;

/// Number of 32-bit words in a file identifier (24 bytes).
pub const FILE_ID_WORDS: usize = 6;

/// Sizing of a [`PageCache`](crate::PageCache).
///
/// # Example
/// ```
/// use pagecache::PageCacheConfig;
///
/// let config = PageCacheConfig::new(64)
///     .with_page_size(8192)
///     .with_extra_size(32);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.frame_bytes(), 8192 + 32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCacheConfig {
    /// Size of each frame's data region in bytes.
    pub page_size: usize,
    /// Number of frames, fixed for the lifetime of the cache.
    pub cache_size: usize,
    /// Size of each frame's pager-owned extra region in bytes.
    pub extra_size: usize,
}

impl PageCacheConfig {
    /// Creates a configuration with `cache_size` frames and default page size.
    pub fn new(cache_size: usize) -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cache_size,
            extra_size: DEFAULT_EXTRA_SIZE,
        }
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the extra region size.
    pub fn with_extra_size(mut self, extra_size: usize) -> Self {
        self.extra_size = extra_size;
        self
    }

    /// Bytes owned by one frame (data + extra), saturating on overflow.
    pub fn frame_bytes(&self) -> usize {
        self.page_size.saturating_add(self.extra_size)
    }

    /// Total bytes of frame memory the cache will own.
    pub fn memory_usage(&self) -> Option<usize> {
        self.page_size
            .checked_add(self.extra_size)?
            .checked_mul(self.cache_size)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// `Error::InvalidConfig` if the page size or cache size is zero, or if
    /// the total frame memory does not fit in `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::invalid_config("page_size must be > 0"));
        }
        if self.cache_size == 0 {
            return Err(Error::invalid_config("cache_size must be > 0"));
        }
        if self.memory_usage().is_none() {
            return Err(Error::invalid_config("total frame memory overflows usize"));
        }
        Ok(())
    }
}

impl Default for PageCacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_size_is_power_of_two() {
        assert!(DEFAULT_PAGE_SIZE.is_power_of_two());
        assert_eq!(DEFAULT_PAGE_SIZE, 4096);
    }

    #[test]
    fn test_config_new() {
        let config = PageCacheConfig::new(10);
        assert_eq!(config.cache_size, 10);
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.extra_size, DEFAULT_EXTRA_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PageCacheConfig::new(4).with_page_size(128).with_extra_size(16);
        assert_eq!(config.frame_bytes(), 144);
        assert_eq!(config.memory_usage(), Some(576));
    }

    #[test]
    fn test_validation() {
        assert!(PageCacheConfig::new(0).validate().is_err());
        assert!(PageCacheConfig::new(4).with_page_size(0).validate().is_err());
        assert!(PageCacheConfig::new(usize::MAX).validate().is_err());

        // An empty pager region is allowed.
        assert!(PageCacheConfig::new(4).with_extra_size(0).validate().is_ok());
    }
}
