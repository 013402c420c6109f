//! Frame identifier type.

use std::fmt;

/// Index of a frame in the cache's frame arena.
///
/// Frames are allocated once in a `Vec<Frame>` and recycled, never freed
/// individually, so an index stays valid for the whole life of the cache.
/// Every intrusive link (hash chain, LRU, free list, dirty list) is an
/// `Option<FrameId>` rather than a pointer.
///
/// # Example
/// ```
/// use pagecache::FrameId;
///
/// let frame_id = FrameId::new(5);
/// assert_eq!(frame_id.index(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub usize);

impl FrameId {
    /// Create a new FrameId.
    #[inline]
    pub const fn new(id: usize) -> Self {
        FrameId(id)
    }

    /// Position in the frame arena.
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_id_new() {
        let fid = FrameId::new(10);
        assert_eq!(fid.index(), 10);
    }

    #[test]
    fn test_frame_id_equality() {
        assert_eq!(FrameId::new(5), FrameId::new(5));
        assert_ne!(FrameId::new(5), FrameId::new(6));
    }

    #[test]
    fn test_frame_id_display() {
        assert_eq!(format!("{}", FrameId::new(42)), "Frame(42)");
    }
}
