//! Free list of frames not bound to any page.

use crate::buffer::frame::try_vec;
use crate::common::{FrameId, Result};

/// Singly linked stack of unbound frames, linked by frame index.
///
/// Frames are pushed at open and popped (LIFO) when a fetch needs a new
/// frame. Once the cache warms up the list stays empty: recycled frames go
/// through the LRU replacer instead.
#[derive(Debug)]
pub struct FreeList {
    /// Top of the stack.
    head: Option<FrameId>,
    /// `next[i]` is the frame below frame `i` on the stack.
    next: Vec<Option<FrameId>>,
    /// `on_list[i]` is true while frame `i` is on the stack.
    on_list: Vec<bool>,
    len: usize,
}

impl FreeList {
    /// Create an empty free list able to hold `capacity` frames.
    ///
    /// # Errors
    /// `Error::AllocationFailed` if the link tables cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            head: None,
            next: try_vec(capacity, None)?,
            on_list: try_vec(capacity, false)?,
            len: 0,
        })
    }

    /// Create a free list holding every frame `0..capacity`.
    ///
    /// Frames are pushed in index order, so frame `capacity - 1` is popped
    /// first.
    pub fn full(capacity: usize) -> Result<Self> {
        let mut list = Self::new(capacity)?;
        for i in 0..capacity {
            list.push(FrameId::new(i));
        }
        Ok(list)
    }

    /// Push a frame onto the list.
    ///
    /// # Panics
    /// Panics if the frame is already on the list.
    pub fn push(&mut self, frame_id: FrameId) {
        let i = frame_id.index();
        assert!(!self.on_list[i], "{} pushed onto free list twice", frame_id);
        self.next[i] = self.head;
        self.on_list[i] = true;
        self.head = Some(frame_id);
        self.len += 1;
    }

    /// Pop the most recently pushed frame, if any.
    pub fn pop(&mut self) -> Option<FrameId> {
        let frame_id = self.head?;
        let i = frame_id.index();
        self.head = self.next[i].take();
        self.on_list[i] = false;
        self.len -= 1;
        Some(frame_id)
    }

    /// Check whether a frame is on the list.
    #[inline]
    pub fn contains(&self, frame_id: FrameId) -> bool {
        self.on_list[frame_id.index()]
    }

    /// Number of frames on the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_list_pops_lifo() {
        let mut list = FreeList::full(3).unwrap();
        assert_eq!(list.len(), 3);

        assert_eq!(list.pop(), Some(FrameId::new(2)));
        assert_eq!(list.pop(), Some(FrameId::new(1)));
        assert_eq!(list.pop(), Some(FrameId::new(0)));
        assert_eq!(list.pop(), None);
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn test_push_pop_membership() {
        let mut list = FreeList::new(4).unwrap();
        assert_eq!(list.len(), 0);

        list.push(FrameId::new(3));
        assert!(list.contains(FrameId::new(3)));
        assert!(!list.contains(FrameId::new(0)));

        assert_eq!(list.pop(), Some(FrameId::new(3)));
        assert!(!list.contains(FrameId::new(3)));
    }

    #[test]
    fn test_new_reports_allocation_failure() {
        let err = FreeList::full(usize::MAX / 4).unwrap_err();
        assert!(matches!(err, crate::common::Error::AllocationFailed { .. }));
    }

    #[test]
    #[should_panic(expected = "pushed onto free list twice")]
    fn test_double_push_panics() {
        let mut list = FreeList::new(2).unwrap();
        list.push(FrameId::new(1));
        list.push(FrameId::new(1));
    }
}
