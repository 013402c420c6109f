//! LRU (Least Recently Used) replacement list.
//!
//! Holds every bound frame whose reference count is zero, ordered by when it
//! was released. The head is the most recently released frame; the tail is
//! the next victim.

use crate::buffer::frame::try_vec;
use crate::common::{FrameId, Result};

/// Intrusive doubly linked LRU list over frame indices.
///
/// ```text
///   head                                      tail
///    │                                          │
///    ▼                                          ▼
///  Frame(4) ⇄ Frame(1) ⇄ Frame(7) ⇄ ... ⇄ Frame(2) ──▶ evict()
///  (released last)                   (released first)
/// ```
///
/// Instead of an always-present anchor node, the list keeps explicit
/// `head`/`tail` indices and a per-frame `linked` flag. A pinned frame is
/// never linked, so eviction can only ever pick an unpinned frame.
#[derive(Debug)]
pub struct LruReplacer {
    head: Option<FrameId>,
    tail: Option<FrameId>,
    /// `prev[i]` is the neighbour of frame `i` towards the head.
    prev: Vec<Option<FrameId>>,
    /// `next[i]` is the neighbour of frame `i` towards the tail.
    next: Vec<Option<FrameId>>,
    /// `linked[i]` is true while frame `i` is on the list.
    linked: Vec<bool>,
    len: usize,
}

impl LruReplacer {
    /// Create an empty replacer for `capacity` frames.
    ///
    /// # Errors
    /// `Error::AllocationFailed` if the link tables cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            head: None,
            tail: None,
            prev: try_vec(capacity, None)?,
            next: try_vec(capacity, None)?,
            linked: try_vec(capacity, false)?,
            len: 0,
        })
    }

    /// Record that a frame's last pin was released: link it at the head.
    ///
    /// # Panics
    /// Panics if the frame is already linked.
    pub fn unpin(&mut self, frame_id: FrameId) {
        let i = frame_id.index();
        assert!(!self.linked[i], "{} linked into LRU list twice", frame_id);

        self.prev[i] = None;
        self.next[i] = self.head;
        match self.head {
            Some(old_head) => self.prev[old_head.index()] = Some(frame_id),
            None => self.tail = Some(frame_id),
        }
        self.head = Some(frame_id);
        self.linked[i] = true;
        self.len += 1;
    }

    /// Take a frame off the list because it is being pinned.
    ///
    /// Returns true if the frame was linked (it was recyclable), false if it
    /// was already pinned.
    pub fn pin(&mut self, frame_id: FrameId) -> bool {
        let i = frame_id.index();
        if !self.linked[i] {
            return false;
        }

        let prev = self.prev[i].take();
        let next = self.next[i].take();
        match prev {
            Some(p) => self.next[p.index()] = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.prev[n.index()] = prev,
            None => self.tail = prev,
        }
        self.linked[i] = false;
        self.len -= 1;
        true
    }

    /// The least recently released frame, without removing it.
    #[inline]
    pub fn victim(&self) -> Option<FrameId> {
        self.tail
    }

    /// Remove and return the least recently released frame.
    ///
    /// Returns `None` if every bound frame is pinned.
    pub fn evict(&mut self) -> Option<FrameId> {
        let frame_id = self.tail?;
        self.pin(frame_id);
        Some(frame_id)
    }

    /// Check whether a frame is on the list.
    #[inline]
    pub fn is_evictable(&self, frame_id: FrameId) -> bool {
        self.linked[frame_id.index()]
    }

    /// Number of recyclable frames.
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    /// True if nothing can be evicted.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate from head (most recently released) to tail (next victim).
    pub fn iter(&self) -> impl Iterator<Item = FrameId> + '_ {
        std::iter::successors(self.head, move |f| self.next[f.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(replacer: &LruReplacer) -> Vec<usize> {
        replacer.iter().map(FrameId::index).collect()
    }

    #[test]
    fn test_new_reports_allocation_failure() {
        let err = LruReplacer::new(usize::MAX / 8).unwrap_err();
        assert!(matches!(err, crate::common::Error::AllocationFailed { .. }));
    }

    #[test]
    fn test_lru_evicts_in_release_order() {
        let mut replacer = LruReplacer::new(4).unwrap();

        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));
        replacer.unpin(FrameId::new(2));
        assert_eq!(replacer.size(), 3);
        assert_eq!(order(&replacer), vec![2, 1, 0]);
        assert_eq!(replacer.victim(), Some(FrameId::new(0)));

        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(2)));
        assert_eq!(replacer.evict(), None);
        assert!(replacer.is_empty());
    }

    #[test]
    fn test_lru_pin_removes_from_middle() {
        let mut replacer = LruReplacer::new(4).unwrap();
        for i in 0..4 {
            replacer.unpin(FrameId::new(i));
        }

        assert!(replacer.pin(FrameId::new(2)));
        assert!(!replacer.is_evictable(FrameId::new(2)));
        assert_eq!(order(&replacer), vec![3, 1, 0]);

        // Pinning an unlinked frame is a no-op.
        assert!(!replacer.pin(FrameId::new(2)));
        assert_eq!(replacer.size(), 3);
    }

    #[test]
    fn test_lru_pin_head_and_tail() {
        let mut replacer = LruReplacer::new(3).unwrap();
        for i in 0..3 {
            replacer.unpin(FrameId::new(i));
        }

        assert!(replacer.pin(FrameId::new(2))); // head
        assert!(replacer.pin(FrameId::new(0))); // tail
        assert_eq!(order(&replacer), vec![1]);
        assert_eq!(replacer.victim(), Some(FrameId::new(1)));

        assert!(replacer.pin(FrameId::new(1)));
        assert_eq!(replacer.victim(), None);
        assert_eq!(order(&replacer), Vec::<usize>::new());
    }

    #[test]
    fn test_lru_reunpin_moves_to_head() {
        let mut replacer = LruReplacer::new(3).unwrap();
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(1));

        // Re-fetch frame 0, then release it again: it is now the newest.
        replacer.pin(FrameId::new(0));
        replacer.unpin(FrameId::new(0));

        assert_eq!(replacer.evict(), Some(FrameId::new(1)));
        assert_eq!(replacer.evict(), Some(FrameId::new(0)));
    }

    #[test]
    #[should_panic(expected = "linked into LRU list twice")]
    fn test_lru_double_unpin_panics() {
        let mut replacer = LruReplacer::new(2).unwrap();
        replacer.unpin(FrameId::new(0));
        replacer.unpin(FrameId::new(0));
    }
}
