//! Chained hash index from page identity to frame.

use crate::buffer::frame::try_vec;
use crate::common::{FrameId, PageId, Result};

/// Chaining hash table over every bound frame, pinned or not.
///
/// # Layout
/// ```text
///  buckets[h]            chain[f] (per-frame link)     bound[f]
///  ┌────┐                ┌──────────┐                  ┌──────────┐
///  │ h0 │──▶ Frame(3) ──▶│ Frame(0) │──▶ None          │ PageId   │
///  │ h1 │──▶ None        └──────────┘                  │ or None  │
///  │ .. │                                              └──────────┘
///  └────┘
/// ```
///
/// A bucket is `PageId::hash_code() % buckets.len()`. Insertion prepends to
/// the chain; removal unlinks by frame index. The index also records which
/// identity each frame is bound to, so it is the single authority on
/// binding.
#[derive(Debug)]
pub struct HashIndex {
    /// Head of each bucket's chain.
    buckets: Vec<Option<FrameId>>,
    /// `chain[i]` is the frame after frame `i` in its bucket.
    chain: Vec<Option<FrameId>>,
    /// `bound[i]` is the identity frame `i` is bound to.
    bound: Vec<Option<PageId>>,
    len: usize,
}

impl HashIndex {
    /// Create an index for `frames` frames with `num_buckets` buckets.
    ///
    /// # Errors
    /// `Error::AllocationFailed` if any table cannot be allocated.
    ///
    /// # Panics
    /// Panics if `num_buckets` is 0.
    pub fn new(frames: usize, num_buckets: usize) -> Result<Self> {
        assert!(num_buckets > 0, "hash index needs at least one bucket");
        Ok(Self {
            buckets: try_vec(num_buckets, None)?,
            chain: try_vec(frames, None)?,
            bound: try_vec(frames, None)?,
            len: 0,
        })
    }

    #[inline]
    fn bucket_of(&self, page_id: &PageId) -> usize {
        page_id.hash_code() as usize % self.buckets.len()
    }

    /// Find the frame bound to `page_id`.
    pub fn lookup(&self, page_id: &PageId) -> Option<FrameId> {
        let mut cursor = self.buckets[self.bucket_of(page_id)];
        while let Some(frame_id) = cursor {
            if self.bound[frame_id.index()].as_ref() == Some(page_id) {
                return Some(frame_id);
            }
            cursor = self.chain[frame_id.index()];
        }
        None
    }

    /// Bind `frame_id` to `page_id` and prepend it to its bucket.
    ///
    /// # Panics
    /// Panics if the frame is already bound. The caller guarantees the
    /// identity is not bound to another frame (it looked it up under the
    /// same lock).
    pub fn insert(&mut self, frame_id: FrameId, page_id: PageId) {
        let i = frame_id.index();
        assert!(
            self.bound[i].is_none(),
            "{} inserted into hash index while still bound",
            frame_id
        );
        let h = self.bucket_of(&page_id);
        self.chain[i] = self.buckets[h];
        self.buckets[h] = Some(frame_id);
        self.bound[i] = Some(page_id);
        self.len += 1;
    }

    /// Unbind `frame_id`, unlinking it from its bucket. Returns the identity
    /// it was bound to.
    ///
    /// # Panics
    /// Panics if the frame is not bound or is missing from the bucket its
    /// identity hashes to. Either means the index is corrupt.
    pub fn remove(&mut self, frame_id: FrameId) -> PageId {
        let i = frame_id.index();
        let Some(page_id) = self.bound[i] else {
            tracing::error!(%frame_id, "removing unbound frame from hash index");
            panic!("{} is not bound in the hash index", frame_id);
        };
        let h = self.bucket_of(&page_id);

        let mut prev: Option<FrameId> = None;
        let mut cursor = self.buckets[h];
        while let Some(current) = cursor {
            if current == frame_id {
                let after = self.chain[i].take();
                match prev {
                    Some(p) => self.chain[p.index()] = after,
                    None => self.buckets[h] = after,
                }
                self.bound[i] = None;
                self.len -= 1;
                return page_id;
            }
            prev = Some(current);
            cursor = self.chain[current.index()];
        }

        tracing::error!(%frame_id, %page_id, bucket = h, "frame missing from its hash bucket");
        panic!("{} missing from hash bucket {}", frame_id, h);
    }

    /// Identity the frame is bound to, if any.
    #[inline]
    pub fn page_of(&self, frame_id: FrameId) -> Option<PageId> {
        self.bound[frame_id.index()]
    }

    /// Number of bound frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Iterate over `(frame, identity)` for every bound frame, in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameId, PageId)> + '_ {
        self.bound
            .iter()
            .enumerate()
            .filter_map(|(i, pid)| pid.map(|pid| (FrameId::new(i), pid)))
    }

    /// Length of the chain in bucket `h`.
    #[cfg(test)]
    fn chain_len(&self, h: usize) -> usize {
        let mut n = 0;
        let mut cursor = self.buckets[h];
        while let Some(frame_id) = cursor {
            n += 1;
            cursor = self.chain[frame_id.index()];
        }
        n
    }
}
