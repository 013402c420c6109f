//! Page identity: which file, which page.

use std::fmt;

use crate::common::config::FILE_ID_WORDS;

/// Identifies a file owned by the pager.
///
/// A fixed-size array of 32-bit words; the cache treats it as opaque and
/// only compares and hashes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub [u32; FILE_ID_WORDS]);

impl FileId {
    /// Create a file id from its words.
    #[inline]
    pub const fn new(words: [u32; FILE_ID_WORDS]) -> Self {
        FileId(words)
    }

    /// Sum of all words, wrapping on overflow.
    #[inline]
    pub fn word_sum(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, w| acc.wrapping_add(*w))
    }
}

impl From<[u32; FILE_ID_WORDS]> for FileId {
    fn from(words: [u32; FILE_ID_WORDS]) -> Self {
        FileId(words)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{:08x}", word)?;
        }
        Ok(())
    }
}

/// Identifies a page: a file plus a page number within it.
///
/// Immutable once a frame is bound to it; equality is exact field-wise
/// comparison.
///
/// # Example
/// ```
/// use pagecache::{FileId, PageId};
///
/// let file = FileId::new([1, 0, 0, 0, 0, 0]);
/// let page_id = PageId::new(file, 42);
/// assert_eq!(page_id.pgno, 42);
/// assert_eq!(page_id.hash_code(), 43);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId {
    /// File the page belongs to.
    pub file_id: FileId,
    /// Page number within the file.
    pub pgno: u32,
}

impl PageId {
    /// Create a new PageId.
    #[inline]
    pub const fn new(file_id: FileId, pgno: u32) -> Self {
        PageId { file_id, pgno }
    }

    /// Raw hash: sum of the file-id words plus the page number.
    ///
    /// The hash index reduces this modulo its bucket count.
    #[inline]
    pub fn hash_code(&self) -> u32 {
        self.file_id.word_sum().wrapping_add(self.pgno)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page({}:{})", self.file_id, self.pgno)
    }
}
