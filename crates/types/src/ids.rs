//! Newtype wrappers for handles into a destination document.

use std::fmt;

/// A handle to a page created on a destination document.
///
/// Handles are only meaningful to the document that issued them.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PageHandle(usize);

impl PageHandle {
    /// Creates a handle from the 0-based position of the page in its document.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the 0-based position of the page in its document.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for PageHandle {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for PageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "page#{}", self.0)
    }
}
