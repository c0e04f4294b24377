//! Error type for backing allocator failures.

use std::alloc::Layout;
use std::error::Error;
use std::fmt;

/// A backing allocator refused to hand out a block.
///
/// Carries the request that failed so callers can report it without
/// holding on to the original [`Layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError {
    /// Number of bytes requested.
    pub size: usize,
    /// Requested alignment in bytes.
    pub align: usize,
}

impl AllocError {
    /// Build the error for a failed request of `layout`.
    pub fn for_layout(layout: Layout) -> Self {
        Self {
            size: layout.size(),
            align: layout.align(),
        }
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "backing allocation failed: {} bytes at alignment {}",
            self.size, self.align
        )
    }
}

impl Error for AllocError {}
