//! Buffer nodes: one contiguous backing allocation each.
//!
//! A [`BufferNode`] records where a backing block lives and how long it
//! currently is. Chain order and the bump cursor are kept by
//! [`ArenaState`](crate::ArenaState), outside the block, so the whole
//! block is usable.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

/// Alignment every node is requested at.
///
/// Fixed rather than configurable: a detached [`ArenaState`](crate::ArenaState)
/// must be releasable by whichever arena it is later attached to.
pub const NODE_ALIGN: usize = 16;

/// One raw memory extent obtained from the backing allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferNode {
    ptr: NonNull<u8>,
    /// Current block length. Always forms a valid `Layout` with `NODE_ALIGN`.
    len: usize,
}

impl BufferNode {
    /// Wrap a block of `len` bytes allocated at [`NODE_ALIGN`].
    pub(crate) fn new(ptr: NonNull<u8>, len: usize) -> Self {
        debug_assert!(Layout::from_size_align(len, NODE_ALIGN).is_ok());
        Self { ptr, len }
    }

    /// Total length of the backing block.
    pub fn total_len(&self) -> usize {
        self.len
    }

    /// Bytes available for allocations.
    ///
    /// Equal to [`total_len`](Self::total_len): nodes carry no in-band header.
    pub fn usable_len(&self) -> usize {
        self.len
    }

    /// Address of the first usable byte.
    pub fn base_addr(&self) -> usize {
        self.ptr.as_ptr() as usize
    }

    pub(crate) fn as_ptr(&self) -> NonNull<u8> {
        self.ptr
    }

    /// Record a successful in-place resize.
    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(Layout::from_size_align(len, NODE_ALIGN).is_ok());
        self.len = len;
    }

    /// The layout this block is currently described by.
    pub(crate) fn layout(&self) -> Layout {
        // SAFETY: NODE_ALIGN is a power of two and `len` was validated
        // against it before the block was allocated or resized.
        unsafe { Layout::from_size_align_unchecked(self.len, NODE_ALIGN) }
    }

    /// Whether `addr..addr + len` lies inside this node's first `committed` bytes.
    pub(crate) fn contains(&self, addr: usize, len: usize, committed: usize) -> bool {
        let Some(offset) = addr.checked_sub(self.base_addr()) else {
            return false;
        };
        offset
            .checked_add(len)
            .is_some_and(|end| end <= committed.min(self.len))
    }
}
