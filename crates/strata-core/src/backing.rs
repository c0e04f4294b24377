//! The backing allocator capability.
//!
//! An arena never inspects where its memory comes from. It only calls
//! through [`BackingAllocator`]: ask for a block, ask to resize that block
//! without moving it, and hand the block back.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use crate::error::AllocError;

/// Source of raw memory blocks for an arena.
///
/// Methods take `&mut self`: implementors are single-threaded by contract
/// and need no interior mutability. An arena borrows its backing allocator
/// through the blanket `&mut A` implementation, or owns it outright.
///
/// # Safety
///
/// Implementors must guarantee that:
///
/// - a block returned by [`allocate`](Self::allocate) is valid for reads
///   and writes of at least `layout.size()` bytes, is aligned to
///   `layout.align()`, and does not overlap any other live block;
/// - when [`resize_in_place`](Self::resize_in_place) returns `true`, the
///   block keeps its address and is now valid for `new_size` bytes;
/// - a block stays valid until it is passed to [`release`](Self::release).
pub unsafe trait BackingAllocator {
    /// Allocate a block described by `layout`.
    ///
    /// The returned slice may be longer than requested; callers that want
    /// to resize or release the block must still describe it with the
    /// layout they asked for.
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError>;

    /// Try to change the length of a live block without moving it.
    ///
    /// Returns `false` if the block cannot be resized in place; the block
    /// is then left untouched and still described by `layout`.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a live block from this allocator, currently
    /// described by `layout` (the size of its last successful resize, if any).
    unsafe fn resize_in_place(&mut self, ptr: NonNull<u8>, layout: Layout, new_size: usize)
        -> bool;

    /// Return a block to the allocator.
    ///
    /// # Safety
    ///
    /// `ptr` must denote a live block from this allocator, described by
    /// `layout`. The block must not be used afterwards.
    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout);
}

// SAFETY: forwards every call to `A`, which upholds the contract itself.
unsafe impl<A: BackingAllocator + ?Sized> BackingAllocator for &mut A {
    #[inline]
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn resize_in_place(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> bool {
        // SAFETY: the caller's obligations are passed through unchanged.
        unsafe { (**self).resize_in_place(ptr, layout, new_size) }
    }

    #[inline]
    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller's obligations are passed through unchanged.
        unsafe { (**self).release(ptr, layout) }
    }
}
