//! Backing allocator over the process global heap.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::ptr::{self, NonNull};

use crate::backing::BackingAllocator;
use crate::error::AllocError;

/// Backing allocator that forwards to the global heap.
///
/// The global heap can only resize by moving, so
/// [`resize_in_place`](BackingAllocator::resize_in_place) succeeds only
/// when the size does not change. Arenas over `SystemBacking` therefore
/// always grow by linking a fresh node.
///
/// Zero-size requests never reach the heap: they get a dangling pointer
/// aligned to the requested alignment, and releasing one is a no-op.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBacking;

// SAFETY: blocks come straight from the global allocator with the caller's
// layout and are released with that same layout.
unsafe impl BackingAllocator for SystemBacking {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if layout.size() == 0 {
            let dangling = ptr::without_provenance_mut::<u8>(layout.align());
            return NonNull::new(dangling)
                .map(|p| NonNull::slice_from_raw_parts(p, 0))
                .ok_or(AllocError::for_layout(layout));
        }
        // SAFETY: layout has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        NonNull::new(raw)
            .map(|p| NonNull::slice_from_raw_parts(p, layout.size()))
            .ok_or(AllocError::for_layout(layout))
    }

    unsafe fn resize_in_place(
        &mut self,
        _ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> bool {
        new_size == layout.size()
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        // SAFETY: the caller guarantees `ptr` was allocated here with `layout`.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::is_aligned;

    #[test]
    fn allocation_respects_alignment() {
        let mut backing = SystemBacking;
        for shift in 0..12 {
            let layout = Layout::from_size_align(24, 1 << shift).unwrap();
            let block = backing.allocate(layout).unwrap();
            assert!(is_aligned(block.cast::<u8>().as_ptr() as usize, 1 << shift));
            // SAFETY: block came from `backing` with `layout`.
            unsafe { backing.release(block.cast(), layout) };
        }
    }

    #[test]
    fn blocks_are_writable() {
        let mut backing = SystemBacking;
        let layout = Layout::from_size_align(128, 16).unwrap();
        let block = backing.allocate(layout).unwrap();
        // SAFETY: the block is valid for 128 bytes.
        unsafe {
            ptr::write_bytes(block.cast::<u8>().as_ptr(), 0xAB, 128);
            assert_eq!(*block.cast::<u8>().as_ptr().add(127), 0xAB);
            backing.release(block.cast(), layout);
        }
    }

    #[test]
    fn zero_size_is_dangling_and_aligned() {
        let mut backing = SystemBacking;
        let layout = Layout::from_size_align(0, 64).unwrap();
        let block = backing.allocate(layout).unwrap();
        assert_eq!(block.len(), 0);
        assert!(is_aligned(block.cast::<u8>().as_ptr() as usize, 64));
        // SAFETY: zero-size release is a no-op.
        unsafe { backing.release(block.cast(), layout) };
    }

    #[test]
    fn resize_only_accepts_same_size() {
        let mut backing = SystemBacking;
        let layout = Layout::from_size_align(32, 8).unwrap();
        let block = backing.allocate(layout).unwrap();
        // SAFETY: block is live and described by `layout`.
        unsafe {
            assert!(backing.resize_in_place(block.cast(), layout, 32));
            assert!(!backing.resize_in_place(block.cast(), layout, 64));
            assert!(!backing.resize_in_place(block.cast(), layout, 16));
            backing.release(block.cast(), layout);
        }
    }
}
