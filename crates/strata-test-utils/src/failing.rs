//! Deterministic fault injection for backing allocators.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use strata_core::{AllocError, BackingAllocator};

/// Wraps a backing allocator and fails on demand.
///
/// By default every call is forwarded. [`fail_after`](Self::fail_after)
/// lets the first `n` allocations through and fails every later one;
/// [`refuse_resizes`](Self::refuse_resizes) makes every in-place resize
/// report `false` without consulting the inner allocator.
#[derive(Debug)]
pub struct FailingAllocator<B> {
    inner: B,
    allocations_left: Option<usize>,
    refuse_resize: bool,
    failures: usize,
}

impl<B: BackingAllocator> FailingAllocator<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            allocations_left: None,
            refuse_resize: false,
            failures: 0,
        }
    }

    /// Allow `n` more successful allocations, then fail.
    pub fn fail_after(mut self, n: usize) -> Self {
        self.allocations_left = Some(n);
        self
    }

    /// Refuse every in-place resize.
    pub fn refuse_resizes(mut self) -> Self {
        self.refuse_resize = true;
        self
    }

    /// Re-arm the allocation budget at runtime.
    pub fn set_allocations_left(&mut self, n: Option<usize>) {
        self.allocations_left = n;
    }

    /// Number of injected failures so far (allocations and resizes).
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }
}

// SAFETY: either forwards to `inner` or fails without handing out memory.
unsafe impl<B: BackingAllocator> BackingAllocator for FailingAllocator<B> {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        match self.allocations_left {
            Some(0) => {
                self.failures += 1;
                Err(AllocError::for_layout(layout))
            }
            Some(ref mut n) => {
                *n -= 1;
                self.inner.allocate(layout)
            }
            None => self.inner.allocate(layout),
        }
    }

    unsafe fn resize_in_place(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> bool {
        if self.refuse_resize {
            self.failures += 1;
            return false;
        }
        // SAFETY: the caller's obligations are passed through unchanged.
        unsafe { self.inner.resize_in_place(ptr, layout, new_size) }
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller's obligations are passed through unchanged.
        unsafe { self.inner.release(ptr, layout) }
    }
}
