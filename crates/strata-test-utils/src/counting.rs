//! Call-counting wrapper around any backing allocator.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::collections::HashMap;
use std::ptr::NonNull;

use strata_core::{AllocError, BackingAllocator};

/// Per-method call counters collected by [`CountingAllocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BackingStats {
    /// `allocate` calls, successful or not.
    pub allocate_calls: usize,
    /// `allocate` calls that returned an error.
    pub failed_allocations: usize,
    /// `resize_in_place` calls, successful or not.
    pub resize_calls: usize,
    /// `resize_in_place` calls that returned `false`.
    pub refused_resizes: usize,
    /// `release` calls.
    pub release_calls: usize,
}

impl BackingStats {
    /// Total number of calls into the backing allocator.
    pub fn calls(&self) -> usize {
        self.allocate_calls + self.resize_calls + self.release_calls
    }
}

/// Wraps a backing allocator and records every call made through it.
///
/// Live blocks are tracked by address, so a release of a block this
/// wrapper never handed out (or already took back) panics instead of
/// reaching the inner allocator.
#[derive(Debug)]
pub struct CountingAllocator<B> {
    inner: B,
    stats: BackingStats,
    /// Live block address -> current size.
    live: HashMap<usize, usize>,
}

impl<B: BackingAllocator> CountingAllocator<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            stats: BackingStats::default(),
            live: HashMap::new(),
        }
    }

    /// Counters accumulated since creation or the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> BackingStats {
        self.stats
    }

    /// Zero the call counters. Live block tracking is unaffected.
    pub fn reset_stats(&mut self) {
        self.stats = BackingStats::default();
    }

    /// Number of blocks allocated and not yet released.
    pub fn live(&self) -> usize {
        self.live.len()
    }

    /// Sum of the current sizes of all live blocks.
    pub fn live_bytes(&self) -> usize {
        self.live.values().sum()
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

// SAFETY: forwards every call to `inner`; bookkeeping never touches memory.
unsafe impl<B: BackingAllocator> BackingAllocator for CountingAllocator<B> {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.stats.allocate_calls += 1;
        match self.inner.allocate(layout) {
            Ok(block) => {
                self.live.insert(block.cast::<u8>().as_ptr() as usize, layout.size());
                Ok(block)
            }
            Err(err) => {
                self.stats.failed_allocations += 1;
                Err(err)
            }
        }
    }

    unsafe fn resize_in_place(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> bool {
        self.stats.resize_calls += 1;
        let addr = ptr.as_ptr() as usize;
        assert!(
            self.live.contains_key(&addr),
            "resize of untracked block {addr:#x}"
        );
        // SAFETY: the caller's obligations are passed through unchanged.
        let resized = unsafe { self.inner.resize_in_place(ptr, layout, new_size) };
        if resized {
            self.live.insert(addr, new_size);
        } else {
            self.stats.refused_resizes += 1;
        }
        resized
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.release_calls += 1;
        let addr = ptr.as_ptr() as usize;
        match self.live.remove(&addr) {
            Some(size) => assert_eq!(
                size,
                layout.size(),
                "release of block {addr:#x} with a stale layout"
            ),
            None => panic!("release of untracked block {addr:#x} (double free?)"),
        }
        // SAFETY: the caller's obligations are passed through unchanged.
        unsafe { self.inner.release(ptr, layout) }
    }
}
