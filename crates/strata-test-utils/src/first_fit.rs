//! A trivial first-fit allocator over one fixed region.
//!
//! Free space is a sorted map of `offset -> len` spans that are coalesced
//! on every release or shrink. Growing a block in place succeeds exactly
//! when the span starting at the block's end is free and large enough,
//! which is the common case for an arena's newest node.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::collections::BTreeMap;
use std::ptr::{self, NonNull};

use strata_core::{align_forward, AllocError, BackingAllocator};

/// Alignment of the whole region. Requests with a larger alignment still
/// work, they just waste more padding.
const REGION_ALIGN: usize = 4096;

/// Fixed-capacity first-fit allocator.
#[derive(Debug)]
pub struct FirstFitAllocator {
    base: NonNull<u8>,
    capacity: usize,
    /// Free spans keyed by offset from `base`.
    free: BTreeMap<usize, usize>,
    /// Live blocks keyed by offset from `base`.
    live: BTreeMap<usize, usize>,
}

impl FirstFitAllocator {
    /// Create an allocator managing `capacity` bytes from the global heap.
    ///
    /// # Panics
    ///
    /// Panics if the region itself cannot be allocated.
    pub fn new(capacity: usize) -> Self {
        let layout = Self::region_layout(capacity);
        // SAFETY: region_layout never has a zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        let mut free = BTreeMap::new();
        if capacity > 0 {
            free.insert(0, capacity);
        }
        Self {
            base,
            capacity,
            free,
            live: BTreeMap::new(),
        }
    }

    fn region_layout(capacity: usize) -> Layout {
        Layout::from_size_align(capacity.max(1), REGION_ALIGN).expect("region layout overflows")
    }

    /// Total size of the managed region.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of blocks handed out and not yet released.
    pub fn live_blocks(&self) -> usize {
        self.live.len()
    }

    /// Bytes not covered by any live block.
    pub fn free_bytes(&self) -> usize {
        self.free.values().sum()
    }

    /// Length of the largest free span.
    pub fn largest_free_span(&self) -> usize {
        self.free.values().copied().max().unwrap_or(0)
    }

    fn offset_of(&self, ptr: NonNull<u8>) -> usize {
        let addr = ptr.as_ptr() as usize;
        let base = self.base.as_ptr() as usize;
        assert!(
            addr >= base && addr < base + self.capacity.max(1),
            "pointer {addr:#x} is outside the first-fit region"
        );
        addr - base
    }

    fn live_len(&self, offset: usize, layout: Layout) -> usize {
        match self.live.get(&offset) {
            Some(&len) => {
                assert_eq!(
                    len,
                    layout.size(),
                    "layout size does not match live block at offset {offset}"
                );
                len
            }
            None => panic!("block at offset {offset} is not live (double free?)"),
        }
    }

    /// Insert a free span, merging it with adjacent free spans.
    fn insert_free(&mut self, mut offset: usize, mut len: usize) {
        if len == 0 {
            return;
        }
        if let Some((&prev_off, &prev_len)) = self.free.range(..offset).next_back() {
            if prev_off + prev_len == offset {
                self.free.remove(&prev_off);
                offset = prev_off;
                len += prev_len;
            }
        }
        if let Some(next_len) = self.free.remove(&(offset + len)) {
            len += next_len;
        }
        self.free.insert(offset, len);
    }
}

// SAFETY: blocks are disjoint sub-ranges of a region this allocator owns for
// its whole lifetime, tracked in `live` and `free`.
unsafe impl BackingAllocator for FirstFitAllocator {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let size = layout.size();
        if size == 0 {
            let dangling = ptr::without_provenance_mut::<u8>(layout.align());
            return NonNull::new(dangling)
                .map(|p| NonNull::slice_from_raw_parts(p, 0))
                .ok_or(AllocError::for_layout(layout));
        }
        let base = self.base.as_ptr() as usize;
        let found = self.free.iter().find_map(|(&off, &len)| {
            let start = align_forward(base + off, layout.align())? - base;
            let pad = start - off;
            (pad.checked_add(size)? <= len).then_some((off, len, start, pad))
        });
        let Some((off, len, start, pad)) = found else {
            return Err(AllocError::for_layout(layout));
        };

        self.free.remove(&off);
        if pad > 0 {
            self.free.insert(off, pad);
        }
        let tail = len - pad - size;
        if tail > 0 {
            self.free.insert(start + size, tail);
        }
        self.live.insert(start, size);

        // SAFETY: start + size <= capacity, so the pointer stays in the region.
        let ptr = unsafe { NonNull::new_unchecked(self.base.as_ptr().add(start)) };
        Ok(NonNull::slice_from_raw_parts(ptr, size))
    }

    unsafe fn resize_in_place(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> bool {
        if layout.size() == 0 {
            return new_size == 0;
        }
        let offset = self.offset_of(ptr);
        let old = self.live_len(offset, layout);
        if new_size == 0 {
            return false;
        }
        if new_size <= old {
            self.live.insert(offset, new_size);
            self.insert_free(offset + new_size, old - new_size);
            return true;
        }

        let need = new_size - old;
        let end = offset + old;
        match self.free.get(&end).copied() {
            Some(span) if span >= need => {
                self.free.remove(&end);
                if span > need {
                    self.free.insert(end + need, span - need);
                }
                self.live.insert(offset, new_size);
                true
            }
            _ => false,
        }
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        if layout.size() == 0 {
            return;
        }
        let offset = self.offset_of(ptr);
        let len = self.live_len(offset, layout);
        self.live.remove(&offset);
        self.insert_free(offset, len);
    }
}

impl Drop for FirstFitAllocator {
    fn drop(&mut self) {
        // SAFETY: the region was allocated in `new` with this exact layout.
        unsafe { alloc::dealloc(self.base.as_ptr(), Self::region_layout(self.capacity)) }
    }
}
