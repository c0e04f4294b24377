//! The arena façade: bump allocation over a chain of backing nodes.
//!
//! [`Arena`] binds one [`BackingAllocator`] to one [`ArenaState`].
//! Allocation bumps a cursor through the head node; when the head is full
//! the arena first asks the backing allocator to grow the head in place
//! and only then links a fresh, larger node in front of the chain. Older
//! nodes are never touched again until a reset or teardown, so every
//! block already handed out stays valid.
//!
//! Individual blocks are reclaimed only when they are *topmost*: the most
//! recent allocation from the head node, ending exactly at the cursor.
//! Everything else is reclaimed in bulk by [`Arena::reset`] or by dropping
//! the arena.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::mem;
use std::ptr::{self, NonNull};

use strata_core::{align_forward, AllocError, BackingAllocator};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::node::{BufferNode, NODE_ALIGN};
use crate::state::ArenaState;

/// Bump arena over a backing allocator.
///
/// Single-threaded: every operation takes `&mut self`. Blocks are returned
/// as raw `NonNull<[u8]>` views whose validity ends at the next
/// [`ResetMode::FreeAll`](crate::ResetMode::FreeAll)-equivalent reset or
/// when the arena is dropped.
///
/// # Example
///
/// ```
/// use std::alloc::Layout;
/// use strata_arena::{Arena, ResetMode};
/// use strata_core::SystemBacking;
///
/// let mut arena = Arena::new(SystemBacking);
/// let block = arena.alloc(Layout::from_size_align(64, 8).unwrap()).unwrap();
/// assert_eq!(block.len(), 64);
/// assert!(arena.query_capacity() >= 64);
/// assert!(arena.reset(ResetMode::RetainCapacity));
/// ```
#[derive(Debug)]
pub struct Arena<B: BackingAllocator> {
    backing: B,
    state: ArenaState,
    config: ArenaConfig,
}

impl<B: BackingAllocator> Arena<B> {
    /// Create an empty arena with the default configuration.
    ///
    /// No memory is requested until the first allocation.
    pub fn new(backing: B) -> Self {
        Self {
            backing,
            state: ArenaState::new(),
            config: ArenaConfig::default(),
        }
    }

    /// Create an arena with an explicit configuration.
    ///
    /// Returns `Err(ArenaError::InvalidConfig)` if the config fails
    /// validation, or `Err(ArenaError::OutOfMemory)` if
    /// `config.initial_capacity` is non-zero and the backing allocator
    /// refuses that first node.
    pub fn with_config(backing: B, config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let initial = config.initial_capacity;
        let mut arena = Self {
            backing,
            state: ArenaState::new(),
            config,
        };
        if initial > 0 {
            let node = arena
                .allocate_node(initial)
                .ok_or(ArenaError::OutOfMemory {
                    requested: initial,
                    align: NODE_ALIGN,
                })?;
            arena.state.nodes.push(node);
        }
        Ok(arena)
    }

    /// Bind a detached state to `backing`.
    ///
    /// The chain and cursor are taken over unchanged. If `config` is
    /// invalid, the chain is released through `backing` and the
    /// validation error is returned.
    ///
    /// # Safety
    ///
    /// Every node in `state` must be releasable and resizable through
    /// `backing`; see [`ArenaState::promote`].
    pub unsafe fn attach(
        state: ArenaState,
        backing: B,
        config: ArenaConfig,
    ) -> Result<Self, ArenaError> {
        let mut arena = Self::from_parts(backing, state, ArenaConfig::default());
        if let Err(err) = config.validate() {
            arena.release_all();
            return Err(err);
        }
        arena.config = config;
        Ok(arena)
    }

    /// Assemble an arena without validating `config`.
    pub(crate) fn from_parts(backing: B, state: ArenaState, config: ArenaConfig) -> Self {
        Self {
            backing,
            state,
            config,
        }
    }

    /// Detach the chain and cursor, leaving nothing for this arena to release.
    ///
    /// No buffer is read, written, or released.
    pub fn into_state(mut self) -> ArenaState {
        mem::take(&mut self.state)
    }

    /// Release every node and consume the arena.
    ///
    /// Equivalent to dropping it.
    pub fn deinit(mut self) {
        self.release_all();
    }

    /// Bump-allocate a block for `layout`.
    ///
    /// The fast path only moves the cursor. When the head node is full the
    /// arena tries, in order: growing the head in place, then linking a new
    /// node sized from the head's usable length. Both refusing is reported
    /// as `Err(ArenaError::OutOfMemory)`; the arena is unchanged apart from
    /// any head growth that did succeed.
    pub fn alloc(&mut self, layout: Layout) -> Result<NonNull<[u8]>, ArenaError> {
        let size = layout.size();
        let align = layout.align();
        let out_of_memory = || ArenaError::OutOfMemory {
            requested: size,
            align,
        };
        // Worst-case footprint in a fresh node: payload plus alignment padding.
        let min_size = size.checked_add(align).ok_or_else(out_of_memory)?;

        loop {
            let Some(&head) = self.state.nodes.last() else {
                self.push_node(0, min_size).ok_or_else(out_of_memory)?;
                continue;
            };

            let cursor = self.state.cursor;
            let addr = head.base_addr() + cursor;
            let aligned = align_forward(addr, align).ok_or_else(out_of_memory)?;
            let start = cursor + (aligned - addr);
            let end = start.checked_add(size).ok_or_else(out_of_memory)?;

            if end <= head.usable_len() {
                self.state.cursor = end;
                // SAFETY: start + size <= usable_len, so the range is inside
                // the head node's block.
                let ptr = unsafe { head.as_ptr().add(start) };
                return Ok(NonNull::slice_from_raw_parts(ptr, size));
            }

            if !self.resize_head(end) {
                self.push_node(head.usable_len(), min_size)
                    .ok_or_else(out_of_memory)?;
            }
        }
    }

    /// Allocate a copy of `bytes`.
    pub fn alloc_copy(&mut self, bytes: &[u8]) -> Result<NonNull<[u8]>, ArenaError> {
        let layout = Layout::for_value(bytes);
        let block = self.alloc(layout)?;
        // SAFETY: the block is fresh, valid for bytes.len() bytes, and cannot
        // overlap a borrowed slice.
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), block.cast::<u8>().as_ptr(), bytes.len());
        }
        Ok(block)
    }

    /// Change the length of `block` without moving it.
    ///
    /// - Topmost block, shrinking: always succeeds and gives the tail back.
    /// - Topmost block, growing: succeeds iff the head has room for the delta.
    ///   The backing allocator is never consulted.
    /// - Any other block: growth fails; shrinking reports success and changes
    ///   nothing.
    ///
    /// # Safety
    ///
    /// `block` must have been returned by this arena (from [`alloc`](Self::alloc)
    /// or [`remap`](Self::remap)) with its current length, and not freed or
    /// invalidated by a reset since.
    pub unsafe fn resize(&mut self, block: NonNull<[u8]>, new_size: usize) -> bool {
        let len = block.len();
        if !self.is_topmost(block) {
            return new_size <= len;
        }
        if new_size <= len {
            self.state.cursor -= len - new_size;
            return true;
        }
        let delta = new_size - len;
        if delta <= self.remaining() {
            self.state.cursor += delta;
            true
        } else {
            false
        }
    }

    /// [`resize`](Self::resize) returning the resized view on success.
    ///
    /// The address never changes.
    ///
    /// # Safety
    ///
    /// Same contract as [`resize`](Self::resize).
    pub unsafe fn remap(
        &mut self,
        block: NonNull<[u8]>,
        new_size: usize,
    ) -> Option<NonNull<[u8]>> {
        // SAFETY: forwarded to the caller.
        let resized = unsafe { self.resize(block, new_size) };
        resized.then(|| NonNull::slice_from_raw_parts(block.cast::<u8>(), new_size))
    }

    /// Give `block` back if it is topmost; otherwise do nothing.
    ///
    /// # Safety
    ///
    /// Same contract as [`resize`](Self::resize). The block must not be
    /// used afterwards.
    pub unsafe fn free(&mut self, block: NonNull<[u8]>) {
        if self.is_topmost(block) {
            self.state.cursor -= block.len();
        }
    }

    /// Whether `block` ends exactly at the cursor and lies inside the head's
    /// committed prefix.
    ///
    /// The containment check keeps a block that ends at the last byte of an
    /// older node from matching a head placed directly after it.
    fn is_topmost(&self, block: NonNull<[u8]>) -> bool {
        let Some(head) = self.state.nodes.last() else {
            return false;
        };
        let addr = block.cast::<u8>().as_ptr() as usize;
        let cursor = self.state.cursor;
        head.contains(addr, block.len(), cursor)
            && addr + block.len() == head.base_addr() + cursor
    }

    /// Usable bytes summed over every node in the chain.
    ///
    /// Counts abandoned, already-full nodes too; it does not depend on the
    /// cursor.
    pub fn query_capacity(&self) -> usize {
        self.state.capacity()
    }

    /// Free bytes left in the head node.
    pub fn remaining(&self) -> usize {
        self.state
            .head()
            .map_or(0, |head| head.usable_len() - self.state.cursor)
    }

    /// Offset of the next free byte in the head node.
    pub fn cursor(&self) -> usize {
        self.state.cursor
    }

    /// Number of nodes in the chain.
    pub fn node_count(&self) -> usize {
        self.state.node_count()
    }

    /// The chain and cursor.
    pub fn state(&self) -> &ArenaState {
        &self.state
    }

    /// The node sizing configuration.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// The backing allocator.
    pub fn backing(&self) -> &B {
        &self.backing
    }

    /// The backing allocator, mutably.
    pub fn backing_mut(&mut self) -> &mut B {
        &mut self.backing
    }

    /// Ask the backing allocator to resize the head node to `new_len` bytes
    /// without moving it.
    pub(crate) fn resize_head(&mut self, new_len: usize) -> bool {
        let Some(head) = self.state.nodes.last_mut() else {
            return false;
        };
        if Layout::from_size_align(new_len, NODE_ALIGN).is_err() {
            return false;
        }
        // SAFETY: the head is a live block from `backing`, described by its layout.
        let grown = unsafe {
            self.backing
                .resize_in_place(head.as_ptr(), head.layout(), new_len)
        };
        if grown {
            log::trace!(
                "arena: resized head node in place from {} to {new_len} bytes",
                head.total_len()
            );
            head.set_len(new_len);
        }
        grown
    }

    /// Link a new head node sized from the abandoned head's usable length.
    fn push_node(&mut self, prev_usable: usize, min_size: usize) -> Option<()> {
        let len = self.config.node_len(prev_usable, min_size)?;
        let node = self.allocate_node(len)?;
        self.state.nodes.push(node);
        self.state.cursor = 0;
        log::trace!(
            "arena: linked {len}-byte node, chain length {}",
            self.state.nodes.len()
        );
        Some(())
    }

    /// Request a `len`-byte node from the backing allocator.
    pub(crate) fn allocate_node(&mut self, len: usize) -> Option<BufferNode> {
        let layout = Layout::from_size_align(len, NODE_ALIGN).ok()?;
        match self.backing.allocate(layout) {
            Ok(block) => Some(BufferNode::new(block.cast(), len)),
            Err(err) => {
                log::debug!("arena: backing allocator refused a node: {err}");
                None
            }
        }
    }

    /// Release `node` to the backing allocator.
    pub(crate) fn release_node(&mut self, node: BufferNode) {
        // SAFETY: every node in (or just removed from) the chain is a live
        // block from `backing`, described by its layout, and is not used again.
        unsafe { self.backing.release(node.as_ptr(), node.layout()) }
    }

    /// Release the whole chain, newest first, and zero the cursor.
    pub(crate) fn release_all(&mut self) {
        while let Some(node) = self.state.nodes.pop() {
            self.release_node(node);
        }
        self.state.cursor = 0;
    }

    pub(crate) fn state_mut(&mut self) -> &mut ArenaState {
        &mut self.state
    }
}

impl<B: BackingAllocator> Drop for Arena<B> {
    fn drop(&mut self) {
        self.release_all();
    }
}

// SAFETY: blocks are disjoint sub-ranges of live nodes. A successful resize
// never moves a block and only grows it into unused space of the head node.
unsafe impl<B: BackingAllocator> BackingAllocator for Arena<B> {
    fn allocate(&mut self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.alloc(layout)
            .map_err(|_| AllocError::for_layout(layout))
    }

    unsafe fn resize_in_place(
        &mut self,
        ptr: NonNull<u8>,
        layout: Layout,
        new_size: usize,
    ) -> bool {
        // SAFETY: the caller vouches for (ptr, layout) as a live block of ours.
        unsafe { self.resize(NonNull::slice_from_raw_parts(ptr, layout.size()), new_size) }
    }

    unsafe fn release(&mut self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller vouches for (ptr, layout) as a live block of ours.
        unsafe { self.free(NonNull::slice_from_raw_parts(ptr, layout.size())) }
    }
}
