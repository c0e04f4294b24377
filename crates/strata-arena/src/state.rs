//! Detachable arena bookkeeping.
//!
//! [`ArenaState`] is the node chain plus the bump cursor, with no
//! reference to any backing allocator. It can be detached from one
//! [`Arena`] and attached to another without touching a single buffer.

#![allow(unsafe_code)]

use strata_core::BackingAllocator;

use crate::arena::Arena;
use crate::config::ArenaConfig;
use crate::node::BufferNode;

/// The buffer-node chain and bump cursor of an arena.
///
/// # Layout
///
/// ```text
/// nodes: [oldest, ..., head]     (Vec, newest last)
///                        └── cursor: next free byte in head
/// ```
///
/// Invariants: `cursor <= head.usable_len()` while a head exists, and
/// `cursor == 0` when the chain is empty.
///
/// Dropping a state that still owns nodes leaks them: there is no backing
/// allocator to release them to. Attach it to an arena first.
#[derive(Debug, Default)]
pub struct ArenaState {
    /// Nodes in allocation order; the last one is the head.
    pub(crate) nodes: Vec<BufferNode>,
    /// Offset of the next free byte in the head node.
    pub(crate) cursor: usize,
}

impl ArenaState {
    /// An empty state: no nodes, cursor at zero.
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            cursor: 0,
        }
    }

    /// Whether the chain holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the chain.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Offset of the next free byte in the head node.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The newest node, if any.
    pub fn head(&self) -> Option<&BufferNode> {
        self.nodes.last()
    }

    /// Nodes from newest (the head) to oldest.
    pub fn chain(&self) -> impl Iterator<Item = &BufferNode> + '_ {
        self.nodes.iter().rev()
    }

    /// Usable bytes summed over every node, full or not.
    pub fn capacity(&self) -> usize {
        self.nodes.iter().map(BufferNode::usable_len).sum()
    }

    /// Attach this state to `backing` with the default configuration.
    ///
    /// # Safety
    ///
    /// Every node in the chain must be releasable and resizable through
    /// `backing`: it must hand out and take back blocks from the same
    /// source as the allocator the nodes were obtained from.
    pub unsafe fn promote<B: BackingAllocator>(self, backing: B) -> Arena<B> {
        Arena::from_parts(backing, self, ArenaConfig::default())
    }
}

impl Drop for ArenaState {
    fn drop(&mut self) {
        if !self.nodes.is_empty() {
            log::warn!(
                "dropping detached arena state with {} nodes ({} bytes); their memory is leaked",
                self.nodes.len(),
                self.capacity()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr::NonNull;

    fn fake_node(addr: usize, len: usize) -> BufferNode {
        BufferNode::new(NonNull::new(addr as *mut u8).unwrap(), len)
    }

    #[test]
    fn new_state_is_empty() {
        let state = ArenaState::new();
        assert!(state.is_empty());
        assert_eq!(state.cursor(), 0);
        assert_eq!(state.capacity(), 0);
        assert!(state.head().is_none());
    }

    #[test]
    fn capacity_sums_every_node() {
        let mut state = ArenaState::new();
        state.nodes.push(fake_node(0x1000, 51));
        state.nodes.push(fake_node(0x2000, 300));
        state.cursor = 7;
        assert_eq!(state.capacity(), 351);
        assert_eq!(state.head().map(BufferNode::total_len), Some(300));
        let order: Vec<usize> = state.chain().map(BufferNode::base_addr).collect();
        assert_eq!(order, vec![0x2000, 0x1000]);
        // Fake nodes were never allocated; forget them rather than warn.
        state.nodes.clear();
    }
}
