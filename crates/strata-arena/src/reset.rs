//! Bulk reclamation.
//!
//! A reset invalidates every block handed out so far. What differs between
//! modes is how much of the chain survives:
//!
//! | Mode | Nodes kept | Capacity after |
//! |------|------------|----------------|
//! | `FreeAll` | none | 0 |
//! | `RetainCapacity` | oldest, resized | previous capacity |
//! | `RetainWithLimit(l)` | oldest, resized | `min(l, previous capacity)` |
//!
//! Keeping one node sized to the whole previous capacity means the next
//! fill of the same shape needs no backing-allocator calls at all.

use strata_core::BackingAllocator;

use crate::arena::Arena;

/// How much memory a [`Arena::reset`] keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetMode {
    /// Release every node.
    FreeAll,
    /// Keep one node holding the arena's whole current capacity.
    RetainCapacity,
    /// Like `RetainCapacity`, but keep at most this many usable bytes.
    RetainWithLimit(usize),
}

impl<B: BackingAllocator> Arena<B> {
    /// Reclaim every allocation at once.
    ///
    /// For the retaining modes the target is [`query_capacity`](Self::query_capacity),
    /// clamped to the limit. A target of zero behaves exactly like
    /// [`ResetMode::FreeAll`]. Otherwise every node but the oldest is
    /// released and the oldest is resized in place to exactly the target;
    /// if the backing allocator refuses, a fresh node of the target size
    /// replaces it.
    ///
    /// Returns `false` only when both the resize and the fresh node are
    /// refused. The arena is then empty but fully usable: later
    /// allocations grow it from scratch.
    pub fn reset(&mut self, mode: ResetMode) -> bool {
        let capacity = self.query_capacity();
        let target = match mode {
            ResetMode::FreeAll => 0,
            ResetMode::RetainCapacity => capacity,
            ResetMode::RetainWithLimit(limit) => limit.min(capacity),
        };

        if target == 0 {
            let released = self.node_count();
            self.release_all();
            log::debug!("arena reset: released {released} nodes ({capacity} bytes)");
            return true;
        }

        // Release newest first, down to the oldest node.
        while self.node_count() > 1 {
            if let Some(node) = self.state_mut().nodes.pop() {
                self.release_node(node);
            }
        }
        self.state_mut().cursor = 0;

        let Some(&retained) = self.state().head() else {
            return true;
        };
        if retained.usable_len() == target {
            log::debug!("arena reset: kept one {target}-byte node");
            return true;
        }

        if self.resize_head(target) {
            log::debug!(
                "arena reset: resized retained node from {} to {target} bytes",
                retained.usable_len()
            );
            return true;
        }

        let fresh = self.allocate_node(target);
        self.state_mut().nodes.clear();
        self.release_node(retained);
        match fresh {
            Some(node) => {
                self.state_mut().nodes.push(node);
                log::debug!("arena reset: replaced retained node with a {target}-byte node");
                true
            }
            None => {
                log::debug!("arena reset: could not preheat {target} bytes; arena left empty");
                false
            }
        }
    }
}
