//! Strata: region-based arena allocation over pluggable backing allocators.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Strata sub-crates. For most users, adding `strata` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::alloc::Layout;
//! use strata::prelude::*;
//!
//! let mut arena = Arena::new(SystemBacking);
//!
//! // Many small allocations, no per-block bookkeeping.
//! let name = arena.alloc_copy(b"strata").unwrap();
//! let table = arena.alloc(Layout::array::<u64>(128).unwrap()).unwrap();
//! assert_eq!(table.len(), 128 * 8);
//!
//! // SAFETY: `name` is live until the next reset.
//! assert_eq!(unsafe { name.as_ref() }, b"strata");
//!
//! // Drop everything at once, keeping the memory for the next round.
//! let capacity = arena.query_capacity();
//! assert!(arena.reset(ResetMode::RetainCapacity));
//! assert_eq!(arena.query_capacity(), capacity);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`backing`] | `strata-core` | Backing allocator trait, system heap backing, alignment helpers |
//! | [`arena`] | `strata-arena` | The arena, its detachable state, reset modes, configuration |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Backing allocators and alignment arithmetic (`strata-core`).
///
/// Implement [`backing::BackingAllocator`] to feed an arena from your own
/// memory source; [`backing::SystemBacking`] uses the global heap.
pub use strata_core as backing;

/// The bump arena (`strata-arena`).
///
/// [`arena::Arena`] is the allocator itself; [`arena::ArenaState`] is its
/// detachable chain of nodes, and [`arena::ResetMode`] selects how much
/// memory a reset keeps.
pub use strata_arena as arena;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Backing
    pub use strata_core::{AllocError, BackingAllocator, SystemBacking};

    // Arena
    pub use strata_arena::{Arena, ArenaConfig, ArenaError, ArenaState, ResetMode};
}
