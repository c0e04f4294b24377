//! Region-based bump arena over a pluggable backing allocator.
//!
//! Serves many small, variably sized and aligned requests out of a few
//! large backing blocks, and releases them all at once instead of one at
//! a time. This crate is one of two that may contain `unsafe` code (along
//! with `strata-core`); it is confined to the modules that hand out raw
//! memory.
//!
//! # Architecture
//!
//! ```text
//! Arena<B> (façade)
//! ├── B: BackingAllocator (borrowed or owned; allocate / resize / release)
//! ├── ArenaState (detachable)
//! │   ├── nodes: Vec<BufferNode>  oldest … head
//! │   └── cursor                  next free byte in head
//! └── ArenaConfig (node slack, growth factor, initial capacity)
//! ```
//!
//! # Reclamation
//!
//! - **Topmost block:** the most recent allocation from the head node can
//!   be freed, shrunk, or grown (within the head) individually.
//! - **Everything else:** reclaimed in bulk by [`Arena::reset`] or on drop.
//!
//! [`Arena`] itself implements [`BackingAllocator`](strata_core::BackingAllocator),
//! so one arena can serve as another's backing allocator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod arena;
pub mod config;
pub mod error;
pub mod node;
pub mod reset;
pub mod state;

// Public re-exports for the primary API surface.
pub use arena::Arena;
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use node::{BufferNode, NODE_ALIGN};
pub use reset::ResetMode;
pub use state::ArenaState;
