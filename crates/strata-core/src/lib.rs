//! Core types and traits for the Strata arena allocator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the capability every arena draws its memory from:
//!
//! - [`BackingAllocator`]: raw block allocation, non-moving resize, release.
//! - [`AllocError`]: the failure value of [`BackingAllocator::allocate`].
//! - [`align_forward`]: the alignment arithmetic shared by every allocator.
//! - [`SystemBacking`]: a backing allocator over the process global heap.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod align;
pub mod backing;
pub mod error;
pub mod system;

pub use align::{align_forward, is_aligned};
pub use backing::BackingAllocator;
pub use error::AllocError;
pub use system::SystemBacking;
