//! Test utilities and instrumented backing allocators for Strata development.
//!
//! Three [`BackingAllocator`](strata_core::BackingAllocator) implementations
//! for exercising arenas:
//!
//! - [`FirstFitAllocator`] — a fixed region served first-fit, with real
//!   in-place growth when the neighbouring span is free.
//! - [`CountingAllocator`] — counts calls and live blocks of any inner
//!   allocator; panics on a release it cannot account for.
//! - [`FailingAllocator`] — fails deterministically after N allocations.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod counting;
pub mod failing;
pub mod first_fit;

pub use counting::{BackingStats, CountingAllocator};
pub use failing::FailingAllocator;
pub use first_fit::FirstFitAllocator;
