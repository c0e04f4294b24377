//! Benchmark workloads for the Strata arena allocator.
//!
//! Provides deterministic request streams so every benchmark run and every
//! comparison between backing allocators sees the same sequence:
//!
//! - [`small_object_profile`]: many small, mixed-alignment requests
//! - [`mixed_profile`]: small requests with periodic large buffers
//! - [`fill`]: drive an arena through a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::alloc::Layout;

use strata_arena::{Arena, ArenaError};
use strata_core::BackingAllocator;

/// `n` small requests (8 to 256 bytes, alignment 1 to 16), seeded.
pub fn small_object_profile(n: usize, seed: u64) -> Vec<Layout> {
    request_stream(n, seed, 256, 0)
}

/// Like [`small_object_profile`], but every 64th request is a 16 KiB buffer.
pub fn mixed_profile(n: usize, seed: u64) -> Vec<Layout> {
    request_stream(n, seed, 256, 64)
}

/// Allocate every layout in `profile` and return the bytes requested.
pub fn fill<B: BackingAllocator>(
    arena: &mut Arena<B>,
    profile: &[Layout],
) -> Result<usize, ArenaError> {
    let mut total = 0;
    for &layout in profile {
        total += arena.alloc(layout)?.len();
    }
    Ok(total)
}

fn request_stream(n: usize, seed: u64, max_small: usize, large_every: usize) -> Vec<Layout> {
    let mut state = seed;
    (0..n)
        .map(|i| {
            // LCG step; only needs to be deterministic, not good.
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let bits = (state >> 33) as usize;
            let size = if large_every > 0 && i % large_every == large_every - 1 {
                16 * 1024
            } else {
                8 + bits % (max_small - 7)
            };
            let align = 1 << ((bits >> 12) % 5);
            Layout::from_size_align(size, align).unwrap_or(Layout::new::<u8>())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::SystemBacking;

    #[test]
    fn profiles_are_deterministic() {
        assert_eq!(small_object_profile(100, 7), small_object_profile(100, 7));
        assert_ne!(small_object_profile(100, 7), small_object_profile(100, 8));
    }

    #[test]
    fn small_profile_stays_small() {
        for layout in small_object_profile(1000, 42) {
            assert!((8..=256).contains(&layout.size()));
            assert!(layout.align() <= 16);
        }
    }

    #[test]
    fn mixed_profile_has_large_buffers() {
        let profile = mixed_profile(128, 42);
        assert_eq!(profile[63].size(), 16 * 1024);
        assert_eq!(profile[127].size(), 16 * 1024);
    }

    #[test]
    fn fill_reports_requested_bytes() {
        let profile = small_object_profile(200, 1);
        let expected: usize = profile.iter().map(Layout::size).sum();
        let mut arena = Arena::new(SystemBacking);
        assert_eq!(fill(&mut arena, &profile).unwrap(), expected);
    }
}
