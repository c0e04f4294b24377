//! Integration tests: the arena's observable allocation contract.
//!
//! Each test drives an `Arena` through an instrumented backing allocator
//! from `strata-test-utils` and checks one externally visible property:
//! address reuse, inert non-topmost frees, resize bounds, reset capacity,
//! preheating, and leak-free teardown.

use std::alloc::Layout;
use std::ptr::NonNull;

use proptest::prelude::*;
use strata_arena::{Arena, ArenaConfig, ResetMode};
use strata_core::{BackingAllocator, SystemBacking};
use strata_test_utils::{CountingAllocator, FailingAllocator, FirstFitAllocator};

fn layout(size: usize, align: usize) -> Layout {
    Layout::from_size_align(size, align).unwrap()
}

fn addr(block: NonNull<[u8]>) -> usize {
    block.cast::<u8>().as_ptr() as usize
}

/// Allocate every `(size, align)` in order and return the blocks.
fn allocate_all<B: BackingAllocator>(
    arena: &mut Arena<B>,
    requests: &[(usize, usize)],
) -> Vec<NonNull<[u8]>> {
    requests
        .iter()
        .map(|&(size, align)| arena.alloc(layout(size, align)).unwrap())
        .collect()
}

fn arb_requests() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..512, 0u32..7), 1..64)
        .prop_map(|v| v.into_iter().map(|(size, shift)| (size, 1usize << shift)).collect())
}

// ── Concrete scenarios ──────────────────────────────────────────────

#[test]
fn tiny_then_large_request_grows_the_arena() {
    let mut first_fit = FirstFitAllocator::new(1 << 16);
    let mut arena = Arena::new(&mut first_fit);
    arena.alloc(layout(1, 1)).unwrap();
    arena.alloc(layout(1000, 1)).unwrap();
    assert!(arena.query_capacity() >= 1001);
}

#[test]
fn tiny_then_large_request_links_second_node_without_resize() {
    let mut arena = Arena::new(SystemBacking);
    arena.alloc(layout(1, 1)).unwrap();
    arena.alloc(layout(1000, 1)).unwrap();
    assert!(arena.node_count() >= 2);
    assert!(arena.query_capacity() >= 1001);
}

#[test]
fn alloc_free_alloc_returns_same_address() {
    let mut arena = Arena::new(SystemBacking);
    let first = arena.alloc(layout(10, 1)).unwrap();
    // SAFETY: `first` is the most recent allocation.
    unsafe { arena.free(first) };
    let second = arena.alloc(layout(10, 1)).unwrap();
    assert_eq!(addr(first), addr(second));
}

#[test]
fn free_all_leaves_no_capacity_and_no_head() {
    let mut counter = CountingAllocator::new(SystemBacking);
    let mut arena = Arena::new(&mut counter);
    allocate_all(&mut arena, &[(100, 8), (3000, 16), (7, 1), (9000, 64)]);
    assert!(arena.reset(ResetMode::FreeAll));
    assert_eq!(arena.query_capacity(), 0);
    assert!(arena.state().head().is_none());
    drop(arena);
    assert_eq!(counter.live(), 0);
}

#[test]
fn block_at_end_of_old_node_is_not_topmost_in_adjacent_head() {
    // Node 0 is exactly 64 bytes and growth is refused, so the first-fit
    // allocator places node 1 directly after it.
    let mut first_fit = FirstFitAllocator::new(1 << 16);
    let failing = FailingAllocator::new(&mut first_fit).refuse_resizes();
    let mut arena = Arena::with_config(failing, ArenaConfig::with_initial_capacity(64)).unwrap();
    let filler = arena.alloc(layout(64, 1)).unwrap();
    assert_eq!(arena.remaining(), 0);

    let next = arena.alloc(layout(8, 1)).unwrap();
    assert_eq!(arena.node_count(), 2);
    let head = arena.state().head().unwrap().base_addr();
    assert_eq!(head, addr(filler) + 64);

    // SAFETY: `next` is topmost.
    unsafe { arena.free(next) };
    assert_eq!(arena.cursor(), 0);
    // `filler` now ends exactly at head base + cursor, but lives in node 0.
    // SAFETY: `filler` is live and not topmost, so this is a no-op.
    unsafe { arena.free(filler) };
    assert_eq!(arena.cursor(), 0);
    assert_eq!(arena.node_count(), 2);
}

#[test]
fn repeated_reset_cycles_stop_calling_backing() {
    let mut counter = CountingAllocator::new(SystemBacking);
    let mut arena = Arena::new(&mut counter);
    let requests: Vec<(usize, usize)> = (1..=40).map(|i| (i * 16, 16)).collect();

    allocate_all(&mut arena, &requests);
    assert!(arena.node_count() > 1);
    assert!(arena.reset(ResetMode::RetainCapacity));

    for _ in 0..5 {
        arena.backing_mut().reset_stats();
        allocate_all(&mut arena, &requests);
        assert!(arena.reset(ResetMode::RetainCapacity));
        assert_eq!(arena.backing().stats().calls(), 0);
        assert_eq!(arena.node_count(), 1);
    }
}

// ── Properties ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn stack_reuse(prefix in arb_requests(), size in 0usize..1024, shift in 0u32..7) {
        let mut arena = Arena::new(SystemBacking);
        allocate_all(&mut arena, &prefix);
        let x = arena.alloc(layout(size, 1 << shift)).unwrap();
        // SAFETY: `x` is the most recent allocation.
        unsafe { arena.free(x) };
        let y = arena.alloc(layout(size, 1 << shift)).unwrap();
        prop_assert_eq!(addr(x), addr(y));
    }

    #[test]
    fn non_topmost_free_is_inert(requests in arb_requests(), pick in any::<prop::sample::Index>()) {
        let mut arena = Arena::new(SystemBacking);
        let mut blocks = allocate_all(&mut arena, &requests);
        // A block that is definitely not topmost.
        blocks.pop();
        let tail = arena.alloc(layout(8, 8)).unwrap();
        prop_assume!(!blocks.is_empty());
        prop_assume!(arena.remaining() >= 8);
        let victim = blocks[pick.index(blocks.len())];

        let capacity = arena.query_capacity();
        let cursor = arena.cursor();
        // SAFETY: `victim` is live and not topmost.
        unsafe { arena.free(victim) };
        prop_assert_eq!(arena.query_capacity(), capacity);
        prop_assert_eq!(arena.cursor(), cursor);
        let next = arena.alloc(layout(8, 8)).unwrap();
        prop_assert_eq!(addr(next), addr(tail) + 8);
    }

    #[test]
    fn resize_growth_bound(prefix in arb_requests(), len in 0usize..256, extra in 0usize..4096) {
        let mut arena = Arena::new(SystemBacking);
        allocate_all(&mut arena, &prefix);
        let x = arena.alloc(layout(len, 1)).unwrap();
        let room = arena.remaining();
        let cursor = arena.cursor();
        let n = len + extra;

        // SAFETY: `x` is topmost.
        let ok = unsafe { arena.resize(x, n) };
        prop_assert_eq!(ok, n <= len + room);
        if ok && arena.remaining() > 0 {
            let next = arena.alloc(layout(1, 1)).unwrap();
            let head = arena.state().head().unwrap().base_addr();
            prop_assert_eq!(addr(next), head + cursor + (n - len));
        } else if !ok {
            prop_assert_eq!(arena.cursor(), cursor);
        }
    }

    #[test]
    fn preheated_second_pass_makes_no_backing_calls(requests in arb_requests()) {
        let mut counter = CountingAllocator::new(SystemBacking);
        let mut arena = Arena::new(&mut counter);
        allocate_all(&mut arena, &requests);
        prop_assert!(arena.reset(ResetMode::RetainCapacity));

        arena.backing_mut().reset_stats();
        allocate_all(&mut arena, &requests);
        prop_assert_eq!(arena.backing().stats().calls(), 0);
    }

    #[test]
    fn preheating_with_in_place_growth(requests in arb_requests()) {
        let mut first_fit = FirstFitAllocator::new(1 << 20);
        let mut counter = CountingAllocator::new(&mut first_fit);
        let mut arena = Arena::new(&mut counter);
        allocate_all(&mut arena, &requests);
        prop_assert!(arena.reset(ResetMode::RetainCapacity));

        arena.backing_mut().reset_stats();
        allocate_all(&mut arena, &requests);
        prop_assert_eq!(arena.backing().stats().calls(), 0);
    }

    #[test]
    fn limit_clamp(requests in arb_requests(), limit in 0usize..8192) {
        let mut arena = Arena::new(SystemBacking);
        allocate_all(&mut arena, &requests);
        prop_assert!(arena.reset(ResetMode::RetainWithLimit(limit)));
        prop_assert!(arena.query_capacity() <= limit);
        prop_assert!(arena.node_count() <= 1);
    }

    #[test]
    fn deinit_leaves_no_live_blocks(requests in arb_requests()) {
        let mut counter = CountingAllocator::new(SystemBacking);
        let mut arena = Arena::new(&mut counter);
        allocate_all(&mut arena, &requests);
        arena.deinit();
        prop_assert_eq!(counter.live(), 0);
    }

    #[test]
    fn deinit_after_resets_and_frees_leaves_no_live_blocks(
        rounds in prop::collection::vec((arb_requests(), 0usize..3, any::<bool>()), 1..6),
    ) {
        let mut first_fit = FirstFitAllocator::new(1 << 20);
        let mut counter = CountingAllocator::new(&mut first_fit);
        let mut arena = Arena::new(&mut counter);
        for (requests, mode, free_last) in &rounds {
            let blocks = allocate_all(&mut arena, requests);
            if *free_last {
                // SAFETY: the last block is topmost and live.
                unsafe { arena.free(*blocks.last().unwrap()) };
            }
            let mode = match mode {
                0 => ResetMode::FreeAll,
                1 => ResetMode::RetainCapacity,
                _ => ResetMode::RetainWithLimit(256),
            };
            arena.reset(mode);
        }
        arena.deinit();
        prop_assert_eq!(counter.live(), 0);
        drop(counter);
        prop_assert_eq!(first_fit.live_blocks(), 0);
    }

    #[test]
    fn live_blocks_never_overlap(requests in arb_requests()) {
        let mut first_fit = FirstFitAllocator::new(1 << 20);
        let mut arena = Arena::new(&mut first_fit);
        let blocks = allocate_all(&mut arena, &requests);
        let mut ranges: Vec<(usize, usize)> = blocks
            .iter()
            .zip(&requests)
            .map(|(b, &(size, align))| {
                prop_assert_eq!(addr(*b) % align, 0);
                Ok((addr(*b), addr(*b) + size))
            })
            .collect::<Result<_, TestCaseError>>()?;
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            prop_assert!(pair[0].1 <= pair[1].0);
        }
    }

    #[test]
    fn contents_survive_growth(requests in arb_requests()) {
        let mut first_fit = FirstFitAllocator::new(1 << 20);
        let mut arena = Arena::new(&mut first_fit);
        let blocks = allocate_all(&mut arena, &requests);
        for (i, block) in blocks.iter().enumerate() {
            // SAFETY: every block is live and exclusively ours.
            unsafe { block.cast::<u8>().as_ptr().write_bytes(i as u8, block.len()) };
        }
        // Force more growth after the writes.
        allocate_all(&mut arena, &requests);
        for (i, block) in blocks.iter().enumerate() {
            // SAFETY: every block is still live.
            let bytes = unsafe { block.as_ref() };
            prop_assert!(bytes.iter().all(|&b| b == i as u8));
        }
    }
}
