//! Alignment arithmetic.

/// Round `addr` up to the next multiple of `align`.
///
/// Returns `None` if the rounded value does not fit in a `usize`.
/// `align` must be a power of two (every [`std::alloc::Layout`] alignment is).
#[inline]
pub fn align_forward(addr: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
    let mask = align - 1;
    addr.checked_add(mask).map(|v| v & !mask)
}

/// Whether `addr` is a multiple of `align`.
#[inline]
pub fn is_aligned(addr: usize, align: usize) -> bool {
    debug_assert!(align.is_power_of_two(), "alignment {align} is not a power of two");
    addr & (align - 1) == 0
}
