//! Index arithmetic for the current pointer. The pointer is advisory: a
//! stored value that no longer fits the sequence is read as 0.

/// Stored pointer as a valid index into a sequence of `count` items.
/// Only meaningful for `count > 0`.
pub fn clamp(stored: u64, count: usize) -> usize {
    usize::try_from(stored)
        .ok()
        .filter(|&index| index < count)
        .unwrap_or(0)
}

/// One step forward, wrapping past the last item to the first.
pub fn advance(index: usize, count: usize) -> usize {
    (index + 1) % count
}

/// One step back, wrapping past the first item to the last.
pub fn retreat(index: usize, count: usize) -> usize {
    (index + count - 1) % count
}

/// Pointer after the item at `removed` is deleted, leaving `remaining`
/// items. The index is kept, so it now names the removed item's successor;
/// removing the last item wraps to 0.
pub fn after_remove(removed: usize, remaining: usize) -> usize {
    if removed >= remaining { 0 } else { removed }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_keeps_in_range_and_resets_stale() {
        assert_eq!(clamp(2, 3), 2);
        assert_eq!(clamp(3, 3), 0);
        assert_eq!(clamp(u64::MAX, 3), 0);
        assert_eq!(clamp(5, 0), 0);
    }

    #[test]
    fn advance_and_retreat_wrap() {
        assert_eq!(advance(0, 3), 1);
        assert_eq!(advance(2, 3), 0);
        assert_eq!(retreat(0, 3), 2);
        assert_eq!(retreat(2, 3), 1);
        assert_eq!(advance(0, 1), 0);
        assert_eq!(retreat(0, 1), 0);
    }

    #[test]
    fn after_remove_points_at_successor_or_wraps() {
        // [A, B, C] remove B (1) -> [A, C], pointer 1 = C
        assert_eq!(after_remove(1, 2), 1);
        // remove C (2) -> [A, B], wraps to A
        assert_eq!(after_remove(2, 2), 0);
        // last item gone
        assert_eq!(after_remove(0, 0), 0);
    }
}
