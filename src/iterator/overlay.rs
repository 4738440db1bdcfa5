use std::collections::BTreeMap;
use std::collections::btree_map::Range;
use std::ops::Bound;

use crate::error::Result;
use crate::iterator::StorageIterator;
use crate::types::{Key, Slot};

/// Sorted view over a write transaction's pending writes.
///
/// Pending deletes surface as tombstones so a [`MergeIterator`] can hide the
/// committed value underneath them.
///
/// [`MergeIterator`]: crate::iterator::MergeIterator
pub struct OverlayIterator<'a> {
    writes: &'a BTreeMap<Key, Slot>,
    range: Range<'a, Key, Slot>,
    current: Option<(&'a Key, &'a Slot)>,
}

impl<'a> OverlayIterator<'a> {
    /// Positioned at the first pending write.
    pub fn new(writes: &'a BTreeMap<Key, Slot>) -> Self {
        let mut range = writes.range::<[u8], _>(..);
        let current = range.next();
        OverlayIterator {
            writes,
            range,
            current,
        }
    }
}

impl StorageIterator for OverlayIterator<'_> {
    fn key(&self) -> &[u8] {
        self.current.map_or(&[][..], |(k, _)| k.as_slice())
    }

    fn value(&self) -> &[u8] {
        match self.current {
            Some((_, Some(v))) => v.as_slice(),
            _ => &[],
        }
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        self.current = self.range.next();
        Ok(())
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.range = self
            .writes
            .range::<[u8], _>((Bound::Included(key), Bound::Unbounded));
        self.current = self.range.next();
        Ok(())
    }

    fn is_tombstone(&self) -> bool {
        matches!(self.current, Some((_, None)))
    }
}
