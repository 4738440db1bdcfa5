pub mod merge;
pub mod overlay;

use crate::error::Result;

pub use merge::MergeIterator;
pub use overlay::OverlayIterator;

/// The central iteration abstraction for the store.
///
/// Every sorted data source (skip list, transaction overlay, merged view)
/// implements this trait. This enables composability — MergeIterator
/// takes Vec<Box<dyn StorageIterator>> and merges them.
pub trait StorageIterator {
    /// Returns the current key. Only valid when is_valid() is true.
    fn key(&self) -> &[u8];

    /// Returns the current value. Only valid when is_valid() is true.
    fn value(&self) -> &[u8];

    /// Returns true if the iterator is positioned at a valid entry.
    fn is_valid(&self) -> bool;

    /// Advances to the next entry. Returns error on IO failure.
    fn next(&mut self) -> Result<()>;

    /// Positions the iterator at the first entry with key >= target.
    fn seek(&mut self, key: &[u8]) -> Result<()>;

    /// True when the current entry marks a deletion that shadows older
    /// sources. Committed tables never hold tombstones.
    fn is_tombstone(&self) -> bool {
        false
    }
}
