pub mod skiplist;

use skiplist::{SkipList, SkipListIterator};

/// In-memory sorted table backing one namespace. Wraps a SkipList.
///
/// Tables only ever hold committed state: a write transaction keeps its
/// changes in a private overlay and applies them here on commit. Because of
/// that a delete can physically unlink the key instead of leaving a
/// tombstone behind.
///
/// Cloned only when a commit touches a table that a read snapshot still
/// shares.
#[derive(Clone)]
pub struct MemTable {
    data: SkipList,
}

impl MemTable {
    /// Create a new empty table.
    pub fn new() -> Self {
        MemTable {
            data: SkipList::new(),
        }
    }

    /// Insert or update a key-value pair.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.data.insert(key, value);
    }

    /// Look up a key.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        self.data.get(key)
    }

    /// Remove a key. Returns whether it was present.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.data.remove(key).is_some()
    }

    /// Return a sorted iterator over all entries.
    pub fn iter(&self) -> SkipListIterator<'_> {
        self.data.iter()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the table holds no keys.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current memory usage in bytes.
    pub fn size(&self) -> usize {
        self.data.size_bytes()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
