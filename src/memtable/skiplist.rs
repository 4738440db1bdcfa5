use std::mem::size_of;

use rand::Rng;

use crate::error::Result;
use crate::iterator::StorageIterator;

/// Maximum height of the skip list. LevelDB uses 12.
pub const MAX_HEIGHT: usize = 12;

/// Arena index of the head sentinel.
const HEAD: usize = 0;

/// A single node in the skip list.
///
/// Each node has `height` forward pointers. Level 0 contains all nodes
/// (a regular linked list). Higher levels skip over nodes, enabling
/// O(log n) average-case search.
///
/// ```text
/// Level 3:  HEAD ──────────────────────────────► 50 ──────────► NIL
/// Level 2:  HEAD ──────────► 20 ────────────────► 50 ──────────► NIL
/// Level 1:  HEAD ──► 10 ──► 20 ────► 35 ────────► 50 ──► 60 ──► NIL
/// Level 0:  HEAD ──► 10 ──► 20 ──► 25 ──► 35 ──► 50 ──► 60 ──► 70 ► NIL
/// ```
#[derive(Clone)]
pub struct SkipNode {
    key: Vec<u8>,
    value: Vec<u8>,
    forward: Vec<Option<usize>>, // indices into SkipList.nodes
}

impl SkipNode {
    fn footprint(&self) -> usize {
        self.key.len() + self.value.len() + self.forward.len() * size_of::<Option<usize>>()
    }
}

/// A probabilistic sorted map from byte keys to byte values.
///
/// Nodes live in an arena and link to each other by index. Removed nodes are
/// unlinked at every level and their slot goes on a free list for the next
/// insert, so a namespace that churns items does not grow without bound.
///
/// Average case: O(log n) insert, lookup and remove, O(n) iteration.
#[derive(Clone)]
pub struct SkipList {
    nodes: Vec<SkipNode>,
    free: Vec<usize>,
    height: usize,
    len: usize,
    size_bytes: usize,
}

impl SkipList {
    /// Create a new empty skip list.
    pub fn new() -> Self {
        let head = SkipNode {
            key: Vec::new(),
            value: Vec::new(),
            forward: vec![None; MAX_HEIGHT],
        };
        SkipList {
            nodes: vec![head],
            free: Vec::new(),
            height: 1,
            len: 0,
            size_bytes: 0,
        }
    }

    /// For every level, the last node whose key is strictly less than `key`.
    /// Levels above the current height point at the head.
    fn predecessors(&self, key: &[u8]) -> [usize; MAX_HEIGHT] {
        let mut preds = [HEAD; MAX_HEIGHT];
        let mut x = HEAD;
        for level in (0..self.height).rev() {
            while let Some(next) = self.nodes[x].forward[level] {
                if self.nodes[next].key.as_slice() < key {
                    x = next;
                } else {
                    break;
                }
            }
            preds[level] = x;
        }
        preds
    }

    /// Arena index of the first node with key >= `key`.
    fn lower_bound(&self, key: &[u8]) -> Option<usize> {
        let preds = self.predecessors(key);
        self.nodes[preds[0]].forward[0]
    }

    /// Insert a key-value pair. Overwrites if key already exists.
    ///
    /// Algorithm:
    ///   1. Find the insertion point at each level (track predecessors)
    ///   2. Generate a random height for the new node (coin flip per level)
    ///   3. Create node with that height
    ///   4. Splice into the list at each level up to the node's height
    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let preds = self.predecessors(&key);

        if let Some(next) = self.nodes[preds[0]].forward[0] {
            if self.nodes[next].key == key {
                let node = &mut self.nodes[next];
                self.size_bytes = self.size_bytes + value.len() - node.value.len();
                node.value = value;
                return;
            }
        }

        let height = self.random_height();
        self.height = self.height.max(height);

        let node = SkipNode {
            key,
            value,
            forward: vec![None; height],
        };
        self.size_bytes += node.footprint();

        let idx = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                slot
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        };

        for (level, &pred) in preds.iter().enumerate().take(height) {
            self.nodes[idx].forward[level] = self.nodes[pred].forward[level];
            self.nodes[pred].forward[level] = Some(idx);
        }
        self.len += 1;
    }

    /// Look up a key. Returns the value if found.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        let idx = self.lower_bound(key)?;
        let node = &self.nodes[idx];
        (node.key == key).then_some(node.value.as_slice())
    }

    /// Unlink a key at every level it appears on. Returns the old value.
    pub fn remove(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let preds = self.predecessors(key);
        let target = self.nodes[preds[0]].forward[0]?;
        if self.nodes[target].key != key {
            return None;
        }

        let height = self.nodes[target].forward.len();
        for (level, &pred) in preds.iter().enumerate().take(height) {
            self.nodes[pred].forward[level] = self.nodes[target].forward[level];
        }
        while self.height > 1 && self.nodes[HEAD].forward[self.height - 1].is_none() {
            self.height -= 1;
        }

        self.size_bytes -= self.nodes[target].footprint();
        let node = &mut self.nodes[target];
        node.key = Vec::new();
        node.forward = Vec::new();
        let value = std::mem::take(&mut node.value);

        self.free.push(target);
        self.len -= 1;
        Some(value)
    }

    /// Number of entries in the skip list.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the skip list is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Approximate memory usage in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Create an iterator over all entries in sorted order.
    /// Traverses level 0 (the bottom level contains all entries).
    pub fn iter(&self) -> SkipListIterator<'_> {
        SkipListIterator {
            list: self,
            current: self.nodes[HEAD].forward[0],
        }
    }

    /// Generate a random level for a new node.
    /// Each level has a 1/4 probability (LevelDB uses 1/4, not 1/2).
    fn random_height(&self) -> usize {
        let mut rng = rand::thread_rng();
        let mut height = 1;
        while height < MAX_HEIGHT && rng.gen_ratio(1, 4) {
            height += 1;
        }
        height
    }
}

impl Default for SkipList {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over skip list entries in sorted order.
///
/// Simply follows level 0 forward pointers — level 0 is a sorted linked list
/// containing every entry.
pub struct SkipListIterator<'a> {
    list: &'a SkipList,
    current: Option<usize>,
}

impl StorageIterator for SkipListIterator<'_> {
    fn key(&self) -> &[u8] {
        self.current
            .map_or(&[][..], |idx| self.list.nodes[idx].key.as_slice())
    }

    fn value(&self) -> &[u8] {
        self.current
            .map_or(&[][..], |idx| self.list.nodes[idx].value.as_slice())
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        if let Some(idx) = self.current {
            self.current = self.list.nodes[idx].forward[0];
        }
        Ok(())
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        self.current = self.list.lower_bound(key);
        Ok(())
    }
}
