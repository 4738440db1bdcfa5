use crate::error::Result;
use crate::iterator::StorageIterator;

/// Merges multiple sorted iterators into a single sorted stream.
///
/// Used to read through a write transaction: its pending writes are the
/// newest source and the committed table sits underneath.
///
/// Deduplication: if multiple sources are positioned on the same key, only
/// the one with the highest priority (lowest index) is yielded. If that
/// winner is a tombstone the key is skipped entirely.
pub struct MergeIterator<'a> {
    iters: Vec<Box<dyn StorageIterator + 'a>>,
    current: Option<usize>,
}

impl<'a> MergeIterator<'a> {
    /// Create a new MergeIterator from multiple sorted sources.
    /// Sources are ordered by priority: index 0 = newest.
    pub fn new(iters: Vec<Box<dyn StorageIterator + 'a>>) -> Result<Self> {
        let mut merged = MergeIterator {
            iters,
            current: None,
        };
        merged.settle()?;
        Ok(merged)
    }

    /// Source positioned on the smallest key; ties go to the lowest index.
    /// The source count is tiny, so a linear pass beats a heap here.
    fn smallest(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, iter) in self.iters.iter().enumerate() {
            if !iter.is_valid() {
                continue;
            }
            match best {
                Some(b) if self.iters[b].key() <= iter.key() => {}
                _ => best = Some(i),
            }
        }
        best
    }

    /// Advance every source positioned on `key`.
    fn skip_key(&mut self, key: &[u8]) -> Result<()> {
        for iter in self.iters.iter_mut() {
            if iter.is_valid() && iter.key() == key {
                iter.next()?;
            }
        }
        Ok(())
    }

    /// Land on the next key whose newest version is live.
    fn settle(&mut self) -> Result<()> {
        loop {
            let Some(winner) = self.smallest() else {
                self.current = None;
                return Ok(());
            };
            if !self.iters[winner].is_tombstone() {
                self.current = Some(winner);
                return Ok(());
            }
            let key = self.iters[winner].key().to_vec();
            self.skip_key(&key)?;
        }
    }
}

impl StorageIterator for MergeIterator<'_> {
    fn key(&self) -> &[u8] {
        self.current.map_or(&[][..], |i| self.iters[i].key())
    }

    fn value(&self) -> &[u8] {
        self.current.map_or(&[][..], |i| self.iters[i].value())
    }

    fn is_valid(&self) -> bool {
        self.current.is_some()
    }

    fn next(&mut self) -> Result<()> {
        if let Some(winner) = self.current {
            let key = self.iters[winner].key().to_vec();
            self.skip_key(&key)?;
            self.settle()?;
        }
        Ok(())
    }

    fn seek(&mut self, key: &[u8]) -> Result<()> {
        for iter in self.iters.iter_mut() {
            iter.seek(key)?;
        }
        self.settle()
    }
}
