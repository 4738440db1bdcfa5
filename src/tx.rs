use std::collections::BTreeMap;

use crate::db::Tables;
use crate::error::{Error, Result};
use crate::iterator::{MergeIterator, OverlayIterator, StorageIterator};
use crate::memtable::MemTable;
use crate::memtable::skiplist::SkipListIterator;
use crate::types::{Key, Slot};
use crate::wal::WALRecord;
use crate::wal::record::MAX_NAMESPACE_LEN;

/// Read access shared by both transaction kinds, so code that only reads
/// (scans, lookups) runs unchanged inside a read or a write transaction.
pub trait KvRead {
    /// Sorted iterator over one namespace.
    type Iter<'a>: StorageIterator
    where
        Self: 'a;

    /// Whether `namespace` exists as seen by this transaction.
    fn has_namespace(&self, namespace: &str) -> bool;

    /// Look up a key.
    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<&[u8]>>;

    /// Iterator positioned at the first key >= `start`.
    fn iter_from(&self, namespace: &str, start: &[u8]) -> Result<Self::Iter<'_>>;
}

/// A read-only transaction over one committed snapshot. Commits that land
/// while it is open are invisible to it and do not wait for it.
pub struct ReadTx<'db> {
    tables: &'db Tables,
}

impl<'db> ReadTx<'db> {
    pub(crate) fn new(tables: &'db Tables) -> Self {
        ReadTx { tables }
    }

    fn table(&self, namespace: &str) -> Result<&MemTable> {
        self.tables
            .get(namespace)
            .map(|table| table.as_ref())
            .ok_or_else(|| Error::NamespaceNotFound(namespace.to_owned()))
    }
}

impl KvRead for ReadTx<'_> {
    type Iter<'a>
        = SkipListIterator<'a>
    where
        Self: 'a;

    fn has_namespace(&self, namespace: &str) -> bool {
        self.tables.contains_key(namespace)
    }

    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<&[u8]>> {
        Ok(self.table(namespace)?.get(key))
    }

    fn iter_from(&self, namespace: &str, start: &[u8]) -> Result<Self::Iter<'_>> {
        let mut iter = self.table(namespace)?.iter();
        iter.seek(start)?;
        Ok(iter)
    }
}

/// What a write transaction has done to one namespace so far.
#[derive(Default)]
struct Pending {
    exists: bool,
    /// The committed table is hidden (dropped earlier in this transaction).
    cleared: bool,
    writes: BTreeMap<Key, Slot>,
}

/// A read-write transaction.
///
/// Reads see the snapshot committed when the transaction began; writers are
/// serialized, so nothing else commits in between. Writes are buffered
/// twice: in a per-namespace overlay so the transaction reads its own
/// writes, and as WAL records in execution order so commit can log and
/// apply them verbatim.
pub struct WriteTx<'db> {
    base: &'db Tables,
    pending: BTreeMap<String, Pending>,
    ops: Vec<WALRecord>,
}

impl<'db> WriteTx<'db> {
    pub(crate) fn new(base: &'db Tables) -> Self {
        WriteTx {
            base,
            pending: BTreeMap::new(),
            ops: Vec::new(),
        }
    }

    /// The logged operations, in execution order.
    pub(crate) fn into_ops(self) -> Vec<WALRecord> {
        self.ops
    }

    /// Committed table visible to this transaction, if any.
    fn committed(&self, namespace: &str) -> Option<&MemTable> {
        match self.pending.get(namespace) {
            Some(p) if p.cleared => None,
            _ => self.base.get(namespace).map(|table| table.as_ref()),
        }
    }

    fn pending_mut(&mut self, namespace: &str) -> Result<&mut Pending> {
        if !self.has_namespace(namespace) {
            return Err(Error::NamespaceNotFound(namespace.to_owned()));
        }
        Ok(self
            .pending
            .entry(namespace.to_owned())
            .or_insert_with(|| Pending {
                exists: true,
                ..Pending::default()
            }))
    }

    /// Create `namespace` unless it already exists.
    pub fn create_namespace(&mut self, namespace: &str) -> Result<()> {
        if namespace.is_empty() || namespace.len() > MAX_NAMESPACE_LEN {
            return Err(Error::InvalidNamespace(namespace.to_owned()));
        }
        if self.has_namespace(namespace) {
            return Ok(());
        }
        self.pending.entry(namespace.to_owned()).or_default().exists = true;
        self.ops.push(WALRecord::create_namespace(namespace));
        Ok(())
    }

    /// Drop `namespace` and everything in it. No-op if it does not exist.
    pub fn drop_namespace(&mut self, namespace: &str) -> Result<()> {
        if !self.has_namespace(namespace) {
            return Ok(());
        }
        self.pending.insert(
            namespace.to_owned(),
            Pending {
                exists: false,
                cleared: true,
                writes: BTreeMap::new(),
            },
        );
        self.ops.push(WALRecord::drop_namespace(namespace));
        Ok(())
    }

    /// Insert or overwrite `key`. Fails if `namespace` does not exist.
    pub fn put(&mut self, namespace: &str, key: &[u8], value: &[u8]) -> Result<()> {
        self.pending_mut(namespace)?
            .writes
            .insert(key.to_vec(), Some(value.to_vec()));
        self.ops
            .push(WALRecord::put(namespace, key.to_vec(), value.to_vec()));
        Ok(())
    }

    /// Delete `key`. Deleting an absent key is not an error.
    pub fn delete(&mut self, namespace: &str, key: &[u8]) -> Result<()> {
        self.pending_mut(namespace)?.writes.insert(key.to_vec(), None);
        self.ops.push(WALRecord::delete(namespace, key.to_vec()));
        Ok(())
    }
}

impl KvRead for WriteTx<'_> {
    type Iter<'a>
        = MergeIterator<'a>
    where
        Self: 'a;

    fn has_namespace(&self, namespace: &str) -> bool {
        match self.pending.get(namespace) {
            Some(p) => p.exists,
            None => self.base.contains_key(namespace),
        }
    }

    fn get(&self, namespace: &str, key: &[u8]) -> Result<Option<&[u8]>> {
        if !self.has_namespace(namespace) {
            return Err(Error::NamespaceNotFound(namespace.to_owned()));
        }
        if let Some(slot) = self.pending.get(namespace).and_then(|p| p.writes.get(key)) {
            return Ok(slot.as_deref());
        }
        Ok(self.committed(namespace).and_then(|t| t.get(key)))
    }

    fn iter_from(&self, namespace: &str, start: &[u8]) -> Result<Self::Iter<'_>> {
        if !self.has_namespace(namespace) {
            return Err(Error::NamespaceNotFound(namespace.to_owned()));
        }

        let mut sources: Vec<Box<dyn StorageIterator + '_>> = Vec::with_capacity(2);
        if let Some(p) = self.pending.get(namespace) {
            sources.push(Box::new(OverlayIterator::new(&p.writes)));
        }
        if let Some(table) = self.committed(namespace) {
            sources.push(Box::new(table.iter()));
        }

        let mut iter = MergeIterator::new(sources)?;
        iter.seek(start)?;
        Ok(iter)
    }
}
