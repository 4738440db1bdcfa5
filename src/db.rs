//! The store: named, ordered namespaces with serialized, atomic write
//! transactions and consistent read transactions.
//!
//! ## Concurrency
//! Committed state is an immutable snapshot, `Arc<Tables>`, with one
//! `MemTable` per namespace, itself behind an `Arc`.
//!   - A read transaction clones the current snapshot and reads it without
//!     holding any lock, so it sees one committed state from start to finish
//!     and never delays a commit.
//!   - A write transaction holds the writer mutex for its whole duration,
//!     which serializes writers. Its changes sit in a private overlay until
//!     commit.
//!   - Commit appends the transaction to the WAL, then applies it to the
//!     snapshot copy-on-write: tables no reader shares are updated in place,
//!     tables a live reader still shares are cloned first. Readers never see
//!     a half applied transaction.
//!
//! ## Durability
//! A durable store is its WAL. Opening locks the file, replays every
//! committed transaction and cuts off anything after the last commit marker.
//! Only one store may have a given WAL open at a time.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{info, trace, warn};

use crate::error::Result;
use crate::memtable::MemTable;
use crate::tx::{ReadTx, WriteTx};
use crate::wal::{RecordType, SyncPolicy, WALReader, WALRecord, WALWriter};

/// Committed tables keyed by namespace name.
pub(crate) type Tables = BTreeMap<String, Arc<MemTable>>;

/// Configuration for [`DB::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// When the WAL is fsync'd.
    pub sync_policy: SyncPolicy,
    /// Create the WAL file if it does not exist. When false, opening a
    /// missing file fails with an `Io(NotFound)` error.
    pub create_if_missing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            sync_policy: SyncPolicy::EveryWrite,
            create_if_missing: true,
        }
    }
}

impl Options {
    /// Set when the WAL is fsync'd.
    pub fn with_sync_policy(mut self, sync_policy: SyncPolicy) -> Self {
        self.sync_policy = sync_policy;
        self
    }

    /// Set whether [`DB::open`] may create a missing WAL file.
    pub fn with_create_if_missing(mut self, create_if_missing: bool) -> Self {
        self.create_if_missing = create_if_missing;
        self
    }
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub namespaces: usize,
    pub keys: usize,
    /// Approximate bytes held by all tables.
    pub memory_bytes: usize,
    /// Length of the WAL. Always 0 for an in-memory store.
    pub wal_bytes: u64,
    /// Transactions applied since open, replayed ones included.
    pub commits: u64,
}

struct Shared {
    /// Latest committed snapshot. Locked only to clone the `Arc` or to apply
    /// a commit.
    tables: RwLock<Arc<Tables>>,
    /// Held for the whole of a write transaction.
    writer: Mutex<()>,
    wal: Mutex<Option<WALWriter>>,
    commits: AtomicU64,
}

/// Handle to a store. Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct DB {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DB {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DB").finish_non_exhaustive()
    }
}

impl DB {
    /// A store that lives only as long as its handles.
    pub fn in_memory() -> Self {
        Self::from_parts(Tables::new(), None, 0)
    }

    /// Open a durable store backed by the WAL at `path`, replaying it.
    ///
    /// Fails with [`Error::Locked`](crate::Error::Locked) while another store
    /// has the same file open.
    pub fn open(path: impl AsRef<Path>, options: Options) -> Result<Self> {
        let path = path.as_ref();
        if !options.create_if_missing && !path.try_exists()? {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no WAL at {}", path.display()),
            )
            .into());
        }

        // Lock before reading so nobody appends behind the replay.
        let mut writer = WALWriter::new(path, options.sync_policy)?;
        let recovered = WALReader::new(path)?.recover();
        if recovered.has_torn_tail() {
            warn!(
                path = %path.display(),
                valid_len = recovered.valid_len,
                file_len = recovered.file_len,
                "discarding uncommitted WAL tail"
            );
        }
        if writer.offset() > recovered.valid_len {
            writer.truncate(recovered.valid_len)?;
        }

        let mut tables = Tables::new();
        let mut commits = 0;
        for batch in recovered.batches {
            for record in batch {
                apply(&mut tables, record);
            }
            commits += 1;
        }

        info!(
            path = %path.display(),
            transactions = commits,
            bytes = recovered.valid_len,
            namespaces = tables.len(),
            "opened store"
        );
        Ok(Self::from_parts(tables, Some(writer), commits))
    }

    fn from_parts(tables: Tables, wal: Option<WALWriter>, commits: u64) -> Self {
        DB {
            shared: Arc::new(Shared {
                tables: RwLock::new(Arc::new(tables)),
                writer: Mutex::new(()),
                wal: Mutex::new(wal),
                commits: AtomicU64::new(commits),
            }),
        }
    }

    fn snapshot(&self) -> Arc<Tables> {
        Arc::clone(&self.shared.tables.read())
    }

    /// Run `f` inside a read transaction.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&ReadTx<'_>) -> Result<T>,
    {
        let snapshot = self.snapshot();
        let tx = ReadTx::new(&snapshot);
        f(&tx)
    }

    /// Run `f` inside a write transaction. Commits if `f` returns `Ok`;
    /// otherwise nothing `f` did is kept.
    ///
    /// Must not be called from inside another `update` on the same store:
    /// writers are serialized and the inner call would wait forever.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut WriteTx<'_>) -> Result<T>,
    {
        let _writer = self.shared.writer.lock();
        let base = self.snapshot();
        let mut tx = WriteTx::new(&base);
        let out = f(&mut tx)?;
        let ops = tx.into_ops();
        self.commit(base, ops)?;
        Ok(out)
    }

    fn commit(&self, base: Arc<Tables>, ops: Vec<WALRecord>) -> Result<()> {
        if ops.is_empty() {
            return Ok(());
        }

        if let Some(wal) = self.shared.wal.lock().as_mut() {
            let bytes = wal.append_batch(&ops)?;
            trace!(ops = ops.len(), bytes, "appended transaction to WAL");
        }

        // Our own reference would force a copy of the whole map.
        drop(base);
        let mut current = self.shared.tables.write();
        let tables = Arc::make_mut(&mut *current);
        for op in ops {
            apply(tables, op);
        }
        self.shared.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Force the WAL to disk regardless of the sync policy.
    pub fn sync(&self) -> Result<()> {
        match self.shared.wal.lock().as_mut() {
            Some(wal) => wal.sync(),
            None => Ok(()),
        }
    }

    /// Whether commits are logged to a WAL.
    pub fn is_durable(&self) -> bool {
        self.shared.wal.lock().is_some()
    }

    /// Counters for the latest committed state.
    pub fn stats(&self) -> Stats {
        let tables = self.snapshot();
        let wal_bytes = self.shared.wal.lock().as_ref().map_or(0, WALWriter::offset);
        Stats {
            namespaces: tables.len(),
            keys: tables.values().map(|table| table.len()).sum(),
            memory_bytes: tables.values().map(|table| table.size()).sum(),
            wal_bytes,
            commits: self.shared.commits.load(Ordering::Relaxed),
        }
    }
}

/// Apply one logged operation to committed state. Used both on commit and
/// on replay; a write transaction only logs operations it has validated.
/// A table shared with a live snapshot is cloned before it is changed.
fn apply(tables: &mut Tables, record: WALRecord) {
    match record.record_type {
        RecordType::CreateNamespace => {
            tables.entry(record.namespace).or_default();
        }
        RecordType::DropNamespace => {
            tables.remove(&record.namespace);
        }
        RecordType::Put => {
            let table = tables.entry(record.namespace).or_default();
            Arc::make_mut(table).put(record.key, record.value);
        }
        RecordType::Delete => {
            if let Some(table) = tables.get_mut(&record.namespace) {
                Arc::make_mut(table).delete(&record.key);
            }
        }
        RecordType::Commit => {}
    }
}
