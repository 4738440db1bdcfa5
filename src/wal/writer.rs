use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use advisory_lock::{AdvisoryFileLock, FileLockError, FileLockMode};
use tracing::warn;

use crate::error::{Error, Result};
use crate::wal::SyncPolicy;
use crate::wal::record::WALRecord;

/// Appends WAL records to a file on disk.
///
/// A transaction is encoded into one buffer (its records followed by a
/// commit marker) and handed to the OS with a single `write_all`, so there is
/// nothing for a `BufWriter` to coalesce.
///
/// If a write or fsync fails, the file is cut back to the length it had
/// before the attempt. A failed transaction therefore never reaches replay.
/// If the cut itself fails the writer is poisoned and refuses further writes.
///
/// The writer holds an exclusive advisory lock on the file for as long as it
/// lives, so at most one writer (and one store) appends to a given log.
pub struct WALWriter {
    file: File,
    offset: u64,
    sync_policy: SyncPolicy,
    writes_since_sync: usize,
    last_sync: Instant,
    poisoned: bool,
}

impl WALWriter {
    /// Open (or create) a WAL at the given path and append to its end.
    ///
    /// Fails with [`Error::Locked`] if another writer holds the file.
    pub fn new(path: &Path, sync_policy: SyncPolicy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        match AdvisoryFileLock::try_lock(&file, FileLockMode::Exclusive) {
            Ok(()) => {}
            Err(FileLockError::AlreadyLocked) => return Err(Error::Locked(path.to_path_buf())),
            Err(FileLockError::Io(err)) => return Err(Error::Io(err)),
        }
        let offset = file.metadata()?.len();

        Ok(WALWriter {
            file,
            offset,
            sync_policy,
            writes_since_sync: 0,
            last_sync: Instant::now(),
            poisoned: false,
        })
    }

    /// Append a whole transaction: `records` followed by a commit marker.
    /// Returns the bytes written. Depending on SyncPolicy, may fsync.
    pub fn append_batch(&mut self, records: &[WALRecord]) -> Result<usize> {
        let commit = WALRecord::commit();
        let size = records.iter().map(WALRecord::encoded_size).sum::<usize>() + commit.encoded_size();

        let mut buf = Vec::with_capacity(size);
        for record in records {
            record.encode_into(&mut buf);
        }
        commit.encode_into(&mut buf);

        self.write_frame(&buf)?;
        Ok(buf.len())
    }

    fn write_frame(&mut self, buf: &[u8]) -> Result<()> {
        if self.poisoned {
            return Err(Error::WalPoisoned);
        }

        let before = self.offset;
        if let Err(err) = self.write_and_sync(buf) {
            self.restore(before);
            return Err(err);
        }
        self.offset = before + buf.len() as u64;
        Ok(())
    }

    fn write_and_sync(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf)?;
        self.writes_since_sync += 1;
        self.sync_if_due()
    }

    /// Sync based on policy.
    fn sync_if_due(&mut self) -> Result<()> {
        let due = match self.sync_policy {
            SyncPolicy::EveryWrite => true,
            SyncPolicy::EveryNWrites(n) => self.writes_since_sync >= n,
            SyncPolicy::EveryNMillis(ms) => self.last_sync.elapsed() >= Duration::from_millis(ms),
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Cut the file back to `len` after a failed append.
    fn restore(&mut self, len: u64) {
        if let Err(err) = self.file.set_len(len) {
            warn!(%err, len, "failed to roll back partial WAL append, poisoning writer");
            self.poisoned = true;
        }
    }

    /// Drop everything past `len`. Used on open to discard a torn tail so
    /// new transactions do not land behind garbage.
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.offset = len;
        Ok(())
    }

    /// Force fsync to disk. Ensures all written transactions are durable.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.writes_since_sync = 0;
        self.last_sync = Instant::now();
        Ok(())
    }

    /// Current file offset (bytes written so far).
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Appends since the last fsync.
    pub fn writes_since_sync(&self) -> usize {
        self.writes_since_sync
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }
}
