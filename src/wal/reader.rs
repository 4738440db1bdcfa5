use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::wal::record::{RecordType, WALRecord};

/// Reads WAL records from a file for crash recovery.
///
/// Loads the entire file into memory, then iterates record by record.
/// On startup:
/// 1. Replay each committed transaction into fresh tables
/// 2. If CRC fails on a record, stop — it was a partial write from a crash.
///    All preceding records are valid.
/// 3. Records after the last commit marker belong to a transaction that
///    never finished and are dropped.
pub struct WALReader {
    data: Vec<u8>,
}

/// Outcome of scanning a WAL file.
#[derive(Debug, Default)]
pub struct Recovered {
    /// Committed transactions in log order, without their commit markers.
    pub batches: Vec<Vec<WALRecord>>,
    /// Byte length of the log up to and including the last commit marker.
    pub valid_len: u64,
    /// Byte length of the file as read.
    pub file_len: u64,
}

impl Recovered {
    /// Whether the file carries bytes past the last committed transaction.
    pub fn has_torn_tail(&self) -> bool {
        self.valid_len < self.file_len
    }
}

impl WALReader {
    /// Open a WAL file for reading.
    pub fn new(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        Ok(WALReader { data })
    }

    /// Create an iterator over all valid records in the WAL.
    pub fn iter(&self) -> WALIterator<'_> {
        WALIterator {
            data: &self.data,
            offset: 0,
        }
    }

    /// Group records into committed transactions.
    pub fn recover(&self) -> Recovered {
        let mut recovered = Recovered {
            file_len: self.data.len() as u64,
            ..Recovered::default()
        };
        let mut pending = Vec::new();
        let mut iter = self.iter();

        while let Some(Ok(record)) = iter.next() {
            if record.record_type == RecordType::Commit {
                recovered.batches.push(std::mem::take(&mut pending));
                recovered.valid_len = iter.offset() as u64;
            } else {
                pending.push(record);
            }
        }

        recovered
    }
}

/// Iterator over WAL records. Yields records until EOF or corruption.
///
/// On CRC mismatch: stops iteration (the record was a partial write).
/// This is safe because WAL writes are sequential and append-only —
/// a corrupted record means the crash happened here, and nothing
/// valid can follow.
pub struct WALIterator<'a> {
    data: &'a [u8],
    offset: usize,
}

impl WALIterator<'_> {
    /// Byte offset just past the last record yielded.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl Iterator for WALIterator<'_> {
    type Item = Result<WALRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }

        let remaining = &self.data[self.offset..];

        match WALRecord::decode(remaining) {
            Ok(record) => {
                self.offset += record.encoded_size();
                Some(Ok(record))
            }
            Err(_) => None,
        }
    }
}
