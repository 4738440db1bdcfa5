pub mod reader;
pub mod record;
pub mod writer;

pub use reader::{Recovered, WALReader};
pub use record::{RecordType, WALRecord};
pub use writer::WALWriter;

/// Controls when the WAL is fsync'd to disk.
///
/// Trade-off: durability vs throughput. A committed transaction is one
/// write as far as the policy is concerned.
///   - EveryWrite: zero data loss, ~10x slower (each fsync waits for disk)
///   - EveryNWrites: batched durability, lose up to N transactions on crash
///   - EveryNMillis: bounded loss window, much higher throughput
///
/// Whatever the policy, a crash can only lose whole transactions: replay
/// drops any batch that is missing its commit marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPolicy {
    /// fsync after every transaction. Safest, slowest.
    #[default]
    EveryWrite,
    /// fsync every N transactions.
    EveryNWrites(usize),
    /// fsync on the first commit after N milliseconds without one.
    EveryNMillis(u64),
}

