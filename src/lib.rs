//! # ringkv
//!
//! A durable circular list: a ring of opaque values kept in a transactional,
//! ordered key-value store, with a current pointer that can advance, move
//! back, and delete the element it rests on. Useful as a rotating worklist
//! (round-robin task selection) that survives restarts.
//!
//! ## Layers
//! - [`db`]: the store. Named namespaces of sorted byte keys, serialized
//!   atomic write transactions, consistent read transactions, and an
//!   optional write-ahead log for durability.
//! - [`circular`]: the list. Storage is the only source of truth; the item
//!   order and the pointer's meaning are re-derived inside each transaction.
//!
//! ```no_run
//! use ringkv::{CircularList, DB, Options};
//!
//! # fn main() -> ringkv::Result<()> {
//! let db = DB::open("tasks.wal", Options::default())?;
//! let tasks = CircularList::open(&db, "tasks")?;
//! tasks.add_nx(b"sync-mirrors")?;
//! let next_task = tasks.next()?;
//! # Ok(())
//! # }
//! ```

pub mod circular;
pub mod db;
pub mod error;
pub mod iterator;
pub mod memtable;
pub mod tx;
pub mod types;
pub mod wal;

// Public re-exports for the top-level API
pub use circular::{CircularList, Current};
pub use db::{DB, Options, Stats};
pub use error::{Error, Result};
pub use tx::{KvRead, ReadTx, WriteTx};
pub use wal::SyncPolicy;
