//! A durable circular list with a movable current pointer.
//!
//! Each list owns one namespace of a [`DB`]. Items are stored under keys
//! assigned from a counter that only ever grows, so key order is insertion
//! order. The pointer is an index into the current item sequence, not a
//! key; it is re-clamped against a freshly scanned sequence on every call.
//!
//! Every mutating call is exactly one write transaction, every read one
//! read transaction. The list handle itself holds no state beyond the store
//! handle and the namespace name, so any number of handles on one [`DB`]
//! observe the same list. A WAL file belongs to a single open store at a
//! time; a second process opening it gets `Error::Locked`.

pub mod codec;
pub mod index;
pub mod pointer;

use tracing::debug;

use crate::db::DB;
use crate::error::{Error, Result};
use crate::tx::{KvRead, WriteTx};
use codec::{CURRENT_KEY, NEXT_KEY};

/// What [`CircularList::current`] reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Current {
    /// Payload at the pointer, `None` when the list is empty.
    pub value: Option<Vec<u8>>,
    /// Pointer position, 0 when the list is empty.
    pub index: usize,
    /// Number of items.
    pub count: usize,
}

/// Handle to one list. Cheap to clone; clones address the same namespace.
#[derive(Debug, Clone)]
pub struct CircularList {
    db: DB,
    name: String,
}

impl CircularList {
    /// Start a fresh list in `name`, wiping whatever the namespace held.
    pub fn create(db: &DB, name: &str) -> Result<Self> {
        db.update(|tx| {
            tx.drop_namespace(name)?;
            tx.create_namespace(name)?;
            tx.put(name, CURRENT_KEY.as_bytes(), &codec::encode_u64(0))?;
            tx.put(name, NEXT_KEY.as_bytes(), &codec::encode_u64(0))
        })?;
        debug!(list = name, "created circular list");
        Ok(Self::handle(db, name))
    }

    /// Reuse the list in `name`, creating it if needed. Meta keys are only
    /// written when absent; a missing counter resumes after the highest
    /// stored item key so keys are never reused.
    pub fn open(db: &DB, name: &str) -> Result<Self> {
        let count = db.update(|tx| {
            tx.create_namespace(name)?;
            let keys = index::snapshot(&*tx, name)?;
            if tx.get(name, CURRENT_KEY.as_bytes())?.is_none() {
                tx.put(name, CURRENT_KEY.as_bytes(), &codec::encode_u64(0))?;
            }
            if tx.get(name, NEXT_KEY.as_bytes())?.is_none() {
                let next = keys.last().map_or(0, |k| k + 1);
                tx.put(name, NEXT_KEY.as_bytes(), &codec::encode_u64(next))?;
            }
            Ok(keys.len())
        })?;
        debug!(list = name, count, "opened circular list");
        Ok(Self::handle(db, name))
    }

    fn handle(db: &DB, name: &str) -> Self {
        CircularList {
            db: db.clone(),
            name: name.to_owned(),
        }
    }

    /// Namespace this list lives in.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append `value`. Returns the item key it was stored under. The
    /// pointer does not move.
    pub fn add(&self, value: &[u8]) -> Result<u64> {
        let key = self.db.update(|tx| self.insert(tx, value))?;
        debug!(list = %self.name, key, "added item");
        Ok(key)
    }

    /// Append `value` unless an item with the same payload exists.
    ///
    /// The duplicate scan and the insert share one write transaction, so two
    /// racing calls with the same value cannot both insert.
    pub fn add_nx(&self, value: &[u8]) -> Result<bool> {
        let added = self.db.update(|tx| {
            if index::position_of(&*tx, &self.name, value)?.is_some() {
                return Ok(false);
            }
            self.insert(tx, value)?;
            Ok(true)
        })?;
        debug!(list = %self.name, added, "add_nx");
        Ok(added)
    }

    fn insert(&self, tx: &mut WriteTx<'_>, value: &[u8]) -> Result<u64> {
        let key = self.meta(&*tx, NEXT_KEY)?;
        let next = key
            .checked_add(1)
            .ok_or_else(|| Error::Corruption(format!("item keys exhausted in {}", self.name)))?;
        tx.put(&self.name, &codec::item_key(key), value)?;
        tx.put(&self.name, NEXT_KEY.as_bytes(), &codec::encode_u64(next))?;
        Ok(key)
    }

    /// Delete the item at the pointer and return its payload. The pointer
    /// keeps its index, which now names the removed item's successor, and
    /// wraps to 0 if the removed item was last. No-op on an empty list.
    pub fn remove(&self) -> Result<Option<Vec<u8>>> {
        let removed = self.db.update(|tx| {
            let keys = index::snapshot(&*tx, &self.name)?;
            if keys.is_empty() {
                return Ok(None);
            }

            let at = pointer::clamp(self.meta(&*tx, CURRENT_KEY)?, keys.len());
            let value = self.item(&*tx, keys[at])?;
            tx.delete(&self.name, &codec::item_key(keys[at]))?;

            let moved_to = pointer::after_remove(at, keys.len() - 1);
            tx.put(&self.name, CURRENT_KEY.as_bytes(), &codec::encode_u64(moved_to as u64))?;
            Ok(Some((at, value)))
        })?;

        Ok(removed.map(|(at, value)| {
            debug!(list = %self.name, index = at, "removed current item");
            value
        }))
    }

    /// Payload at the pointer with its index and the item count. Read-only:
    /// a stale pointer is reported as 0 but not written back.
    pub fn current(&self) -> Result<Current> {
        self.db.view(|tx| {
            let keys = index::snapshot(tx, &self.name)?;
            if keys.is_empty() {
                return Ok(Current::default());
            }
            let index = pointer::clamp(self.meta(tx, CURRENT_KEY)?, keys.len());
            Ok(Current {
                value: Some(self.item(tx, keys[index])?),
                index,
                count: keys.len(),
            })
        })
    }

    /// Advance the pointer, wrapping to the first item, and return the
    /// payload it lands on. `None` on an empty list.
    pub fn next(&self) -> Result<Option<Vec<u8>>> {
        self.step(pointer::advance)
    }

    /// Move the pointer back, wrapping to the last item.
    pub fn previous(&self) -> Result<Option<Vec<u8>>> {
        self.step(pointer::retreat)
    }

    fn step(&self, movement: fn(usize, usize) -> usize) -> Result<Option<Vec<u8>>> {
        self.db.update(|tx| {
            let keys = index::snapshot(&*tx, &self.name)?;
            if keys.is_empty() {
                return Ok(None);
            }

            let from = pointer::clamp(self.meta(&*tx, CURRENT_KEY)?, keys.len());
            let to = movement(from, keys.len());
            tx.put(&self.name, CURRENT_KEY.as_bytes(), &codec::encode_u64(to as u64))?;
            debug!(list = %self.name, from, to, "moved pointer");
            self.item(&*tx, keys[to]).map(Some)
        })
    }

    /// Number of items.
    pub fn len(&self) -> Result<usize> {
        self.db.view(|tx| Ok(index::snapshot(tx, &self.name)?.len()))
    }

    /// Whether the list has no items.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every payload in list order, starting from the first item (not the
    /// pointer).
    pub fn values(&self) -> Result<Vec<Vec<u8>>> {
        self.db.view(|tx| index::values(tx, &self.name))
    }

    /// Whether any item's payload equals `value` byte for byte.
    pub fn contains(&self, value: &[u8]) -> Result<bool> {
        self.db
            .view(|tx| Ok(index::position_of(tx, &self.name, value)?.is_some()))
    }

    fn meta<T: KvRead>(&self, tx: &T, key: &'static str) -> Result<u64> {
        match tx.get(&self.name, key.as_bytes())? {
            Some(bytes) => codec::decode_u64(bytes),
            None => Err(Error::MissingMeta {
                namespace: self.name.clone(),
                key,
            }),
        }
    }

    fn item<T: KvRead>(&self, tx: &T, key: u64) -> Result<Vec<u8>> {
        tx.get(&self.name, &codec::item_key(key))?
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::Corruption(format!("item {key} missing from {}", self.name)))
    }
}
