//! The Sequence: every item key in the namespace, ascending.
//!
//! Nothing here is cached. Each operation derives the sequence inside its
//! own transaction, so it always agrees with what that transaction reads
//! and writes, whoever else has touched the namespace.

use crate::circular::codec::{self, ITEM_PREFIX};
use crate::error::Result;
use crate::iterator::StorageIterator;
use crate::tx::KvRead;

/// Item keys in insertion order.
pub fn snapshot<T: KvRead>(tx: &T, namespace: &str) -> Result<Vec<u64>> {
    let mut iter = tx.iter_from(namespace, ITEM_PREFIX)?;
    let mut keys = Vec::new();
    while iter.is_valid() && codec::is_item_key(iter.key()) {
        keys.push(codec::decode_item_key(iter.key())?);
        iter.next()?;
    }
    Ok(keys)
}

/// Position of the first item whose payload equals `value`. Linear scan.
pub fn position_of<T: KvRead>(tx: &T, namespace: &str, value: &[u8]) -> Result<Option<usize>> {
    let mut iter = tx.iter_from(namespace, ITEM_PREFIX)?;
    let mut position = 0;
    while iter.is_valid() && codec::is_item_key(iter.key()) {
        if iter.value() == value {
            return Ok(Some(position));
        }
        position += 1;
        iter.next()?;
    }
    Ok(None)
}

/// Every payload in sequence order.
pub fn values<T: KvRead>(tx: &T, namespace: &str) -> Result<Vec<Vec<u8>>> {
    let mut iter = tx.iter_from(namespace, ITEM_PREFIX)?;
    let mut values = Vec::new();
    while iter.is_valid() && codec::is_item_key(iter.key()) {
        values.push(iter.value().to_vec());
        iter.next()?;
    }
    Ok(values)
}
