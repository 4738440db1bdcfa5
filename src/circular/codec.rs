//! Keys and values of a list's namespace.
//!
//! | Key                     | Value                      |
//! |-------------------------|----------------------------|
//! | `__current__`           | 8-byte BE current pointer  |
//! | `__next__`              | 8-byte BE next item key    |
//! | `i` + 8-byte BE item key| item payload               |
//!
//! Integers are big-endian so byte order equals numeric order, which makes
//! a namespace scan from the item prefix yield items in insertion order.

use crate::error::{Error, Result};

/// Meta key holding the current pointer.
pub const CURRENT_KEY: &str = "__current__";

/// Meta key holding the next item key to assign.
pub const NEXT_KEY: &str = "__next__";

/// Prefix of every item key. Sorts after both meta keys ('i' > '_').
pub const ITEM_PREFIX: &[u8] = b"i";

const ITEM_KEY_LEN: usize = ITEM_PREFIX.len() + 8;

/// Big-endian, so byte order matches numeric order.
pub fn encode_u64(n: u64) -> [u8; 8] {
    n.to_be_bytes()
}

/// Inverse of [`encode_u64`]. Any length but 8 is corruption.
pub fn decode_u64(bytes: &[u8]) -> Result<u64> {
    <[u8; 8]>::try_from(bytes)
        .map(u64::from_be_bytes)
        .map_err(|_| Error::Corruption(format!("expected 8-byte integer, got {} bytes", bytes.len())))
}

/// Storage key of the item assigned `seq`.
pub fn item_key(seq: u64) -> [u8; ITEM_KEY_LEN] {
    let mut key = [0u8; ITEM_KEY_LEN];
    key[..ITEM_PREFIX.len()].copy_from_slice(ITEM_PREFIX);
    key[ITEM_PREFIX.len()..].copy_from_slice(&encode_u64(seq));
    key
}

/// Whether `key` falls in the item range of a list namespace.
pub fn is_item_key(key: &[u8]) -> bool {
    key.starts_with(ITEM_PREFIX)
}

/// Inverse of [`item_key`].
pub fn decode_item_key(key: &[u8]) -> Result<u64> {
    if key.len() != ITEM_KEY_LEN || !is_item_key(key) {
        return Err(Error::Corruption(format!("malformed item key {key:02x?}")));
    }
    decode_u64(&key[ITEM_PREFIX.len()..])
}
