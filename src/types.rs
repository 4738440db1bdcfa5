/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// A pending write inside a transaction. `None` is a tombstone: the key is
/// deleted once the transaction commits.
pub type Slot = Option<Value>;
