use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the store and the lists built on it.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error from disk operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Data corruption detected (CRC mismatch, bad format, malformed key).
    #[error("Corruption: {0}")]
    Corruption(String),

    /// The namespace does not exist (never created, or dropped).
    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Namespace names must be non-empty and fit the WAL's 2-byte length field.
    #[error("Invalid namespace name: {0:?}")]
    InvalidNamespace(String),

    /// A list's meta key is absent. Create/open always writes both, so this
    /// means the namespace was initialized by something else.
    #[error("Missing meta key {key} in namespace {namespace}")]
    MissingMeta { namespace: String, key: &'static str },

    /// Another open store already owns this WAL file.
    #[error("WAL {} is locked by another open store", .0.display())]
    Locked(PathBuf),

    /// An earlier log append failed and the file could not be restored.
    #[error("WAL is poisoned by an earlier failed append")]
    WalPoisoned,
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
