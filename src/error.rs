//! Error types for StashKV
//!
//! Every synchronous operation that can fail returns [`StoreError`]. The
//! in-memory operations (`get`, `set`, `remove`, enumeration) never fail;
//! errors only come from the persistence layer.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while persisting or loading entries.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `persist` or `load` was called on a store without a persistence directory
    #[error("persistence is not enabled: no directory configured")]
    PersistenceDisabled,

    /// Creating the directory, or writing, reading, renaming or deleting a file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An entry could not be serialized
    #[error("failed to encode entry {key:?}: {source}")]
    Encode {
        key: String,
        #[source]
        source: bincode::Error,
    },

    /// A persisted file does not decode as an entry
    #[error("corrupt entry file {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    /// A file in the persistence directory has a name that is not a valid key
    #[error("invalid entry file name: {}", .0.display())]
    InvalidFileName(PathBuf),
}

impl StoreError {
    /// Wraps an I/O error with the path it happened on.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}
