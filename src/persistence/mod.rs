//! Persistence Layer
//!
//! Persistence is opt-in and per mutation. `set` and `remove` return an
//! [`Outcome`] describing what they just did; calling
//! [`Outcome::persist`] replays that mutation against the configured
//! directory. Writers that don't call it never touch the disk.
//!
//! ```text
//!   caller ──set/remove──> ExpiringStore ──Outcome──> caller
//!                                                       │ persist()
//!                                                       ▼
//!                                              <dir>/<key>  (one file per key)
//! ```
//!
//! On startup, [`ExpiringStore::load`] rebuilds the map from the directory.
//! Loaded entries keep their original deadline, so anything that expired
//! while the process was down is simply expired on first read.
//!
//! ## Stale outcomes
//!
//! An `Outcome` is a snapshot taken when the mutation ran. Persisting it
//! after the same key was set or removed again writes that old snapshot,
//! which resurrects stale data on disk. Persist outcomes right away, within
//! the request that produced them, and keep at most one writer per key.
//!
//! ## Example
//!
//! ```
//! use stashkv::{ExpiringStore, StoreConfig};
//! use std::time::Duration;
//!
//! # fn main() -> stashkv::Result<()> {
//! let dir = std::env::temp_dir().join("stashkv-doc-example");
//! let store = ExpiringStore::with_config(StoreConfig::default().with_persistence_dir(&dir));
//!
//! store.set_with_ttl("k", "v".to_string(), Duration::from_secs(3600)).persist()?;
//!
//! let restored: ExpiringStore<String> =
//!     ExpiringStore::with_config(StoreConfig::default().with_persistence_dir(&dir));
//! restored.load()?;
//! assert_eq!(restored.get("k"), Some("v".to_string()));
//!
//! restored.remove("k").persist()?;
//! # Ok(())
//! # }
//! ```

pub mod disk;

use crate::error::{Result, StoreError};
use crate::storage::{Entry, ExpiringStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

/// The mutation an [`Outcome`] replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<T> {
    /// The key was set to this entry
    Set(Entry<T>),
    /// The key was removed
    Remove,
}

/// A deferred "persist this mutation" handle returned by `set` and `remove`.
///
/// It borrows the store that produced it and carries a snapshot of the
/// mutation. Dropping it without calling [`persist`](Self::persist) is fine.
pub struct Outcome<'a, T> {
    store: &'a ExpiringStore<T>,
    key: String,
    action: Action<T>,
}

impl<'a, T> Outcome<'a, T> {
    pub(crate) fn set(store: &'a ExpiringStore<T>, key: String, entry: Entry<T>) -> Self {
        Self {
            store,
            key,
            action: Action::Set(entry),
        }
    }

    pub(crate) fn remove(store: &'a ExpiringStore<T>, key: String) -> Self {
        Self {
            store,
            key,
            action: Action::Remove,
        }
    }

    /// The key this mutation touched.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn action(&self) -> &Action<T> {
        &self.action
    }
}

impl<T: Serialize> Outcome<'_, T> {
    /// Writes (for `set`) or deletes (for `remove`) the key's backing file.
    ///
    /// Fails with [`StoreError::PersistenceDisabled`] if the store has no
    /// persistence directory, and with [`StoreError::Io`] if the directory
    /// cannot be created or the file cannot be written or deleted. Deleting
    /// a file that does not exist succeeds.
    pub fn persist(self) -> Result<()> {
        let dir = self
            .store
            .persistence_dir()
            .ok_or(StoreError::PersistenceDisabled)?;

        match &self.action {
            Action::Set(entry) => disk::write_entry(dir, &self.key, entry),
            Action::Remove => disk::remove_entry(dir, &self.key).map(|_| ()),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Outcome<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Outcome")
            .field("key", &self.key)
            .field("action", &self.action)
            .finish()
    }
}

impl<T: DeserializeOwned> ExpiringStore<T> {
    /// Rebuilds entries from the persistence directory.
    ///
    /// Every regular file becomes one entry whose key is the file name. A
    /// missing directory loads nothing. If any file cannot be read or
    /// decoded the load fails and the store is left untouched; otherwise
    /// all entries are inserted at once, overwriting in-memory entries with
    /// the same key. Returns the number of entries loaded.
    pub fn load(&self) -> Result<usize> {
        let dir = self
            .persistence_dir()
            .ok_or(StoreError::PersistenceDisabled)?;

        let entries = disk::read_entries::<T>(dir)?;
        let count = entries.len();

        self.write().extend(entries);

        info!(count, dir = %dir.display(), "Loaded persisted entries");
        Ok(count)
    }
}
