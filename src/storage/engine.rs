//! Thread-Safe Expiring Store
//!
//! This module implements the in-memory half of StashKV: a `HashMap` of
//! typed entries guarded by a single `RwLock`, with lazy expiry on every
//! read and an explicit [`sweep`](ExpiringStore::sweep) that the background
//! sweeper calls on a timer.
//!
//! ## Lock Discipline
//!
//! ```text
//! ┌──────────────────────────────┬────────────────┐
//! │ get / contains / ttl         │                │
//! │ len / is_empty / keys        │  read (shared) │
//! │ values / all                 │                │
//! ├──────────────────────────────┼────────────────┤
//! │ set / remove / clear         │ write          │
//! │ sweep / load                 │ (exclusive)    │
//! └──────────────────────────────┴────────────────┘
//! ```
//!
//! No method acquires the lock twice, so there is no upgrade path and no
//! self-deadlock. Enumeration copies what it needs under the read lock and
//! releases it before the caller sees the first item.

use crate::config::StoreConfig;
use crate::persistence::{disk, Outcome};
use crate::storage::entry::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, SystemTime};
use tracing::trace;

/// A concurrent key-value store whose entries expire.
///
/// `T` is fixed per store. The store is meant to be wrapped in an `Arc` and
/// shared between request handlers and the [`ExpirySweeper`](crate::ExpirySweeper).
///
/// Expiry is logical: an expired entry is invisible to `get`, `contains` and
/// enumeration from the moment its deadline passes, whether or not the
/// sweeper has physically removed it yet. `len` and `is_empty` report
/// physical occupancy and do count unswept entries.
///
/// Nothing is evicted in the background unless an
/// [`ExpirySweeper`](crate::ExpirySweeper) is started for the store. Without
/// one, expired entries stay in memory (and on disk) until overwritten,
/// removed, cleared or swept by an explicit [`sweep`](Self::sweep) call.
///
/// # Example
///
/// ```
/// use stashkv::ExpiringStore;
/// use std::time::Duration;
///
/// let store = ExpiringStore::new();
///
/// store.set_with_ttl("name", "Ada".to_string(), Duration::from_secs(60));
/// assert_eq!(store.get("name"), Some("Ada".to_string()));
///
/// store.remove("name");
/// assert_eq!(store.get("name"), None);
/// ```
pub struct ExpiringStore<T> {
    data: RwLock<HashMap<String, Entry<T>>>,

    config: StoreConfig,

    /// Statistics: total get operations
    get_count: AtomicU64,

    /// Statistics: total set operations
    set_count: AtomicU64,

    /// Statistics: total remove operations
    del_count: AtomicU64,

    /// Statistics: entries evicted by sweeps
    expired_count: AtomicU64,
}

/// Counters exposed by [`ExpiringStore::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Entries physically present, live or not
    pub keys: u64,
    pub get_ops: u64,
    pub set_ops: u64,
    pub del_ops: u64,
    /// Entries evicted by sweeps
    pub expired: u64,
}

impl<T> std::fmt::Debug for ExpiringStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("keys", &self.len())
            .field("config", &self.config)
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl<T> Default for ExpiringStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ExpiringStore<T> {
    /// Creates a store with the default configuration (no persistence).
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Creates a store with a custom configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            config,
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The persistence directory, if persistence is enabled.
    pub fn persistence_dir(&self) -> Option<&Path> {
        self.config.persistence_dir()
    }

    // Only whole map operations run under the lock, so a poisoned lock
    // still guards a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Entry<T>>> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Entry<T>>> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Deletes a key unconditionally.
    ///
    /// Removing an absent key is not an error. The returned [`Outcome`] can be
    /// persisted to delete the key's backing file.
    pub fn remove(&self, key: &str) -> Outcome<'_, T> {
        self.del_count.fetch_add(1, Ordering::Relaxed);
        self.write().remove(key);

        Outcome::remove(self, key.to_string())
    }

    /// Checks if a key holds a live entry.
    pub fn contains(&self, key: &str) -> bool {
        self.read()
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Remaining time-to-live of a live entry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        self.read().get(key).and_then(Entry::ttl)
    }

    /// Number of entries physically held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns true if the map holds no entries at all.
    ///
    /// Like [`len`](Self::len), this reflects physical occupancy: an expired
    /// entry keeps the store non-empty until the next sweep.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Removes every entry. Backing files are left untouched.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Evicts every expired entry and returns how many were removed.
    ///
    /// When persistence is enabled the evicted keys' files are deleted too,
    /// before the write lock is released. File deletion is best-effort:
    /// failures are logged and otherwise ignored.
    pub fn sweep(&self) -> usize {
        let now = SystemTime::now();
        let mut data = self.write();

        let mut expired = Vec::new();
        data.retain(|key, entry| {
            if entry.is_expired_at(now) {
                expired.push(key.clone());
                false
            } else {
                true
            }
        });

        if let Some(dir) = self.config.persistence_dir() {
            disk::remove_files_best_effort(dir, &expired);
        }
        drop(data);

        let swept = expired.len();
        if swept > 0 {
            self.expired_count.fetch_add(swept as u64, Ordering::Relaxed);
            trace!(swept, "Evicted expired entries");
        }
        swept
    }

    /// Returns operation counters.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.len() as u64,
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }

    /// Copies `project(key, entry)` for every entry, keeping each expiry so
    /// the caller can filter lazily.
    fn snapshot<R>(&self, project: impl Fn(&String, &Entry<T>) -> R) -> Vec<Entry<R>> {
        self.read()
            .iter()
            .map(|(key, entry)| Entry::new(project(key, entry), entry.expires_at))
            .collect()
    }
}

/// Filters a snapshot down to entries still live when each item is reached.
fn live<R>(snapshot: Vec<Entry<R>>) -> impl Iterator<Item = R> {
    snapshot
        .into_iter()
        .filter(|entry| !entry.is_expired())
        .map(|entry| entry.value)
}

impl<T: Clone> ExpiringStore<T> {
    /// Inserts or overwrites `key` using the configured default TTL.
    pub fn set(&self, key: impl Into<String>, value: T) -> Outcome<'_, T> {
        self.set_with_ttl(key, value, self.config.ttl)
    }

    /// Inserts or overwrites `key`, expiring `ttl` from now.
    ///
    /// A zero TTL is allowed and produces an entry that is already expired.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: T, ttl: Duration) -> Outcome<'_, T> {
        self.insert(key.into(), Entry::with_ttl(value, ttl))
    }

    /// Inserts or overwrites `key` with an absolute deadline.
    ///
    /// A deadline in the past pre-expires the entry.
    pub fn set_expiring_at(
        &self,
        key: impl Into<String>,
        value: T,
        expires_at: SystemTime,
    ) -> Outcome<'_, T> {
        self.insert(key.into(), Entry::new(value, expires_at))
    }

    fn insert(&self, key: String, entry: Entry<T>) -> Outcome<'_, T> {
        self.set_count.fetch_add(1, Ordering::Relaxed);
        self.write().insert(key.clone(), entry.clone());

        Outcome::set(self, key, entry)
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key is missing or its entry has expired. An
    /// expired entry is left in place for the sweeper.
    pub fn get(&self, key: &str) -> Option<T> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        self.read()
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.value.clone())
    }

    /// Gets the full live entry, including its deadline.
    pub fn get_entry(&self, key: &str) -> Option<Entry<T>> {
        self.read()
            .get(key)
            .filter(|entry| !entry.is_expired())
            .cloned()
    }

    /// Keys of live entries, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = String> {
        live(self.snapshot(|key, _| key.clone()))
    }

    /// Values of live entries, in no particular order.
    pub fn values(&self) -> impl Iterator<Item = T> {
        live(self.snapshot(|_, entry| entry.value.clone()))
    }

    /// Key-value pairs of live entries, in no particular order.
    pub fn all(&self) -> impl Iterator<Item = (String, T)> {
        live(self.snapshot(|key, entry| (key.clone(), entry.value.clone())))
    }
}
