//! Storage Module
//!
//! This module provides the in-memory half of StashKV: a thread-safe,
//! typed key-value map with per-entry expiry, and a background sweeper
//! that evicts expired entries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              ExpiringStore<T>               │
//! │   RwLock<HashMap<String, Entry<T>>>         │
//! └─────────────────────────────────────────────┘
//!                        ▲
//!                        │ sweep() every interval
//!          ┌─────────────┴─────────────┐
//!          │      ExpirySweeper        │
//!          │  (Background Tokio Task)  │
//!          └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **Lazy Expiry**: Reads never return expired entries
//! - **Active Expiry**: The sweeper reclaims entries nobody reads again
//!
//! ## Example
//!
//! ```
//! use stashkv::storage::ExpiringStore;
//! use std::time::Duration;
//!
//! let store = ExpiringStore::new();
//!
//! store.set("name", 42u32);
//! assert_eq!(store.get("name"), Some(42));
//!
//! store.set_with_ttl("session", 7u32, Duration::from_secs(3600));
//! assert!(store.contains("session"));
//! ```

pub mod engine;
pub mod entry;
pub mod expiry;

pub use engine::{ExpiringStore, StorageStats};
pub use entry::Entry;
pub use expiry::{ExpirySweeper, SweeperState};
