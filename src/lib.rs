//! # StashKV - An Expiring In-Memory Key-Value Store
//!
//! StashKV is a concurrent, in-memory key-value store whose entries carry a
//! time-to-live, with opt-in persistence of individual entries to a
//! directory so a process can rebuild its state after a restart.
//!
//! ## Features
//!
//! - **Typed**: One value type `T` per store
//! - **Concurrent**: A single `RwLock`; many readers, one writer
//! - **TTL Support**: Lazy expiry on read plus a background sweeper
//! - **Opt-in Persistence**: Mutations return an [`Outcome`] the caller may
//!   persist; nothing touches the disk otherwise
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           StashKV                            │
//! │                                                              │
//! │   caller ──set/remove──> ┌──────────────────┐                │
//! │      ▲                   │ ExpiringStore<T> │<── sweep() ──┐ │
//! │      │                   └────────┬─────────┘              │ │
//! │      └────────── Outcome ─────────┘              ┌─────────┴┐│
//! │      │                                           │ Expiry   ││
//! │      │ persist()                                 │ Sweeper  ││
//! │      ▼                                           └──────────┘│
//! │   ┌──────────────────────────┐                               │
//! │   │ <dir>/<key>  (bincode)   │<── load() at startup          │
//! │   └──────────────────────────┘                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use stashkv::{ExpiringStore, ExpirySweeper, StoreConfig};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> stashkv::Result<()> {
//!     let config = StoreConfig::default()
//!         .with_ttl(Duration::from_secs(300))
//!         .with_persistence_dir("./stash");
//!
//!     let store: Arc<ExpiringStore<String>> = Arc::new(ExpiringStore::with_config(config));
//!     store.load()?;
//!
//!     let sweeper = ExpirySweeper::start(Arc::clone(&store));
//!
//!     store.set("user:123", "John Doe".to_string()).persist()?;
//!     assert_eq!(store.get("user:123").as_deref(), Some("John Doe"));
//!
//!     sweeper.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The expiring store, entries and the background sweeper
//! - [`persistence`]: Outcome handles, `load`, and the file-per-key codec
//! - [`config`]: Store configuration
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod persistence;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use persistence::{Action, Outcome};
pub use storage::{Entry, ExpiringStore, ExpirySweeper, StorageStats, SweeperState};

/// Version of StashKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
