//! Store configuration
//!
//! ```
//! use stashkv::StoreConfig;
//! use std::time::Duration;
//!
//! let config = StoreConfig::default()
//!     .with_ttl(Duration::from_secs(300))
//!     .with_sweep_interval(Duration::from_secs(30))
//!     .with_persistence_dir("/var/lib/stash");
//!
//! assert_eq!(config.ttl, Duration::from_secs(300));
//! assert!(config.persistence_dir.is_some());
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Sweep interval used when none (or zero) is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Time-to-live used by [`ExpiringStore::set`](crate::ExpiringStore::set).
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Configuration for an [`ExpiringStore`](crate::ExpiringStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Default time-to-live for entries inserted with `set`
    pub ttl: Duration,

    /// Interval between background sweeps (zero means [`DEFAULT_SWEEP_INTERVAL`])
    pub sweep_interval: Duration,

    /// Directory holding one file per persisted key. `None` disables persistence.
    pub persistence_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            persistence_dir: None,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sets how often the background sweeper runs.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Enables persistence into `dir`.
    ///
    /// Keys become file names verbatim, so keys containing path separators,
    /// reserved file names, or the `.tmp-` prefix are not supported once
    /// persistence is enabled.
    pub fn with_persistence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persistence_dir = Some(dir.into());
        self
    }

    /// The interval the sweeper actually uses.
    pub fn effective_sweep_interval(&self) -> Duration {
        if self.sweep_interval.is_zero() {
            DEFAULT_SWEEP_INTERVAL
        } else {
            self.sweep_interval
        }
    }

    /// The persistence directory, if persistence is enabled.
    pub fn persistence_dir(&self) -> Option<&Path> {
        self.persistence_dir.as_deref()
    }
}
