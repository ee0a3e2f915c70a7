//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically evicts expired
//! entries. This is "active expiry", as opposed to the "lazy expiry" every
//! read performs.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry keeps readers from ever seeing stale data, but it never frees
//! anything: an entry that expires and is never touched again would stay in
//! memory forever. The sweeper reclaims that space.
//!
//! ## States
//!
//! ```text
//!            tick: store.sweep()
//!              ┌──────────┐
//!              ▼          │
//!         ┌─────────┐─────┘     stop / drop       ┌─────────┐
//!  start ─>│ Running │──────────────────────────────>│ Stopped │
//!         └─────────┘      store.clear()           └─────────┘
//! ```
//!
//! Once the sweeper stops nothing evicts entries anymore, so the store's
//! contents are cleared as the task's last act.

use crate::storage::ExpiringStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of an [`ExpirySweeper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    Running,
    Stopped,
}

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped and the
/// store cleared.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,

    task: Option<JoinHandle<()>>,
}

impl ExpirySweeper {
    /// Starts sweeping `store` at its configured interval.
    ///
    /// The first sweep happens one interval after start. Must be called from
    /// within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```
    /// use stashkv::{ExpiringStore, ExpirySweeper, StoreConfig};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let config = StoreConfig::default().with_sweep_interval(Duration::from_secs(30));
    /// let store: Arc<ExpiringStore<String>> = Arc::new(ExpiringStore::with_config(config));
    /// let sweeper = ExpirySweeper::start(Arc::clone(&store));
    ///
    /// // Sweeper runs in the background...
    ///
    /// sweeper.shutdown().await;
    /// assert!(store.is_empty());
    /// # }
    /// ```
    pub fn start<T>(store: Arc<ExpiringStore<T>>) -> Self
    where
        T: Send + Sync + 'static,
    {
        let interval = store.config().effective_sweep_interval();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(sweeper_loop(store, interval, shutdown_rx));

        info!(
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        Self {
            shutdown_tx,
            task: Some(task),
        }
    }

    pub fn state(&self) -> SweeperState {
        match &self.task {
            Some(task) if !task.is_finished() => SweeperState::Running,
            _ => SweeperState::Stopped,
        }
    }

    /// Signals the sweeper to stop without waiting for it.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Stops the sweeper and waits until it has cleared the store.
    pub async fn shutdown(mut self) {
        self.stop();

        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Expiry sweeper task did not finish cleanly");
            }
        }
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop<T>(
    store: Arc<ExpiringStore<T>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; sweeping starts one interval in
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let swept = store.sweep();
                if swept > 0 {
                    debug!(
                        swept,
                        keys_remaining = store.len(),
                        "Expired entries cleaned up"
                    );
                }
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    break;
                }
            }
        }
    }

    store.clear();
    info!("Background expiry sweeper stopped");
}
