//! Stored entries and the expiry predicate.
//!
//! Expiry uses wall-clock time (`SystemTime`) rather than `Instant` so the
//! absolute deadline survives being written to disk and read back by another
//! process.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// A stored value with its absolute expiration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<T> {
    /// The stored value
    pub value: T,
    /// When this entry stops being live
    pub expires_at: SystemTime,
}

impl<T> Entry<T> {
    /// Creates an entry expiring at an absolute time.
    pub fn new(value: T, expires_at: SystemTime) -> Self {
        Self { value, expires_at }
    }

    /// Creates an entry expiring `ttl` from now.
    pub fn with_ttl(value: T, ttl: Duration) -> Self {
        Self::new(value, deadline_after(SystemTime::now(), ttl))
    }

    /// The expiry predicate shared by reads, enumeration and the sweeper.
    ///
    /// An entry is expired once `now` reaches its deadline, so a zero TTL
    /// produces an entry that is already expired. At exactly `expires_at`
    /// the entry is expired, not live.
    #[inline]
    pub fn is_expired_at(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }

    /// Checks the predicate against the current time.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(SystemTime::now())
    }

    /// Remaining lifetime, or `None` once expired.
    pub fn ttl(&self) -> Option<Duration> {
        match self.expires_at.duration_since(SystemTime::now()) {
            Ok(remaining) if !remaining.is_zero() => Some(remaining),
            _ => None,
        }
    }
}

/// TTLs are clamped to this so `now + ttl` cannot overflow `SystemTime`.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn deadline_after(now: SystemTime, ttl: Duration) -> SystemTime {
    now + ttl.min(MAX_TTL)
}
