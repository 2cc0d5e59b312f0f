//! Creation backoff cache
//!
//! Throttles repeated failing feed-creation calls. Entries are keyed by
//! the fingerprint of the creation payload and remember the remote error
//! code until they expire; the delay itself is persisted by the caller
//! (it survives the process, entries do not).
//!
//! Concurrency: near-simultaneous failures for the same fingerprint are
//! last-writer-wins, which at worst costs one extra remote call.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use feedsync_common::time::{Clock, SystemClock};
use feedsync_domain::constants::CREATE_FEED_DELAY_CEILING;

#[derive(Debug, Clone)]
struct BackoffEntry {
    code: i64,
    expires_at: Instant,
}

/// Fingerprint-keyed throttling records for feed creation failures
pub struct CreateFeedBackoff {
    entries: DashMap<String, BackoffEntry>,
    clock: Arc<dyn Clock>,
}

impl CreateFeedBackoff {
    /// Create a backoff cache driven by the system clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a backoff cache with an explicit clock (tests)
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { entries: DashMap::new(), clock }
    }

    /// The remembered error code for an unexpired entry, if any.
    ///
    /// Expired entries are removed on access.
    pub fn active(&self, fingerprint: &str) -> Option<i64> {
        let now = self.clock.now();
        if let Some(entry) = self.entries.get(fingerprint) {
            if entry.expires_at > now {
                return Some(entry.code);
            }
        }
        self.entries.remove(fingerprint);
        None
    }

    /// Record a creation failure, throttling the fingerprint for `ttl`.
    pub fn record_failure(&self, fingerprint: &str, code: i64, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries.insert(fingerprint.to_string(), BackoffEntry { code, expires_at });
    }

    /// Drop the entry for a fingerprint (after a successful creation).
    pub fn clear(&self, fingerprint: &str) {
        self.entries.remove(fingerprint);
    }
}

impl Default for CreateFeedBackoff {
    fn default() -> Self {
        Self::new()
    }
}

/// The delay to store after a failure: double the current one, capped.
pub fn doubled_delay(current: Duration) -> Duration {
    current.saturating_mul(2).min(CREATE_FEED_DELAY_CEILING)
}
