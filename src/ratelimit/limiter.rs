//! Core rate limiter implementation.

use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use super::clock::{Clock, SystemClock};
use super::record::{RateLimitDecision, RateLimitRecord};

/// Default attempts allowed per window.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default window length (15 minutes).
pub const DEFAULT_WINDOW_MS: u64 = 15 * 60 * 1000;
/// Default cadence of the expired-record sweep (15 minutes).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Fixed-window attempt counter keyed by caller identity.
///
/// Records live in a sharded map; each check holds the shard lock for its key
/// across the read-check-increment, so concurrent attempts from one key can
/// never overshoot `max_attempts` while unrelated keys proceed in parallel.
///
/// State is per process. Replicas behind a load balancer each keep their own
/// records, so the effective cap is `max_attempts` times the replica count.
pub struct RateLimiter<C: Clock = SystemClock> {
    /// Attempt records indexed by key
    records: DashMap<String, RateLimitRecord>,
    clock: C,
}

impl RateLimiter<SystemClock> {
    /// Create a new rate limiter backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a rate limiter reading time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            records: DashMap::new(),
            clock,
        }
    }

    /// Register one attempt for `key` and decide whether it may proceed.
    ///
    /// A missing or expired record opens a new window of `window_ms` with this
    /// attempt counted. Within a window, attempts are counted until
    /// `max_attempts` is reached; after that the record is left untouched and
    /// the caller is told how long to wait.
    pub fn check(&self, key: &str, max_attempts: u32, window_ms: u64) -> RateLimitDecision {
        let now = self.clock.now_millis();

        trace!(key = %key, max_attempts, window_ms, "Checking rate limit");

        match self.records.entry(key.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(RateLimitRecord::start(now, window_ms));
                debug!(key = %key, "Opened rate limit window");
                RateLimitDecision::allow(max_attempts.saturating_sub(1))
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();

                if record.is_expired(now) {
                    *record = RateLimitRecord::start(now, window_ms);
                    debug!(key = %key, "Rate limit window expired, opened a new one");
                    return RateLimitDecision::allow(max_attempts.saturating_sub(1));
                }

                if record.count >= max_attempts {
                    let retry_after = record.retry_after_secs(now);
                    debug!(
                        key = %key,
                        count = record.count,
                        retry_after_secs = retry_after,
                        "Rate limit exceeded"
                    );
                    return RateLimitDecision::deny(retry_after);
                }

                record.count += 1;
                RateLimitDecision::allow(max_attempts.saturating_sub(record.count))
            }
        }
    }

    /// Forget `key` entirely. A no-op when nothing is recorded.
    pub fn reset(&self, key: &str) {
        if self.records.remove(key).is_some() {
            debug!(key = %key, "Rate limit record cleared");
        }
    }

    /// Drop every record whose window has expired.
    ///
    /// Returns the number of records removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.records.len())
    }

    /// Get a copy of the record for `key`, if any.
    pub fn record(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.get(key).map(|r| *r)
    }

    /// Get the number of tracked keys.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<C: Clock + 'static> RateLimiter<C> {
    /// Start a background task that sweeps expired records every `interval`.
    ///
    /// The task stops when the returned handle is dropped or when the limiter
    /// itself is dropped, whichever comes first.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let limiter = Arc::downgrade(self);
        let task = tokio::spawn(sweep_loop(limiter, interval));
        info!(interval_secs = interval.as_secs(), "Rate limit sweeper started");
        SweeperHandle { task: Some(task) }
    }
}

async fn sweep_loop<C: Clock + 'static>(limiter: Weak<RateLimiter<C>>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; there is nothing to sweep yet.
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let Some(limiter) = limiter.upgrade() else {
            debug!("Rate limiter dropped, sweeper exiting");
            return;
        };

        let removed = limiter.sweep();
        if removed > 0 {
            info!(removed, remaining = limiter.len(), "Swept expired rate limit records");
        } else {
            trace!(remaining = limiter.len(), "Rate limit sweep found nothing to remove");
        }
    }
}

/// Owns the background sweep task. Dropping it stops the task.
#[derive(Debug)]
pub struct SweeperHandle {
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to wind down.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
        info!("Rate limit sweeper stopped");
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
