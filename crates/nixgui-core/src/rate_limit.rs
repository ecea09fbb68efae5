//! Per-client sliding-window rate limiting.
//!
//! Each client key owns a queue of the instants at which its accepted
//! requests arrived. A request is admitted only while fewer than `limit`
//! instants remain inside the trailing `window`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Requests admitted per window when nothing else is configured.
pub const DEFAULT_LIMIT: usize = 100;

/// Length of the trailing window when nothing else is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// In-memory sliding-window limiter.
///
/// State lives for the lifetime of the value; nothing is shared across
/// processes. Keys are never evicted, so the table grows with the number of
/// distinct clients seen.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: usize,
    window: Duration,
    windows: DashMap<String, VecDeque<Instant>>,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT, DEFAULT_WINDOW)
    }
}

impl SlidingWindowLimiter {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records a request from `key` at the current instant.
    ///
    /// Returns `false` when the client is over its budget.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Same as [`allow`](Self::allow) with an explicit clock reading.
    ///
    /// Expired instants are pruned first. A rejected request is not
    /// recorded, so a client over the limit recovers only as its oldest
    /// accepted requests age out of the window.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let mut entry = self.windows.entry(key.to_owned()).or_default();

        while let Some(&oldest) = entry.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                entry.pop_front();
            } else {
                break;
            }
        }

        if entry.len() >= self.limit {
            return false;
        }

        entry.push_back(now);
        true
    }

    /// Number of requests currently counted against `key`.
    pub fn in_window(&self, key: &str) -> usize {
        self.windows.get(key).map(|w| w.len()).unwrap_or(0)
    }

    /// Number of distinct client keys seen so far.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }
}
