//! Per-identifier sliding-window rate limiting.
//!
//! Each identifier owns a list of request timestamps. Stale timestamps are
//! purged lazily on every check, so the window slides with real time rather
//! than resetting on fixed boundaries. Per-process only: a multi-process
//! deployment needs an external store.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Default requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Sliding-window request counter keyed by caller identifier.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self { windows: Mutex::new(HashMap::new()), max_requests, window }
    }

    /// Check whether `identifier` may make a request now.
    ///
    /// Purges stale timestamps, then records the request and returns true if
    /// the remaining count is under the limit. A denied attempt is NOT
    /// recorded, so hammering a limited identifier does not extend its wait.
    pub async fn is_allowed(&self, identifier: &str) -> bool {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let timestamps = windows.entry(identifier.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() < self.max_requests as usize {
            timestamps.push(now);
            true
        } else {
            false
        }
    }

    /// How many requests `identifier` has left in the current window.
    ///
    /// Non-mutating aside from the lazy purge of stale timestamps.
    pub async fn remaining(&self, identifier: &str) -> u32 {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let valid = match windows.get_mut(identifier) {
            Some(timestamps) => {
                timestamps.retain(|t| now.duration_since(*t) < self.window);
                timestamps.len() as u32
            }
            None => 0,
        };

        self.max_requests.saturating_sub(valid)
    }

    /// Clear the window for `identifier` entirely.
    pub async fn reset(&self, identifier: &str) {
        self.windows.lock().await.remove(identifier);
    }
}
