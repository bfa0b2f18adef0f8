//! Sliding window rate limiting algorithm
//!
//! Exact sliding-window counter: each identity keeps the timestamps of its
//! accepted requests, and a request is admitted only while fewer than `limit`
//! of them fall inside the trailing window ending at `now`. Unlike fixed
//! buckets this never admits a double burst across a bucket boundary.

use crate::clock::Millis;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory sliding window limiter keyed by an arbitrary identity string
#[derive(Debug, Default)]
pub struct SlidingWindowLimiter {
    windows: Mutex<HashMap<String, VecDeque<Millis>>>,
}

impl SlidingWindowLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check and record a request for `identity` at `now`.
    ///
    /// Timestamps older than the window are pruned even when the request is
    /// rejected, so the stored sequence always reflects the last check.
    pub fn allow(&self, identity: &str, limit: usize, window_ms: u64, now: Millis) -> bool {
        let mut windows = self.lock();

        let timestamps = windows.entry(identity.to_string()).or_default();

        // Ascending order: everything before the first live entry is stale.
        while let Some(&oldest) = timestamps.front() {
            if now.saturating_sub(oldest) < window_ms {
                break;
            }
            timestamps.pop_front();
        }

        if timestamps.len() >= limit {
            return false;
        }

        timestamps.push_back(now);
        true
    }

    /// Number of requests currently recorded for `identity` inside the window.
    pub fn count(&self, identity: &str, window_ms: u64, now: Millis) -> usize {
        self.lock()
            .get(identity)
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|&&t| now.saturating_sub(t) < window_ms)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Drop every identity. Returns how many were tracked.
    pub fn reset_all(&self) -> usize {
        let mut windows = self.lock();
        let dropped = windows.len();
        windows.clear();
        dropped
    }

    /// Number of identities currently tracked
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<Millis>>> {
        // Every mutation leaves the map consistent, so a poisoned lock is still usable.
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
