//! Rate limiting algorithms module
//!
//! Only the exact sliding-window counter is used by the service; the policy
//! type below describes one axis of limiting (how many requests, over how long).

pub mod sliding_window;

use serde::Serialize;

pub use sliding_window::SlidingWindowLimiter;

/// Cap and trailing window for one limiting axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowPolicy {
    pub limit: usize,
    pub window_ms: u64,
}

impl WindowPolicy {
    pub const fn new(limit: usize, window_ms: u64) -> Self {
        Self { limit, window_ms }
    }

    /// Window length in whole seconds, rounded up so sub-second windows never report 0
    pub fn window_secs(&self) -> u64 {
        self.window_ms.div_ceil(1000)
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        Self::new(100, 60_000)
    }
}
