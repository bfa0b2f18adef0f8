//! Time sources.
//!
//! Every time-based decision in the service (sliding windows, wipe deadlines,
//! `receivedAt` stamps) reads from a [`Clock`] so tests can substitute a
//! [`ManualClock`] and move time explicitly instead of sleeping.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Milliseconds since an arbitrary epoch, monotonically non-decreasing.
pub type Millis = u64;

/// Monotonic millisecond time source.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Millis;
}

/// Production clock.
///
/// Captures the Unix time once at construction and advances it with a
/// monotonic [`Instant`], so readings are meaningful as wall-clock stamps but
/// never move backwards when the system clock is adjusted.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
    origin_unix_ms: Millis,
}

impl SystemClock {
    pub fn new() -> Self {
        let origin_unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Millis;

        Self {
            origin: Instant::now(),
            origin_unix_ms,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Millis {
        self.origin_unix_ms + self.origin.elapsed().as_millis() as Millis
    }
}

/// Manually driven clock for tests.
///
/// Clones share the same reading, so advancing one clone advances every
/// component holding another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    current: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            current: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.current
            .fetch_add(by.as_millis() as Millis, Ordering::SeqCst);
    }

    /// Moves the clock to `to`. Earlier values are ignored to keep readings monotonic.
    pub fn set(&self, to: Millis) {
        self.current.fetch_max(to, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Millis {
        self.current.load(Ordering::SeqCst)
    }
}
