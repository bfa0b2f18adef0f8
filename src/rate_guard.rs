use crate::algorithms::{SlidingWindowLimiter, WindowPolicy};
use crate::clock::{Clock, Millis};
use crate::error::RateLimitError;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

/// Limits applied by [`RateGuard`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateGuardConfig {
    pub per_ip: WindowPolicy,
    pub per_key: WindowPolicy,
    /// Both limiter maps are dropped wholesale on this period to bound memory
    pub reset_interval_ms: u64,
}

impl Default for RateGuardConfig {
    fn default() -> Self {
        Self {
            per_ip: WindowPolicy::new(100, 60_000),
            per_key: WindowPolicy::new(500, 60_000),
            reset_interval_ms: 300_000,
        }
    }
}

/// Dual-axis rate limiting: one sliding window per client IP and one per API key.
///
/// The periodic reset forgets every identity at once, regardless of where
/// each one is in its window. An abuser can therefore get a fresh allowance
/// slightly early; that is accepted in exchange for bounded memory.
#[derive(Debug)]
pub struct RateGuard {
    config: RateGuardConfig,
    clock: Arc<dyn Clock>,
    by_ip: SlidingWindowLimiter,
    by_key: SlidingWindowLimiter,
    next_reset_at: Mutex<Millis>,
}

impl RateGuard {
    pub fn new(config: RateGuardConfig, clock: Arc<dyn Clock>) -> Self {
        let reset_interval_ms = config.reset_interval_ms.max(1);
        let next_reset_at = Mutex::new(clock.now() + reset_interval_ms);

        Self {
            config: RateGuardConfig {
                reset_interval_ms,
                ..config
            },
            clock,
            by_ip: SlidingWindowLimiter::new(),
            by_key: SlidingWindowLimiter::new(),
            next_reset_at,
        }
    }

    pub fn check_ip(&self, ip: &str) -> bool {
        let now = self.tick(self.clock.now());
        let policy = self.config.per_ip;
        self.by_ip.allow(ip, policy.limit, policy.window_ms, now)
    }

    pub fn check_key(&self, key: &str) -> bool {
        let now = self.tick(self.clock.now());
        let policy = self.config.per_key;
        self.by_key.allow(key, policy.limit, policy.window_ms, now)
    }

    /// Check the IP axis, then the key axis, reporting which one tripped.
    ///
    /// The key axis is not charged when the IP axis already rejected.
    pub fn check(&self, ip: &str, key: &str) -> Result<(), RateLimitError> {
        if !self.check_ip(ip) {
            info!(ip = %ip, "IP rate limit exceeded");
            return Err(RateLimitError::IpExceeded {
                limit: self.config.per_ip.limit,
                window_secs: self.config.per_ip.window_secs(),
            });
        }

        if !self.check_key(key) {
            info!(ip = %ip, "API key rate limit exceeded");
            return Err(RateLimitError::KeyExceeded {
                limit: self.config.per_key.limit,
                window_secs: self.config.per_key.window_secs(),
            });
        }

        Ok(())
    }

    /// Clear both axes if the reset deadline has passed.
    /// Returns the number of identities dropped, or `None` when not due.
    pub fn reset_if_due(&self) -> Option<usize> {
        let now = self.clock.now();
        self.reset_at(now)
    }

    /// Unconditionally clear both axes
    pub fn reset_all(&self) -> usize {
        self.by_ip.reset_all() + self.by_key.reset_all()
    }

    pub fn tracked_ips(&self) -> usize {
        self.by_ip.len()
    }

    pub fn tracked_keys(&self) -> usize {
        self.by_key.len()
    }

    pub fn reset_interval(&self) -> Duration {
        Duration::from_millis(self.config.reset_interval_ms)
    }

    fn tick(&self, now: Millis) -> Millis {
        self.reset_at(now);
        now
    }

    fn reset_at(&self, now: Millis) -> Option<usize> {
        // Held across both clears: only one caller performs a given reset.
        let mut next_reset_at = self
            .next_reset_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if now < *next_reset_at {
            return None;
        }

        let interval = self.config.reset_interval_ms;
        let missed = (now - *next_reset_at) / interval;
        *next_reset_at += (missed + 1) * interval;

        let dropped = self.reset_all();
        debug!(dropped, "Rate limit windows reset");
        Some(dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn guard() -> (ManualClock, RateGuard) {
        let clock = ManualClock::new(0);
        let guard = RateGuard::new(RateGuardConfig::default(), Arc::new(clock.clone()));
        (clock, guard)
    }

    #[test]
    fn test_ip_axis_limit() {
        let (clock, guard) = guard();

        for i in 0..100 {
            assert!(guard.check_ip("1.2.3.4"), "call {} should pass", i + 1);
            clock.advance(Duration::from_millis(100));
        }
        assert!(!guard.check_ip("1.2.3.4"));
        assert!(guard.check_ip("5.6.7.8"));
    }

    #[test]
    fn test_key_axis_limit_is_independent() {
        let (_, guard) = guard();

        for _ in 0..500 {
            assert!(guard.check_key("K1"));
        }
        assert!(!guard.check_key("K1"));
        assert!(guard.check_ip("1.2.3.4"));
    }

    #[test]
    fn test_check_reports_axis() {
        let clock = ManualClock::new(0);
        let config = RateGuardConfig {
            per_ip: WindowPolicy::new(2, 60_000),
            per_key: WindowPolicy::new(3, 60_000),
            ..Default::default()
        };
        let guard = RateGuard::new(config, Arc::new(clock));

        assert!(guard.check("ip-a", "K1").is_ok());
        assert!(guard.check("ip-a", "K1").is_ok());
        assert_eq!(
            guard.check("ip-a", "K1"),
            Err(RateLimitError::IpExceeded { limit: 2, window_secs: 60 })
        );

        // The IP rejection above did not consume key allowance.
        assert!(guard.check("ip-b", "K1").is_ok());
        assert_eq!(
            guard.check("ip-b", "K1"),
            Err(RateLimitError::KeyExceeded { limit: 3, window_secs: 60 })
        );
    }

    #[test]
    fn test_sub_second_window_rounds_up() {
        let clock = ManualClock::new(0);
        let config = RateGuardConfig {
            per_ip: WindowPolicy::new(1, 500),
            ..Default::default()
        };
        let guard = RateGuard::new(config, Arc::new(clock));

        assert!(guard.check("ip-a", "K1").is_ok());
        let err = guard.check("ip-a", "K1").unwrap_err();
        assert_eq!(err, RateLimitError::IpExceeded { limit: 1, window_secs: 1 });
        assert_eq!(err.retry_after_secs(), 1);
    }

    #[test]
    fn test_concurrent_checks_admit_exactly_limit() {
        let clock = ManualClock::new(0);
        let config = RateGuardConfig {
            per_ip: WindowPolicy::new(20, 60_000),
            ..Default::default()
        };
        let guard = RateGuard::new(config, Arc::new(clock));

        let admitted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| (0..20).filter(|_| guard.check_ip("1.2.3.4")).count())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(admitted, 20);
        assert!(!guard.check_ip("1.2.3.4"));
    }

    #[test]
    fn test_window_slides_back_open() {
        let (clock, guard) = guard();

        for _ in 0..100 {
            guard.check_ip("1.2.3.4");
        }
        assert!(!guard.check_ip("1.2.3.4"));

        clock.advance(Duration::from_millis(60_000));
        assert!(guard.check_ip("1.2.3.4"));
    }

    #[test]
    fn test_periodic_reset_clears_both_axes() {
        let (clock, guard) = guard();

        for _ in 0..100 {
            guard.check_ip("1.2.3.4");
        }
        guard.check_key("K1");
        assert_eq!(guard.reset_if_due(), None);

        clock.advance(Duration::from_millis(300_000));
        assert_eq!(guard.reset_if_due(), Some(2));
        assert_eq!(guard.tracked_ips(), 0);
        assert_eq!(guard.tracked_keys(), 0);
    }

    #[test]
    fn test_reset_applies_lazily_on_check() {
        let clock = ManualClock::new(0);
        let config = RateGuardConfig {
            per_ip: WindowPolicy::new(1, 600_000),
            ..Default::default()
        };
        let guard = RateGuard::new(config, Arc::new(clock.clone()));

        assert!(guard.check_ip("1.2.3.4"));
        clock.advance(Duration::from_millis(299_999));
        assert!(!guard.check_ip("1.2.3.4"));

        // Window is still open, but the global reset forgets the identity.
        clock.advance(Duration::from_millis(1));
        assert!(guard.check_ip("1.2.3.4"));
    }
}
