use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::handlers::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub auth_configured: bool,
    pub records: usize,
    pub next_wipe_in_ms: u64,
    pub tracked_ips: usize,
    pub tracked_keys: usize,
}

pub struct HealthChecker<'a> {
    state: &'a AppState,
}

impl<'a> HealthChecker<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    pub fn check_health(&self) -> HealthStatus {
        let auth_configured = self.state.auth.is_configured();

        let status = if auth_configured {
            "healthy"
        } else {
            "degraded" // Serving, but every request is rejected
        };

        HealthStatus {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: Instant::now()
                .duration_since(self.state.started_at)
                .as_secs(),
            auth_configured,
            records: self.state.store.len(),
            next_wipe_in_ms: self.state.store.next_wipe_in().as_millis() as u64,
            tracked_ips: self.state.guard.tracked_ips(),
            tracked_keys: self.state.guard.tracked_keys(),
        }
    }
}
