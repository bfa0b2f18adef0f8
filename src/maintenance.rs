//! Background maintenance: the record wipe cycle and the rate limit reset.
//!
//! Both tasks only nudge their owners (`wipe_if_due`, `reset_if_due`); the
//! deadlines themselves live in [`RecordStore`] and [`RateGuard`] and are read
//! from the shared clock. The tasks stop together when [`Maintenance::shutdown`]
//! is called or the shutdown token is cancelled.

use crate::rate_guard::RateGuard;
use crate::store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct Maintenance {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Maintenance {
    /// Spawn both maintenance tasks on the current runtime
    pub fn start(store: Arc<RecordStore>, guard: Arc<RateGuard>) -> Self {
        let shutdown = CancellationToken::new();

        let wipe_period = store.wipe_interval();
        let reset_period = guard.reset_interval();

        let handles = vec![
            spawn_ticker("record wipe", wipe_period, shutdown.child_token(), move || {
                store.wipe_if_due();
            }),
            spawn_ticker("rate limit reset", reset_period, shutdown.child_token(), move || {
                guard.reset_if_due();
            }),
        ];

        info!(
            wipe_interval_ms = wipe_period.as_millis() as u64,
            reset_interval_ms = reset_period.as_millis() as u64,
            "Maintenance tasks started"
        );

        Self { shutdown, handles }
    }

    /// Token that stops every maintenance task when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|handle| !handle.is_finished())
    }

    /// Stop both tasks and wait for them to exit
    pub async fn shutdown(self) {
        self.shutdown.cancel();

        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Maintenance task did not exit cleanly");
            }
        }

        info!("Maintenance tasks stopped");
    }
}

fn spawn_ticker<F>(
    name: &'static str,
    period: Duration,
    shutdown: CancellationToken,
    mut on_tick: F,
) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        // First tick one full period out, not immediately.
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => on_tick(),
                _ = shutdown.cancelled() => {
                    debug!(task = name, "Maintenance task shutting down");
                    break;
                }
            }
        }
    })
}
