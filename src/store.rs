//! Ephemeral animal record store.
//!
//! Records live in insertion order until the next wipe. The wipe is global and
//! purely time driven: every `wipe_interval` measured from store creation the
//! whole sequence is replaced with an empty one, however many records exist.
//! The deadline is enforced both by the background ticker (see
//! [`crate::maintenance`]) and lazily on every access, so data can never be
//! read after its wipe deadline even if the ticker runs late.

use crate::clock::{Clock, Millis};
use crate::validation::AnimalSubmission;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimalRecord {
    pub job_id: String,
    pub name: String,
    pub generation: String,
    pub received_at: Millis,
}

/// Outcome of [`RecordStore::submit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub inserted: bool,
}

/// Point-in-time copy of the store contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub animals: Vec<AnimalRecord>,
    pub total: usize,
}

#[derive(Debug)]
struct StoreState {
    records: Vec<AnimalRecord>,
    next_wipe_at: Millis,
}

#[derive(Debug)]
pub struct RecordStore {
    clock: Arc<dyn Clock>,
    wipe_interval_ms: Millis,
    state: Mutex<StoreState>,
}

impl RecordStore {
    pub fn new(clock: Arc<dyn Clock>, wipe_interval: Duration) -> Self {
        // A zero interval would make every access a wipe deadline.
        let wipe_interval_ms = (wipe_interval.as_millis() as Millis).max(1);
        let started_at = clock.now();

        Self {
            clock,
            wipe_interval_ms,
            state: Mutex::new(StoreState {
                records: Vec::new(),
                next_wipe_at: started_at + wipe_interval_ms,
            }),
        }
    }

    /// Insert a validated submission unless (job_id, name) is already present.
    ///
    /// `generation` takes no part in the duplicate check: a resubmission with
    /// a different generation keeps the first record.
    pub fn submit(&self, submission: AnimalSubmission) -> SubmitOutcome {
        let now = self.clock.now();
        let mut state = self.lock();
        self.wipe_locked(&mut state, now);

        let duplicate = state
            .records
            .iter()
            .any(|r| r.job_id == submission.job_id && r.name == submission.name);

        if duplicate {
            debug!(
                job_id = %submission.job_id,
                name = %submission.name,
                "Duplicate animal ignored"
            );
            return SubmitOutcome { inserted: false };
        }

        info!(
            name = %submission.name,
            generation = %submission.generation,
            total = state.records.len() + 1,
            "Animal received"
        );

        state.records.push(AnimalRecord {
            job_id: submission.job_id,
            name: submission.name,
            generation: submission.generation,
            received_at: now,
        });

        SubmitOutcome { inserted: true }
    }

    pub fn list(&self) -> Snapshot {
        let now = self.clock.now();
        let mut state = self.lock();
        self.wipe_locked(&mut state, now);

        Snapshot {
            animals: state.records.clone(),
            total: state.records.len(),
        }
    }

    pub fn len(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        self.wipe_locked(&mut state, now);
        state.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the wipe if its deadline has passed. Returns the number of records removed.
    pub fn wipe_if_due(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();
        self.wipe_locked(&mut state, now)
    }

    pub fn wipe_interval(&self) -> Duration {
        Duration::from_millis(self.wipe_interval_ms)
    }

    /// Milliseconds until the next scheduled wipe
    pub fn next_wipe_in(&self) -> Duration {
        let now = self.clock.now();
        let state = self.lock();
        Duration::from_millis(state.next_wipe_at.saturating_sub(now))
    }

    fn wipe_locked(&self, state: &mut StoreState, now: Millis) -> usize {
        if now < state.next_wipe_at {
            return 0;
        }

        // Deadlines stay aligned to store start even when several were missed.
        let missed = (now - state.next_wipe_at) / self.wipe_interval_ms;
        state.next_wipe_at += (missed + 1) * self.wipe_interval_ms;

        let deleted = std::mem::take(&mut state.records).len();
        if deleted > 0 {
            info!(deleted, "Automatic cleanup: animals deleted");
        }
        deleted
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
