//! Ephemeral animal record intake service.
//!
//! Clients submit animal records (job id, name, generation) and read back the
//! current batch. The whole batch is wiped on a fixed interval. Every request
//! must carry a known API key and passes a per-IP and a per-key sliding-window
//! rate limit.

pub mod algorithms;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod health;
pub mod maintenance;
pub mod middleware;
pub mod rate_guard;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use auth::AuthGate;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use rate_guard::{RateGuard, RateGuardConfig};
pub use server::{create_app, Server};
pub use store::{AnimalRecord, RecordStore};
pub use validation::validate;
