use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::auth::AuthGate;
use crate::clock::Clock;
use crate::config::Config;
use crate::error::{ApiError, ApiResult, ValidationError};
use crate::extract::{client_ip, CredentialExtractor};
use crate::health::{HealthChecker, HealthStatus};
use crate::rate_guard::RateGuard;
use crate::response::{ListResponse, SubmitResponse};
use crate::store::RecordStore;
use crate::validation::RequestValidator;

/// Shared application state
pub type SharedState = Arc<AppState>;

/// Everything a request needs, built once per process
pub struct AppState {
    pub auth: AuthGate,
    pub extractor: CredentialExtractor,
    pub guard: Arc<RateGuard>,
    pub store: Arc<RecordStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: config.auth_gate(),
            extractor: CredentialExtractor::default(),
            guard: Arc::new(RateGuard::new(config.rate_guard(), clock.clone())),
            store: Arc::new(RecordStore::new(clock, config.wipe_interval())),
            started_at: Instant::now(),
        }
    }

    /// Authenticate, then charge the IP axis and the key axis, in that order
    pub fn authorize(&self, headers: &HeaderMap, query: &HashMap<String, String>) -> ApiResult<()> {
        let client_ip = client_ip(headers);
        let credential = self.extractor.extract(headers, query);

        self.auth.authenticate(credential.as_deref(), &client_ip)?;

        let key = credential.as_deref().unwrap_or_default();
        self.guard.check(&client_ip, key)?;

        Ok(())
    }
}

/// List every live animal record
pub async fn list_animals(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse>> {
    state.authorize(&headers, &query)?;

    Ok(Json(state.store.list().into()))
}

/// Submit one animal record
pub async fn submit_animal(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    state.authorize(&headers, &query)?;

    let Json(body) = body.map_err(|e| ValidationError::Malformed(e.body_text()))?;
    let submission = RequestValidator::validate_submit_body(&body)?;

    let outcome = state.store.submit(submission);

    Ok(Json(SubmitResponse::from_outcome(
        outcome,
        state.store.wipe_interval(),
    )))
}

/// Any other method on the animals resource
pub async fn method_not_allowed(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<()> {
    state.authorize(&headers, &query)?;

    Err(ApiError::MethodNotAllowed)
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthStatus> {
    Json(HealthChecker::new(&state).check_health())
}
