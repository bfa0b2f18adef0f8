use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::error::ConfigError;
use crate::handlers::{
    health_check, list_animals, method_not_allowed, submit_animal, AppState,
    SharedState,
};
use crate::maintenance::Maintenance;
use crate::middleware::logging_middleware;
use axum::http::{header, HeaderName, Method};
use axum::routing::get;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct Server {
    state: SharedState,
    bind_addr: SocketAddr,
}

impl Server {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        config.validate()?;

        let state = Arc::new(AppState::new(&config, clock));
        if !state.auth.is_configured() {
            tracing::warn!("No API keys configured; every request will be rejected with 401");
        }

        Ok(Self {
            state,
            bind_addr: config.bind_addr,
        })
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    pub async fn run(self) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(self.bind_addr).await?;

        let maintenance = Maintenance::start(self.state.store.clone(), self.state.guard.clone());

        tracing::info!("Animal intake server listening on {}", self.bind_addr);
        tracing::info!("Animals endpoint available at /api/animals");
        tracing::info!("Health check available at /health");

        let served = axum::serve(listener, create_app(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        // Stop background work whether or not the server exited cleanly.
        maintenance.shutdown().await;

        served
    }
}

/// Build the router around already constructed state
pub fn create_app(state: SharedState) -> Router {
    // OPTIONS never reaches the router: the CORS layer answers it before auth.
    let animals = get(list_animals)
        .post(submit_animal)
        .fallback(method_not_allowed);

    Router::new()
        .route("/api/animals", animals)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("x-csrf-token"),
            HeaderName::from_static("x-requested-with"),
            header::ACCEPT,
            HeaderName::from_static("accept-version"),
            header::CONTENT_LENGTH,
            HeaderName::from_static("content-md5"),
            header::CONTENT_TYPE,
            header::DATE,
            HeaderName::from_static("x-api-version"),
            HeaderName::from_static("x-api-key"),
            header::AUTHORIZATION,
        ])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
