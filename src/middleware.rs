use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;
use uuid::Uuid;

use crate::extract::client_ip;

/// Logging middleware for request/response tracking
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let client_ip = client_ip(request.headers());

    // Path only: the query string may carry an API key.
    info!(
        target: "animal_intake::middleware",
        request_id = %request_id,
        method = %method,
        uri = %uri.path(),
        client_ip = %client_ip,
        "Incoming request"
    );

    let response = next.run(request).await;

    let status = response.status();
    info!(
        target: "animal_intake::middleware",
        request_id = %request_id,
        method = %method,
        uri = %uri.path(),
        status = %status,
        "Request completed"
    );

    response
}
