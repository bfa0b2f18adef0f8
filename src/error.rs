use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Credential rejection. Every variant maps to the same 401 on the wire;
/// the distinction only exists for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("API key missing")]
    Missing,
    #[error("API key not recognised")]
    Invalid,
    #[error("no API keys configured")]
    NotConfigured,
}

/// Which limiting axis tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("IP rate limit exceeded (max {limit} requests per {window_secs}s)")]
    IpExceeded { limit: usize, window_secs: u64 },
    #[error("API key rate limit exceeded (max {limit} requests per {window_secs}s)")]
    KeyExceeded { limit: usize, window_secs: u64 },
}

impl RateLimitError {
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            RateLimitError::IpExceeded { window_secs, .. }
            | RateLimitError::KeyExceeded { window_secs, .. } => *window_secs,
        }
    }
}

/// Structurally invalid submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("request body is not a valid animal submission: {0}")]
    Malformed(String),
    #[error("missing field '{0}'")]
    Missing(&'static str),
    #[error("field '{0}' must be a string")]
    NotAString(&'static str),
    #[error("field '{field}' exceeds {max} characters")]
    TooLong { field: &'static str, max: u64 },
}

/// Startup configuration fault
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),
}

/// Everything the request handlers can answer with besides success
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
    #[error(transparent)]
    InvalidData(#[from] ValidationError),
    #[error("method not allowed")]
    MethodNotAllowed,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InvalidData(_) => StatusCode::BAD_REQUEST,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Unauthorized(_) => {
                ErrorResponse::new("Unauthorized - Invalid or missing API key", None)
            }
            ApiError::RateLimited(err) => {
                ErrorResponse::new(format!("Too many requests - {}", err), None)
            }
            ApiError::InvalidData(err) => ErrorResponse::new("Invalid data", Some(err.to_string())),
            ApiError::MethodNotAllowed => ErrorResponse::new("Method not allowed", None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.to_error_response())).into_response();

        if let ApiError::RateLimited(err) = &self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(err.retry_after_secs()),
            );
        }

        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
