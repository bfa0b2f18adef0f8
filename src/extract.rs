//! Request metadata extraction: API credentials and client identity.

use axum::http::{header, HeaderMap};
use std::collections::HashMap;

/// Identity used for IP limiting when no proxy header is present.
/// All such clients share one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Where an API key may be presented
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// `X-API-Key: <key>`
    ApiKeyHeader,
    /// `Authorization: Bearer <key>`
    BearerToken,
    /// `?<name>=<key>`
    QueryParam(&'static str),
}

impl CredentialSource {
    fn extract(&self, headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
        let raw = match self {
            CredentialSource::ApiKeyHeader => header_str(headers, "x-api-key"),
            CredentialSource::BearerToken => header_str(headers, header::AUTHORIZATION.as_str())
                .and_then(|value| value.strip_prefix("Bearer ")),
            CredentialSource::QueryParam(name) => query.get(*name).map(String::as_str),
        };

        raw.filter(|value| !value.is_empty()).map(str::to_string)
    }
}

/// Ordered list of credential sources; the first one that yields a value wins
#[derive(Debug, Clone)]
pub struct CredentialExtractor {
    sources: Vec<CredentialSource>,
}

impl CredentialExtractor {
    pub fn new(sources: Vec<CredentialSource>) -> Self {
        Self { sources }
    }

    pub fn extract(&self, headers: &HeaderMap, query: &HashMap<String, String>) -> Option<String> {
        self.sources
            .iter()
            .find_map(|source| source.extract(headers, query))
    }
}

impl Default for CredentialExtractor {
    fn default() -> Self {
        Self::new(vec![
            CredentialSource::ApiKeyHeader,
            CredentialSource::BearerToken,
            CredentialSource::QueryParam("key"),
        ])
    }
}

/// Client identity for IP limiting: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then [`UNKNOWN_CLIENT`].
pub fn client_ip(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| {
            header_str(headers, "x-real-ip")
                .map(str::trim)
                .filter(|ip| !ip.is_empty())
        })
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
