use crate::error::AuthError;
use std::collections::HashSet;
use tracing::{error, warn};

/// Static shared-secret API key check.
///
/// An empty key set rejects everything: a deployment that forgot to configure
/// keys must not end up open to the world.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    keys: HashSet<String>,
}

impl AuthGate {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = keys
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        Self { keys }
    }

    /// Build from a comma-separated list such as `"k1, k2,,k3"`
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_configured(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Exact, case-sensitive membership test
    pub fn is_valid(&self, credential: Option<&str>) -> bool {
        self.check(credential).is_ok()
    }

    /// Like [`AuthGate::is_valid`], but says why a credential was refused
    pub fn check(&self, credential: Option<&str>) -> Result<(), AuthError> {
        if self.keys.is_empty() {
            return Err(AuthError::NotConfigured);
        }

        match credential {
            None => Err(AuthError::Missing),
            Some(key) if self.keys.contains(key) => Ok(()),
            Some(_) => Err(AuthError::Invalid),
        }
    }

    /// [`AuthGate::check`] with the rejection logged
    pub fn authenticate(&self, credential: Option<&str>, client_ip: &str) -> Result<(), AuthError> {
        let result = self.check(credential);

        match result {
            Err(AuthError::NotConfigured) => {
                error!(client_ip = %client_ip, "API keys not configured, rejecting request");
            }
            Err(err) => {
                warn!(client_ip = %client_ip, reason = %err, "Authentication failed");
            }
            Ok(()) => {}
        }

        result
    }
}
