use crate::algorithms::WindowPolicy;
use crate::auth::AuthGate;
use crate::error::ConfigError;
use crate::rate_guard::RateGuardConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Service configuration, read from command-line flags or environment variables
#[derive(Debug, Clone, Parser)]
#[command(name = "animal-intake", version, about)]
pub struct Config {
    /// Server bind address
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind_addr: SocketAddr,

    /// Comma-separated list of accepted API keys
    #[arg(long, env = "API_KEYS", default_value = "", hide_env_values = true)]
    pub api_keys: String,

    /// Single accepted API key, merged with API_KEYS
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Interval between unconditional wipes of the record store
    #[arg(long, env = "WIPE_INTERVAL_MS", default_value_t = 40_000)]
    pub wipe_interval_ms: u64,

    /// Requests allowed per client IP within the rate window
    #[arg(long, env = "IP_RATE_LIMIT", default_value_t = 100)]
    pub ip_rate_limit: usize,

    /// Requests allowed per API key within the rate window
    #[arg(long, env = "KEY_RATE_LIMIT", default_value_t = 500)]
    pub key_rate_limit: usize,

    /// Sliding window length for both rate limits
    #[arg(long, env = "RATE_WINDOW_MS", default_value_t = 60_000)]
    pub rate_window_ms: u64,

    /// Interval between full resets of the rate limit state
    #[arg(long, env = "RATE_RESET_INTERVAL_MS", default_value_t = 300_000)]
    pub rate_reset_interval_ms: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            api_keys: String::new(),
            api_key: None,
            wipe_interval_ms: 40_000,
            ip_rate_limit: 100,
            key_rate_limit: 500,
            rate_window_ms: 60_000,
            rate_reset_interval_ms: 300_000,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the process arguments and environment
    pub fn from_env() -> Self {
        Config::parse()
    }

    /// Rejects settings that would disable a limit or spin a timer
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            (self.wipe_interval_ms == 0, "WIPE_INTERVAL_MS"),
            (self.ip_rate_limit == 0, "IP_RATE_LIMIT"),
            (self.key_rate_limit == 0, "KEY_RATE_LIMIT"),
            (self.rate_window_ms == 0, "RATE_WINDOW_MS"),
            (self.rate_reset_interval_ms == 0, "RATE_RESET_INTERVAL_MS"),
        ];

        match checks.iter().find(|(is_zero, _)| *is_zero) {
            Some((_, name)) => Err(ConfigError::Zero(*name)),
            None => Ok(()),
        }
    }

    pub fn wipe_interval(&self) -> Duration {
        Duration::from_millis(self.wipe_interval_ms)
    }

    pub fn rate_guard(&self) -> RateGuardConfig {
        RateGuardConfig {
            per_ip: WindowPolicy::new(self.ip_rate_limit, self.rate_window_ms),
            per_key: WindowPolicy::new(self.key_rate_limit, self.rate_window_ms),
            reset_interval_ms: self.rate_reset_interval_ms,
        }
    }

    pub fn auth_gate(&self) -> AuthGate {
        let single = self.api_key.as_deref().unwrap_or_default();
        AuthGate::new(self.api_keys.split(',').chain(std::iter::once(single)))
    }

    pub fn with_api_keys(mut self, keys: &str) -> Self {
        self.api_keys = keys.to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_cli_defaults() {
        let parsed = Config::parse_from(["animal-intake"]);
        let default = Config::default();

        assert_eq!(parsed.bind_addr, default.bind_addr);
        assert_eq!(parsed.wipe_interval_ms, default.wipe_interval_ms);
        assert_eq!(parsed.ip_rate_limit, default.ip_rate_limit);
        assert_eq!(parsed.key_rate_limit, default.key_rate_limit);
        assert_eq!(parsed.rate_window_ms, default.rate_window_ms);
        assert_eq!(parsed.rate_reset_interval_ms, default.rate_reset_interval_ms);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::parse_from([
            "animal-intake",
            "--bind-addr",
            "127.0.0.1:8080",
            "--api-keys",
            "K1,K2",
            "--wipe-interval-ms",
            "1000",
        ]);

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.wipe_interval(), Duration::from_secs(1));
        assert!(config.auth_gate().is_valid(Some("K2")));
    }

    #[test]
    fn test_default_rate_guard_policy() {
        assert_eq!(Config::default().rate_guard(), RateGuardConfig::default());
    }

    #[test]
    fn test_single_key_merges_with_list() {
        let config = Config {
            api_key: Some("legacy".to_string()),
            ..Config::default().with_api_keys("K1")
        };
        let gate = config.auth_gate();

        assert_eq!(gate.key_count(), 2);
        assert!(gate.is_valid(Some("legacy")));
        assert!(gate.is_valid(Some("K1")));
    }

    #[test]
    fn test_no_keys_is_not_a_config_error() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.auth_gate().is_configured());
    }

    #[test]
    fn test_zero_values_rejected() {
        let config = Config {
            ip_rate_limit: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("IP_RATE_LIMIT")));

        let config = Config {
            rate_reset_interval_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("RATE_RESET_INTERVAL_MS")));
    }
}
