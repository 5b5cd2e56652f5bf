//! Application settings and configuration

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::fetcher::RetryPolicy;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Upstream backend location
    #[serde(default)]
    pub backend: BackendSettings,
    /// Retry policy for JSON consumers (CLI feeds)
    #[serde(default)]
    pub fetch: RetrySettings,
    /// Same-origin proxy server
    #[serde(default)]
    pub proxy: ProxySettings,
    /// Backend warm-up ping
    #[serde(default)]
    pub warmup: WarmupSettings,
}

// =============================================================================
// BACKEND CONFIGURATION
// =============================================================================

/// Where the backend origin comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Explicit base URL; wins over every environment candidate
    #[serde(default)]
    pub url: Option<String>,
    /// Environment variables consulted in order, first non-empty wins
    #[serde(default = "default_backend_url_env")]
    pub url_env: Vec<String>,
    /// Used when nothing else is set
    #[serde(default = "default_backend_url")]
    pub default_url: String,
}

fn default_backend_url_env() -> Vec<String> {
    vec!["BACKEND_URL".to_string(), "PUBLIC_BACKEND_URL".to_string()]
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            url_env: default_backend_url_env(),
            default_url: default_backend_url(),
        }
    }
}

// =============================================================================
// RETRY CONFIGURATION
// =============================================================================

/// Attempt budget and backoff for one class of requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Per-attempt timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    600
}

fn default_timeout_ms() -> u64 {
    8000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RetrySettings {
    /// Retry policy that retries every failed attempt
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.timeout_ms),
        )
    }
}

// =============================================================================
// PROXY CONFIGURATION
// =============================================================================

/// Proxy server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Listen address
    #[serde(default = "default_proxy_bind")]
    pub bind: String,
    /// Route serving `?path=` requests
    #[serde(default = "default_proxy_route")]
    pub route: String,
    /// Attempt budget while the backend is cold
    #[serde(default)]
    pub retry: RetrySettings,
    /// Upstream statuses treated as a cold backend and retried; others are relayed
    #[serde(default = "default_retry_statuses")]
    pub retry_statuses: Vec<u16>,
}

fn default_proxy_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_proxy_route() -> String {
    "/api/proxy".to_string()
}

fn default_retry_statuses() -> Vec<u16> {
    vec![502, 503, 504]
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            bind: default_proxy_bind(),
            route: default_proxy_route(),
            retry: RetrySettings::default(),
            retry_statuses: default_retry_statuses(),
        }
    }
}

impl ProxySettings {
    pub fn policy(&self) -> RetryPolicy {
        self.retry.policy().retry_statuses(self.retry_statuses.clone())
    }
}

// =============================================================================
// WARM-UP CONFIGURATION
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarmupSettings {
    /// Timeout of the single `/health` ping
    #[serde(default = "default_warmup_timeout")]
    pub timeout_ms: u64,
}

fn default_warmup_timeout() -> u64 {
    4000
}

impl Default for WarmupSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_warmup_timeout(),
        }
    }
}

impl WarmupSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Settings {
    /// Load settings from configuration files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_prefix("COASTAL")
    }

    /// Load settings with a custom environment variable prefix
    pub fn load_with_prefix(env_prefix: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config_dir = Self::config_dir();

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            // Add environment-specific configuration
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // Add local overrides (not checked into git)
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            // Add environment variables (e.g., COASTAL__PROXY__BIND)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("backend.url_env")
                    .with_list_parse_key("proxy.retry_statuses"),
            )
            .build()?;

        s.try_deserialize()
    }

    /// Load settings, falling back to defaults when sources are missing or invalid
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {}", e);
                Self::default_settings()
            }
        }
    }

    /// Get the configuration directory path
    fn config_dir() -> String {
        std::env::var("COASTAL_CONFIG_DIR").unwrap_or_else(|_| "config".into())
    }

    /// Create default settings (useful for testing)
    pub fn default_settings() -> Self {
        Settings {
            backend: BackendSettings::default(),
            fetch: RetrySettings::default(),
            proxy: ProxySettings::default(),
            warmup: WarmupSettings::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::default_settings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::StatusRetry;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default_settings();
        assert_eq!(settings.fetch.max_attempts, 5);
        assert_eq!(settings.fetch.base_delay_ms, 600);
        assert_eq!(settings.proxy.bind, "0.0.0.0:3000");
        assert_eq!(settings.proxy.route, "/api/proxy");
        assert_eq!(settings.warmup.timeout(), Duration::from_secs(4));
        assert_eq!(settings.backend.url_env, ["BACKEND_URL", "PUBLIC_BACKEND_URL"]);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let settings: Settings = serde_json::from_value(serde_json::json!({
            "proxy": {"bind": "127.0.0.1:9000"},
            "fetch": {"max_attempts": 2}
        }))
        .unwrap();

        assert_eq!(settings.proxy.bind, "127.0.0.1:9000");
        assert_eq!(settings.proxy.retry_statuses, [502, 503, 504]);
        assert_eq!(settings.fetch.max_attempts, 2);
        assert_eq!(settings.fetch.timeout_ms, 8000);
        assert_eq!(settings.backend.default_url, "http://localhost:8000");
    }

    #[test]
    fn test_policies() {
        let settings = Settings::default_settings();

        let fetch = settings.fetch.policy();
        assert_eq!(fetch.max_attempts, 5);
        assert_eq!(fetch.retry_on, StatusRetry::AnyFailure);

        let proxy = settings.proxy.policy();
        assert_eq!(proxy.timeout, Duration::from_millis(8000));
        assert_eq!(proxy.retry_on, StatusRetry::Only(vec![502, 503, 504]));
    }
}
