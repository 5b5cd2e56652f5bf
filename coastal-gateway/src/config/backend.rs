//! Resolved backend origin shared by the proxy, fetcher and feeds.

use std::fmt;

use coastal_common::error::ConfigurationError;
use url::Url;

use super::BackendSettings;

/// Where the active base URL was taken from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSource {
    /// `backend.url` in the settings
    Settings,
    /// The named environment variable
    Env(String),
    /// `backend.default_url`
    Default,
}

impl fmt::Display for BackendSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendSource::Settings => write!(f, "settings"),
            BackendSource::Env(name) => write!(f, "env:{}", name),
            BackendSource::Default => write!(f, "default"),
        }
    }
}

/// Backend base origin, resolved once at startup and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    base: Url,
    raw: String,
    source: BackendSource,
}

impl BackendConfig {
    /// Resolve from settings and the process environment.
    pub fn from_env(settings: &BackendSettings) -> Result<Self, ConfigurationError> {
        Self::resolve(settings, |name| std::env::var(name).ok())
    }

    /// Resolve using `lookup` for environment variables.
    ///
    /// Order: explicit `url`, then each `url_env` candidate, then `default_url`.
    /// Blank values are skipped.
    pub fn resolve<F>(settings: &BackendSettings, lookup: F) -> Result<Self, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |v: String| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        };

        let (raw, source) = if let Some(url) = settings.url.clone().and_then(non_blank) {
            (url, BackendSource::Settings)
        } else if let Some((name, url)) = settings
            .url_env
            .iter()
            .find_map(|name| lookup(name).and_then(non_blank).map(|url| (name.clone(), url)))
        {
            (url, BackendSource::Env(name))
        } else {
            (settings.default_url.trim().to_string(), BackendSource::Default)
        };

        Self::parse(&raw, source)
    }

    /// Build from a literal base URL.
    pub fn from_url(raw: &str) -> Result<Self, ConfigurationError> {
        Self::parse(raw.trim(), BackendSource::Settings)
    }

    fn parse(raw: &str, source: BackendSource) -> Result<Self, ConfigurationError> {
        let base = Url::parse(raw)
            .map_err(|e| ConfigurationError::invalid("backend.url", format!("'{}': {}", raw, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigurationError::invalid(
                "backend.url",
                format!("unsupported scheme '{}'", base.scheme()),
            ));
        }
        if base.host_str().is_none() {
            return Err(ConfigurationError::invalid("backend.url", "missing host"));
        }
        Ok(Self {
            base,
            raw: raw.to_string(),
            source,
        })
    }

    /// Parsed base URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Base URL as configured, before normalization
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn source(&self) -> &BackendSource {
        &self.source
    }

    /// Absolute URL for a logical path such as `/waves/?start=...`.
    ///
    /// The path replaces any path on the base; scheme, host and port are kept.
    pub fn join(&self, logical: &str) -> Result<Url, url::ParseError> {
        self.base.join(logical)
    }
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
