//! Logging configuration and initialization.

use std::env;

use tracing_subscriber::fmt::time::{ChronoLocal, ChronoUtc};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use super::json_layer::JsonLayer;

/// Filter used when neither `RUST_LOG` nor `LOG_LEVEL` is set.
pub const DEFAULT_DIRECTIVES: &str = "coastal_gateway=info,coastal_common=info,hyper=warn";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl LogFormat {
    /// Parse format from string, falling back to `Pretty`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

/// Timestamp format for log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    #[default]
    Local,
    Utc,
    None,
}

impl TimestampFormat {
    /// Parse format from string, falling back to `Local`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "utc" => TimestampFormat::Utc,
            "none" | "off" => TimestampFormat::None,
            _ => TimestampFormat::Local,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format
    pub format: LogFormat,
    /// Timestamp format
    pub timestamps: TimestampFormat,
    /// Filter directives used when `RUST_LOG` is not set
    pub directives: String,
    /// Include source file and line
    pub include_location: bool,
    /// Include the event target (module path)
    pub include_target: bool,
    /// Application name for JSON logs
    pub app_name: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            timestamps: TimestampFormat::Local,
            directives: DEFAULT_DIRECTIVES.to_string(),
            include_location: false,
            include_target: true,
            app_name: None,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            format: lookup("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            timestamps: lookup("LOG_TIMESTAMPS")
                .map(|s| TimestampFormat::parse(&s))
                .unwrap_or_default(),
            directives: lookup("LOG_LEVEL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.directives),
            include_location: lookup("LOG_LOCATION")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.include_location),
            include_target: defaults.include_target,
            app_name: lookup("LOG_APP_NAME"),
        }
    }

    /// Set the application name
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Replace the fallback filter directives
    pub fn with_directives(mut self, directives: impl Into<String>) -> Self {
        self.directives = directives.into();
        self
    }
}

/// Initialize logging with the given configuration
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.directives));

    match config.format {
        LogFormat::Json => {
            let layer = JsonLayer::new(
                config.app_name.clone(),
                config.include_location,
                config.timestamps == TimestampFormat::Utc,
            );
            tracing_subscriber::registry()
                .with(env_filter)
                .with(layer)
                .try_init()?;
        }
        LogFormat::Compact => init_fmt_logging(&config, env_filter, true)?,
        LogFormat::Pretty => init_fmt_logging(&config, env_filter, false)?,
    }

    Ok(())
}

fn init_fmt_logging(
    config: &LogConfig,
    env_filter: EnvFilter,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer()
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr));

    // compact() and the timer both change the layer type, so each arm installs its own
    match (config.timestamps, compact) {
        (TimestampFormat::Local, false) => registry
            .with(layer.with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f %z".to_string())))
            .try_init()?,
        (TimestampFormat::Local, true) => registry
            .with(
                layer
                    .compact()
                    .with_timer(ChronoLocal::new("%H:%M:%S%.3f".to_string())),
            )
            .try_init()?,
        (TimestampFormat::Utc, false) => registry
            .with(layer.with_timer(ChronoUtc::new("%Y-%m-%dT%H:%M:%S%.3fZ".to_string())))
            .try_init()?,
        (TimestampFormat::Utc, true) => registry
            .with(
                layer
                    .compact()
                    .with_timer(ChronoUtc::new("%H:%M:%S%.3fZ".to_string())),
            )
            .try_init()?,
        (TimestampFormat::None, false) => registry.with(layer.without_time()).try_init()?,
        (TimestampFormat::None, true) => {
            registry.with(layer.compact().without_time()).try_init()?
        }
    }

    Ok(())
}
