//! JSON lines layer for structured log output.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// One serialized log line
#[derive(Debug, Clone, Serialize)]
pub struct JsonLogEvent {
    /// RFC 3339 timestamp
    pub timestamp: String,
    /// TRACE, DEBUG, INFO, WARN or ERROR
    pub level: String,
    /// Target module path
    pub target: String,
    /// Rendered message
    pub message: String,
    /// Innermost span name, if the event was emitted inside one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    /// Structured fields recorded on the event (attempt, status, path, ...)
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    /// Process-wide sequence number
    pub seq: u64,
}

impl JsonLogEvent {
    pub fn new(level: Level, target: &str, message: String) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            level: level.to_string(),
            target: target.to_string(),
            message,
            span: None,
            file: None,
            line: None,
            app: None,
            fields: Map::new(),
            seq: SEQUENCE.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn with_location(mut self, file: Option<&str>, line: Option<u32>) -> Self {
        self.file = file.map(str::to_string);
        self.line = line;
        self
    }

    pub fn with_app(mut self, app: Option<&str>) -> Self {
        self.app = app.map(str::to_string);
        self
    }

    pub fn add_field(&mut self, key: String, value: Value) {
        self.fields.insert(key, value);
    }
}

pub(super) struct JsonLayer {
    app_name: Option<String>,
    include_location: bool,
    use_utc: bool,
}

impl JsonLayer {
    pub(super) fn new(app_name: Option<String>, include_location: bool, use_utc: bool) -> Self {
        Self {
            app_name,
            include_location,
            use_utc,
        }
    }
}

impl<S> Layer<S> for JsonLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let mut log_event = JsonLogEvent::new(
            *metadata.level(),
            metadata.target(),
            visitor.message.take().unwrap_or_default(),
        );

        if !self.use_utc {
            log_event.timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string();
        }
        if self.include_location {
            log_event = log_event.with_location(metadata.file(), metadata.line());
        }
        log_event.span = ctx.event_span(event).map(|span| span.name().to_string());
        log_event = log_event.with_app(self.app_name.as_deref());

        for (key, value) in visitor.fields {
            log_event.add_field(key, value);
        }

        if let Ok(json) = serde_json::to_string(&log_event) {
            let _ = writeln!(io::stderr().lock(), "{}", json);
        }
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl JsonVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        if let Some(n) = serde_json::Number::from_f64(value) {
            self.put(field, Value::Number(n));
        }
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }
}
