//! Timestamp parsing for loosely-shaped upstream records.
//!
//! Upstream rows carry their time as epoch seconds, epoch milliseconds,
//! `YYYY-MM-DD`, `YYYY-MM-DD HH:MM[:SS]`, ISO-8601 with or without an offset,
//! and a handful of other spellings. [`TimeParser`] folds all of them into a
//! single UTC [`Instant`]. Zone-less wall-clock values are read in the parser's
//! timezone (the process local zone by default).
//!
//! Parsing is total: every input yields `Some(instant)` or `None`, never a
//! panic or an error.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// An absolute point in time.
pub type Instant = DateTime<Utc>;

/// Numeric timestamps whose magnitude exceeds this are epoch milliseconds;
/// anything smaller is epoch seconds.
pub const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

/// Offset-bearing layouts tried after RFC 3339 and RFC 2822.
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
];

/// Wall-clock layouts without an offset, read in the parser's timezone.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Date-only layouts (besides `YYYY-MM-DD`), read as local midnight.
const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%d/%m/%Y"];

/// Converts heterogeneous timestamp values into [`Instant`]s.
#[derive(Debug, Clone)]
pub struct TimeParser<Tz: TimeZone = Local> {
    tz: Tz,
}

impl TimeParser<Local> {
    /// Parser that reads zone-less values in the process local timezone.
    pub fn local() -> Self {
        Self { tz: Local }
    }
}

impl Default for TimeParser<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz: TimeZone> TimeParser<Tz> {
    /// Parser that reads zone-less values in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Timezone used for zone-less values.
    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    /// Parse any JSON scalar into an instant.
    ///
    /// Numbers are epochs, strings go through [`TimeParser::parse_str`];
    /// null, booleans, arrays and objects yield `None`.
    pub fn parse(&self, value: &Value) -> Option<Instant> {
        match value {
            Value::Number(n) => n.as_f64().and_then(|n| self.parse_epoch(n)),
            Value::String(s) => self.parse_str(s),
            _ => None,
        }
    }

    /// Interpret a number as epoch seconds or epoch milliseconds.
    pub fn parse_epoch(&self, n: f64) -> Option<Instant> {
        if !n.is_finite() {
            return None;
        }
        let millis = if n.abs() > EPOCH_MILLIS_THRESHOLD {
            n
        } else {
            n * 1000.0
        };
        DateTime::from_timestamp_millis(millis.trunc() as i64)
    }

    /// Parse a textual timestamp.
    pub fn parse_str(&self, raw: &str) -> Option<Instant> {
        let s = raw.trim();
        if s.is_empty() {
            return None;
        }

        if matches_shape(s, "dddd-dd-dd dd:dd") || matches_shape(s, "dddd-dd-dd dd:dd:dd") {
            let layout = if s.len() == 16 {
                "%Y-%m-%d %H:%M"
            } else {
                "%Y-%m-%d %H:%M:%S"
            };
            return NaiveDateTime::parse_from_str(s, layout)
                .ok()
                .and_then(|naive| self.localize(naive));
        }

        if matches_shape(s, "dddd-dd-dd") {
            return NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| self.local_midnight(date));
        }

        self.parse_generic(s)
    }

    /// Resolve a wall-clock value in the parser's timezone.
    ///
    /// Ambiguous times (DST fall-back) take the earlier instant; times that
    /// do not exist (DST spring-forward gap) yield `None`.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<Instant> {
        self.tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    fn local_midnight(&self, date: NaiveDate) -> Option<Instant> {
        date.and_hms_opt(0, 0, 0).and_then(|naive| self.localize(naive))
    }

    fn parse_generic(&self, s: &str) -> Option<Instant> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
            return Some(dt.with_timezone(&Utc));
        }
        for layout in ZONED_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(s, layout) {
                return Some(dt.with_timezone(&Utc));
            }
        }
        for layout in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
                return self.localize(naive);
            }
        }
        for layout in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(s, layout) {
                return self.local_midnight(date);
            }
        }
        None
    }
}

/// Parse a JSON value with a local-time parser.
pub fn parse_instant(value: &Value) -> Option<Instant> {
    TimeParser::local().parse(value)
}

/// `d` in `pattern` matches one ASCII digit, every other byte matches itself.
fn matches_shape(s: &str, pattern: &str) -> bool {
    s.len() == pattern.len()
        && s.bytes().zip(pattern.bytes()).all(|(c, p)| match p {
            b'd' => c.is_ascii_digit(),
            _ => c == p,
        })
}
