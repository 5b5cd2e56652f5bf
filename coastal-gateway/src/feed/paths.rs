use std::fmt::Display;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Route of the bundled proxy server
pub const DEFAULT_PROXY_ROUTE: &str = "/api/proxy";

/// Characters left unescaped by a URI component encoder.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const PLAIN_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";
const ZONED_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Percent-encode a single query component.
pub fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Proxy URL path for a logical backend path on the default route.
pub fn api_path(logical: &str) -> String {
    proxied_path(DEFAULT_PROXY_ROUTE, logical)
}

/// Proxy URL path for a logical backend path on `route`.
pub fn proxied_path(route: &str, logical: &str) -> String {
    format!("{}?path={}", route, encode_component(logical))
}

/// Whole calendar days, from the start of `start` to the last second of `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Today in the local timezone
    pub fn today() -> Self {
        Self::day(Local::now().date_naive())
    }

    /// Parse `YYYY-MM-DD` bounds
    pub fn parse(start: &str, end: &str) -> Result<Self, chrono::ParseError> {
        Ok(Self::new(
            NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d")?,
            NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d")?,
        ))
    }

    fn start_naive(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::default())
    }

    fn end_naive(&self) -> NaiveDateTime {
        self.end.and_hms_opt(23, 59, 59).unwrap_or_else(|| self.end.and_time(NaiveTime::default()))
    }

    /// `YYYY-MM-DDT00:00:00`, no offset
    pub fn start_param(&self) -> String {
        self.start_naive().format(PLAIN_LAYOUT).to_string()
    }

    /// `YYYY-MM-DDT23:59:59`, no offset
    pub fn end_param(&self) -> String {
        self.end_naive().format(PLAIN_LAYOUT).to_string()
    }

    /// Both bounds with the `±HH:MM` offset of `tz` on those days.
    pub fn zoned_params<Tz: TimeZone>(&self, tz: &Tz) -> (String, String)
    where
        Tz::Offset: Display,
    {
        (zoned(tz, self.start_naive()), zoned(tz, self.end_naive()))
    }

    pub fn waves_path(&self) -> String {
        range_path("/waves/", &self.start_param(), &self.end_param())
    }

    pub fn tides_path(&self) -> String {
        range_path("/tides/", &self.start_param(), &self.end_param())
    }

    pub fn zoned_waves_path<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: Display,
    {
        let (start, end) = self.zoned_params(tz);
        range_path("/waves/", &start, &end)
    }

    pub fn zoned_tides_path<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: Display,
    {
        let (start, end) = self.zoned_params(tz);
        range_path("/tides/", &start, &end)
    }
}

fn zoned<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> String
where
    Tz::Offset: Display,
{
    // wall-clock midnight can fall in a DST gap; read it as UTC then
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        .format(ZONED_LAYOUT)
        .to_string()
}

fn range_path(resource: &str, start: &str, end: &str) -> String {
    format!(
        "{}?start={}&end={}",
        resource,
        encode_component(start),
        encode_component(end)
    )
}
