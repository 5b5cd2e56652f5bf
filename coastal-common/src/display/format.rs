use std::fmt::Display;

use chrono::TimeZone;

use crate::series::Mergeable;
use crate::time::Instant;

/// Placeholder rendered for absent values.
pub const MISSING: &str = "—";

pub const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// 16-point compass label for a bearing in degrees.
///
/// Sectors are 22.5° wide and centred on each point, so `N` covers
/// `[348.75, 11.25)`.
pub fn compass16(degrees: f64) -> &'static str {
    let sector = ((degrees + 11.25).rem_euclid(360.0) / 22.5).floor() as usize % 16;
    COMPASS_POINTS[sector]
}

/// Integers print as-is, other numbers with two decimals.
pub fn format_number(value: Option<f64>) -> String {
    match value {
        // `+ 0.0` folds -0 into 0
        Some(n) if n.is_finite() && n.fract() == 0.0 => format!("{:.0}", n + 0.0),
        Some(n) if n.is_finite() => format!("{:.2}", n),
        _ => MISSING.to_string(),
    }
}

/// Rounded bearing with its compass point, e.g. `156° SSE`.
pub fn format_direction(value: Option<f64>) -> String {
    match value.filter(|d| d.is_finite()) {
        Some(deg) => {
            let rounded = deg.round();
            format!("{}° {}", rounded as i64, compass16(rounded))
        }
        None => MISSING.to_string(),
    }
}

pub fn hhmm<Tz: TimeZone>(instant: &Instant, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%H:%M").to_string()
}

pub fn ddmm_hhmm<Tz: TimeZone>(instant: &Instant, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    instant.with_timezone(tz).format("%d/%m %H:%M").to_string()
}

/// Whether the timed records of a series span more than one calendar day in `tz`.
///
/// Only the first and last timed records are compared, so the input is
/// expected in ascending order.
pub fn is_multi_day<T: Mergeable, Tz: TimeZone>(series: &[T], tz: &Tz) -> bool {
    let mut timed = series.iter().filter_map(Mergeable::instant);
    let Some(first) = timed.next() else {
        return false;
    };
    let last = timed.last().unwrap_or(first);
    first.with_timezone(tz).date_naive() != last.with_timezone(tz).date_naive()
}
