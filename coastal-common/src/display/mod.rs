//! Presentation helpers shared by the CLI and any dashboard front-end.

mod format;
mod summary;
mod tides;

pub use format::{compass16, ddmm_hhmm, format_direction, format_number, hhmm, is_multi_day, COMPASS_POINTS, MISSING};
pub use summary::{Summary, SummaryEntry, DIRECTION_KEYS, SUMMARY_LABELS, SUMMARY_UNITS};
pub use tides::{tide_extremes, upcoming_tide_events};
