//! Field extraction and mapping of loosely-shaped upstream rows.
//!
//! Upstream services disagree on key names (`hs` vs `waveHeight`, `ts` vs
//! `datetime`, ...). The alias tables in [`aliases`] describe every accepted
//! spelling as data; [`RecordMapper`] applies them to produce canonical
//! records.

pub mod aliases;
mod extract;
mod mapper;
mod payload;
mod values;

pub use aliases::{FieldAliases, OBSERVATION_ALIASES, TIDE_ALIASES, TIME_KEYS};
pub use extract::{extract_time, lookup_alias, MAX_NESTED_DEPTH};
pub use mapper::RecordMapper;
pub use payload::extract_rows;
pub use values::{as_f64, as_text};

/// A single upstream row: a generic string-keyed mapping.
pub type RawRecord = serde_json::Map<String, serde_json::Value>;
