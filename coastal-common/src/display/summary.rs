use serde::Serialize;
use serde_json::{Map, Value};

use super::format::{format_direction, format_number, MISSING};
use crate::record::as_f64;

/// Display labels for known summary keys.
pub const SUMMARY_LABELS: &[(&str, &str)] = &[
    ("date", "Data"),
    ("hs_avg", "Altura"),
    ("tp_avg", "Período"),
    ("dp_avg", "Direção da Onda"),
    ("sst_avg", "Temp. da Água"),
    ("air_temp_avg", "Temp. do Ar"),
    ("wind_speed_avg", "Vento"),
    ("wind_dir_avg", "Dir. do Vento"),
];

/// Units appended to numeric summary values.
pub const SUMMARY_UNITS: &[(&str, &str)] = &[
    ("hs_avg", "m"),
    ("tp_avg", "s"),
    ("dp_avg", "°"),
    ("sst_avg", "°C"),
    ("air_temp_avg", "°C"),
    ("wind_speed_avg", "m/s"),
    ("wind_dir_avg", "°"),
];

/// Keys rendered as a bearing with compass point.
pub const DIRECTION_KEYS: &[&str] = &["dp_avg", "wind_dir_avg"];

/// Minimum entry count for a level of the payload to be shown.
const RICH_LEVEL_MIN: usize = 3;

fn table_get(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEntry {
    pub key: String,
    pub label: String,
    pub value: Value,
    pub display: String,
}

/// Flat, labeled view of a daily summary payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub entries: Vec<SummaryEntry>,
}

impl Summary {
    /// Build from an arbitrary summary payload.
    ///
    /// Uses the object itself when it has at least three scalar entries,
    /// else the first nested object with at least three keys, else the
    /// object as-is. Non-object payloads give an empty summary.
    pub fn from_value(payload: &Value) -> Self {
        let Some(root) = payload.as_object() else {
            return Self::default();
        };
        let source = rich_level(root);
        let entries = source
            .iter()
            .map(|(key, value)| SummaryEntry {
                key: key.clone(),
                label: table_get(SUMMARY_LABELS, key)
                    .map(str::to_string)
                    .unwrap_or_else(|| key.clone()),
                value: value.clone(),
                display: format_summary_value(key, value),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&SummaryEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn rich_level(root: &Map<String, Value>) -> &Map<String, Value> {
    let scalars = root.values().filter(|v| !v.is_object() && !v.is_array()).count();
    if scalars >= RICH_LEVEL_MIN {
        return root;
    }
    root.values()
        .filter_map(Value::as_object)
        .find(|inner| inner.len() >= RICH_LEVEL_MIN)
        .unwrap_or(root)
}

/// Render one summary value for display.
pub fn format_summary_value(key: &str, value: &Value) -> String {
    match value {
        Value::Null => MISSING.to_string(),
        Value::Number(_) if DIRECTION_KEYS.contains(&key) => format_direction(as_f64(value)),
        Value::Number(_) => {
            let number = format_number(as_f64(value));
            match table_get(SUMMARY_UNITS, key) {
                Some(unit) => format!("{} {}", number, unit),
                None => number,
            }
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
