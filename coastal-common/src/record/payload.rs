use serde_json::Value;
use tracing::debug;

use super::RawRecord;

/// Pull the row list out of an upstream payload.
///
/// Accepts a bare array, or an object wrapping the array under `items` or
/// `data`. Non-object entries are skipped.
pub fn extract_rows(payload: &Value) -> Vec<RawRecord> {
    let rows = match payload {
        Value::Array(rows) => rows,
        Value::Object(map) => match ["items", "data"].iter().find_map(|k| map.get(*k).and_then(Value::as_array)) {
            Some(rows) => rows,
            None => {
                debug!("payload object has no items/data array");
                return Vec::new();
            }
        },
        _ => return Vec::new(),
    };

    rows.iter()
        .filter_map(|row| row.as_object().cloned())
        .collect()
}
