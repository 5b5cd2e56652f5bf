use serde_json::Value;

use super::aliases::{DATE_PART_KEYS, HOUR_KEYS, MINUTE_KEYS, SECOND_KEYS, TIME_KEYS};
use super::RawRecord;

/// How many levels of nested objects are searched for a timestamp.
pub const MAX_NESTED_DEPTH: usize = 2;

/// First alias present in `record`, even when its value is `null`.
pub fn lookup_alias<'a>(record: &'a RawRecord, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| record.get(*alias))
}

/// Locate the raw timestamp value of a row.
///
/// Search order, first match wins:
/// 1. a key from [`TIME_KEYS`], in list order
/// 2. a date key plus separate hour/minute/second keys, combined into
///    `YYYY-MM-DD HH:MM:SS`
/// 3. any key whose name contains `time` or `date`
/// 4. the same search inside nested objects, up to [`MAX_NESTED_DEPTH`]
pub fn extract_time(record: &RawRecord) -> Option<Value> {
    extract_at_depth(record, 0)
}

fn extract_at_depth(record: &RawRecord, depth: usize) -> Option<Value> {
    if let Some(value) = TIME_KEYS
        .iter()
        .filter_map(|key| record.get(*key))
        .find(|value| is_time_scalar(value))
    {
        return Some(value.clone());
    }

    if let Some(composite) = composite_timestamp(record) {
        return Some(Value::String(composite));
    }

    if let Some(value) = record
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            key.contains("time") || key.contains("date")
        })
        .map(|(_, value)| value)
        .find(|value| is_time_scalar(value))
    {
        return Some(value.clone());
    }

    if depth < MAX_NESTED_DEPTH {
        return record
            .values()
            .filter_map(Value::as_object)
            .find_map(|inner| extract_at_depth(inner, depth + 1));
    }
    None
}

fn is_time_scalar(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(_) => true,
        _ => false,
    }
}

fn find_key<'a>(record: &'a RawRecord, names: &[&str]) -> Option<&'a Value> {
    record
        .iter()
        .find(|(key, _)| names.iter().any(|name| key.eq_ignore_ascii_case(name)))
        .map(|(_, value)| value)
}

fn composite_timestamp(record: &RawRecord) -> Option<String> {
    let date = find_key(record, DATE_PART_KEYS)?.as_str()?.trim();
    let date = date.split(['T', ' ']).next().filter(|d| !d.is_empty())?;

    let hour = find_key(record, HOUR_KEYS);
    let minute = find_key(record, MINUTE_KEYS);
    let second = find_key(record, SECOND_KEYS);
    if hour.is_none() && minute.is_none() && second.is_none() {
        return None;
    }

    Some(format!(
        "{} {:02}:{:02}:{:02}",
        date,
        clock_part(hour),
        clock_part(minute),
        clock_part(second)
    ))
}

fn clock_part(value: Option<&Value>) -> u64 {
    value
        .and_then(super::as_f64)
        .filter(|n| *n >= 0.0)
        .map(|n| n.trunc() as u64)
        .unwrap_or(0)
}
