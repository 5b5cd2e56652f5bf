// Ordering and deduplication of canonical records
// Rows are sorted by instant, then collapsed per second with first-wins fill

use std::collections::HashMap;

use tracing::debug;

use crate::time::Instant;

/// Layout of the deduplication key: UTC, second precision.
pub const KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Trait for records that can be ordered and merged into a series
///
/// Implemented for `CanonicalObservation` and `CanonicalTideEvent`.
pub trait Mergeable: Clone {
    /// Instant of the record, `None` when the row had no usable time
    fn instant(&self) -> Option<Instant>;

    /// Fill every absent attribute of `self` from `other`; present values stay.
    fn fill_missing_from(&mut self, other: &Self);

    /// Number of attributes where both records hold different non-null values.
    fn count_conflicts(&self, _other: &Self) -> usize {
        0
    }
}

/// Counters describing one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub input: usize,
    pub output: usize,
    /// Rows folded into an earlier row with the same key
    pub merged: usize,
    /// Rows without an instant, each kept on its own
    pub untimed: usize,
    /// Attribute values discarded because the earlier row already had one
    pub conflicts: usize,
}

/// Deduplication key of a record.
///
/// Timed records use their UTC instant truncated to the second; untimed
/// records get `row-<ordinal>`, which never collides with a timed key.
pub fn dedup_key(instant: Option<Instant>, ordinal: usize) -> String {
    match instant {
        Some(t) => t.format(KEY_FORMAT).to_string(),
        None => format!("row-{}", ordinal),
    }
}

/// Stable ascending sort by instant; untimed records sort as the epoch.
pub fn sort_by_time<T: Mergeable>(records: &mut [T]) {
    records.sort_by_key(|r| r.instant().map(|t| t.timestamp_millis()).unwrap_or(0));
}

/// Sort and deduplicate `records`.
pub fn merge<T: Mergeable>(records: Vec<T>) -> Vec<T> {
    merge_with_stats(records).0
}

/// Sort and deduplicate `records`, reporting what was folded.
///
/// Records are stably sorted by instant, then grouped by [`dedup_key`]. The
/// first record of each key keeps its position and its present values; later
/// records only fill attributes it lacks.
pub fn merge_with_stats<T: Mergeable>(mut records: Vec<T>) -> (Vec<T>, MergeStats) {
    let mut stats = MergeStats {
        input: records.len(),
        ..MergeStats::default()
    };
    sort_by_time(&mut records);

    let mut out: Vec<T> = Vec::with_capacity(records.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for record in records {
        let instant = record.instant();
        if instant.is_none() {
            stats.untimed += 1;
        }
        let key = dedup_key(instant, out.len());
        match index.get(&key) {
            Some(&pos) => {
                let existing = &mut out[pos];
                stats.conflicts += existing.count_conflicts(&record);
                existing.fill_missing_from(&record);
                stats.merged += 1;
            }
            None => {
                index.insert(key, out.len());
                out.push(record);
            }
        }
    }

    stats.output = out.len();
    if stats.merged > 0 || stats.conflicts > 0 {
        debug!(
            input = stats.input,
            output = stats.output,
            merged = stats.merged,
            conflicts = stats.conflicts,
            "merged duplicate rows"
        );
    }
    (out, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CanonicalObservation, CanonicalTideEvent, ObservationField, TideType};
    use chrono::{Duration, TimeZone, Utc};

    fn at(h: u32, m: u32, s: u32) -> Option<Instant> {
        Some(Utc.with_ymd_and_hms(2024, 3, 5, h, m, s).unwrap())
    }

    fn obs(time: Option<Instant>) -> CanonicalObservation {
        CanonicalObservation::at(time)
    }

    #[test]
    fn test_merge_fills_missing_fields() {
        let rows = vec![
            obs(at(10, 0, 0)).with(ObservationField::Hs, 1.2),
            obs(at(10, 0, 0)).with(ObservationField::Tp, 8.0),
        ];
        let merged = merge(rows);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].hs, Some(1.2));
        assert_eq!(merged[0].tp, Some(8.0));
    }

    #[test]
    fn test_merge_first_wins_on_conflict() {
        let rows = vec![
            obs(at(10, 0, 0)).with(ObservationField::Hs, 1.2),
            obs(at(10, 0, 0)).with(ObservationField::Hs, 9.9),
        ];
        let (merged, stats) = merge_with_stats(rows);

        assert_eq!(merged[0].hs, Some(1.2));
        assert_eq!(stats.conflicts, 1);
        assert_eq!(stats.merged, 1);
    }

    #[test]
    fn test_merge_sorts_ascending() {
        let rows = vec![
            obs(at(12, 0, 0)).with(ObservationField::Hs, 3.0),
            obs(at(10, 0, 0)).with(ObservationField::Hs, 1.0),
            obs(at(11, 0, 0)).with(ObservationField::Hs, 2.0),
        ];
        let merged = merge(rows);
        let hs: Vec<_> = merged.iter().map(|o| o.hs.unwrap()).collect();
        assert_eq!(hs, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_merge_collapses_within_same_second() {
        let base = at(10, 0, 0).unwrap();
        let rows = vec![
            obs(Some(base + Duration::milliseconds(100))).with(ObservationField::Hs, 1.0),
            obs(Some(base + Duration::milliseconds(900))).with(ObservationField::Ws, 4.0),
            obs(Some(base + Duration::seconds(1))).with(ObservationField::Hs, 2.0),
        ];
        let merged = merge(rows);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].hs, Some(1.0));
        assert_eq!(merged[0].ws, Some(4.0));
        assert_eq!(merged[1].hs, Some(2.0));
    }

    #[test]
    fn test_merge_keeps_untimed_rows_separately() {
        let rows = vec![
            obs(at(10, 0, 0)).with(ObservationField::Hs, 1.0),
            obs(None).with(ObservationField::Hs, 5.0),
            obs(None).with(ObservationField::Hs, 6.0),
        ];
        let (merged, stats) = merge_with_stats(rows);

        assert_eq!(merged.len(), 3);
        assert_eq!(stats.untimed, 2);
        // untimed rows sort as the epoch, ahead of everything timed
        assert_eq!(merged[0].time, None);
        assert_eq!(merged[0].hs, Some(5.0));
        assert_eq!(merged[1].hs, Some(6.0));
        assert_eq!(merged[2].time, at(10, 0, 0));
    }

    #[test]
    fn test_merge_keys_are_unique_and_strictly_increasing() {
        let mut rows = Vec::new();
        for i in 0..50u32 {
            let t = at(10, (i * 7) % 60, (i * 13) % 60);
            rows.push(obs(t).with(ObservationField::Hs, i as f64));
        }
        let merged = merge(rows);

        let keys: Vec<_> = merged
            .iter()
            .enumerate()
            .map(|(i, o)| dedup_key(o.time, i))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let rows = vec![
            obs(at(11, 0, 0)).with(ObservationField::Hs, 2.0),
            obs(at(10, 0, 0)).with(ObservationField::Tp, 7.0),
            obs(at(10, 0, 0)).with(ObservationField::Hs, 1.0),
            obs(at(11, 0, 0)).with(ObservationField::Dp, 45.0),
        ];
        let once = merge(rows);
        let twice = merge(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_empty() {
        let (merged, stats) = merge_with_stats(Vec::<CanonicalObservation>::new());
        assert!(merged.is_empty());
        assert_eq!(stats, MergeStats::default());
    }

    #[test]
    fn test_merge_tide_events() {
        let rows = vec![
            CanonicalTideEvent {
                time: at(4, 12, 0),
                height: Some(1.3),
                kind: None,
            },
            CanonicalTideEvent {
                time: at(4, 12, 0),
                height: None,
                kind: Some(TideType::High),
            },
        ];
        let merged = merge(rows);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].height, Some(1.3));
        assert_eq!(merged[0].kind, Some(TideType::High));
    }

    #[test]
    fn test_dedup_key_format() {
        assert_eq!(dedup_key(at(4, 5, 6), 0), "2024-03-05T04:05:06");
        assert_eq!(dedup_key(None, 3), "row-3");
    }
}
