use chrono::{Local, TimeZone};
use tracing::trace;

use super::aliases::{OBSERVATION_ALIASES, TIDE_ALIASES};
use super::extract::{extract_time, lookup_alias};
use super::values::{as_f64, as_text};
use super::RawRecord;
use crate::schema::{CanonicalObservation, CanonicalTideEvent, TideField, TideType};
use crate::time::{Instant, TimeParser};

/// Maps raw rows into canonical records.
///
/// Naive timestamps are interpreted in the mapper's time zone.
#[derive(Debug, Clone)]
pub struct RecordMapper<Tz: TimeZone = Local> {
    parser: TimeParser<Tz>,
}

impl RecordMapper<Local> {
    pub fn local() -> Self {
        Self::new(TimeParser::local())
    }
}

impl Default for RecordMapper<Local> {
    fn default() -> Self {
        Self::local()
    }
}

impl<Tz: TimeZone> RecordMapper<Tz> {
    pub fn new(parser: TimeParser<Tz>) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &TimeParser<Tz> {
        &self.parser
    }

    /// Timestamp of a row, if one can be located and parsed.
    pub fn instant_of(&self, record: &RawRecord) -> Option<Instant> {
        extract_time(record).and_then(|raw| self.parser.parse(&raw))
    }

    pub fn map_observation(&self, record: &RawRecord) -> CanonicalObservation {
        let mut observation = CanonicalObservation::at(self.instant_of(record));
        for entry in OBSERVATION_ALIASES {
            let value = lookup_alias(record, entry.aliases).and_then(as_f64);
            *observation.field_mut(entry.field) = if entry.field.is_direction() {
                value.map(|deg| deg.rem_euclid(360.0))
            } else {
                value
            };
        }
        if observation.time.is_none() {
            trace!(keys = record.len(), "observation row without usable timestamp");
        }
        observation
    }

    pub fn map_tide_event(&self, record: &RawRecord) -> CanonicalTideEvent {
        let mut event = CanonicalTideEvent {
            time: self.instant_of(record),
            ..CanonicalTideEvent::default()
        };
        for entry in TIDE_ALIASES {
            let raw = lookup_alias(record, entry.aliases);
            match entry.field {
                TideField::Height => event.height = raw.and_then(as_f64),
                TideField::Kind => {
                    event.kind = raw.and_then(as_text).and_then(|s| TideType::normalize(&s))
                }
            }
        }
        event
    }

    pub fn map_observations(&self, rows: &[RawRecord]) -> Vec<CanonicalObservation> {
        rows.iter().map(|row| self.map_observation(row)).collect()
    }

    pub fn map_tide_events(&self, rows: &[RawRecord]) -> Vec<CanonicalTideEvent> {
        rows.iter().map(|row| self.map_tide_event(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};
    use serde_json::{json, Value};

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn utc_mapper() -> RecordMapper<Utc> {
        RecordMapper::new(TimeParser::new(Utc))
    }

    #[test]
    fn test_camel_case_aliases() {
        let r = record(json!({
            "timestamp": "2024-03-05T10:00:00Z",
            "waveHeight": 1.4,
            "wavePeriod": "9.5",
            "waveDirection": 135,
            "waterTemperature": 24.1,
            "airTemperature": 27,
            "windSpeed": 5.5,
            "windDirection": 90
        }));
        let obs = utc_mapper().map_observation(&r);

        assert_eq!(obs.time, Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()));
        assert_eq!(obs.hs, Some(1.4));
        assert_eq!(obs.tp, Some(9.5));
        assert_eq!(obs.dp, Some(135.0));
        assert_eq!(obs.sst, Some(24.1));
        assert_eq!(obs.air, Some(27.0));
        assert_eq!(obs.ws, Some(5.5));
        assert_eq!(obs.wd, Some(90.0));
    }

    #[test]
    fn test_first_present_alias_wins_even_when_null() {
        let r = record(json!({"ts": 1700000000, "hs": null, "waveHeight": 2.0}));
        let obs = utc_mapper().map_observation(&r);
        assert_eq!(obs.hs, None);
    }

    #[test]
    fn test_unparseable_values_are_absent() {
        let r = record(json!({"ts": 1700000000, "hs": "calm", "tp": [], "wind_speed": {}}));
        let obs = utc_mapper().map_observation(&r);
        assert_eq!(obs.hs, None);
        assert_eq!(obs.tp, None);
        assert_eq!(obs.ws, None);
    }

    #[test]
    fn test_directions_wrap_into_circle() {
        let r = record(json!({"dp": 360, "wd": -90}));
        let obs = utc_mapper().map_observation(&r);
        assert_eq!(obs.dp, Some(0.0));
        assert_eq!(obs.wd, Some(270.0));
    }

    #[test]
    fn test_missing_time_is_none() {
        let r = record(json!({"hs": 1.0}));
        assert_eq!(utc_mapper().map_observation(&r).time, None);

        let r = record(json!({"ts": "yesterday-ish", "hs": 1.0}));
        assert_eq!(utc_mapper().map_observation(&r).time, None);
    }

    #[test]
    fn test_naive_time_uses_mapper_zone() {
        let rio = FixedOffset::west_opt(3 * 3600).unwrap();
        let mapper = RecordMapper::new(TimeParser::new(rio));
        let r = record(json!({"date": "2024-03-05", "hour": 9, "hs": 1.0}));
        assert_eq!(
            mapper.map_observation(&r).time,
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_tide_event_aliases() {
        let r = record(json!({"datetime": "2024-03-05T04:12:00Z", "tide": "1.23", "event": "Preamar"}));
        let event = utc_mapper().map_tide_event(&r);
        assert_eq!(event.height, Some(1.23));
        assert_eq!(event.kind, Some(TideType::High));
        assert!(event.time.is_some());

        let r = record(json!({"time": 1700000000, "value": 0.3, "type": "low"}));
        let event = utc_mapper().map_tide_event(&r);
        assert_eq!(event.height, Some(0.3));
        assert_eq!(event.kind, Some(TideType::Low));
    }

    #[test]
    fn test_tide_reading_without_type() {
        let r = record(json!({"ts": 1700000000, "height": 0.8}));
        let event = utc_mapper().map_tide_event(&r);
        assert_eq!(event.kind, None);
        assert_eq!(event.height, Some(0.8));
    }
}
