use crate::schema::CanonicalTideEvent;
use crate::time::Instant;

/// Timed events that carry a tide type, in input order.
pub fn tide_extremes(events: &[CanonicalTideEvent]) -> Vec<&CanonicalTideEvent> {
    events
        .iter()
        .filter(|e| e.time.is_some() && e.kind.is_some())
        .collect()
}

/// The next `count` typed events at or after `now`, earliest first.
pub fn upcoming_tide_events(events: &[CanonicalTideEvent], now: Instant, count: usize) -> Vec<&CanonicalTideEvent> {
    let mut upcoming: Vec<_> = events
        .iter()
        .filter(|e| e.kind.is_some() && e.time.is_some_and(|t| t >= now))
        .collect();
    upcoming.sort_by_key(|e| e.time);
    upcoming.truncate(count);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TideType;
    use chrono::{TimeZone, Utc};

    fn event(hour: u32, kind: Option<TideType>) -> CanonicalTideEvent {
        CanonicalTideEvent {
            time: Some(Utc.with_ymd_and_hms(2024, 3, 5, hour, 0, 0).unwrap()),
            height: Some(1.0),
            kind,
        }
    }

    #[test]
    fn test_upcoming_skips_past_and_untyped() {
        let events = vec![
            event(2, Some(TideType::Low)),
            event(8, Some(TideType::High)),
            event(9, None),
            event(20, Some(TideType::High)),
            event(14, Some(TideType::Low)),
        ];
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 8, 0, 0).unwrap();
        let next = upcoming_tide_events(&events, now, 2);

        assert_eq!(next.len(), 2);
        assert_eq!(next[0].kind, Some(TideType::High));
        assert_eq!(next[1].kind, Some(TideType::Low));
    }

    #[test]
    fn test_extremes_are_typed_events() {
        let events = vec![
            event(2, Some(TideType::Low)),
            event(5, Some(TideType::Flood)),
            event(8, Some(TideType::High)),
            event(9, None),
        ];
        let extremes = tide_extremes(&events);
        assert_eq!(extremes.len(), 3);
        assert_eq!(extremes[1].kind, Some(TideType::Flood));

        let untimed = CanonicalTideEvent {
            time: None,
            height: None,
            kind: Some(TideType::High),
        };
        assert!(tide_extremes(&[untimed]).is_empty());
    }
}
