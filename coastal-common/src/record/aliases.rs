//! Accepted source spellings for every canonical field.

use crate::schema::{ObservationField, TideField};

/// Ordered source aliases for one canonical field; the first alias present wins.
#[derive(Debug, Clone, Copy)]
pub struct FieldAliases<F: 'static> {
    pub field: F,
    pub aliases: &'static [&'static str],
}

pub const OBSERVATION_ALIASES: &[FieldAliases<ObservationField>] = &[
    FieldAliases {
        field: ObservationField::Hs,
        aliases: &["hs", "waveHeight", "wave_height"],
    },
    FieldAliases {
        field: ObservationField::Tp,
        aliases: &["tp", "wavePeriod", "wave_period"],
    },
    FieldAliases {
        field: ObservationField::Dp,
        aliases: &["dp", "waveDirection", "wave_direction"],
    },
    FieldAliases {
        field: ObservationField::Sst,
        aliases: &["sst", "waterTemperature", "water_temperature"],
    },
    FieldAliases {
        field: ObservationField::Air,
        aliases: &["air_temp", "airTemperature", "air"],
    },
    FieldAliases {
        field: ObservationField::Ws,
        aliases: &["wind_speed", "windSpeed", "ws"],
    },
    FieldAliases {
        field: ObservationField::Wd,
        aliases: &["wind_dir", "windDirection", "wd"],
    },
];

pub const TIDE_ALIASES: &[FieldAliases<TideField>] = &[
    FieldAliases {
        field: TideField::Height,
        aliases: &["height", "tide", "value", "level"],
    },
    FieldAliases {
        field: TideField::Kind,
        aliases: &["type", "event", "tide_type", "kind"],
    },
];

/// Timestamp keys in preference order.
pub const TIME_KEYS: &[&str] = &[
    "ts",
    "timestamp",
    "datetime",
    "time",
    "date_time",
    "datetime_utc",
    "time_utc",
    "dt",
    "epoch",
    "ts_epoch",
];

/// Keys holding a calendar date when time-of-day is split out.
pub const DATE_PART_KEYS: &[&str] = &["date", "day", "data"];
pub const HOUR_KEYS: &[&str] = &["hour", "hora", "hh", "hours"];
pub const MINUTE_KEYS: &[&str] = &["minute", "minuto", "min", "mm", "minutes"];
pub const SECOND_KEYS: &[&str] = &["second", "segundo", "sec", "ss", "seconds"];

/// Aliases registered for `field`, empty when the table has no entry.
pub fn aliases_for<F: PartialEq + Copy>(table: &[FieldAliases<F>], field: F) -> &'static [&'static str] {
    table
        .iter()
        .find(|entry| entry.field == field)
        .map(|entry| entry.aliases)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_observation_field_has_aliases() {
        for field in ObservationField::ALL {
            let aliases = aliases_for(OBSERVATION_ALIASES, field);
            assert!(!aliases.is_empty(), "{} has no aliases", field.name());
        }
    }

    #[test]
    fn test_canonical_spelling_comes_first() {
        assert_eq!(aliases_for(OBSERVATION_ALIASES, ObservationField::Hs)[0], "hs");
        assert_eq!(aliases_for(OBSERVATION_ALIASES, ObservationField::Ws)[0], "wind_speed");
        assert_eq!(aliases_for(TIDE_ALIASES, TideField::Height)[0], "height");
        assert_eq!(aliases_for(TIDE_ALIASES, TideField::Kind)[0], "type");
    }
}
