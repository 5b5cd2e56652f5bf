//! Wave and environmental observations.

use serde::{Deserialize, Serialize};

use crate::series::Mergeable;
use crate::time::Instant;

/// Numeric attributes of a [`CanonicalObservation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationField {
    /// Significant wave height (m)
    Hs,
    /// Wave period (s)
    Tp,
    /// Wave direction (degrees)
    Dp,
    /// Sea-surface temperature (°C)
    Sst,
    /// Air temperature (°C)
    Air,
    /// Wind speed (m/s)
    Ws,
    /// Wind direction (degrees)
    Wd,
}

impl ObservationField {
    pub const ALL: [ObservationField; 7] = [
        ObservationField::Hs,
        ObservationField::Tp,
        ObservationField::Dp,
        ObservationField::Sst,
        ObservationField::Air,
        ObservationField::Ws,
        ObservationField::Wd,
    ];

    /// Canonical key name
    pub fn name(self) -> &'static str {
        match self {
            ObservationField::Hs => "hs",
            ObservationField::Tp => "tp",
            ObservationField::Dp => "dp",
            ObservationField::Sst => "sst",
            ObservationField::Air => "air",
            ObservationField::Ws => "ws",
            ObservationField::Wd => "wd",
        }
    }

    /// Directions are kept in `[0, 360)`.
    pub fn is_direction(self) -> bool {
        matches!(self, ObservationField::Dp | ObservationField::Wd)
    }
}

/// One observation instant with every attribute optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalObservation {
    /// `None` when the source row had no parseable timestamp
    pub time: Option<Instant>,
    pub hs: Option<f64>,
    pub tp: Option<f64>,
    pub dp: Option<f64>,
    pub sst: Option<f64>,
    pub air: Option<f64>,
    pub ws: Option<f64>,
    pub wd: Option<f64>,
}

impl CanonicalObservation {
    /// Observation at `time` with no attributes set
    pub fn at(time: Option<Instant>) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    pub fn get(&self, field: ObservationField) -> Option<f64> {
        match field {
            ObservationField::Hs => self.hs,
            ObservationField::Tp => self.tp,
            ObservationField::Dp => self.dp,
            ObservationField::Sst => self.sst,
            ObservationField::Air => self.air,
            ObservationField::Ws => self.ws,
            ObservationField::Wd => self.wd,
        }
    }

    pub fn field_mut(&mut self, field: ObservationField) -> &mut Option<f64> {
        match field {
            ObservationField::Hs => &mut self.hs,
            ObservationField::Tp => &mut self.tp,
            ObservationField::Dp => &mut self.dp,
            ObservationField::Sst => &mut self.sst,
            ObservationField::Air => &mut self.air,
            ObservationField::Ws => &mut self.ws,
            ObservationField::Wd => &mut self.wd,
        }
    }

    /// Builder-style setter
    pub fn with(mut self, field: ObservationField, value: f64) -> Self {
        *self.field_mut(field) = Some(value);
        self
    }
}

impl Mergeable for CanonicalObservation {
    fn instant(&self) -> Option<Instant> {
        self.time
    }

    fn fill_missing_from(&mut self, other: &Self) {
        for field in ObservationField::ALL {
            let slot = self.field_mut(field);
            if slot.is_none() {
                *slot = other.get(field);
            }
        }
    }

    fn count_conflicts(&self, other: &Self) -> usize {
        ObservationField::ALL
            .iter()
            .filter(|field| match (self.get(**field), other.get(**field)) {
                (Some(a), Some(b)) => a != b,
                _ => false,
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_missing_keeps_present_values() {
        let mut first = CanonicalObservation::default()
            .with(ObservationField::Hs, 1.2)
            .with(ObservationField::Ws, 4.0);
        let second = CanonicalObservation::default()
            .with(ObservationField::Hs, 9.9)
            .with(ObservationField::Tp, 8.0);

        first.fill_missing_from(&second);

        assert_eq!(first.hs, Some(1.2));
        assert_eq!(first.tp, Some(8.0));
        assert_eq!(first.ws, Some(4.0));
        assert_eq!(first.dp, None);
    }

    #[test]
    fn test_count_conflicts_ignores_nulls_and_equal_values() {
        let a = CanonicalObservation::default()
            .with(ObservationField::Hs, 1.2)
            .with(ObservationField::Tp, 8.0)
            .with(ObservationField::Dp, 90.0);
        let b = CanonicalObservation::default()
            .with(ObservationField::Hs, 1.5)
            .with(ObservationField::Tp, 8.0);

        assert_eq!(a.count_conflicts(&b), 1);
    }

    #[test]
    fn test_field_names_are_canonical() {
        let names: Vec<_> = ObservationField::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["hs", "tp", "dp", "sst", "air", "ws", "wd"]);
        assert!(ObservationField::Wd.is_direction());
        assert!(!ObservationField::Ws.is_direction());
    }
}
