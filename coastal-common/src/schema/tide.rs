//! Tide events and tide-type vocabulary.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::series::Mergeable;
use crate::time::Instant;

/// Substrings that classify a tide as high water (English and Portuguese).
pub const HIGH_TERMS: &[&str] = &["high", "alta", "preamar", "prea-mar", "preámar", "preá-mar"];
/// Substrings that classify a tide as low water.
pub const LOW_TERMS: &[&str] = &["low", "baixa", "baixamar", "baixámar", "baixá-mar"];
/// Substrings that classify an ebbing (falling) tide.
pub const EBB_TERMS: &[&str] = &["ebb", "vazante"];
/// Substrings that classify a flooding (rising) tide.
pub const FLOOD_TERMS: &[&str] = &["flood", "enchente"];

/// Tide classification after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TideType {
    High,
    Low,
    Ebb,
    Flood,
    /// Unrecognized label, first letter capitalized
    Other(String),
}

impl TideType {
    /// Classify a raw upstream label.
    ///
    /// Matching is a case-insensitive substring search, high-water terms
    /// first. Blank input yields `None`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        let contains_any = |terms: &[&str]| terms.iter().any(|t| lower.contains(t));

        let kind = if contains_any(HIGH_TERMS) {
            TideType::High
        } else if contains_any(LOW_TERMS) {
            TideType::Low
        } else if contains_any(EBB_TERMS) {
            TideType::Ebb
        } else if contains_any(FLOOD_TERMS) {
            TideType::Flood
        } else {
            TideType::Other(capitalize(trimmed))
        };
        Some(kind)
    }

    /// High or low water, the events charts annotate.
    pub fn is_extreme(&self) -> bool {
        matches!(self, TideType::High | TideType::Low)
    }

    pub fn label(&self) -> &str {
        match self {
            TideType::High => "High",
            TideType::Low => "Low",
            TideType::Ebb => "Ebb",
            TideType::Flood => "Flood",
            TideType::Other(s) => s,
        }
    }
}

impl fmt::Display for TideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for TideType {
    fn from(value: String) -> Self {
        TideType::normalize(&value).unwrap_or(TideType::Other(value))
    }
}

impl From<TideType> for String {
    fn from(value: TideType) -> Self {
        value.label().to_string()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Attributes of a [`CanonicalTideEvent`] that come from upstream aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TideField {
    Height,
    Kind,
}

impl TideField {
    pub fn name(self) -> &'static str {
        match self {
            TideField::Height => "height",
            TideField::Kind => "type",
        }
    }
}

/// One tide reading or high/low event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalTideEvent {
    pub time: Option<Instant>,
    /// Tide height (m)
    pub height: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<TideType>,
}

impl Mergeable for CanonicalTideEvent {
    fn instant(&self) -> Option<Instant> {
        self.time
    }

    fn fill_missing_from(&mut self, other: &Self) {
        if self.height.is_none() {
            self.height = other.height;
        }
        if self.kind.is_none() {
            self.kind = other.kind.clone();
        }
    }

    fn count_conflicts(&self, other: &Self) -> usize {
        let height = matches!((self.height, other.height), (Some(a), Some(b)) if a != b);
        let kind = matches!((&self.kind, &other.kind), (Some(a), Some(b)) if a != b);
        usize::from(height) + usize::from(kind)
    }
}
