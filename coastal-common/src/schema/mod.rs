//! Canonical record shapes produced from upstream rows.
//!
//! Every upstream payload, whatever its key names, is mapped into one of these
//! fixed structures before ordering and deduplication.

mod observation;
mod tide;

pub use observation::{CanonicalObservation, ObservationField};
pub use tide::{CanonicalTideEvent, TideField, TideType, EBB_TERMS, FLOOD_TERMS, HIGH_TERMS, LOW_TERMS};
