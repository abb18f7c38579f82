//! Canonical in-memory representation of a single time-series observation.
//!
//! This struct is the standard output unit for the gateway, regardless of
//! the upstream series' frequency or units.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single dated observation.
///
/// Values marked missing by the upstream provider are `None`, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar day of the observation.
    pub date: NaiveDate,
    /// Observed value, or `None` when the provider reported it missing.
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}
