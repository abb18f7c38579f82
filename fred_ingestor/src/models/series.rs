//! A complete series: metadata plus its ordered observations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::observation::Observation;

/// Violations of the series ordering invariant.
#[derive(Debug, Error)]
pub enum SeriesIntegrityError {
    #[error("Series {series_id}: observations not strictly ascending at {date}")]
    OutOfOrder { series_id: String, date: NaiveDate },

    #[error("Series {series_id}: duplicate observation date {date}")]
    DuplicateDate { series_id: String, date: NaiveDate },
}

/// Native reporting frequency of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
    Irregular,
}

impl Frequency {
    /// Maps FRED's human-readable frequency strings ("Monthly",
    /// "Quarterly, End of Period", ...) onto the canonical enum. Anything
    /// unrecognized is `Irregular`.
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("daily") {
            Frequency::Daily
        } else if lower.starts_with("weekly") || lower.starts_with("biweekly") {
            Frequency::Weekly
        } else if lower.starts_with("monthly") {
            Frequency::Monthly
        } else if lower.starts_with("quarterly") {
            Frequency::Quarterly
        } else if lower.starts_with("annual") || lower.starts_with("semiannual") {
            Frequency::Annual
        } else {
            Frequency::Irregular
        }
    }
}

/// Descriptive metadata for a series, as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesMeta {
    pub id: String,
    pub title: String,
    pub units: String,
    pub frequency: Frequency,
    pub seasonal_adjustment: String,
    pub observation_start: Option<NaiveDate>,
    pub observation_end: Option<NaiveDate>,
    pub popularity: Option<i64>,
    pub notes: Option<String>,
}

/// A self-describing set of observations for one series.
#[derive(Debug, Clone)]
pub struct Series {
    pub meta: SeriesMeta,
    pub observations: Vec<Observation>,
}

impl Series {
    /// Checks the ordering invariant: dates strictly ascending, no
    /// duplicates. The gateway runs this on every decoded response.
    pub fn check_integrity(&self) -> Result<(), SeriesIntegrityError> {
        for pair in self.observations.windows(2) {
            if pair[1].date == pair[0].date {
                return Err(SeriesIntegrityError::DuplicateDate {
                    series_id: self.meta.id.clone(),
                    date: pair[1].date,
                });
            }
            if pair[1].date < pair[0].date {
                return Err(SeriesIntegrityError::OutOfOrder {
                    series_id: self.meta.id.clone(),
                    date: pair[1].date,
                });
            }
        }
        Ok(())
    }

    /// First observation date, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.first().map(|o| o.date)
    }

    /// Last observation date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|o| o.date)
    }
}
