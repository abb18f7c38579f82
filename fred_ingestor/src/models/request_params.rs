use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters for an observation fetch against the gateway.
///
/// Omitted bounds mean "full available history" on the provider side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObservationRequest {
    pub series_id: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ObservationRequest {
    pub fn full_history(series_id: impl Into<String>) -> Self {
        Self {
            series_id: series_id.into(),
            start: None,
            end: None,
        }
    }

    pub fn windowed(
        series_id: impl Into<String>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        Self {
            series_id: series_id.into(),
            start,
            end,
        }
    }
}
