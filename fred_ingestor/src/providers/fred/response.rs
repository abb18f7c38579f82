//! Raw response shapes of the FRED JSON API and their conversions into
//! the canonical models.
//!
//! FRED encodes observation values as strings and marks missing data with
//! a bare `"."`; dates are `YYYY-MM-DD` strings throughout.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::directory::{CategoryInfo, ReleaseInfo, SourceInfo};
use crate::models::observation::Observation;
use crate::models::series::{Frequency, SeriesMeta};
use crate::providers::errors::GatewayError;

/// Error body FRED returns alongside non-2xx statuses.
#[derive(Deserialize, Debug)]
pub struct FredErrorBody {
    pub error_code: i64,
    pub error_message: String,
}

#[derive(Deserialize, Debug)]
pub struct FredSeriesItem {
    pub id: String,
    pub title: String,
    pub units: String,
    pub frequency: String,
    pub seasonal_adjustment: String,
    pub observation_start: Option<String>,
    pub observation_end: Option<String>,
    pub popularity: Option<i64>,
    pub notes: Option<String>,
}

/// Both `fred/series` and `fred/series/search` wrap their items in a
/// `seriess` array (sic, the API's own spelling).
#[derive(Deserialize, Debug)]
pub struct SeriesEnvelope {
    pub seriess: Vec<FredSeriesItem>,
}

#[derive(Deserialize, Debug)]
pub struct ObservationItem {
    pub date: String,
    pub value: String,
}

#[derive(Deserialize, Debug)]
pub struct ObservationsEnvelope {
    pub observations: Vec<ObservationItem>,
}

#[derive(Deserialize, Debug)]
pub struct ReleaseItem {
    pub id: i64,
    pub name: String,
    pub press_release: Option<bool>,
    pub link: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ReleasesEnvelope {
    pub releases: Vec<ReleaseItem>,
}

#[derive(Deserialize, Debug)]
pub struct CategoryItem {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
}

#[derive(Deserialize, Debug)]
pub struct CategoriesEnvelope {
    pub categories: Vec<CategoryItem>,
}

#[derive(Deserialize, Debug)]
pub struct SourceItem {
    pub id: i64,
    pub name: String,
    pub link: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct SourcesEnvelope {
    pub sources: Vec<SourceItem>,
}

fn parse_date(raw: &str) -> Result<NaiveDate, GatewayError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| GatewayError::Decode(format!("bad date {raw:?}: {e}")))
}

fn parse_date_opt(raw: &Option<String>) -> Result<Option<NaiveDate>, GatewayError> {
    raw.as_deref().map(parse_date).transpose()
}

impl FredSeriesItem {
    pub fn into_meta(self) -> Result<SeriesMeta, GatewayError> {
        Ok(SeriesMeta {
            frequency: Frequency::parse(&self.frequency),
            observation_start: parse_date_opt(&self.observation_start)?,
            observation_end: parse_date_opt(&self.observation_end)?,
            id: self.id,
            title: self.title,
            units: self.units,
            seasonal_adjustment: self.seasonal_adjustment,
            popularity: self.popularity,
            notes: self.notes,
        })
    }
}

impl ObservationItem {
    /// `"."` and the empty string are the provider's missing markers;
    /// anything else must parse as a float.
    pub fn into_observation(self) -> Result<Observation, GatewayError> {
        let date = parse_date(&self.date)?;
        let value = match self.value.trim() {
            "." | "" => None,
            raw => Some(raw.parse::<f64>().map_err(|e| {
                GatewayError::Decode(format!("bad value {raw:?} at {date}: {e}"))
            })?),
        };
        Ok(Observation { date, value })
    }
}

impl From<ReleaseItem> for ReleaseInfo {
    fn from(item: ReleaseItem) -> Self {
        ReleaseInfo {
            id: item.id,
            name: item.name,
            press_release: item.press_release,
            link: item.link,
        }
    }
}

impl From<CategoryItem> for CategoryInfo {
    fn from(item: CategoryItem) -> Self {
        CategoryInfo {
            id: item.id,
            name: item.name,
            parent_id: item.parent_id,
        }
    }
}

impl From<SourceItem> for SourceInfo {
    fn from(item: SourceItem) -> Self {
        SourceInfo {
            id: item.id,
            name: item.name,
            link: item.link,
        }
    }
}
