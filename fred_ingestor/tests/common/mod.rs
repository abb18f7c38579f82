//! Shared test fixtures: an in-memory provider and series builders.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use indexmap::IndexMap;

use fred_ingestor::models::directory::{CategoryInfo, ReleaseInfo, SourceInfo};
use fred_ingestor::models::observation::Observation;
use fred_ingestor::models::request_params::ObservationRequest;
use fred_ingestor::models::series::{Frequency, Series, SeriesMeta};
use fred_ingestor::providers::{GatewayError, SeriesProvider};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn meta(id: &str) -> SeriesMeta {
    SeriesMeta {
        id: id.to_string(),
        title: format!("{id} test series"),
        units: "Percent".to_string(),
        frequency: Frequency::Monthly,
        seasonal_adjustment: "Not Seasonally Adjusted".to_string(),
        observation_start: None,
        observation_end: None,
        popularity: None,
        notes: None,
    }
}

pub fn series(id: &str, rows: &[(NaiveDate, Option<f64>)]) -> Series {
    Series {
        meta: meta(id),
        observations: rows
            .iter()
            .map(|(d, v)| Observation::new(*d, *v))
            .collect(),
    }
}

/// Monthly series starting at `start`, one value per entry.
pub fn monthly_series(id: &str, start: NaiveDate, values: &[f64]) -> Series {
    let rows: Vec<(NaiveDate, Option<f64>)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let months = start.month0() + i as u32;
            let year = start.year() + (months / 12) as i32;
            (
                NaiveDate::from_ymd_opt(year, months % 12 + 1, 1).unwrap(),
                Some(*v),
            )
        })
        .collect();
    series(id, &rows)
}

/// An in-memory provider serving a fixed set of series. Unknown ids are
/// `NotFound`; directory endpoints serve nothing.
pub struct StaticProvider {
    pub series: IndexMap<String, Series>,
}

impl StaticProvider {
    pub fn new(entries: Vec<Series>) -> Self {
        Self {
            series: entries
                .into_iter()
                .map(|s| (s.meta.id.clone(), s))
                .collect(),
        }
    }
}

#[async_trait]
impl SeriesProvider for StaticProvider {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SeriesMeta>, GatewayError> {
        Ok(self
            .series
            .values()
            .filter(|s| s.meta.id.contains(text) || s.meta.title.contains(text))
            .take(limit)
            .map(|s| s.meta.clone())
            .collect())
    }

    async fn series_meta(&self, series_id: &str) -> Result<SeriesMeta, GatewayError> {
        self.series
            .get(series_id)
            .map(|s| s.meta.clone())
            .ok_or_else(|| GatewayError::NotFound {
                series_id: series_id.to_string(),
            })
    }

    async fn observations(&self, req: &ObservationRequest) -> Result<Series, GatewayError> {
        let series = self
            .series
            .get(&req.series_id)
            .ok_or_else(|| GatewayError::NotFound {
                series_id: req.series_id.clone(),
            })?;
        let observations = series
            .observations
            .iter()
            .filter(|o| req.start.is_none_or(|s| o.date >= s))
            .filter(|o| req.end.is_none_or(|e| o.date <= e))
            .copied()
            .collect();
        Ok(Series {
            meta: series.meta.clone(),
            observations,
        })
    }

    async fn releases(&self) -> Result<Vec<ReleaseInfo>, GatewayError> {
        Ok(Vec::new())
    }

    async fn release_details(&self, release_id: i64) -> Result<ReleaseInfo, GatewayError> {
        Err(GatewayError::NotFound {
            series_id: release_id.to_string(),
        })
    }

    async fn category_details(&self, category_id: i64) -> Result<CategoryInfo, GatewayError> {
        Err(GatewayError::NotFound {
            series_id: category_id.to_string(),
        })
    }

    async fn sources(&self) -> Result<Vec<SourceInfo>, GatewayError> {
        Ok(Vec::new())
    }
}
