//! Provider abstraction for economic time-series sources.
//!
//! This module defines the [`SeriesProvider`] trait, a unified interface
//! for fetching series metadata, observations, and directory records from
//! an upstream vendor. The concrete [`fred::FredProvider`] talks to the
//! St. Louis Fed API; tests substitute in-memory implementations.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`Arc<dyn SeriesProvider>`) so the dataset builder and plot service do
//! not care where observations come from.

pub mod errors;
pub mod fred;

use async_trait::async_trait;

pub use errors::GatewayError;

use crate::models::directory::{CategoryInfo, ReleaseInfo, SourceInfo};
use crate::models::request_params::ObservationRequest;
use crate::models::series::{Series, SeriesMeta};

#[async_trait]
pub trait SeriesProvider: Send + Sync {
    /// Full-text search over series, at most `limit` results.
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SeriesMeta>, GatewayError>;

    /// Metadata for a single series.
    async fn series_meta(&self, series_id: &str) -> Result<SeriesMeta, GatewayError>;

    /// Observations for a series within an optional window. An empty
    /// window is an empty series, not an error.
    async fn observations(&self, req: &ObservationRequest) -> Result<Series, GatewayError>;

    /// All releases known to the provider.
    async fn releases(&self) -> Result<Vec<ReleaseInfo>, GatewayError>;

    /// A single release by id.
    async fn release_details(&self, release_id: i64) -> Result<ReleaseInfo, GatewayError>;

    /// A single category by id.
    async fn category_details(&self, category_id: i64) -> Result<CategoryInfo, GatewayError>;

    /// All originating sources.
    async fn sources(&self) -> Result<Vec<SourceInfo>, GatewayError>;
}
