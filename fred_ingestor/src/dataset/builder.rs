//! Multi-series fetch, alignment, transformation, and artifact emission.
//!
//! A build fans out gateway fetches under a concurrency cap, merges the
//! resulting columns on the Date index, applies transformations on the
//! post-merge index, and emits CSV + XLSX + metadata sidecar. The sidecar
//! is written last and is the commit marker; if a build is cancelled
//! mid-write the partial CSV/XLSX are removed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use futures::StreamExt;
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::dataset::metadata::{DatasetMetadata, write_sidecar};
use crate::io::csv_sink::CsvSink;
use crate::io::sink::{SinkError, TableSink};
use crate::io::xlsx_sink::XlsxSink;
use crate::models::request_params::ObservationRequest;
use crate::models::series::Series;
use crate::models::table::{DataTable, MergeStrategy, TableError};
use crate::models::transformation::Transformation;
use crate::providers::{GatewayError, SeriesProvider};
use crate::transform;

/// Observed window of one fetched series, used to describe why an inner
/// merge came up empty.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesWindow {
    pub series_id: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// One per-series gateway failure, reported inside the success payload
/// as long as at least one series succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesFailure {
    pub series_id: String,
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("series_list must not be empty")]
    EmptySeriesList,

    #[error("Duplicate series id in series_list: {series_id}")]
    DuplicateSeries { series_id: String },

    #[error("Transformation references a series not in series_list: {series_id}")]
    UnknownTransformTarget { series_id: String },

    #[error("All series failed to fetch")]
    AllSeriesFailed { failures: Vec<SeriesFailure> },

    #[error("Merge produced no rows; observation windows do not overlap")]
    EmptyIntersection { windows: Vec<SeriesWindow> },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl BuildError {
    /// Stable kind string for protocol error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::EmptySeriesList | BuildError::UnknownTransformTarget { .. } => {
                "invalid_params"
            }
            BuildError::DuplicateSeries { .. } => "duplicate_series",
            BuildError::AllSeriesFailed { .. } => "upstream_unavailable",
            BuildError::EmptyIntersection { .. } => "empty_intersection",
            BuildError::Table(_) | BuildError::Sink(_) => "internal",
        }
    }
}

/// Inputs for one dataset build.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub series_list: Vec<String>,
    /// Missing entries default to `none`.
    pub transformations: IndexMap<String, Transformation>,
    pub observation_start: Option<NaiveDate>,
    pub observation_end: Option<NaiveDate>,
    pub merge_strategy: MergeStrategy,
}

/// Result payload of a successful build.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    pub name: String,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    pub metadata_path: PathBuf,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub observation_start: Option<NaiveDate>,
    pub observation_end: Option<NaiveDate>,
    pub merge_strategy: MergeStrategy,
    pub series_ok: Vec<String>,
    pub series_failed: Vec<SeriesFailure>,
}

pub struct DatasetBuilder {
    provider: Arc<dyn SeriesProvider>,
    root: PathBuf,
    fetch_concurrency: usize,
    /// Per-basename write locks; writes to one dataset folder serialize,
    /// builds of different datasets proceed in parallel.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl DatasetBuilder {
    pub fn new(
        provider: Arc<dyn SeriesProvider>,
        root: impl Into<PathBuf>,
        fetch_concurrency: usize,
    ) -> Self {
        Self {
            provider,
            root: root.into(),
            fetch_concurrency: fetch_concurrency.max(1),
            locks: DashMap::new(),
        }
    }

    pub async fn build(&self, request: BuildRequest) -> Result<DatasetSummary, BuildError> {
        self.build_at(request, Utc::now()).await
    }

    /// Build with an explicit clock, so tests get stable stamps.
    pub async fn build_at(
        &self,
        request: BuildRequest,
        now: DateTime<Utc>,
    ) -> Result<DatasetSummary, BuildError> {
        validate_request(&request)?;

        let (fetched, failures) = self.fetch_all(&request).await;
        if fetched.is_empty() {
            return Err(BuildError::AllSeriesFailed { failures });
        }

        let windows: Vec<SeriesWindow> = fetched
            .iter()
            .map(|(id, series)| SeriesWindow {
                series_id: id.clone(),
                start: series.first_date(),
                end: series.last_date(),
            })
            .collect();

        let tables: Vec<DataTable> = fetched
            .iter()
            .map(|(id, series)| DataTable::from_series(id.clone(), series))
            .collect();
        let mut table = DataTable::merge(tables, request.merge_strategy)?;

        // Transformations honor the post-merge index: lookback is counted
        // in merged rows, not in the series' native frequency.
        for (id, _) in &fetched {
            let tag = request
                .transformations
                .get(id)
                .copied()
                .unwrap_or(Transformation::None);
            if tag == Transformation::None {
                continue;
            }
            let values = table
                .columns
                .get(id)
                .expect("merged column exists for fetched series");
            let transformed = transform::apply(tag, values);
            table.replace_column(id, tag.column_name(id), transformed)?;
        }

        table.drop_null_edges();
        if table.is_empty() {
            return Err(BuildError::EmptyIntersection { windows });
        }

        let series_ok: Vec<String> = fetched.iter().map(|(id, _)| id.clone()).collect();
        let name = dataset_name(&series_ok);
        let (observation_start, observation_end) = match table.window() {
            Some((s, e)) => (Some(s), Some(e)),
            None => (None, None),
        };

        let dir = self.root.join(&name);
        let stamp = now.date_naive().format("%Y%m%d").to_string();
        let file_base = format!(
            "{name}_{}_to_{}_built_{stamp}",
            observation_start
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            observation_end
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        );
        let csv_path = dir.join(format!("{file_base}.csv"));
        let xlsx_path = dir.join(format!("{file_base}.xlsx"));
        let metadata_path = dir.join(format!("{name}_metadata_{stamp}.json"));

        let transformations: IndexMap<String, Transformation> = series_ok
            .iter()
            .map(|id| {
                (
                    id.clone(),
                    request
                        .transformations
                        .get(id)
                        .copied()
                        .unwrap_or(Transformation::None),
                )
            })
            .collect();

        let metadata = DatasetMetadata {
            name: name.clone(),
            series_list: series_ok.clone(),
            transformations,
            observation_start,
            observation_end,
            merge_strategy: request.merge_strategy,
            created_at: now,
            csv_path: csv_path.clone(),
            xlsx_path: xlsx_path.clone(),
            columns: table.column_names(),
            row_count: table.row_count(),
        };

        // Serialize writers per basename; the guard removes partial
        // artifacts if this future is dropped before the sidecar commit.
        let lock = self
            .locks
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _held = lock.lock().await;

        let mut guard = CommitGuard::new(vec![csv_path.clone(), xlsx_path.clone()]);
        CsvSink::new(csv_path.clone()).write_table(&table).await?;
        XlsxSink::new(xlsx_path.clone()).write_table(&table).await?;
        write_sidecar(&metadata_path, &metadata)?;
        guard.commit();

        tracing::info!(
            dataset = %name,
            rows = table.row_count(),
            columns = table.columns.len(),
            failed = failures.len(),
            "dataset built"
        );

        Ok(DatasetSummary {
            name,
            csv_path,
            xlsx_path,
            metadata_path,
            columns: table.column_names(),
            row_count: table.row_count(),
            observation_start,
            observation_end,
            merge_strategy: request.merge_strategy,
            series_ok,
            series_failed: failures,
        })
    }

    /// Fetches every requested series with bounded fan-out, preserving the
    /// caller's order among successes. Failures are collected, not fatal.
    async fn fetch_all(
        &self,
        request: &BuildRequest,
    ) -> (Vec<(String, Series)>, Vec<SeriesFailure>) {
        let cap = self.fetch_concurrency.min(request.series_list.len()).max(1);
        let mut results: Vec<(usize, String, Result<Series, GatewayError>)> =
            futures::stream::iter(request.series_list.iter().cloned().enumerate().map(
                |(idx, series_id)| {
                    let provider = Arc::clone(&self.provider);
                    let req = ObservationRequest::windowed(
                        series_id.clone(),
                        request.observation_start,
                        request.observation_end,
                    );
                    async move {
                        let outcome = provider.observations(&req).await;
                        (idx, series_id, outcome)
                    }
                },
            ))
            .buffer_unordered(cap)
            .collect()
            .await;
        results.sort_by_key(|(idx, _, _)| *idx);

        let mut fetched = Vec::new();
        let mut failures = Vec::new();
        for (_, series_id, outcome) in results {
            match outcome {
                Ok(series) => fetched.push((series_id, series)),
                Err(err) => {
                    tracing::warn!(series_id = %series_id, error = %err, "series fetch failed");
                    failures.push(SeriesFailure {
                        series_id,
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    });
                }
            }
        }
        (fetched, failures)
    }
}

fn validate_request(request: &BuildRequest) -> Result<(), BuildError> {
    if request.series_list.is_empty() {
        return Err(BuildError::EmptySeriesList);
    }
    let mut seen = std::collections::HashSet::new();
    for id in &request.series_list {
        if !seen.insert(id.as_str()) {
            return Err(BuildError::DuplicateSeries {
                series_id: id.clone(),
            });
        }
    }
    for id in request.transformations.keys() {
        if !seen.contains(id.as_str()) {
            return Err(BuildError::UnknownTransformTarget {
                series_id: id.clone(),
            });
        }
    }
    Ok(())
}

/// Canonical dataset basename: `FRED_dataset_` + ids in caller order.
pub fn dataset_name(series_ids: &[String]) -> String {
    format!("FRED_dataset_{}", series_ids.join("_"))
}

/// Removes the listed files on drop unless the sidecar write committed.
struct CommitGuard {
    paths: Vec<PathBuf>,
    committed: bool,
}

impl CommitGuard {
    fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for CommitGuard {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for path in &self.paths {
            if let Err(err) = remove_if_present(path) {
                tracing::warn!(path = %path.display(), error = %err, "failed to clean partial artifact");
            }
        }
    }
}

fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
