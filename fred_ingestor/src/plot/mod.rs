//! The plot service: single-series, dual-axis, differencing-analysis, and
//! dataset-column plot generators.
//!
//! Every operation returns the set of file paths it wrote, never image
//! bytes. Network fetches piggyback the series store so a plotted window
//! always has its CSV/XLSX export next to it; `plot_from_dataset` is the
//! one operation that must not touch the network at all.

pub mod adf;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use plotters::style::{BLUE, RED};
use serde::Serialize;
use thiserror::Error;

use crate::dataset::catalog::{CatalogEntry, DatasetCatalog};
use crate::io::csv_sink::{read_table_csv, write_table_csv};
use crate::io::sink::SinkError;
use crate::io::xlsx_sink::write_table_xlsx;
use crate::models::request_params::ObservationRequest;
use crate::models::series::Series;
use crate::models::table::{DataTable, MergeStrategy};
use crate::plot::adf::{AdfError, AdfResult, adf_test};
use crate::plot::render::{parse_color, render_dual, render_line};
use crate::providers::{GatewayError, SeriesProvider};
use crate::store::{SeriesStore, StoreError};

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Unknown column {column:?}; available columns: {}", available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Dataset at {} has no metadata sidecar; treat it as incomplete", path.display())]
    IncompleteDataset { path: PathBuf },

    #[error("No dataset contains all of: {}", columns.join(", "))]
    NoDatasetWithColumns { columns: Vec<String> },

    #[error("Nothing to plot for {what}")]
    EmptyPlot { what: String },

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Adf(#[from] AdfError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlotError {
    /// Stable kind string for protocol error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            PlotError::UnknownColumn { .. } => "unknown_column",
            PlotError::IncompleteDataset { .. } => "incomplete_dataset",
            PlotError::NoDatasetWithColumns { .. } => "no_matching_dataset",
            PlotError::EmptyPlot { .. } => "empty_window",
            PlotError::Gateway(e) => e.kind(),
            _ => "internal",
        }
    }
}

/// Paths written by a single-series plot.
#[derive(Debug, Clone, Serialize)]
pub struct PlotArtifacts {
    pub png_path: PathBuf,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
}

/// One differencing order: its chart and unit-root statistics.
#[derive(Debug, Clone, Serialize)]
pub struct DifferencingOutcome {
    pub order: String,
    pub png_path: PathBuf,
    pub adf: AdfResult,
}

#[derive(Debug, Clone, Serialize)]
pub struct DifferencingReport {
    pub series_id: String,
    pub outcomes: Vec<DifferencingOutcome>,
}

/// Paths produced by a dataset-column plot.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetPlotArtifacts {
    pub dataset_name: String,
    pub png_path: PathBuf,
    pub dataset_csv: PathBuf,
}

pub struct PlotService {
    provider: Arc<dyn SeriesProvider>,
    store: SeriesStore,
}

impl PlotService {
    pub fn new(provider: Arc<dyn SeriesProvider>, store: SeriesStore) -> Self {
        Self { provider, store }
    }

    /// Fetches a series, persists its window to the store, and renders a
    /// single-axis line chart next to the export.
    pub async fn plot_series(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PlotArtifacts, PlotError> {
        let stamp = Utc::now().date_naive();
        let series = self
            .provider
            .observations(&ObservationRequest::windowed(series_id, start, end))
            .await?;
        let stored = self.store.write_series_stamped(&series, stamp)?;

        let points = non_null_points(&series);
        let png_path = self.store.plot_dir(series_id).join(format!(
            "{series_id}_{}_to_{}_plot_{}.png",
            stored.start.format("%Y-%m-%d"),
            stored.end.format("%Y-%m-%d"),
            stamp.format("%Y%m%d"),
        ));
        render_line(
            &png_path,
            &format!("{} ({})", series.meta.title, series_id),
            &series.meta.units,
            &points,
            BLUE,
        )?;

        Ok(PlotArtifacts {
            png_path,
            csv_path: stored.csv_path,
            xlsx_path: stored.xlsx_path,
        })
    }

    /// Fetches two series, aligns them on the intersection of their
    /// dates, and renders them on independent left/right axes.
    pub async fn plot_dual_axis(
        &self,
        left_id: &str,
        right_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        color_left: Option<&str>,
        color_right: Option<&str>,
    ) -> Result<PlotArtifacts, PlotError> {
        let stamp = Utc::now().date_naive();
        let left = self
            .provider
            .observations(&ObservationRequest::windowed(left_id, start, end))
            .await?;
        let right = self
            .provider
            .observations(&ObservationRequest::windowed(right_id, start, end))
            .await?;

        let aligned = DataTable::merge(
            vec![
                DataTable::from_series(left_id, &left),
                DataTable::from_series(right_id, &right),
            ],
            MergeStrategy::Inner,
        )
        .map_err(|e| PlotError::Render(e.to_string()))?;
        if aligned.is_empty() {
            return Err(PlotError::EmptyPlot {
                what: format!("{left_id} vs {right_id}"),
            });
        }

        let dir = self.store.plot_dir(left_id);
        let base = format!(
            "{left_id}_vs_{right_id}_{}",
            stamp.format("%Y%m%d")
        );
        let png_path = dir.join(format!(
            "{left_id}_vs_{right_id}_plot_{}.png",
            stamp.format("%Y%m%d")
        ));
        let csv_path = dir.join(format!("{base}_data.csv"));
        let xlsx_path = dir.join(format!("{base}_data.xlsx"));

        render_dual(
            &png_path,
            &format!("{left_id} vs {right_id}"),
            left_id,
            right_id,
            &column_points(&aligned, left_id),
            &column_points(&aligned, right_id),
            parse_color(color_left, BLUE),
            parse_color(color_right, RED),
        )?;
        write_table_csv(&csv_path, &aligned)?;
        write_table_xlsx(&xlsx_path, &aligned)?;

        Ok(PlotArtifacts {
            png_path,
            csv_path,
            xlsx_path,
        })
    }

    /// Plots the level, first difference, and second difference of a
    /// series and runs an augmented Dickey-Fuller test on each.
    pub async fn analyze_differencing(
        &self,
        series_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DifferencingReport, PlotError> {
        let stamp = Utc::now().date_naive();
        let series = self
            .provider
            .observations(&ObservationRequest::windowed(series_id, start, end))
            .await?;

        // Missing observations are dropped before differencing; the test
        // needs a contiguous value sequence.
        let level = non_null_points(&series);
        let dir = self.store.plot_dir(series_id);

        let mut outcomes = Vec::with_capacity(3);
        let mut current = level;
        for order in ["level", "diff1", "diff2"] {
            let png_path = dir.join(format!(
                "{series_id}_{order}_plot_{}.png",
                stamp.format("%Y%m%d")
            ));
            render_line(
                &png_path,
                &format!("{series_id} ({order})"),
                &series.meta.units,
                &current,
                BLUE,
            )?;
            let values: Vec<f64> = current.iter().map(|(_, v)| *v).collect();
            let adf = adf_test(&values)?;
            outcomes.push(DifferencingOutcome {
                order: order.to_string(),
                png_path,
                adf,
            });
            current = difference(&current);
        }

        Ok(DifferencingReport {
            series_id: series_id.to_string(),
            outcomes,
        })
    }

    /// Renders two dataset columns on a dual axis without any network
    /// calls, resolving the dataset through the catalog when no explicit
    /// path is given.
    pub async fn plot_from_dataset(
        &self,
        catalog: &DatasetCatalog,
        column_left: &str,
        column_right: &str,
        dataset_path: Option<&Path>,
    ) -> Result<DatasetPlotArtifacts, PlotError> {
        let stamp = Utc::now().date_naive();
        let entry = self.resolve_dataset(catalog, column_left, column_right, dataset_path)?;
        let table = read_table_csv(&entry.metadata.csv_path)?;

        for column in [column_left, column_right] {
            if !table.columns.contains_key(column) {
                return Err(PlotError::UnknownColumn {
                    column: column.to_string(),
                    available: table.column_names(),
                });
            }
        }

        let png_path = entry.dir.join("plots").join(format!(
            "{column_left}_vs_{column_right}_plot_{}.png",
            stamp.format("%Y%m%d")
        ));
        render_dual(
            &png_path,
            &format!("{column_left} vs {column_right}"),
            column_left,
            column_right,
            &column_points(&table, column_left),
            &column_points(&table, column_right),
            BLUE,
            RED,
        )?;

        Ok(DatasetPlotArtifacts {
            dataset_name: entry.metadata.name.clone(),
            png_path,
            dataset_csv: entry.metadata.csv_path.clone(),
        })
    }

    fn resolve_dataset(
        &self,
        catalog: &DatasetCatalog,
        column_left: &str,
        column_right: &str,
        dataset_path: Option<&Path>,
    ) -> Result<CatalogEntry, PlotError> {
        match dataset_path {
            Some(path) => {
                let dir = if path.is_dir() {
                    path.to_path_buf()
                } else {
                    path.parent()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| path.to_path_buf())
                };
                DatasetCatalog::read_dir_entry(&dir).ok_or_else(|| PlotError::IncompleteDataset {
                    path: path.to_path_buf(),
                })
            }
            None => catalog
                .most_recent_with_columns(&[column_left, column_right])
                // With no dataset holding both columns, fall back to one
                // holding either so column validation can name what is
                // actually available.
                .or_else(|| catalog.most_recent_with_columns(&[column_left]))
                .or_else(|| catalog.most_recent_with_columns(&[column_right]))
                .ok_or_else(|| PlotError::NoDatasetWithColumns {
                    columns: vec![column_left.to_string(), column_right.to_string()],
                }),
        }
    }
}

fn non_null_points(series: &Series) -> Vec<(NaiveDate, f64)> {
    series
        .observations
        .iter()
        .filter_map(|o| o.value.map(|v| (o.date, v)))
        .collect()
}

fn column_points(table: &DataTable, column: &str) -> Vec<(NaiveDate, f64)> {
    table
        .dates
        .iter()
        .zip(table.columns[column].iter())
        .filter_map(|(d, v)| v.map(|v| (*d, v)))
        .collect()
}

/// First difference of a dated point sequence, keeping the later date of
/// each pair.
fn difference(points: &[(NaiveDate, f64)]) -> Vec<(NaiveDate, f64)> {
    points
        .windows(2)
        .map(|w| (w[1].0, w[1].1 - w[0].1))
        .collect()
}
