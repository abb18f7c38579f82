//! Durable on-disk layout for raw series.
//!
//! Each series gets its own folder under the data root:
//!
//! ```text
//! <root>/<SERIES_ID>/series/<SERIES_ID>_<start>_to_<end>_downloaded_<YYYYMMDD>.csv (+ .xlsx)
//! <root>/<SERIES_ID>/grafico/...png            (written by the plot service)
//! ```
//!
//! The start/end embedded in the filename are the actual first and last
//! observation dates returned, not the requested bounds, so identical
//! downloads land on the same basename and overwrite in place.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use thiserror::Error;

use crate::io::csv_sink::write_table_csv;
use crate::io::sink::SinkError;
use crate::io::xlsx_sink::write_table_xlsx;
use crate::models::series::Series;
use crate::models::table::DataTable;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The series came back with zero observations; there is no window to
    /// name a file after.
    #[error("Series {series_id} has no observations to persist")]
    EmptySeries { series_id: String },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Paths and window of a persisted series download.
#[derive(Debug, Clone)]
pub struct StoredSeries {
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct SeriesStore {
    root: PathBuf,
}

impl SeriesStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding a series' CSV/XLSX downloads.
    pub fn series_dir(&self, series_id: &str) -> PathBuf {
        self.root.join(series_id).join("series")
    }

    /// Folder holding a series' plot images and their data exports.
    pub fn plot_dir(&self, series_id: &str) -> PathBuf {
        self.root.join(series_id).join("grafico")
    }

    /// Persists a series as CSV + XLSX, stamped with today's date.
    pub fn write_series(&self, series: &Series) -> Result<StoredSeries, StoreError> {
        self.write_series_stamped(series, Utc::now().date_naive())
    }

    /// Same as [`write_series`](Self::write_series) with an explicit stamp
    /// date, so tests produce stable filenames.
    pub fn write_series_stamped(
        &self,
        series: &Series,
        stamp: NaiveDate,
    ) -> Result<StoredSeries, StoreError> {
        let id = &series.meta.id;
        let (start, end) = match (series.first_date(), series.last_date()) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                return Err(StoreError::EmptySeries {
                    series_id: id.clone(),
                });
            }
        };

        let basename = download_basename(id, start, end, stamp);
        let dir = self.series_dir(id);
        let csv_path = dir.join(format!("{basename}.csv"));
        let xlsx_path = dir.join(format!("{basename}.xlsx"));

        let table = DataTable::from_series(id.clone(), series);
        write_table_csv(&csv_path, &table)?;
        write_table_xlsx(&xlsx_path, &table)?;

        Ok(StoredSeries {
            csv_path,
            xlsx_path,
            start,
            end,
            rows: table.row_count(),
        })
    }
}

fn download_basename(id: &str, start: NaiveDate, end: NaiveDate, stamp: NaiveDate) -> String {
    format!(
        "{id}_{}_to_{}_downloaded_{}",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        stamp.format("%Y%m%d")
    )
}
