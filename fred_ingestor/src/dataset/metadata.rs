//! The dataset metadata sidecar.
//!
//! The sidecar is the dataset's commit marker: it is written last, after
//! the CSV and XLSX, and readers must treat a dataset folder without a
//! parseable sidecar as incomplete.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use crate::io::sink::{FilesystemSnafu, SidecarSnafu, SinkError};
use crate::models::table::MergeStrategy;
use crate::models::transformation::Transformation;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub name: String,
    pub series_list: Vec<String>,
    pub transformations: IndexMap<String, Transformation>,
    pub observation_start: Option<NaiveDate>,
    pub observation_end: Option<NaiveDate>,
    pub merge_strategy: MergeStrategy,
    pub created_at: DateTime<Utc>,
    pub csv_path: PathBuf,
    pub xlsx_path: PathBuf,
    pub columns: Vec<String>,
    pub row_count: usize,
}

/// Writes the sidecar atomically: a temp file in the same directory,
/// then a rename over the target. Catalog readers never observe a
/// half-written sidecar.
pub fn write_sidecar(path: &Path, metadata: &DatasetMetadata) -> Result<(), SinkError> {
    let body = serde_json::to_vec_pretty(metadata).map_err(|e| {
        SidecarSnafu {
            path,
            detail: e.to_string(),
        }
        .build()
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, body).context(FilesystemSnafu { path: &tmp })?;
    std::fs::rename(&tmp, path).context(FilesystemSnafu { path })?;
    Ok(())
}

pub fn read_sidecar(path: &Path) -> Result<DatasetMetadata, SinkError> {
    let body = std::fs::read(path).context(FilesystemSnafu { path })?;
    serde_json::from_slice(&body).map_err(|e| {
        SidecarSnafu {
            path,
            detail: e.to_string(),
        }
        .build()
    })
}
