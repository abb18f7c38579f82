//! The dataset catalog: a stateless re-projection of the on-disk layout.
//!
//! The catalog exists so a stateless caller can rebind symbolic column
//! references ("UNRATE vs CPIAUCSL_YoY") to persisted artifacts across
//! sessions. It owns no state and never mutates the filesystem; every
//! read re-scans the dataset root. Folders without a parseable metadata
//! sidecar are treated as incomplete and skipped.

use std::path::{Path, PathBuf};

use crate::dataset::metadata::{DatasetMetadata, read_sidecar};

/// Prefix of every dataset folder the builder emits.
pub const DATASET_PREFIX: &str = "FRED_dataset_";

/// Default number of entries a catalog read returns.
pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub dir: PathBuf,
    pub metadata: DatasetMetadata,
}

#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    root: PathBuf,
}

impl DatasetCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The most recent `limit` complete datasets, newest first.
    pub fn entries(&self, limit: usize) -> Vec<CatalogEntry> {
        let Ok(dir_iter) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut entries: Vec<CatalogEntry> = dir_iter
            .flatten()
            .filter(|e| {
                e.file_name()
                    .to_string_lossy()
                    .starts_with(DATASET_PREFIX)
                    && e.path().is_dir()
            })
            .filter_map(|e| Self::read_dir_entry(&e.path()))
            .collect();

        entries.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        entries.truncate(limit);
        entries
    }

    /// Loads one dataset folder's entry, or `None` when its sidecar is
    /// missing or unreadable.
    pub fn read_dir_entry(dir: &Path) -> Option<CatalogEntry> {
        let sidecar = Self::find_sidecar(dir)?;
        let metadata = match read_sidecar(&sidecar) {
            Ok(m) => m,
            Err(err) => {
                tracing::debug!(
                    dir = %dir.display(),
                    error = %err,
                    "skipping dataset with unreadable sidecar"
                );
                return None;
            }
        };
        Some(CatalogEntry {
            dir: dir.to_path_buf(),
            metadata,
        })
    }

    /// Locates `<name>_metadata_<stamp>.json` inside a dataset folder.
    /// With multiple stamps present, the lexically newest wins.
    pub fn find_sidecar(dir: &Path) -> Option<PathBuf> {
        let name = dir.file_name()?.to_string_lossy().to_string();
        let marker = format!("{name}_metadata_");
        let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension().is_some_and(|ext| ext == "json")
                    && p.file_name()
                        .is_some_and(|f| f.to_string_lossy().starts_with(&marker))
            })
            .collect();
        candidates.sort();
        candidates.pop()
    }

    /// The most recent dataset containing every listed column.
    pub fn most_recent_with_columns(&self, columns: &[&str]) -> Option<CatalogEntry> {
        self.entries(usize::MAX).into_iter().find(|entry| {
            columns
                .iter()
                .all(|c| entry.metadata.columns.iter().any(|have| have == c))
        })
    }

    /// Human-readable listing for resource reads, one block per dataset.
    pub fn render_text(&self, limit: usize) -> String {
        let entries = self.entries(limit);
        if entries.is_empty() {
            return "No datasets have been built yet.".to_string();
        }

        let mut out = String::new();
        for entry in entries {
            let m = &entry.metadata;
            let window = match (m.observation_start, m.observation_end) {
                (Some(s), Some(e)) => format!("{s} to {e}"),
                _ => "empty".to_string(),
            };
            let transformations = m
                .transformations
                .iter()
                .filter(|(_, t)| **t != crate::models::transformation::Transformation::None)
                .map(|(id, t)| format!("{id}={}", t.tag()))
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "Dataset: {}\nCreated: {}\nWindow: {}\nColumns: {}\nTransformations: {}\nRows: {}\nCSV: {}\n\n",
                m.name,
                m.created_at.to_rfc3339(),
                window,
                m.columns.join(", "),
                if transformations.is_empty() {
                    "none".to_string()
                } else {
                    transformations
                },
                m.row_count,
                m.csv_path.display(),
            ));
        }
        out.trim_end().to_string()
    }
}
