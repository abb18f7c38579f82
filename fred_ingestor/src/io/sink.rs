//! Failure taxonomy for table artifacts and the sink trait the CSV and
//! XLSX writers share.
//!
//! Every artifact is a single file derived from a [`DataTable`], so
//! errors carry the path they were working on. Decode failures are split
//! from encode failures: a table that no longer reads back cleanly
//! (foreign header, bad date, non-numeric cell) is a different situation
//! from a write that never landed.

use std::path::PathBuf;

use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::table::DataTable;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Filesystem trouble around the artifact: creating its folder,
    /// flushing, or renaming a temp file over its target.
    #[snafu(display("I/O on {}: {source}", path.display()))]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    /// The CSV layer refused the artifact, on either direction.
    #[snafu(display("CSV error for {}: {source}", path.display()))]
    Csv {
        path: PathBuf,
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// The workbook writer could not produce the XLSX sibling.
    #[snafu(display("Workbook error for {}: {message}", path.display()))]
    Workbook {
        path: PathBuf,
        message: String,
        backtrace: Backtrace,
    },

    /// A persisted table no longer decodes: foreign header, unparseable
    /// date, or non-numeric cell.
    #[snafu(display("Malformed table {}: {detail}", path.display()))]
    MalformedTable {
        path: PathBuf,
        detail: String,
        backtrace: Backtrace,
    },

    /// The metadata sidecar failed to encode or decode.
    #[snafu(display("Sidecar {}: {detail}", path.display()))]
    Sidecar {
        path: PathBuf,
        detail: String,
        backtrace: Backtrace,
    },
}

/// A destination for table artifacts.
///
/// One file per write; the created path comes back so callers can hand
/// it to the metadata sidecar and the tool payload.
#[async_trait]
pub trait TableSink {
    async fn write_table(&self, table: &DataTable) -> Result<PathBuf, SinkError>;
}
