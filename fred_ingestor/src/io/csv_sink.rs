//! CSV writing and reading for [`DataTable`]s.
//!
//! Layout: a `date` column in `YYYY-MM-DD` followed by one column per
//! series; null cells are empty fields. This is the canonical interchange
//! format, the XLSX sibling is a convenience copy.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use indexmap::IndexMap;
use snafu::ResultExt;

use crate::io::sink::{CsvSnafu, FilesystemSnafu, MalformedTableSnafu, SinkError, TableSink};
use crate::models::table::DataTable;

const DATE_COLUMN: &str = "date";

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TableSink for CsvSink {
    async fn write_table(&self, table: &DataTable) -> Result<PathBuf, SinkError> {
        write_table_csv(&self.path, table)?;
        Ok(self.path.clone())
    }
}

/// Synchronous CSV write; callers on the async path go through the sink.
pub fn write_table_csv(path: &Path, table: &DataTable) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context(FilesystemSnafu { path })?;
    }
    let mut writer = csv::Writer::from_path(path).context(CsvSnafu { path })?;

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push(DATE_COLUMN.to_string());
    header.extend(table.columns.keys().cloned());
    writer.write_record(&header).context(CsvSnafu { path })?;

    for (idx, date) in table.dates.iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(date.format("%Y-%m-%d").to_string());
        for values in table.columns.values() {
            record.push(match values[idx] {
                Some(v) => format_value(v),
                None => String::new(),
            });
        }
        writer.write_record(&record).context(CsvSnafu { path })?;
    }
    writer.flush().context(FilesystemSnafu { path })?;
    Ok(())
}

/// Reads a table back from its CSV form.
pub fn read_table_csv(path: &Path) -> Result<DataTable, SinkError> {
    let mut reader = csv::Reader::from_path(path).context(CsvSnafu { path })?;

    let headers = reader.headers().context(CsvSnafu { path })?.clone();
    if headers.get(0) != Some(DATE_COLUMN) {
        return MalformedTableSnafu {
            path,
            detail: format!("first column must be {DATE_COLUMN:?}"),
        }
        .fail();
    }
    let column_names: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut dates = Vec::new();
    let mut columns: IndexMap<String, Vec<Option<f64>>> = column_names
        .iter()
        .map(|name| (name.clone(), Vec::new()))
        .collect();

    for record in reader.records() {
        let record = record.context(CsvSnafu { path })?;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            MalformedTableSnafu {
                path,
                detail: format!("bad date {raw_date:?}: {e}"),
            }
            .build()
        })?;
        dates.push(date);
        for (i, name) in column_names.iter().enumerate() {
            let cell = record.get(i + 1).unwrap_or_default().trim();
            let value = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|e| {
                    MalformedTableSnafu {
                        path,
                        detail: format!("bad value {cell:?} in {name}: {e}"),
                    }
                    .build()
                })?)
            };
            columns
                .get_mut(name)
                .expect("column pre-inserted from header")
                .push(value);
        }
    }

    Ok(DataTable { dates, columns })
}

/// Trims float formatting so integral values round-trip without a
/// trailing `.0` churn between rebuilds.
fn format_value(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}
