//! XLSX sibling writer, mirroring the CSV layout one cell at a time.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::ResultExt;

use crate::io::sink::{FilesystemSnafu, SinkError, TableSink, WorkbookSnafu};
use crate::models::table::DataTable;

pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TableSink for XlsxSink {
    async fn write_table(&self, table: &DataTable) -> Result<PathBuf, SinkError> {
        write_table_xlsx(&self.path, table)?;
        Ok(self.path.clone())
    }
}

/// Synchronous XLSX write. Null cells stay empty rather than holding a
/// zero, matching the CSV representation.
pub fn write_table_xlsx(path: &Path, table: &DataTable) -> Result<(), SinkError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context(FilesystemSnafu { path })?;
    }

    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_sheet_by_name_mut("Sheet1").ok_or_else(|| {
        WorkbookSnafu {
            path,
            message: "workbook missing default sheet",
        }
        .build()
    })?;

    sheet.get_cell_mut((1, 1)).set_value("date");
    for (col_idx, name) in table.columns.keys().enumerate() {
        sheet
            .get_cell_mut((col_idx as u32 + 2, 1))
            .set_value(name.clone());
    }

    for (row_idx, date) in table.dates.iter().enumerate() {
        let row = row_idx as u32 + 2;
        sheet
            .get_cell_mut((1, row))
            .set_value(date.format("%Y-%m-%d").to_string());
        for (col_idx, values) in table.columns.values().enumerate() {
            if let Some(v) = values[row_idx] {
                sheet
                    .get_cell_mut((col_idx as u32 + 2, row))
                    .set_value_number(v);
            }
        }
    }

    umya_spreadsheet::writer::xlsx::write(&book, path).map_err(|e| {
        WorkbookSnafu {
            path,
            message: e.to_string(),
        }
        .build()
    })
}
