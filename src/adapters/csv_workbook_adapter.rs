//! CSV spreadsheet sink.
//!
//! Writes each sheet of a [`Workbook`] to `<stem>_<SHEET>.csv` next to the
//! requested path.

use crate::domain::error::ScreenerError;
use crate::domain::report::{Cell, Workbook};
use crate::ports::report_port::SpreadsheetSink;
use std::path::{Path, PathBuf};

pub const EXTENSION: &str = "csv";

#[derive(Debug, Default)]
pub struct CsvWorkbookAdapter;

impl CsvWorkbookAdapter {
    pub fn new() -> Self {
        Self
    }

    /// File a sheet of the workbook at `path` is written to.
    pub fn sheet_path(path: &Path, sheet: &str) -> PathBuf {
        let stem = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!("{stem}_{sheet}.{EXTENSION}"))
    }
}

fn render(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => n.to_string(),
        Cell::Empty => String::new(),
    }
}

impl SpreadsheetSink for CsvWorkbookAdapter {
    fn write(&self, workbook: &Workbook, path: &Path) -> Result<(), ScreenerError> {
        for sheet in &workbook.sheets {
            let sheet_path = Self::sheet_path(path, &sheet.name);
            let mut writer =
                csv::Writer::from_path(&sheet_path).map_err(|e| ScreenerError::ReportGeneration {
                    reason: format!("failed to create {}: {}", sheet_path.display(), e),
                })?;

            for row in &sheet.rows {
                writer
                    .write_record(row.iter().map(render))
                    .map_err(|e| ScreenerError::ReportGeneration {
                        reason: format!("failed to write {}: {}", sheet_path.display(), e),
                    })?;
            }

            writer.flush()?;
        }
        Ok(())
    }
}
