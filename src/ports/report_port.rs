//! Report output port trait.

use crate::domain::error::ScreenerError;
use crate::domain::report::Workbook;
use std::path::Path;

/// Sink that serializes a [`Workbook`] under `path`.
pub trait SpreadsheetSink {
    fn write(&self, workbook: &Workbook, path: &Path) -> Result<(), ScreenerError>;
}
