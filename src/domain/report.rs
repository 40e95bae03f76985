//! Monthly eligibility report.
//!
//! Groups the stored universe by classification tag into symbol-only
//! sheets, plus two percentage sheets for records that pass both rules.
//! Generation never fails the caller; errors are logged and swallowed.

use crate::domain::eligibility::EligibilityRules;
use crate::domain::error::ScreenerError;
use crate::domain::record::{Classification, StockRecord};
use crate::domain::record_store::RecordStore;
use crate::ports::report_port::SpreadsheetSink;
use chrono::{Datelike, NaiveDate};
use std::path::PathBuf;
use tracing::{error, info};

pub const PERCENTAGE_SHEET: &str = "PERCENTAGE";
pub const PERCENTAGE_4Y_SHEET: &str = "PERCENTAGE_4Y";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn opt_number(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    pub fn opt_text(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn append_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty sheet and return it for filling.
    pub fn add_sheet(&mut self, name: &str) -> &mut Sheet {
        self.sheets.push(Sheet {
            name: name.to_string(),
            rows: Vec::new(),
        });
        let last = self.sheets.len() - 1;
        &mut self.sheets[last]
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// `{year}-{MM}` stem for the report written in `date`'s month.
pub fn report_file_stem(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

fn percentage_header(years: usize) -> Vec<Cell> {
    let mut header = vec![Cell::text("name"), Cell::text("sector"), Cell::text("avg_pct")];
    header.extend((1..=years).map(|i| Cell::Text(format!("pct_{i}"))));
    header.push(Cell::text("market_cap"));
    header.push(Cell::text("assets_liabilities_ratio"));
    header
}

fn percentage_row(record: &StockRecord, years: usize) -> Vec<Cell> {
    let income = &record.computed.income;
    let mut row = vec![
        Cell::text(record.name.as_str()),
        Cell::opt_text(record.sector.as_deref()),
        Cell::opt_number(income.avg_percentage),
    ];
    for i in 0..years {
        row.push(Cell::opt_number(
            income.annual_percentages.get(i).copied().flatten(),
        ));
    }
    let financials = record.financials.as_ref();
    row.push(Cell::opt_number(financials.and_then(|f| f.market_cap)));
    row.push(Cell::opt_number(
        financials.and_then(|f| f.latest_assets_to_liabilities()),
    ));
    row
}

fn fill_percentage_sheet(sheet: &mut Sheet, records: &[&StockRecord]) {
    let years = records
        .iter()
        .map(|r| r.computed.income.annual_percentages.len())
        .max()
        .unwrap_or(0);
    sheet.append_row(percentage_header(years));
    for record in records {
        sheet.append_row(percentage_row(record, years));
    }
}

/// Assemble the workbook from `records`.
///
/// Only records with financials are reported, and each is reclassified
/// first so a tag list left over from an earlier refresh never leaks out.
/// Rows are sorted by symbol.
pub fn build_workbook(records: Vec<StockRecord>, rules: &EligibilityRules) -> Workbook {
    let mut records: Vec<StockRecord> = records
        .into_iter()
        .filter(StockRecord::has_financials)
        .map(|mut r| {
            rules.apply(&mut r);
            r
        })
        .collect();
    records.sort_by(|a, b| a.name.cmp(&b.name));

    let mut workbook = Workbook::new();
    for tag in Classification::ALL {
        let sheet = workbook.add_sheet(tag.as_str());
        sheet.append_row(vec![Cell::text("name")]);
        for record in records.iter().filter(|r| r.is_tagged(tag)) {
            sheet.append_row(vec![Cell::text(record.name.as_str())]);
        }
    }

    let qualifying: Vec<&StockRecord> = records
        .iter()
        .filter(|r| r.is_tagged(Classification::AnnualOkQuarterlyOk))
        .collect();
    fill_percentage_sheet(workbook.add_sheet(PERCENTAGE_SHEET), &qualifying);

    let four_year: Vec<&StockRecord> = qualifying
        .iter()
        .copied()
        .filter(|r| r.has_four_annual_balance() && r.has_four_quarterly_balance())
        .collect();
    fill_percentage_sheet(workbook.add_sheet(PERCENTAGE_4Y_SHEET), &four_year);

    workbook
}

pub struct ReportBuilder<'a> {
    store: &'a RecordStore<'a>,
    sink: &'a dyn SpreadsheetSink,
    dir: PathBuf,
    rules: EligibilityRules,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(
        store: &'a RecordStore<'a>,
        sink: &'a dyn SpreadsheetSink,
        dir: impl Into<PathBuf>,
        rules: EligibilityRules,
    ) -> Self {
        Self {
            store,
            sink,
            dir: dir.into(),
            rules,
        }
    }

    /// Build and write the report for `date`'s month.
    pub fn try_generate(&self, date: NaiveDate) -> Result<PathBuf, ScreenerError> {
        let records = self.store.load_all()?;
        let workbook = build_workbook(records, &self.rules);
        std::fs::create_dir_all(&self.dir).map_err(|e| ScreenerError::ReportGeneration {
            reason: format!("failed to create {}: {}", self.dir.display(), e),
        })?;
        let path = self.dir.join(report_file_stem(date));
        self.sink.write(&workbook, &path)?;
        Ok(path)
    }

    /// Like [`try_generate`](Self::try_generate) but logs failures instead
    /// of returning them.
    pub fn generate(&self, date: NaiveDate) -> Option<PathBuf> {
        match self.try_generate(date) {
            Ok(path) => {
                info!(path = %path.display(), "report written");
                Some(path)
            }
            Err(e) => {
                error!(error = %e, "report generation failed");
                None
            }
        }
    }
}
