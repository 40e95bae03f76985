//! Data provider port traits.

use crate::domain::error::ScreenerError;
use crate::domain::provider::ProviderStatus;
use crate::domain::record::{Financials, SeedEntry};

/// Bulk listing provider used by the seed cycle.
pub trait SeedProvider {
    /// Epoch milliseconds of the last run start; 0 if never run.
    fn last_update(&self) -> i64;

    fn status(&self) -> ProviderStatus;

    /// Called once before the bulk scrape of a cycle.
    fn begin_run(&mut self, now_ms: i64) -> Result<(), ScreenerError>;

    /// Run one bulk scrape.
    fn bulk_data(&mut self) -> Result<Vec<SeedEntry>, ScreenerError>;

    /// Called once after the cycle, with whether every entry was handled.
    fn end_run(&mut self, completed: bool) -> Result<(), ScreenerError>;
}

/// Per-symbol financial statement provider used by the detail cycle.
pub trait DetailProvider {
    fn last_update(&self) -> i64;

    fn status(&self) -> ProviderStatus;

    /// Called once before the first fetch of a cycle.
    fn begin_run(&mut self, now_ms: i64) -> Result<(), ScreenerError>;

    /// Financial statements for `symbol`, or `None` when nothing usable
    /// came back. Fetch failures are reported as `None`.
    fn financial_data(&mut self, symbol: &str) -> Option<Financials>;

    /// Called once after the cycle, with whether the enumeration completed.
    fn end_run(&mut self, completed: bool) -> Result<(), ScreenerError>;
}

/// Process-wide scraping session (e.g. a headless browser handle).
pub trait ScrapeSession {
    /// Release the session. Safe to call when it was never acquired.
    fn close(&mut self);
}
