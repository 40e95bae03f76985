//! Directory of per-symbol JSON financial statements as a detail provider.
//!
//! Each `<SYMBOL>.json` file holds one [`Financials`] document. Missing,
//! unreadable, or incomplete files are reported as no data.

use crate::domain::error::ScreenerError;
use crate::domain::provider::{DETAIL_PROVIDER, ProviderLedger, ProviderStatus};
use crate::domain::record::Financials;
use crate::ports::kv_port::KeyValuePort;
use crate::ports::provider_port::{DetailProvider, ScrapeSession};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, warn};

pub struct JsonDetailAdapter<'a> {
    dir: PathBuf,
    ledger: ProviderLedger<'a>,
}

impl<'a> JsonDetailAdapter<'a> {
    pub fn new(dir: PathBuf, backend: &'a dyn KeyValuePort) -> Result<Self, ScreenerError> {
        Ok(Self {
            dir,
            ledger: ProviderLedger::open(DETAIL_PROVIDER, backend)?,
        })
    }

    fn statement_path(&self, symbol: &str) -> Option<PathBuf> {
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '^'))
            && !symbol.contains("..");
        valid.then(|| self.dir.join(format!("{symbol}.json")))
    }
}

impl DetailProvider for JsonDetailAdapter<'_> {
    fn last_update(&self) -> i64 {
        self.ledger.state().last_update
    }

    fn status(&self) -> ProviderStatus {
        self.ledger.state().status
    }

    fn begin_run(&mut self, now_ms: i64) -> Result<(), ScreenerError> {
        self.ledger.begin(now_ms)
    }

    fn financial_data(&mut self, symbol: &str) -> Option<Financials> {
        let Some(path) = self.statement_path(symbol) else {
            warn!(symbol, "symbol not usable as a file name");
            return None;
        };

        let content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(symbol, "no statement file");
                return None;
            }
            Err(e) => {
                warn!(symbol, path = %path.display(), error = %e, "failed to read statements");
                return None;
            }
        };

        match serde_json::from_slice::<Financials>(&content) {
            Ok(financials) if financials.is_complete() => Some(financials),
            Ok(_) => {
                warn!(symbol, "statements incomplete");
                None
            }
            Err(e) => {
                warn!(symbol, error = %e, "failed to parse statements");
                None
            }
        }
    }

    fn end_run(&mut self, completed: bool) -> Result<(), ScreenerError> {
        if completed {
            self.ledger.finish()
        } else {
            self.ledger.fail()
        }
    }
}

/// Session for providers that hold no process-wide resource.
#[derive(Debug, Default)]
pub struct NullSession;

impl ScrapeSession for NullSession {
    fn close(&mut self) {}
}
