//! CSV universe file seed provider.
//!
//! Reads `symbol,country,sector` rows and tracks its run state in a
//! [`ProviderLedger`].

use crate::domain::error::ScreenerError;
use crate::domain::provider::{ProviderLedger, ProviderStatus, SEED_PROVIDER};
use crate::domain::record::SeedEntry;
use crate::ports::kv_port::KeyValuePort;
use crate::ports::provider_port::SeedProvider;
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct CsvSeedAdapter<'a> {
    path: PathBuf,
    ledger: ProviderLedger<'a>,
}

impl<'a> CsvSeedAdapter<'a> {
    pub fn new(path: PathBuf, backend: &'a dyn KeyValuePort) -> Result<Self, ScreenerError> {
        Ok(Self {
            path,
            ledger: ProviderLedger::open(SEED_PROVIDER, backend)?,
        })
    }

    fn fetch_error(&self, reason: String) -> ScreenerError {
        ScreenerError::ProviderFetch {
            provider: SEED_PROVIDER.to_string(),
            reason,
        }
    }

    fn read_entries(&self) -> Result<Vec<SeedEntry>, ScreenerError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            self.fetch_error(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut entries = Vec::new();
        for (line, result) in rdr.deserialize::<SeedEntry>().enumerate() {
            let mut entry =
                result.map_err(|e| self.fetch_error(format!("CSV parse error: {}", e)))?;
            if entry.symbol.is_empty() {
                warn!(line = line + 2, "skipping row without symbol");
                continue;
            }
            entry.symbol = entry.symbol.to_uppercase();
            entry.country = entry.country.filter(|c| !c.is_empty());
            entry.sector = entry.sector.filter(|s| !s.is_empty());
            entries.push(entry);
        }
        Ok(entries)
    }
}

impl SeedProvider for CsvSeedAdapter<'_> {
    fn last_update(&self) -> i64 {
        self.ledger.state().last_update
    }

    fn status(&self) -> ProviderStatus {
        self.ledger.state().status
    }

    fn begin_run(&mut self, now_ms: i64) -> Result<(), ScreenerError> {
        self.ledger.begin(now_ms)
    }

    fn bulk_data(&mut self) -> Result<Vec<SeedEntry>, ScreenerError> {
        let entries = self.read_entries()?;
        info!(path = %self.path.display(), entries = entries.len(), "universe loaded");
        Ok(entries)
    }

    fn end_run(&mut self, completed: bool) -> Result<(), ScreenerError> {
        if completed {
            self.ledger.finish()
        } else {
            self.ledger.fail()
        }
    }
}
