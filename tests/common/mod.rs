#![allow(dead_code)]

use stockscreen::adapters::sqlite_adapter::SqliteAdapter;
use stockscreen::domain::error::ScreenerError;
use stockscreen::domain::provider::ProviderStatus;
use stockscreen::domain::record::{
    BalanceSnapshot, Financials, History, IncomeSnapshot, SeedEntry, StockRecord,
};
use stockscreen::ports::kv_port::KeyValuePort;
use stockscreen::ports::provider_port::{DetailProvider, ScrapeSession, SeedProvider};
use std::collections::HashMap;

pub const HOUR_MS: i64 = 3_600_000;

pub fn memory_backend() -> SqliteAdapter {
    let adapter = SqliteAdapter::in_memory().unwrap();
    adapter.initialize_schema().unwrap();
    adapter
}

pub struct MockSeedProvider {
    pub entries: Vec<SeedEntry>,
    pub error: Option<String>,
    pub last_update: i64,
    pub status: ProviderStatus,
    pub calls: usize,
}

impl MockSeedProvider {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            error: None,
            last_update: 0,
            status: ProviderStatus::Idle,
            calls: 0,
        }
    }

    pub fn with_entry(mut self, symbol: &str, country: Option<&str>, sector: Option<&str>) -> Self {
        self.entries.push(SeedEntry {
            symbol: symbol.to_string(),
            country: country.map(str::to_string),
            sector: sector.map(str::to_string),
        });
        self
    }

    pub fn with_state(mut self, last_update: i64, status: ProviderStatus) -> Self {
        self.last_update = last_update;
        self.status = status;
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl SeedProvider for MockSeedProvider {
    fn last_update(&self) -> i64 {
        self.last_update
    }

    fn status(&self) -> ProviderStatus {
        self.status
    }

    fn begin_run(&mut self, now_ms: i64) -> Result<(), ScreenerError> {
        self.last_update = now_ms;
        self.status = ProviderStatus::Running;
        Ok(())
    }

    fn bulk_data(&mut self) -> Result<Vec<SeedEntry>, ScreenerError> {
        self.calls += 1;
        if let Some(reason) = &self.error {
            return Err(ScreenerError::ProviderFetch {
                provider: "seed".to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self.entries.clone())
    }

    fn end_run(&mut self, completed: bool) -> Result<(), ScreenerError> {
        self.status = if completed {
            ProviderStatus::Finished
        } else {
            ProviderStatus::Error
        };
        Ok(())
    }
}

pub struct MockDetailProvider {
    pub data: HashMap<String, Financials>,
    pub last_update: i64,
    pub status: ProviderStatus,
    pub fetched: Vec<String>,
    pub begun: usize,
    pub ended: Vec<bool>,
}

impl MockDetailProvider {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            last_update: 0,
            status: ProviderStatus::Idle,
            fetched: Vec::new(),
            begun: 0,
            ended: Vec::new(),
        }
    }

    pub fn with_financials(mut self, symbol: &str, financials: Financials) -> Self {
        self.data.insert(symbol.to_string(), financials);
        self
    }

    pub fn with_state(mut self, last_update: i64, status: ProviderStatus) -> Self {
        self.last_update = last_update;
        self.status = status;
        self
    }
}

impl DetailProvider for MockDetailProvider {
    fn last_update(&self) -> i64 {
        self.last_update
    }

    fn status(&self) -> ProviderStatus {
        self.status
    }

    fn begin_run(&mut self, now_ms: i64) -> Result<(), ScreenerError> {
        self.begun += 1;
        self.last_update = now_ms;
        self.status = ProviderStatus::Running;
        Ok(())
    }

    fn financial_data(&mut self, symbol: &str) -> Option<Financials> {
        self.fetched.push(symbol.to_string());
        self.data.get(symbol).cloned()
    }

    fn end_run(&mut self, completed: bool) -> Result<(), ScreenerError> {
        self.ended.push(completed);
        self.status = if completed {
            ProviderStatus::Finished
        } else {
            ProviderStatus::Error
        };
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingSession {
    pub closes: usize,
}

impl ScrapeSession for CountingSession {
    fn close(&mut self) {
        self.closes += 1;
    }
}

/// Key-value backend whose every call fails as if the store were down.
pub struct UnavailableStore;

impl KeyValuePort for UnavailableStore {
    fn keys(&self, _pattern: &str) -> Result<Vec<String>, ScreenerError> {
        Err(unavailable())
    }

    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, ScreenerError> {
        Err(unavailable())
    }

    fn set(&self, _key: &str, _value: &[u8]) -> Result<(), ScreenerError> {
        Err(unavailable())
    }
}

/// Store that keeps provider state but fails every record write.
pub struct RecordWritesUnavailable {
    pub inner: SqliteAdapter,
}

impl KeyValuePort for RecordWritesUnavailable {
    fn keys(&self, pattern: &str) -> Result<Vec<String>, ScreenerError> {
        self.inner.keys(pattern)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ScreenerError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ScreenerError> {
        if key.starts_with("provider:") {
            return self.inner.set(key, value);
        }
        Err(unavailable())
    }
}

fn unavailable() -> ScreenerError {
    ScreenerError::StoreUnavailable {
        reason: "connection refused".to_string(),
    }
}

pub fn income(values: &[f64]) -> Vec<IncomeSnapshot> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| IncomeSnapshot {
            period: format!("P{}", i + 1),
            net_income: Some(*v),
        })
        .collect()
}

pub fn balances(count: usize, assets: f64, liabilities: f64) -> Vec<BalanceSnapshot> {
    (0..count)
        .map(|i| BalanceSnapshot {
            period: format!("P{}", i + 1),
            total_assets: Some(assets),
            total_liabilities: Some(liabilities),
        })
        .collect()
}

pub fn make_financials(
    annual: &[f64],
    quarterly: &[f64],
    balance_periods: usize,
    liabilities: f64,
) -> Financials {
    Financials {
        balance: History {
            annual: balances(balance_periods, 200.0, liabilities),
            quarterly: balances(balance_periods, 200.0, liabilities),
        },
        income: History {
            annual: income(annual),
            quarterly: income(quarterly),
        },
        market_cap: Some(3_000_000_000_000.0),
    }
}

/// Rising annual and quarterly income with four periods of balance sheets.
pub fn qualifying_financials() -> Financials {
    make_financials(&[100.0, 120.0, 150.0, 180.0], &[10.0, 12.0, 15.0, 18.0], 4, 50.0)
}

/// Rising annual income, falling quarterly income.
pub fn annual_only_financials() -> Financials {
    make_financials(&[100.0, 120.0, 150.0, 180.0], &[18.0, 15.0, 12.0, 10.0], 4, 50.0)
}

pub fn seed_record(symbol: &str) -> StockRecord {
    StockRecord {
        name: symbol.to_string(),
        country: Some("US".to_string()),
        sector: Some("Technology".to_string()),
        ..StockRecord::default()
    }
}
