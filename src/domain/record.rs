//! Stock record data model.
//!
//! A [`StockRecord`] is the unit of persistence, keyed by its symbol. Seed
//! records carry only identity fields; detail refreshes attach
//! [`Financials`] and the derived [`Computed`] block and classification list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Eligibility bucket assigned by the eligibility engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    AnnualOk,
    QuarterlyOk,
    AnnualOkQuarterlyOk,
    AnnualOkQuarterlyNo,
    QuarterlyNo,
}

impl Classification {
    pub const ALL: [Classification; 5] = [
        Classification::AnnualOk,
        Classification::QuarterlyOk,
        Classification::AnnualOkQuarterlyOk,
        Classification::AnnualOkQuarterlyNo,
        Classification::QuarterlyNo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::AnnualOk => "ANNUAL_OK",
            Classification::QuarterlyOk => "QUARTERLY_OK",
            Classification::AnnualOkQuarterlyOk => "ANNUAL_OK_QUARTERLY_OK",
            Classification::AnnualOkQuarterlyNo => "ANNUAL_OK_QUARTERLY_NO",
            Classification::QuarterlyNo => "QUARTERLY_NO",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub total_assets: Option<f64>,
    #[serde(default)]
    pub total_liabilities: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSnapshot {
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub net_income: Option<f64>,
}

/// Annual and quarterly snapshots, ordered oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History<T> {
    #[serde(default)]
    pub annual: Vec<T>,
    #[serde(default)]
    pub quarterly: Vec<T>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self {
            annual: Vec::new(),
            quarterly: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    #[serde(default)]
    pub balance: History<BalanceSnapshot>,
    #[serde(default)]
    pub income: History<IncomeSnapshot>,
    #[serde(default)]
    pub market_cap: Option<f64>,
}

impl Financials {
    pub fn has_four_annual_balance(&self) -> bool {
        self.balance.annual.len() >= 4
    }

    pub fn has_four_quarterly_balance(&self) -> bool {
        self.balance.quarterly.len() >= 4
    }

    /// Both a balance history and an income history are present.
    pub fn is_complete(&self) -> bool {
        let has_balance = !self.balance.annual.is_empty() || !self.balance.quarterly.is_empty();
        let has_income = !self.income.annual.is_empty() || !self.income.quarterly.is_empty();
        has_balance && has_income
    }

    /// Total assets over total liabilities for the most recent annual snapshot.
    ///
    /// `None` when there is no annual snapshot, a figure is missing, or
    /// liabilities are zero.
    pub fn latest_assets_to_liabilities(&self) -> Option<f64> {
        let latest = self.balance.annual.last()?;
        let assets = latest.total_assets?;
        let liabilities = latest.total_liabilities?;
        if liabilities == 0.0 {
            return None;
        }
        Some(assets / liabilities)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeMetrics {
    pub avg_percentage: Option<f64>,
    pub annual_percentages: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Computed {
    pub income: IncomeMetrics,
}

/// One row of a seed provider's bulk listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub symbol: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub financials: Option<Financials>,
    /// Derived on every refresh; never persisted.
    #[serde(skip)]
    pub computed: Computed,
    #[serde(default)]
    pub list: BTreeSet<Classification>,
}

impl StockRecord {
    pub fn from_seed(entry: &SeedEntry) -> Self {
        Self {
            name: entry.symbol.clone(),
            country: entry.country.clone(),
            sector: entry.sector.clone(),
            ..Self::default()
        }
    }

    /// Refresh identity fields from a seed entry, keeping financial history.
    ///
    /// Seed fields that are absent leave the stored value in place.
    pub fn merge_seed(&mut self, entry: &SeedEntry) {
        if entry.country.is_some() {
            self.country = entry.country.clone();
        }
        if entry.sector.is_some() {
            self.sector = entry.sector.clone();
        }
    }

    pub fn has_financials(&self) -> bool {
        self.financials.is_some()
    }

    pub fn has_four_annual_balance(&self) -> bool {
        self.financials
            .as_ref()
            .is_some_and(Financials::has_four_annual_balance)
    }

    pub fn has_four_quarterly_balance(&self) -> bool {
        self.financials
            .as_ref()
            .is_some_and(Financials::has_four_quarterly_balance)
    }

    pub fn is_tagged(&self, tag: Classification) -> bool {
        self.list.contains(&tag)
    }
}
