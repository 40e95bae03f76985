//! Eligibility classification and income percentage metrics.
//!
//! Everything here is a pure function of a record's [`Financials`]: two
//! records with identical histories always receive identical tags and
//! metrics.

use crate::domain::record::{
    Classification, Computed, Financials, IncomeMetrics, IncomeSnapshot, StockRecord,
};
use std::collections::BTreeSet;

/// Thresholds for the annual and quarterly income trend rules.
#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRules {
    /// Minimum period-over-period annual net income change, in percent.
    pub annual_min_growth_pct: f64,
    /// Minimum period-over-period quarterly net income change, in percent.
    pub quarterly_min_growth_pct: f64,
    pub min_annual_periods: usize,
    pub min_quarterly_periods: usize,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            annual_min_growth_pct: 0.0,
            quarterly_min_growth_pct: 0.0,
            min_annual_periods: 2,
            min_quarterly_periods: 2,
        }
    }
}

/// Percentage change from `previous` to `current`.
///
/// `None` when either value is missing or `previous` is zero. Uses the
/// magnitude of `previous` so a loss shrinking toward profit reads as growth.
pub fn percentage_change(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    let prev = previous?;
    let curr = current?;
    if prev == 0.0 {
        return None;
    }
    Some((curr - prev) / prev.abs() * 100.0)
}

/// One entry per consecutive pair of snapshots.
pub fn period_percentages(snapshots: &[IncomeSnapshot]) -> Vec<Option<f64>> {
    snapshots
        .windows(2)
        .map(|pair| percentage_change(pair[0].net_income, pair[1].net_income))
        .collect()
}

/// Mean of the defined entries; `None` if there are none.
pub fn average_percentage(percentages: &[Option<f64>]) -> Option<f64> {
    let defined: Vec<f64> = percentages.iter().flatten().copied().collect();
    if defined.is_empty() {
        return None;
    }
    Some(defined.iter().sum::<f64>() / defined.len() as f64)
}

fn trend_holds(snapshots: &[IncomeSnapshot], min_periods: usize, min_growth_pct: f64) -> bool {
    if snapshots.len() < min_periods.max(2) {
        return false;
    }
    if !snapshots
        .iter()
        .all(|s| s.net_income.is_some_and(|v| v > 0.0))
    {
        return false;
    }
    period_percentages(snapshots)
        .iter()
        .all(|p| p.is_some_and(|pct| pct >= min_growth_pct))
}

impl EligibilityRules {
    pub fn annual_ok(&self, financials: &Financials) -> bool {
        trend_holds(
            &financials.income.annual,
            self.min_annual_periods,
            self.annual_min_growth_pct,
        )
    }

    pub fn quarterly_ok(&self, financials: &Financials) -> bool {
        trend_holds(
            &financials.income.quarterly,
            self.min_quarterly_periods,
            self.quarterly_min_growth_pct,
        )
    }

    pub fn classify(&self, financials: &Financials) -> BTreeSet<Classification> {
        let annual = self.annual_ok(financials);
        let quarterly = self.quarterly_ok(financials);

        let mut tags = BTreeSet::new();
        if annual {
            tags.insert(Classification::AnnualOk);
        }
        if quarterly {
            tags.insert(Classification::QuarterlyOk);
        }
        if annual && quarterly {
            tags.insert(Classification::AnnualOkQuarterlyOk);
        }
        if annual && !quarterly {
            tags.insert(Classification::AnnualOkQuarterlyNo);
        }
        if !quarterly {
            tags.insert(Classification::QuarterlyNo);
        }
        tags
    }

    pub fn compute(&self, financials: &Financials) -> Computed {
        let annual_percentages = period_percentages(&financials.income.annual);
        Computed {
            income: IncomeMetrics {
                avg_percentage: average_percentage(&annual_percentages),
                annual_percentages,
            },
        }
    }

    /// Recompute `list` and `computed` from the record's financials.
    ///
    /// A seed-only record ends up with no tags and empty metrics.
    pub fn apply(&self, record: &mut StockRecord) {
        match &record.financials {
            Some(financials) => {
                record.list = self.classify(financials);
                record.computed = self.compute(financials);
            }
            None => {
                record.list.clear();
                record.computed = Computed::default();
            }
        }
    }
}
