//! Refresh orchestration: the seed and detail cycles.
//!
//! Each cycle consults the staleness policy with the provider's own state,
//! then walks its input one record at a time (load, fetch, classify, save)
//! and returns a fresh [`CycleSummary`].

use crate::domain::eligibility::EligibilityRules;
use crate::domain::error::ScreenerError;
use crate::domain::record::{SeedEntry, StockRecord};
use crate::domain::record_store::RecordStore;
use crate::domain::staleness::StalenessPolicy;
use crate::ports::provider_port::{DetailProvider, ScrapeSession, SeedProvider};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoData,
    /// Provider data lacked a balance or income history.
    Incomplete,
    NotFound,
    Unreadable,
    /// The store refused the record, e.g. a symbol naming a reserved key.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// False when the staleness policy said the cycle was not due.
    pub ran: bool,
    pub created: usize,
    pub updated: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl CycleSummary {
    fn skip(&mut self, symbol: &str, reason: SkipReason) {
        self.skipped.push(SkippedRecord {
            symbol: symbol.to_string(),
            reason,
        });
    }
}

pub struct Orchestrator<'a> {
    store: &'a RecordStore<'a>,
    rules: EligibilityRules,
    policy: StalenessPolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a RecordStore<'a>, rules: EligibilityRules, policy: StalenessPolicy) -> Self {
        Self {
            store,
            rules,
            policy,
        }
    }

    /// Seed the store with the provider's bulk listing.
    ///
    /// New symbols become seed-only records. Existing records keep their
    /// financials and tags; only country and sector are refreshed. An entry
    /// the store rejects is skipped; a store failure aborts the cycle and
    /// leaves the provider marked as failed.
    pub fn run_seed_cycle(
        &self,
        provider: &mut dyn SeedProvider,
        now_ms: i64,
        force: bool,
    ) -> Result<CycleSummary, ScreenerError> {
        let last_update = provider.last_update();
        let due = force
            || self
                .policy
                .should_refresh(last_update, provider.status(), now_ms);
        if !due {
            debug!(provider = "seed", last_update, "cycle not due");
            return Ok(CycleSummary::default());
        }
        let mut summary = CycleSummary {
            ran: true,
            ..CycleSummary::default()
        };

        let outcome = match provider.begin_run(now_ms) {
            Ok(()) => self.seed_all(provider, &mut summary),
            Err(e) => Err(e),
        };
        let ended = provider.end_run(outcome.is_ok());
        outcome?;
        ended?;

        info!(
            created = summary.created,
            updated = summary.updated,
            skipped = summary.skipped.len(),
            "seed cycle finished"
        );
        Ok(summary)
    }

    /// Enrich every stored record with fresh financials and reclassify it.
    ///
    /// Records without data are skipped. A store failure aborts the cycle.
    /// The session is closed exactly once, after the enumeration, whether or
    /// not it completed.
    pub fn run_detail_cycle(
        &self,
        provider: &mut dyn DetailProvider,
        session: &mut dyn ScrapeSession,
        now_ms: i64,
        force: bool,
    ) -> Result<CycleSummary, ScreenerError> {
        let last_update = provider.last_update();
        let due = force
            || self
                .policy
                .should_refresh(last_update, provider.status(), now_ms);
        if !due {
            debug!(provider = "detail", last_update, "cycle not due");
            return Ok(CycleSummary::default());
        }
        let mut summary = CycleSummary {
            ran: true,
            ..CycleSummary::default()
        };

        let outcome = match provider.begin_run(now_ms) {
            Ok(()) => self.enrich_all(provider, &mut summary),
            Err(e) => Err(e),
        };
        session.close();
        let ended = provider.end_run(outcome.is_ok());
        outcome?;
        ended?;

        info!(
            updated = summary.updated,
            skipped = summary.skipped.len(),
            "detail cycle finished"
        );
        Ok(summary)
    }

    fn seed_all(
        &self,
        provider: &mut dyn SeedProvider,
        summary: &mut CycleSummary,
    ) -> Result<(), ScreenerError> {
        let entries = provider.bulk_data()?;
        info!(entries = entries.len(), "seed cycle started");

        for entry in &entries {
            let symbol = entry.symbol.trim();
            if symbol.is_empty() {
                continue;
            }
            let (record, created) = match self.store.load(symbol) {
                Ok(mut existing) => {
                    existing.merge_seed(entry);
                    (existing, false)
                }
                Err(e) if e.is_fatal_to_cycle() => return Err(e),
                Err(ScreenerError::NotFound { .. }) => (Self::fresh_record(symbol, entry), true),
                Err(e) => {
                    warn!(symbol, error = %e, "replacing unreadable record with seed");
                    (Self::fresh_record(symbol, entry), true)
                }
            };

            match self.store.save(&record) {
                Ok(()) if created => summary.created += 1,
                Ok(()) => summary.updated += 1,
                Err(e) if e.is_fatal_to_cycle() => return Err(e),
                Err(e) => {
                    warn!(symbol, error = %e, "skipping rejected seed entry");
                    summary.skip(symbol, SkipReason::Rejected);
                }
            }
        }
        Ok(())
    }

    fn fresh_record(symbol: &str, entry: &SeedEntry) -> StockRecord {
        let mut record = StockRecord::from_seed(entry);
        record.name = symbol.to_string();
        record
    }

    fn enrich_all(
        &self,
        provider: &mut dyn DetailProvider,
        summary: &mut CycleSummary,
    ) -> Result<(), ScreenerError> {
        let keys = self.store.list_record_keys()?;
        info!(records = keys.len(), "detail cycle started");

        for key in &keys {
            let mut record = match self.store.load(key) {
                Ok(record) => record,
                Err(e) if e.is_fatal_to_cycle() => return Err(e),
                Err(ScreenerError::NotFound { .. }) => {
                    debug!(symbol = %key, "record vanished during cycle");
                    summary.skip(key, SkipReason::NotFound);
                    continue;
                }
                Err(e) => {
                    warn!(symbol = %key, error = %e, "skipping unreadable record");
                    summary.skip(key, SkipReason::Unreadable);
                    continue;
                }
            };

            let Some(financials) = provider.financial_data(&record.name) else {
                debug!(symbol = %record.name, "no financial data");
                summary.skip(&record.name, SkipReason::NoData);
                continue;
            };

            if !financials.is_complete() {
                warn!(symbol = %record.name, "incomplete financial data");
                summary.skip(&record.name, SkipReason::Incomplete);
                continue;
            }

            record.financials = Some(financials);
            self.rules.apply(&mut record);
            match self.store.save(&record) {
                Ok(()) => {
                    summary.updated += 1;
                    debug!(symbol = %record.name, tags = record.list.len(), "record refreshed");
                }
                Err(e) if e.is_fatal_to_cycle() => return Err(e),
                Err(e) => {
                    warn!(symbol = %record.name, error = %e, "skipping rejected record");
                    summary.skip(&record.name, SkipReason::Rejected);
                }
            }
        }
        Ok(())
    }
}
