//! Core domain types and logic.

pub mod record;
pub mod provider;
pub mod staleness;
pub mod eligibility;
pub mod record_store;
pub mod refresh;
pub mod report;
pub mod config_validation;
pub mod error;
