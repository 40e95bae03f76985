//! Provider run state and its persisted ledger.
//!
//! Each provider wrapper owns a [`ProviderLedger`] that stores the
//! provider's [`ProviderState`] as JSON under a reserved key. The
//! orchestrator only ever reads the state.

use crate::domain::error::ScreenerError;
use crate::ports::kv_port::KeyValuePort;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub const SEED_PROVIDER: &str = "seed";
pub const DETAIL_PROVIDER: &str = "detail";

const STATE_KEY_PREFIX: &str = "provider:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderStatus {
    #[default]
    Idle,
    Running,
    Finished,
    Error,
}

impl fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderStatus::Idle => "IDLE",
            ProviderStatus::Running => "RUNNING",
            ProviderStatus::Finished => "FINISHED",
            ProviderStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderState {
    pub status: ProviderStatus,
    /// Epoch milliseconds of the last run start; 0 if never run.
    pub last_update: i64,
}

/// Reserved key holding the state of provider `name`.
pub fn state_key(name: &str) -> String {
    format!("{STATE_KEY_PREFIX}{name}")
}

/// Keys that hold provider metadata rather than stock records.
pub fn reserved_keys() -> Vec<String> {
    vec![state_key(SEED_PROVIDER), state_key(DETAIL_PROVIDER)]
}

pub struct ProviderLedger<'a> {
    name: String,
    backend: &'a dyn KeyValuePort,
    state: ProviderState,
}

impl<'a> ProviderLedger<'a> {
    /// Open the ledger for `name`, starting from its persisted state if any.
    pub fn open(name: &str, backend: &'a dyn KeyValuePort) -> Result<Self, ScreenerError> {
        let key = state_key(name);
        let state = match backend.get(&key)? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ScreenerError::CorruptRecord {
                    key: key.clone(),
                    reason: e.to_string(),
                }
            })?,
            None => ProviderState::default(),
        };
        Ok(Self {
            name: name.to_string(),
            backend,
            state,
        })
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    /// Enter `Running` and stamp the run start.
    pub fn begin(&mut self, now_ms: i64) -> Result<(), ScreenerError> {
        self.state = ProviderState {
            status: ProviderStatus::Running,
            last_update: now_ms,
        };
        self.persist()
    }

    pub fn finish(&mut self) -> Result<(), ScreenerError> {
        self.state.status = ProviderStatus::Finished;
        self.persist()
    }

    pub fn fail(&mut self) -> Result<(), ScreenerError> {
        self.state.status = ProviderStatus::Error;
        self.persist()
    }

    fn persist(&self) -> Result<(), ScreenerError> {
        let bytes =
            serde_json::to_vec(&self.state).map_err(|e| ScreenerError::CorruptRecord {
                key: state_key(&self.name),
                reason: e.to_string(),
            })?;
        self.backend.set(&state_key(&self.name), &bytes)?;
        debug!(
            provider = %self.name,
            status = %self.state.status,
            last_update = self.state.last_update,
            "provider state saved"
        );
        Ok(())
    }
}
