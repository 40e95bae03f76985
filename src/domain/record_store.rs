//! Record store over a key-value backend.
//!
//! Records are stored as JSON under their symbol. Provider metadata shares
//! the namespace, so enumeration filters an explicit set of reserved keys.

use crate::domain::error::ScreenerError;
use crate::domain::provider::reserved_keys;
use crate::domain::record::StockRecord;
use crate::ports::kv_port::KeyValuePort;
use std::collections::HashSet;

pub struct RecordStore<'a> {
    backend: &'a dyn KeyValuePort,
    reserved: HashSet<String>,
}

impl<'a> RecordStore<'a> {
    /// Store that excludes the provider state keys.
    pub fn new(backend: &'a dyn KeyValuePort) -> Self {
        Self::with_reserved(backend, reserved_keys())
    }

    pub fn with_reserved<I>(backend: &'a dyn KeyValuePort, reserved: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            backend,
            reserved: reserved.into_iter().collect(),
        }
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        self.reserved.contains(key)
    }

    /// Every record key in backend order, reserved keys removed.
    pub fn list_record_keys(&self) -> Result<Vec<String>, ScreenerError> {
        let keys = self.backend.keys("*")?;
        Ok(keys.into_iter().filter(|k| !self.is_reserved(k)).collect())
    }

    pub fn exists(&self, key: &str) -> Result<bool, ScreenerError> {
        Ok(self.backend.get(key)?.is_some())
    }

    pub fn load(&self, key: &str) -> Result<StockRecord, ScreenerError> {
        let bytes = self
            .backend
            .get(key)?
            .ok_or_else(|| ScreenerError::NotFound {
                key: key.to_string(),
            })?;
        let mut record: StockRecord =
            serde_json::from_slice(&bytes).map_err(|e| ScreenerError::CorruptRecord {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        if record.name.is_empty() {
            record.name = key.to_string();
        }
        Ok(record)
    }

    /// Load every record, skipping corrupt entries.
    pub fn load_all(&self) -> Result<Vec<StockRecord>, ScreenerError> {
        let mut records = Vec::new();
        for key in self.list_record_keys()? {
            match self.load(&key) {
                Ok(record) => records.push(record),
                Err(e) if e.is_fatal_to_cycle() => return Err(e),
                Err(e) => tracing::warn!(key = %key, error = %e, "skipping unreadable record"),
            }
        }
        Ok(records)
    }

    /// Upsert `record` under its name.
    pub fn save(&self, record: &StockRecord) -> Result<(), ScreenerError> {
        if self.is_reserved(&record.name) {
            return Err(ScreenerError::CorruptRecord {
                key: record.name.clone(),
                reason: "symbol collides with a reserved key".into(),
            });
        }
        let bytes = serde_json::to_vec(record).map_err(|e| ScreenerError::CorruptRecord {
            key: record.name.clone(),
            reason: e.to_string(),
        })?;
        self.backend.set(&record.name, &bytes)
    }
}
