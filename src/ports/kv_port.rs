//! Key-value backend port trait.

use crate::domain::error::ScreenerError;

/// Minimal key-value surface the record store and provider ledgers need.
///
/// Connectivity failures surface as [`ScreenerError::StoreUnavailable`];
/// implementations do not retry.
pub trait KeyValuePort {
    /// Keys matching a glob-style `pattern` (`*` and `?`).
    fn keys(&self, pattern: &str) -> Result<Vec<String>, ScreenerError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ScreenerError>;

    /// Insert or replace the value stored under `key`.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), ScreenerError>;
}
