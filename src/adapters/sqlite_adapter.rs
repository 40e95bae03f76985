//! SQLite key-value adapter.

use crate::domain::error::ScreenerError;
use crate::ports::config_port::ConfigPort;
use crate::ports::kv_port::KeyValuePort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScreenerError> {
        let db_path = config.require_string("store", "path")?;

        let pool_size = config.get_int("store", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| ScreenerError::StoreUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ScreenerError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ScreenerError::StoreUnavailable {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScreenerError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| ScreenerError::StoreUnavailable {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), ScreenerError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            );",
        )
        .map_err(|e: rusqlite::Error| ScreenerError::StoreQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

impl KeyValuePort for SqliteAdapter {
    fn keys(&self, pattern: &str) -> Result<Vec<String>, ScreenerError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT key FROM kv WHERE key GLOB ?1")
            .map_err(|e: rusqlite::Error| ScreenerError::StoreQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![pattern], |row| row.get(0))
            .map_err(|e: rusqlite::Error| ScreenerError::StoreQuery {
                reason: e.to_string(),
            })?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(
                row.map_err(|e: rusqlite::Error| ScreenerError::StoreQuery {
                    reason: e.to_string(),
                })?,
            );
        }

        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ScreenerError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e: rusqlite::Error| ScreenerError::StoreQuery {
            reason: e.to_string(),
        })
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ScreenerError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e: rusqlite::Error| ScreenerError::StoreQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
    }

    fn adapter() -> SqliteAdapter {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
        adapter
    }

    #[test]
    fn from_config_missing_path() {
        let config = EmptyConfig;
        let result = SqliteAdapter::from_config(&config);
        match result {
            Err(ScreenerError::ConfigMissing { section, key }) => {
                assert_eq!(section, "store");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_initialization_is_repeatable() {
        let adapter = adapter();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn get_missing_key_is_none() {
        let adapter = adapter();
        assert_eq!(adapter.get("AAPL").unwrap(), None);
    }

    #[test]
    fn set_then_get() {
        let adapter = adapter();
        adapter.set("AAPL", b"first").unwrap();
        assert_eq!(adapter.get("AAPL").unwrap(), Some(b"first".to_vec()));

        adapter.set("AAPL", b"second").unwrap();
        assert_eq!(adapter.get("AAPL").unwrap(), Some(b"second".to_vec()));
        assert_eq!(adapter.keys("*").unwrap().len(), 1);
    }

    #[test]
    fn keys_glob_pattern() {
        let adapter = adapter();
        adapter.set("AAPL", b"1").unwrap();
        adapter.set("AMZN", b"2").unwrap();
        adapter.set("provider:seed", b"3").unwrap();

        let mut all = adapter.keys("*").unwrap();
        all.sort();
        assert_eq!(all, vec!["AAPL", "AMZN", "provider:seed"]);

        assert_eq!(adapter.keys("provider:*").unwrap(), vec!["provider:seed"]);

        let mut a_four = adapter.keys("A???").unwrap();
        a_four.sort();
        assert_eq!(a_four, vec!["AAPL", "AMZN"]);
    }

    #[test]
    fn missing_schema_is_query_error() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        assert!(matches!(
            adapter.get("AAPL"),
            Err(ScreenerError::StoreQuery { .. })
        ));
    }

    #[test]
    fn file_backed_store_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("screen.db");

        struct PathConfig(String);
        impl ConfigPort for PathConfig {
            fn get_string(&self, section: &str, key: &str) -> Option<String> {
                (section == "store" && key == "path").then(|| self.0.clone())
            }
            fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
                default
            }
            fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
                default
            }
        }

        let config = PathConfig(path.display().to_string());
        {
            let adapter = SqliteAdapter::from_config(&config).unwrap();
            adapter.initialize_schema().unwrap();
            adapter.set("IBM", b"{}").unwrap();
        }
        let adapter = SqliteAdapter::from_config(&config).unwrap();
        assert_eq!(adapter.get("IBM").unwrap(), Some(b"{}".to_vec()));
    }
}
