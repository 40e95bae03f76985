//! Configuration validation.
//!
//! Validates config fields before any refresh cycle or report runs.

use crate::domain::error::ScreenerError;
use crate::ports::config_port::ConfigPort;

pub fn validate_store_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_store_path(config)?;
    validate_pool_size(config)?;
    Ok(())
}

pub fn validate_refresh_config(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    validate_window(config)?;
    validate_periods(config, "min_annual_periods")?;
    validate_periods(config, "min_quarterly_periods")?;
    Ok(())
}

fn validate_store_path(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    config.require_string("store", "path").map(|_| ())
}

fn validate_pool_size(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_int("store", "pool_size", 4);
    if value < 1 {
        return Err(ScreenerError::ConfigInvalid {
            section: "store".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), ScreenerError> {
    let value = config.get_double("refresh", "window_hours", 24.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(ScreenerError::ConfigInvalid {
            section: "refresh".to_string(),
            key: "window_hours".to_string(),
            reason: "window_hours must be a positive number".to_string(),
        });
    }
    Ok(())
}

fn validate_periods(config: &dyn ConfigPort, key: &str) -> Result<(), ScreenerError> {
    let value = config.get_int("eligibility", key, 2);
    if value < 2 {
        return Err(ScreenerError::ConfigInvalid {
            section: "eligibility".to_string(),
            key: key.to_string(),
            reason: format!("{key} must be at least 2"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapConfig(HashMap<(String, String), String>);

    impl MapConfig {
        fn new(entries: &[(&str, &str, &str)]) -> Self {
            Self(
                entries
                    .iter()
                    .map(|(s, k, v)| ((s.to_string(), k.to_string()), v.to_string()))
                    .collect(),
            )
        }
    }

    impl ConfigPort for MapConfig {
        fn get_string(&self, section: &str, key: &str) -> Option<String> {
            self.0.get(&(section.to_string(), key.to_string())).cloned()
        }
        fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
        fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
            self.get_string(section, key)
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }
    }

    #[test]
    fn store_path_required() {
        let config = MapConfig::new(&[]);
        let err = validate_store_config(&config).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigMissing { key, .. } if key == "path"));
    }

    #[test]
    fn blank_store_path_rejected() {
        let config = MapConfig::new(&[("store", "path", "  ")]);
        assert!(validate_store_config(&config).is_err());
    }

    #[test]
    fn zero_pool_size_rejected() {
        let config = MapConfig::new(&[("store", "path", "db.sqlite"), ("store", "pool_size", "0")]);
        let err = validate_store_config(&config).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigInvalid { key, .. } if key == "pool_size"));
    }

    #[test]
    fn defaults_are_valid() {
        let config = MapConfig::new(&[("store", "path", "db.sqlite")]);
        assert!(validate_store_config(&config).is_ok());
        assert!(validate_refresh_config(&config).is_ok());
    }

    #[test]
    fn non_positive_window_rejected() {
        let config = MapConfig::new(&[("refresh", "window_hours", "0")]);
        let err = validate_refresh_config(&config).unwrap_err();
        assert!(matches!(err, ScreenerError::ConfigInvalid { key, .. } if key == "window_hours"));
    }

    #[test]
    fn non_finite_window_rejected() {
        for value in ["nan", "NaN", "inf", "-inf"] {
            let config = MapConfig::new(&[("refresh", "window_hours", value)]);
            let err = validate_refresh_config(&config).unwrap_err();
            assert!(
                matches!(err, ScreenerError::ConfigInvalid { key, .. } if key == "window_hours"),
                "{value} accepted"
            );
        }
    }

    #[test]
    fn single_period_rule_rejected() {
        let config = MapConfig::new(&[("eligibility", "min_quarterly_periods", "1")]);
        let err = validate_refresh_config(&config).unwrap_err();
        assert!(
            matches!(err, ScreenerError::ConfigInvalid { key, .. } if key == "min_quarterly_periods")
        );
    }
}
