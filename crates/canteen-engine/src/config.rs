//! Engine configuration.
//!
//! Loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use canteen_core::DEFAULT_REORDER_THRESHOLD;

/// Limits and defaults applied by the engine and catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Most lines a single sale may carry.
    /// Default: unlimited
    pub max_sale_lines: Option<usize>,

    /// Largest quantity on one line, for tills that want a fat-finger guard.
    /// Default: unlimited
    pub max_line_quantity: Option<i64>,

    /// Reorder threshold for products created without one.
    /// Default: 10
    pub default_reorder_threshold: i64,

    /// Cap on the catalog's low-stock list.
    /// Default: 50
    pub low_stock_report_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_sale_lines: None,
            max_line_quantity: None,
            default_reorder_threshold: DEFAULT_REORDER_THRESHOLD,
            low_stock_report_limit: 50,
        }
    }
}

impl EngineConfig {
    /// Load configuration from `CANTEEN_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// missing keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            max_sale_lines: read_limit(&lookup, "CANTEEN_MAX_SALE_LINES")?,
            max_line_quantity: read_limit(&lookup, "CANTEEN_MAX_LINE_QUANTITY")?,
            default_reorder_threshold: read(
                &lookup,
                "CANTEEN_DEFAULT_REORDER_THRESHOLD",
                defaults.default_reorder_threshold,
            )?,
            low_stock_report_limit: read(
                &lookup,
                "CANTEEN_LOW_STOCK_REPORT_LIMIT",
                defaults.low_stock_report_limit,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sale_lines == Some(0) {
            return Err(ConfigError::InvalidValue("CANTEEN_MAX_SALE_LINES".to_string()));
        }
        if self.max_line_quantity.is_some_and(|max| max <= 0) {
            return Err(ConfigError::InvalidValue("CANTEEN_MAX_LINE_QUANTITY".to_string()));
        }
        if self.default_reorder_threshold < 0 {
            return Err(ConfigError::InvalidValue(
                "CANTEEN_DEFAULT_REORDER_THRESHOLD".to_string(),
            ));
        }
        Ok(())
    }
}

fn read<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

/// Like [`read`] for limits that are off unless set. An empty value also
/// means off.
fn read_limit<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => parse(key, &raw).map(Some),
        None => Ok(None),
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
