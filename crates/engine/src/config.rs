//! Comparator tunables.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default minimum accepted price on either venue.
pub const MIN_PRICE: f64 = 0.000001;
/// Default maximum accepted spread magnitude, in percent.
pub const MAX_SPREAD: f64 = 10.0;
/// Default minimum DEX 24h volume, in the quote currency.
pub const MIN_VOLUME: f64 = 1000.0;
/// Default number of history records kept per symbol.
pub const HISTORY_CAPACITY: usize = 100;
/// Default number of results returned by a ranked batch.
pub const TOP_N: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Sanity thresholds applied by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_price: f64,
    /// Maximum |spread| in percent (inclusive)
    pub max_spread_pct: f64,
    /// Minimum DEX volume in the quote currency (inclusive)
    pub min_volume: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_price: MIN_PRICE,
            max_spread_pct: MAX_SPREAD,
            min_volume: MIN_VOLUME,
        }
    }
}

/// Configuration for the comparison orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparatorConfig {
    pub thresholds: Thresholds,
    /// Records kept per symbol in the in-memory history.
    pub history_capacity: usize,
    /// Bound on a single CEX ticker fetch.
    pub cex_timeout: Duration,
    /// Bound on a single DEX quote fetch.
    pub dex_timeout: Duration,
    /// Default size of a ranked batch.
    pub top_n: usize,
    /// Slippage tolerance sent with DEX quote requests.
    pub slippage_bps: u16,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            history_capacity: HISTORY_CAPACITY,
            cex_timeout: Duration::from_secs(10),
            dex_timeout: Duration::from_secs(10),
            top_n: TOP_N,
            slippage_bps: 50,
        }
    }
}

impl ComparatorConfig {
    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if !(t.min_price.is_finite() && t.min_price > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "min_price",
                reason: format!("must be positive, got {}", t.min_price),
            });
        }
        if !(t.max_spread_pct.is_finite() && t.max_spread_pct >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "max_spread_pct",
                reason: format!("must be non-negative, got {}", t.max_spread_pct),
            });
        }
        if !(t.min_volume.is_finite() && t.min_volume >= 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "min_volume",
                reason: format!("must be non-negative, got {}", t.min_volume),
            });
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "history_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cex_timeout.is_zero() || self.dex_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "fetch timeouts must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}
