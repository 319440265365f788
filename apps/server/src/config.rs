//! Application configuration.

use serde::{Deserialize, Serialize};
use spread_core::{TokenInfo, TokenRegistry, MAX_DECIMALS};
use spread_engine::{ComparatorConfig, Thresholds};
use spread_feeds::{JUPITER_QUOTE_URL, JUPITER_TOKENS_URL, OKX_BASE_URL};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Invalid(#[from] spread_engine::ConfigError),
    #[error("token {symbol} has {decimals} decimals, at most {max} are supported", max = MAX_DECIMALS)]
    Decimals { symbol: String, decimals: u8 },
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Comparison thresholds and limits.
    pub comparator: ComparatorSettings,
    /// Venue endpoints.
    pub venues: VenueSettings,
    /// HTTP API settings.
    pub server: ServerSettings,
    /// SQLite URL for the durable comparison log.
    pub database_url: String,
    /// Seconds between background scans.
    pub scan_interval_secs: u64,
    /// Logging level.
    pub log_level: String,
    /// Overrides the built-in token list when set.
    pub tokens: Option<Vec<TokenSettings>>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            comparator: ComparatorSettings::default(),
            venues: VenueSettings::default(),
            server: ServerSettings::default(),
            database_url: "sqlite://price_history.db".to_string(),
            scan_interval_secs: 60,
            log_level: "info".to_string(),
            tokens: None,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ComparatorConfig::from(&self.comparator).validate()?;
        if let Some(token) = self
            .tokens
            .iter()
            .flatten()
            .find(|t| t.decimals > MAX_DECIMALS)
        {
            return Err(ConfigError::Decimals {
                symbol: token.symbol.clone(),
                decimals: token.decimals,
            });
        }
        Ok(())
    }

    /// Supported tokens, quoted in USDC.
    pub fn registry(&self) -> TokenRegistry {
        match &self.tokens {
            Some(tokens) => TokenRegistry::new(
                TokenInfo::usdc(),
                tokens
                    .iter()
                    .map(|t| TokenInfo::new(&t.symbol, &t.mint, t.decimals)),
            ),
            None => TokenRegistry::default_solana(),
        }
    }
}

/// Comparator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorSettings {
    pub min_price: f64,
    /// Maximum |spread| in percent.
    pub max_spread_pct: f64,
    /// Minimum DEX 24h volume in USDC.
    pub min_volume: f64,
    pub history_capacity: usize,
    pub cex_timeout_secs: u64,
    pub dex_timeout_secs: u64,
    pub top_n: usize,
    pub slippage_bps: u16,
}

impl Default for ComparatorSettings {
    fn default() -> Self {
        let config = ComparatorConfig::default();
        Self {
            min_price: config.thresholds.min_price,
            max_spread_pct: config.thresholds.max_spread_pct,
            min_volume: config.thresholds.min_volume,
            history_capacity: config.history_capacity,
            cex_timeout_secs: config.cex_timeout.as_secs(),
            dex_timeout_secs: config.dex_timeout.as_secs(),
            top_n: config.top_n,
            slippage_bps: config.slippage_bps,
        }
    }
}

impl From<&ComparatorSettings> for ComparatorConfig {
    fn from(settings: &ComparatorSettings) -> Self {
        ComparatorConfig {
            thresholds: Thresholds {
                min_price: settings.min_price,
                max_spread_pct: settings.max_spread_pct,
                min_volume: settings.min_volume,
            },
            history_capacity: settings.history_capacity,
            cex_timeout: Duration::from_secs(settings.cex_timeout_secs),
            dex_timeout: Duration::from_secs(settings.dex_timeout_secs),
            top_n: settings.top_n,
            slippage_bps: settings.slippage_bps,
        }
    }
}

/// Venue base URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueSettings {
    pub okx_base_url: String,
    pub jupiter_quote_url: String,
    pub jupiter_tokens_url: String,
}

impl Default for VenueSettings {
    fn default() -> Self {
        Self {
            okx_base_url: OKX_BASE_URL.to_string(),
            jupiter_quote_url: JUPITER_QUOTE_URL.to_string(),
            jupiter_tokens_url: JUPITER_TOKENS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

/// A token entry in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSettings {
    pub symbol: String,
    pub mint: String,
    pub decimals: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.scan_interval_secs, 60);
        assert_eq!(config.registry().len(), 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_comparator_settings_to_config() {
        let settings = ComparatorSettings::default();
        let config: ComparatorConfig = (&settings).into();
        assert_eq!(config, ComparatorConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let json = r#"{"comparator": {"min_volume": 5000.0}, "server": {"port": 9100}}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.comparator.min_volume, 5000.0);
        assert_eq!(config.comparator.max_spread_pct, 10.0);
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.venues.okx_base_url, OKX_BASE_URL);
    }

    #[test]
    fn test_token_override() {
        let json = r#"{"tokens": [{"symbol": "sol", "mint": "So11111111111111111111111111111111111111112", "decimals": 9}]}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let registry = config.registry();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("SOL").unwrap().decimals, 9);
    }

    #[test]
    fn test_invalid_comparator_rejected() {
        let mut config = AppConfig::default();
        config.comparator.history_capacity = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_decimals_rejected() {
        let json = r#"{"tokens": [
            {"symbol": "SOL", "mint": "So11111111111111111111111111111111111111112", "decimals": 9},
            {"symbol": "BIG", "mint": "MintBIG", "decimals": 20}
        ]}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Decimals { ref symbol, decimals: 20 } if symbol == "BIG"));
        assert!(err.to_string().contains("at most 19"));

        let json = r#"{"tokens": [{"symbol": "MAX", "mint": "MintMAX", "decimals": 19}]}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = AppConfig::load("/nonexistent/spread-bot.json").unwrap();
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.database_url, config.database_url);
    }
}
