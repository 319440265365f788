//! Raw venue payloads and normalized quotes.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Ticker fields returned by the centralized venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CexTicker {
    /// Last traded price in the quote currency
    pub last_price: f64,
    /// 24h volume in base-asset units
    pub volume_24h_base: f64,
    /// 24h price change in percent
    pub change_24h_pct: Option<f64>,
}

/// Swap quote request sent to the decentralized venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DexQuoteRequest {
    pub input_mint: CompactString,
    pub output_mint: CompactString,
    /// Input amount in base units
    pub amount: u64,
    /// Slippage tolerance in basis points
    pub slippage_bps: u16,
}

/// Swap quote returned by the decentralized venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DexQuote {
    /// Input amount in base units of the input mint
    pub in_amount: u64,
    /// Output amount in base units of the output mint
    pub out_amount: u64,
    /// Price impact in percent
    pub price_impact_pct: f64,
    /// 24h traded volume in the quote currency
    pub daily_volume: f64,
}

/// One leg of a comparison after unit conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQuote {
    /// Price in the quote currency
    pub price: f64,
    /// 24h volume in the quote currency
    pub volume_24h: f64,
    /// 24h trend in percent
    pub trend_24h: Option<f64>,
    /// Price impact in percent
    pub slippage: Option<f64>,
    /// Venue name
    pub source: CompactString,
    pub timestamp: DateTime<Utc>,
}
