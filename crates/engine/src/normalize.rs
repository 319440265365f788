//! Unit conversion from raw venue payloads to [`RawQuote`]s.
//!
//! All volumes leave this module in the quote currency. CEX volume arrives in
//! base-asset units and is multiplied by the last price; DEX volume is already
//! quoted and passes through unchanged.

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use spread_core::{CexTicker, DexQuote, QuoteError, QuoteResult, RawQuote, TokenInfo};

/// Normalize a CEX ticker.
pub fn normalize_cex(source: &str, ticker: &CexTicker, timestamp: DateTime<Utc>) -> RawQuote {
    RawQuote {
        price: ticker.last_price,
        volume_24h: ticker.volume_24h_base * ticker.last_price,
        trend_24h: ticker.change_24h_pct,
        slippage: None,
        source: CompactString::new(source),
        timestamp,
    }
}

/// Normalize a DEX swap quote of `token` into `quote_asset`.
pub fn normalize_dex(
    source: &str,
    quote: &DexQuote,
    token: &TokenInfo,
    quote_asset: &TokenInfo,
    timestamp: DateTime<Utc>,
) -> QuoteResult<RawQuote> {
    if quote.in_amount == 0 {
        return Err(QuoteError::Parse(format!(
            "{} quote for {} has zero input amount",
            source, token.symbol
        )));
    }

    let input = quote.in_amount as f64 / token.unit_scale();
    let output = quote.out_amount as f64 / quote_asset.unit_scale();

    Ok(RawQuote {
        price: output / input,
        volume_24h: quote.daily_volume,
        trend_24h: None,
        slippage: Some(quote.price_impact_pct),
        source: CompactString::new(source),
        timestamp,
    })
}
