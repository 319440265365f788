//! Mock venue providers for testing.

use async_trait::async_trait;
use compact_str::CompactString;
use spread_core::{
    normalize_symbol, CexQuoteProvider, CexTicker, DexQuote, DexQuoteProvider, DexQuoteRequest,
    QuoteError, QuoteResult,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Mock CEX returning canned tickers per symbol.
#[derive(Debug, Default)]
pub struct MockCexProvider {
    tickers: HashMap<CompactString, QuoteResult<CexTicker>>,
    /// Simulated response latency.
    pub delay: Option<Duration>,
    calls: AtomicU64,
}

impl MockCexProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: respond to `symbol` with `ticker`.
    pub fn with_ticker(mut self, symbol: &str, ticker: CexTicker) -> Self {
        self.tickers.insert(normalize_symbol(symbol), Ok(ticker));
        self
    }

    /// Builder: respond to `symbol` with a price and base volume.
    pub fn with_price(self, symbol: &str, price: f64, volume_24h_base: f64) -> Self {
        self.with_ticker(
            symbol,
            CexTicker {
                last_price: price,
                volume_24h_base,
                change_24h_pct: Some(1.5),
            },
        )
    }

    /// Builder: fail requests for `symbol`.
    pub fn with_error(mut self, symbol: &str, error: QuoteError) -> Self {
        self.tickers.insert(normalize_symbol(symbol), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of ticker requests served.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CexQuoteProvider for MockCexProvider {
    fn name(&self) -> &str {
        "MockCEX"
    }

    async fn get_ticker(&self, symbol: &str) -> QuoteResult<CexTicker> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.tickers
            .get(&normalize_symbol(symbol))
            .cloned()
            .unwrap_or_else(|| Err(QuoteError::NotFound(symbol.to_string())))
    }
}

/// Mock DEX returning canned quotes per input mint.
#[derive(Debug, Default)]
pub struct MockDexProvider {
    quotes: HashMap<CompactString, QuoteResult<DexQuote>>,
    pub delay: Option<Duration>,
    calls: AtomicU64,
}

impl MockDexProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quote(mut self, input_mint: &str, quote: DexQuote) -> Self {
        self.quotes.insert(CompactString::new(input_mint), Ok(quote));
        self
    }

    pub fn with_error(mut self, input_mint: &str, error: QuoteError) -> Self {
        self.quotes.insert(CompactString::new(input_mint), Err(error));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DexQuoteProvider for MockDexProvider {
    fn name(&self) -> &str {
        "MockDEX"
    }

    async fn get_quote(&self, request: &DexQuoteRequest) -> QuoteResult<DexQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.quotes
            .get(&request.input_mint)
            .cloned()
            .unwrap_or_else(|| Err(QuoteError::NotFound(request.input_mint.to_string())))
    }
}

/// A one-token DEX quote that normalizes to `price` in a 6-decimal quote asset.
pub fn quote_for_price(price: f64, token_decimals: u8, daily_volume: f64) -> DexQuote {
    DexQuote {
        in_amount: 10u64.pow(token_decimals as u32),
        out_amount: (price * 1_000_000.0).round() as u64,
        price_impact_pct: 0.05,
        daily_volume,
    }
}
