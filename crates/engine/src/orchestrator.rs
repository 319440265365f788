//! Comparison orchestrator.
//!
//! Fetches both legs for a symbol, normalizes and validates them, then records
//! the attempt. Every failure becomes an invalid [`ComparisonResult`]; nothing
//! raises past [`ComparisonOrchestrator::compare`].

use crate::{
    normalize_cex, normalize_dex, rank, ComparatorConfig, HistoryStore, QuoteValidator, Rejection,
};
use futures_util::future::join_all;
use serde::Serialize;
use spread_core::{
    normalize_symbol, now_utc, CexQuoteProvider, CexTicker, ComparisonLog, ComparisonResult,
    DexQuote, DexQuoteProvider, DexQuoteRequest, HistoryRecord, LogError, PersistedEntry,
    QuoteError, QuoteResult, RejectReason, TokenInfo, TokenRegistry, MAX_DECIMALS,
};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Running counters over all comparison attempts.
#[derive(Debug, Default)]
pub struct ComparatorStats {
    pub comparisons: AtomicU64,
    pub valid: AtomicU64,
    pub rejected: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub persistence_failures: AtomicU64,
}

/// Point-in-time copy of [`ComparatorStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSummary {
    pub comparisons: u64,
    pub valid: u64,
    pub rejected: u64,
    pub fetch_failures: u64,
    pub persistence_failures: u64,
}

impl ComparatorStats {
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            comparisons: self.comparisons.load(Ordering::Relaxed),
            valid: self.valid.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }
}

/// Compares CEX and DEX prices for the symbols in a [`TokenRegistry`].
pub struct ComparisonOrchestrator {
    config: ComparatorConfig,
    validator: QuoteValidator,
    cex: Arc<dyn CexQuoteProvider>,
    dex: Arc<dyn DexQuoteProvider>,
    history: HistoryStore,
    log: Arc<dyn ComparisonLog>,
    stats: ComparatorStats,
}

impl ComparisonOrchestrator {
    pub fn new(
        config: ComparatorConfig,
        registry: TokenRegistry,
        cex: Arc<dyn CexQuoteProvider>,
        dex: Arc<dyn DexQuoteProvider>,
        log: Arc<dyn ComparisonLog>,
    ) -> Self {
        Self {
            validator: QuoteValidator::new(registry, config.thresholds),
            history: HistoryStore::new(config.history_capacity),
            config,
            cex,
            dex,
            log,
            stats: ComparatorStats::default(),
        }
    }

    pub fn config(&self) -> &ComparatorConfig {
        &self.config
    }

    pub fn registry(&self) -> &TokenRegistry {
        self.validator.registry()
    }

    pub fn stats(&self) -> StatsSummary {
        self.stats.summary()
    }

    /// Compare one symbol and record the attempt.
    pub async fn compare(&self, symbol: &str) -> ComparisonResult {
        let symbol = normalize_symbol(symbol);
        self.stats.comparisons.fetch_add(1, Ordering::Relaxed);

        let result = match self.registry().get(&symbol) {
            Some(token) => self.evaluate(&symbol, token).await,
            None => {
                let rejection = Rejection::unsupported(&symbol);
                ComparisonResult::rejected(
                    &symbol,
                    None,
                    None,
                    None,
                    rejection.reason,
                    rejection.detail,
                    now_utc(),
                )
            }
        };

        self.record(&result).await;
        result
    }

    /// Compare every symbol concurrently, in input order.
    pub async fn compare_many<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<ComparisonResult> {
        join_all(symbols.iter().map(|s| self.compare(s.as_ref()))).await
    }

    /// Compare every symbol and return the configured top-N.
    pub async fn compare_batch<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<ComparisonResult> {
        self.compare_batch_top(symbols, self.config.top_n).await
    }

    /// Compare every symbol and return the top `n`.
    pub async fn compare_batch_top<S: AsRef<str>>(
        &self,
        symbols: &[S],
        n: usize,
    ) -> Vec<ComparisonResult> {
        let results = self.compare_many(symbols).await;
        rank(&results, n)
    }

    /// Compare every registry symbol.
    pub async fn compare_all(&self) -> Vec<ComparisonResult> {
        let symbols = self.registry().symbols();
        self.compare_many(&symbols).await
    }

    /// In-memory history for `symbol`, newest last.
    pub fn history(&self, symbol: &str, limit: usize) -> Vec<HistoryRecord> {
        self.history.read(symbol, limit)
    }

    /// Durable log entries for `symbol`, newest first.
    pub async fn persisted(&self, symbol: &str, limit: usize) -> Result<Vec<PersistedEntry>, LogError> {
        self.log.read(symbol, limit).await
    }

    async fn evaluate(&self, symbol: &str, token: &TokenInfo) -> ComparisonResult {
        let quote_asset = &self.registry().quote;
        let Some(amount) = token.unit_amount() else {
            return ComparisonResult::rejected(
                symbol,
                None,
                None,
                None,
                RejectReason::FetchFailed,
                format!(
                    "{} has {} decimals, at most {} are supported",
                    symbol, token.decimals, MAX_DECIMALS
                ),
                now_utc(),
            );
        };
        let request = DexQuoteRequest {
            input_mint: token.mint.clone(),
            output_mint: quote_asset.mint.clone(),
            amount,
            slippage_bps: self.config.slippage_bps,
        };

        let (cex, dex) = tokio::join!(self.fetch_cex(symbol), self.fetch_dex(&request));
        let timestamp = now_utc();

        let cex = cex.map(|ticker| normalize_cex(self.cex.name(), &ticker, timestamp));
        let dex = dex.and_then(|quote| {
            normalize_dex(self.dex.name(), &quote, token, quote_asset, timestamp)
        });

        let (cex, dex) = match (cex, dex) {
            (Ok(cex), Ok(dex)) => (cex, dex),
            (cex, dex) => {
                let mut failures = Vec::new();
                if let Err(e) = &cex {
                    log_fetch_error(symbol, self.cex.name(), e);
                    failures.push(format!("{}: {}", self.cex.name(), e));
                }
                if let Err(e) = &dex {
                    log_fetch_error(symbol, self.dex.name(), e);
                    failures.push(format!("{}: {}", self.dex.name(), e));
                }
                return ComparisonResult::rejected(
                    symbol,
                    cex.as_ref().ok(),
                    dex.as_ref().ok(),
                    None,
                    RejectReason::FetchFailed,
                    failures.join("; "),
                    timestamp,
                );
            }
        };

        match self.validator.validate(symbol, &cex, &dex) {
            Ok(spread) => ComparisonResult::valid(symbol, &cex, &dex, spread, timestamp),
            Err(rejection) => ComparisonResult::rejected(
                symbol,
                Some(&cex),
                Some(&dex),
                rejection.spread_pct,
                rejection.reason,
                rejection.detail,
                timestamp,
            ),
        }
    }

    async fn fetch_cex(&self, symbol: &str) -> QuoteResult<CexTicker> {
        with_timeout(
            self.cex.name(),
            self.config.cex_timeout,
            self.cex.get_ticker(symbol),
        )
        .await
    }

    async fn fetch_dex(&self, request: &DexQuoteRequest) -> QuoteResult<DexQuote> {
        with_timeout(
            self.dex.name(),
            self.config.dex_timeout,
            self.dex.get_quote(request),
        )
        .await
    }

    /// History first, then the durable log. A log failure is only a warning.
    async fn record(&self, result: &ComparisonResult) {
        match result.reason() {
            None => {
                self.stats.valid.fetch_add(1, Ordering::Relaxed);
                if let Some(record) = result.to_history_record() {
                    self.history.append(&result.symbol, record);
                }
            }
            Some(reason) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                if reason == RejectReason::FetchFailed {
                    self.stats.fetch_failures.fetch_add(1, Ordering::Relaxed);
                }
                debug!(
                    symbol = %result.symbol,
                    reason = %reason,
                    error = result.error().unwrap_or_default(),
                    "Comparison rejected"
                );
            }
        }

        if let Err(e) = self.log.append(result).await {
            self.stats.persistence_failures.fetch_add(1, Ordering::Relaxed);
            warn!(symbol = %result.symbol, error = %e, "Failed to persist comparison");
        }
    }
}

/// Transient venue errors are worth a warning; the rest repeat every scan.
fn log_fetch_error(symbol: &str, venue: &str, error: &QuoteError) {
    if error.is_transient() {
        warn!(symbol, venue, error = %error, "Quote fetch failed");
    } else {
        debug!(symbol, venue, error = %error, "Quote unavailable");
    }
}

async fn with_timeout<T>(
    venue: &str,
    timeout: Duration,
    fetch: impl Future<Output = QuoteResult<T>>,
) -> QuoteResult<T> {
    match tokio::time::timeout(timeout, fetch).await {
        Ok(result) => result,
        Err(_) => Err(QuoteError::Timeout {
            venue: venue.to_string(),
            timeout,
        }),
    }
}
