//! Interfaces to the collaborators around the comparison engine.

use crate::{CexTicker, ComparisonResult, DexQuote, DexQuoteRequest, LogError, PersistedEntry, QuoteResult};
use async_trait::async_trait;

/// Centralized venue ticker source.
#[async_trait]
pub trait CexQuoteProvider: Send + Sync {
    /// Venue name used in logs and error details.
    fn name(&self) -> &str;

    /// Fetch the ticker for `symbol` against the quote currency.
    async fn get_ticker(&self, symbol: &str) -> QuoteResult<CexTicker>;
}

/// Decentralized venue swap quote source.
#[async_trait]
pub trait DexQuoteProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Quote a swap of `request.amount` input base units.
    async fn get_quote(&self, request: &DexQuoteRequest) -> QuoteResult<DexQuote>;
}

/// Durable append-only record of every comparison attempt.
///
/// Implementations must make each `append` atomic under concurrent callers.
#[async_trait]
pub trait ComparisonLog: Send + Sync {
    /// Append one attempt, returning its identifier.
    async fn append(&self, result: &ComparisonResult) -> Result<i64, LogError>;

    /// Most recent entries for `symbol`, newest first.
    async fn read(&self, symbol: &str, limit: usize) -> Result<Vec<PersistedEntry>, LogError>;
}
