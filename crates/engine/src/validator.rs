//! Sanity rules applied to a pair of normalized quotes.

use crate::{spread_pct, Thresholds};
use spread_core::{RawQuote, RejectReason, TokenRegistry};

/// A failed validation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub reason: RejectReason,
    pub detail: String,
    /// Spread, when it was computed before the rule failed
    pub spread_pct: Option<f64>,
}

impl Rejection {
    fn new(reason: RejectReason, detail: String) -> Self {
        Self {
            reason,
            detail,
            spread_pct: None,
        }
    }

    /// Rejection for a symbol missing from the registry.
    pub fn unsupported(symbol: &str) -> Self {
        Self::new(
            RejectReason::UnsupportedSymbol,
            format!("Token {} not supported", symbol),
        )
    }
}

/// `Ok(spread_pct)` when every rule passes.
pub type ValidationOutcome = Result<f64, Rejection>;

/// Applies the rules in order; the first failure wins.
///
/// 1. symbol is in the registry
/// 2. both prices >= `min_price`
/// 3. DEX volume >= `min_volume`
/// 4. |spread| <= `max_spread_pct`
#[derive(Debug, Clone)]
pub struct QuoteValidator {
    registry: TokenRegistry,
    thresholds: Thresholds,
}

impl QuoteValidator {
    pub fn new(registry: TokenRegistry, thresholds: Thresholds) -> Self {
        Self {
            registry,
            thresholds,
        }
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Rule 1 on its own, for callers that must resolve the token first.
    pub fn check_symbol(&self, symbol: &str) -> Result<(), Rejection> {
        if self.registry.contains(symbol) {
            Ok(())
        } else {
            Err(Rejection::unsupported(symbol))
        }
    }

    pub fn validate(&self, symbol: &str, cex: &RawQuote, dex: &RawQuote) -> ValidationOutcome {
        self.check_symbol(symbol)?;

        let t = &self.thresholds;

        // Negated comparisons so NaN fails every rule.
        if !(cex.price >= t.min_price) || !(dex.price >= t.min_price) {
            return Err(Rejection::new(
                RejectReason::PriceTooLow,
                format!(
                    "Price too low: CEX {} / DEX {} (min {})",
                    cex.price, dex.price, t.min_price
                ),
            ));
        }

        if !(dex.volume_24h >= t.min_volume) {
            return Err(Rejection::new(
                RejectReason::VolumeTooLow,
                format!(
                    "Volume too low: {:.2} {}",
                    dex.volume_24h, self.registry.quote.symbol
                ),
            ));
        }

        let spread = spread_pct(cex.price, dex.price);
        if !(spread.abs() <= t.max_spread_pct) {
            return Err(Rejection {
                reason: RejectReason::SpreadTooHigh,
                detail: format!("Spread too high: {:+.2}%", spread),
                spread_pct: Some(spread),
            });
        }

        Ok(spread)
    }
}
