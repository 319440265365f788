//! Spread calculation between the two venues.

use serde::{Deserialize, Serialize};

/// Spread in percent: `(price_dex - price_cex) / price_cex * 100`.
///
/// Callers guarantee `price_cex > 0`; the validator rejects anything below
/// the minimum price before this is reached.
#[inline]
pub fn spread_pct(price_cex: f64, price_dex: f64) -> f64 {
    (price_dex - price_cex) / price_cex * 100.0
}

/// Profitable trade direction implied by a spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadDirection {
    /// DEX is more expensive: buy on the CEX, sell on the DEX.
    BuyCexSellDex,
    /// CEX is more expensive: buy on the DEX, sell on the CEX.
    BuyDexSellCex,
    Flat,
}

impl SpreadDirection {
    pub fn from_spread(spread_pct: f64) -> Self {
        if spread_pct > 0.0 {
            SpreadDirection::BuyCexSellDex
        } else if spread_pct < 0.0 {
            SpreadDirection::BuyDexSellCex
        } else {
            SpreadDirection::Flat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spread_positive_when_dex_higher() {
        let spread = spread_pct(1.30, 1.35);
        assert!((spread - 3.846153846).abs() < 1e-6);
        assert_eq!(SpreadDirection::from_spread(spread), SpreadDirection::BuyCexSellDex);
    }

    #[test]
    fn test_spread_negative_when_cex_higher() {
        let spread = spread_pct(100.0, 95.0);
        assert!((spread + 5.0).abs() < 1e-12);
        assert_eq!(SpreadDirection::from_spread(spread), SpreadDirection::BuyDexSellCex);
    }

    #[test]
    fn test_spread_zero_for_equal_prices() {
        assert_eq!(spread_pct(42.0, 42.0), 0.0);
        assert_eq!(SpreadDirection::from_spread(0.0), SpreadDirection::Flat);
    }

    #[test]
    fn test_spread_matches_formula() {
        let pairs = [(0.000002, 0.0000021), (150.25, 149.8), (0.9999, 1.0001), (61000.0, 61250.0)];
        for (cex, dex) in pairs {
            let expected = (dex - cex) / cex * 100.0;
            assert!((spread_pct(cex, dex) - expected).abs() <= f64::EPSILON * expected.abs().max(1.0));
        }
    }
}
