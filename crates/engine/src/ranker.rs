//! Top-N selection over a batch of comparison results.

use spread_core::ComparisonResult;
use std::cmp::Ordering;

/// Select at most `n` valid results, ordered by descending |spread| with
/// ties broken by ascending symbol.
///
/// Invalid results and results without a finite spread are skipped. An
/// empty output is not an error.
pub fn rank(results: &[ComparisonResult], n: usize) -> Vec<ComparisonResult> {
    let mut ranked: Vec<&ComparisonResult> = results
        .iter()
        .filter(|r| r.ranking_spread().is_some())
        .collect();

    ranked.sort_by(|a, b| compare_ranked(a, b));
    ranked.into_iter().take(n).cloned().collect()
}

/// Ordering used by [`rank`], exposed for callers that sort in place.
pub fn compare_ranked(a: &ComparisonResult, b: &ComparisonResult) -> Ordering {
    match (a.ranking_spread(), b.ranking_spread()) {
        (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.symbol.cmp(&b.symbol)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.symbol.cmp(&b.symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use compact_str::CompactString;
    use spread_core::{RawQuote, RejectReason};

    fn raw(price: f64) -> RawQuote {
        RawQuote {
            price,
            volume_24h: 10_000.0,
            trend_24h: None,
            slippage: None,
            source: CompactString::new("Jupiter"),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn valid(symbol: &str, spread: f64) -> ComparisonResult {
        ComparisonResult::valid(symbol, &raw(1.0), &raw(1.0), spread, raw(1.0).timestamp)
    }

    fn invalid(symbol: &str) -> ComparisonResult {
        ComparisonResult::rejected(
            symbol,
            None,
            None,
            Some(9.9),
            RejectReason::SpreadTooHigh,
            "Spread too high: +99.00%",
            raw(1.0).timestamp,
        )
    }

    fn spreads(results: &[ComparisonResult]) -> Vec<f64> {
        results.iter().map(|r| r.spread_pct.unwrap()).collect()
    }

    #[test]
    fn test_rank_batch_scenario() {
        let batch = vec![
            valid("AAA", 0.5),
            invalid("BBB"),
            valid("CCC", 3.8),
            invalid("DDD"),
            valid("EEE", -1.2),
        ];

        let top = rank(&batch, 3);
        assert_eq!(top.len(), 3);
        assert_eq!(spreads(&top), vec![3.8, -1.2, 0.5]);
    }

    #[test]
    fn test_rank_by_absolute_value() {
        let batch = vec![valid("A", 2.0), valid("B", -5.0), valid("C", 4.0)];
        let top = rank(&batch, 10);
        assert_eq!(spreads(&top), vec![-5.0, 4.0, 2.0]);
    }

    #[test]
    fn test_ties_broken_by_symbol() {
        let batch = vec![valid("WIF", -2.0), valid("BONK", 2.0), valid("JUP", 2.0)];
        let top = rank(&batch, 3);
        let symbols: Vec<&str> = top.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BONK", "JUP", "WIF"]);
    }

    #[test]
    fn test_fewer_valid_than_n() {
        let batch = vec![valid("A", 1.0), invalid("B")];
        assert_eq!(rank(&batch, 5).len(), 1);
    }

    #[test]
    fn test_no_valid_results() {
        let batch = vec![invalid("A"), invalid("B")];
        assert!(rank(&batch, 3).is_empty());
        assert!(rank(&[], 3).is_empty());
    }

    #[test]
    fn test_n_zero() {
        assert!(rank(&[valid("A", 1.0)], 0).is_empty());
    }

    #[test]
    fn test_non_finite_spread_excluded() {
        let batch = vec![valid("A", f64::NAN), valid("B", 1.0)];
        let top = rank(&batch, 3);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].symbol.as_str(), "B");
    }

    #[test]
    fn test_compare_ranked_matches_rank() {
        let mut batch = vec![invalid("Z"), valid("B", 1.0), valid("A", 1.0), valid("C", 3.0)];
        let expected = rank(&batch, batch.len());
        batch.sort_by(compare_ranked);
        assert_eq!(&batch[..3], &expected[..]);
        assert_eq!(batch[3].symbol.as_str(), "Z");
    }
}
