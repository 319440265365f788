//! Comparison results, history records and persisted entries.

use crate::{RawQuote, RejectReason};
use chrono::{DateTime, SubsecRound, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Wire format for all timestamps: ISO-8601, second resolution, UTC.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Current UTC time truncated to whole seconds.
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Render a timestamp in [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

/// Serde adapter for [`TIMESTAMP_FORMAT`] timestamps.
pub mod timestamp_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_timestamp(&s).map_err(serde::de::Error::custom)
    }
}

/// Outcome tag of a comparison attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    Valid,
    Invalid { reason: RejectReason, detail: String },
}

/// Result of comparing one symbol across both venues.
///
/// Built once per attempt and never mutated. A valid result always has
/// positive prices and a spread within the configured maximum; an invalid
/// one always carries its reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ComparisonResponse", try_from = "ComparisonResponse")]
pub struct ComparisonResult {
    pub symbol: CompactString,
    pub price_cex: f64,
    pub price_dex: f64,
    /// (dex - cex) / cex * 100; positive when the DEX is more expensive
    pub spread_pct: Option<f64>,
    /// 24h CEX volume in the quote currency
    pub volume_cex: f64,
    /// 24h DEX volume in the quote currency
    pub volume_dex: f64,
    pub slippage: Option<f64>,
    pub trend: Option<f64>,
    pub source: CompactString,
    pub timestamp: DateTime<Utc>,
    pub verdict: Verdict,
}

impl ComparisonResult {
    /// Build a valid result from two normalized quotes.
    pub fn valid(
        symbol: &str,
        cex: &RawQuote,
        dex: &RawQuote,
        spread_pct: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            price_cex: cex.price,
            price_dex: dex.price,
            spread_pct: Some(spread_pct),
            volume_cex: cex.volume_24h,
            volume_dex: dex.volume_24h,
            slippage: dex.slippage,
            trend: cex.trend_24h,
            source: dex.source.clone(),
            timestamp,
            verdict: Verdict::Valid,
        }
    }

    /// Build an invalid result, keeping whichever legs are known.
    pub fn rejected(
        symbol: &str,
        cex: Option<&RawQuote>,
        dex: Option<&RawQuote>,
        spread_pct: Option<f64>,
        reason: RejectReason,
        detail: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: CompactString::new(symbol),
            price_cex: cex.map(|q| q.price).unwrap_or(0.0),
            price_dex: dex.map(|q| q.price).unwrap_or(0.0),
            spread_pct,
            volume_cex: cex.map(|q| q.volume_24h).unwrap_or(0.0),
            volume_dex: dex.map(|q| q.volume_24h).unwrap_or(0.0),
            slippage: dex.and_then(|q| q.slippage),
            trend: cex.and_then(|q| q.trend_24h),
            source: dex.map(|q| q.source.clone()).unwrap_or_default(),
            timestamp,
            verdict: Verdict::Invalid {
                reason,
                detail: detail.into(),
            },
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self.verdict, Verdict::Valid)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match &self.verdict {
            Verdict::Valid => None,
            Verdict::Invalid { reason, .. } => Some(*reason),
        }
    }

    /// Human readable error, present iff the result is invalid.
    pub fn error(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Valid => None,
            Verdict::Invalid { detail, .. } => Some(detail),
        }
    }

    /// Spread magnitude, if this result takes part in ranking.
    pub fn ranking_spread(&self) -> Option<f64> {
        if !self.is_valid() {
            return None;
        }
        self.spread_pct.filter(|s| s.is_finite()).map(f64::abs)
    }

    /// Reduced projection stored in the in-memory history.
    pub fn to_history_record(&self) -> Option<HistoryRecord> {
        if !self.is_valid() {
            return None;
        }
        Some(HistoryRecord {
            symbol: self.symbol.clone(),
            price_cex: self.price_cex,
            price_dex: self.price_dex,
            spread_pct: self.spread_pct?,
            source: self.source.clone(),
            timestamp: self.timestamp,
        })
    }

    /// True if both results describe the same market observation,
    /// ignoring when it was taken.
    pub fn same_observation(&self, other: &ComparisonResult) -> bool {
        Self {
            timestamp: other.timestamp,
            ..self.clone()
        } == *other
    }
}

/// Flat API shape of a [`ComparisonResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    pub symbol: String,
    pub price_cex: f64,
    pub price_dex: f64,
    pub spread_pct: Option<f64>,
    pub volume_cex: f64,
    pub volume_dex: f64,
    pub slippage: Option<f64>,
    pub trend: Option<f64>,
    pub source: String,
    pub timestamp: String,
    pub is_valid: bool,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<RejectReason>,
}

impl From<ComparisonResult> for ComparisonResponse {
    fn from(result: ComparisonResult) -> Self {
        let (is_valid, error, error_kind) = match result.verdict {
            Verdict::Valid => (true, None, None),
            Verdict::Invalid { reason, detail } => (false, Some(detail), Some(reason)),
        };
        Self {
            symbol: result.symbol.to_string(),
            price_cex: result.price_cex,
            price_dex: result.price_dex,
            spread_pct: result.spread_pct,
            volume_cex: result.volume_cex,
            volume_dex: result.volume_dex,
            slippage: result.slippage,
            trend: result.trend,
            source: result.source.to_string(),
            timestamp: format_timestamp(&result.timestamp),
            is_valid,
            error,
            error_kind,
        }
    }
}

impl TryFrom<ComparisonResponse> for ComparisonResult {
    type Error = String;

    fn try_from(response: ComparisonResponse) -> Result<Self, Self::Error> {
        let verdict = match (response.is_valid, response.error, response.error_kind) {
            (true, None, _) => Verdict::Valid,
            (false, Some(detail), Some(reason)) => Verdict::Invalid { reason, detail },
            (false, Some(_), None) => return Err("invalid result without an error_kind".to_string()),
            (true, Some(_), _) => return Err("valid result carries an error".to_string()),
            (false, None, _) => return Err("invalid result without an error".to_string()),
        };
        let timestamp = parse_timestamp(&response.timestamp).map_err(|e| e.to_string())?;

        Ok(Self {
            symbol: CompactString::new(&response.symbol),
            price_cex: response.price_cex,
            price_dex: response.price_dex,
            spread_pct: response.spread_pct,
            volume_cex: response.volume_cex,
            volume_dex: response.volume_dex,
            slippage: response.slippage,
            trend: response.trend,
            source: CompactString::new(&response.source),
            timestamp,
            verdict,
        })
    }
}

/// Entry of the bounded in-memory history (valid comparisons only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub symbol: CompactString,
    pub price_cex: f64,
    pub price_dex: f64,
    pub spread_pct: f64,
    pub source: CompactString,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
}

/// A comparison attempt as written to the durable log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedEntry {
    /// Monotonically increasing identifier
    pub id: i64,
    pub symbol: CompactString,
    pub price_cex: f64,
    pub price_dex: f64,
    pub spread_pct: Option<f64>,
    pub volume_cex: f64,
    pub volume_dex: f64,
    pub slippage: Option<f64>,
    pub trend: Option<f64>,
    pub source: CompactString,
    pub is_valid: bool,
    pub error_kind: Option<RejectReason>,
    pub error_message: Option<String>,
    #[serde(with = "timestamp_format")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<Utc>,
}

impl PersistedEntry {
    /// Project a result into an entry with the given id and insertion time.
    pub fn from_result(id: i64, result: &ComparisonResult, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            symbol: result.symbol.clone(),
            price_cex: result.price_cex,
            price_dex: result.price_dex,
            spread_pct: result.spread_pct,
            volume_cex: result.volume_cex,
            volume_dex: result.volume_dex,
            slippage: result.slippage,
            trend: result.trend,
            source: result.source.clone(),
            is_valid: result.is_valid(),
            error_kind: result.reason(),
            error_message: result.error().map(str::to_string),
            timestamp: result.timestamp,
            created_at,
        }
    }
}
