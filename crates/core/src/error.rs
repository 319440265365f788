//! Error taxonomy for quote comparison.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Why a comparison attempt produced an invalid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    UnsupportedSymbol,
    FetchFailed,
    PriceTooLow,
    VolumeTooLow,
    SpreadTooHigh,
}

impl RejectReason {
    /// Stable identifier used in storage and API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::UnsupportedSymbol => "UnsupportedSymbol",
            RejectReason::FetchFailed => "FetchFailed",
            RejectReason::PriceTooLow => "PriceTooLow",
            RejectReason::VolumeTooLow => "VolumeTooLow",
            RejectReason::SpreadTooHigh => "SpreadTooHigh",
        }
    }
}

/// Unrecognized [`RejectReason`] identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown reject reason {0:?}")]
pub struct ParseReasonError(pub String);

impl FromStr for RejectReason {
    type Err = ParseReasonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UnsupportedSymbol" => Ok(RejectReason::UnsupportedSymbol),
            "FetchFailed" => Ok(RejectReason::FetchFailed),
            "PriceTooLow" => Ok(RejectReason::PriceTooLow),
            "VolumeTooLow" => Ok(RejectReason::VolumeTooLow),
            "SpreadTooHigh" => Ok(RejectReason::SpreadTooHigh),
            other => Err(ParseReasonError(other.to_string())),
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by venue quote providers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuoteError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("unexpected HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{venue} did not respond within {timeout:?}")]
    Timeout { venue: String, timeout: Duration },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("no market data for {0}")]
    NotFound(String),
}

impl QuoteError {
    /// Returns true if a retry on the next scan is likely to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            QuoteError::Http(_) | QuoteError::Timeout { .. } => true,
            QuoteError::Status { status, .. } => *status == 429 || *status >= 500,
            QuoteError::Parse(_) | QuoteError::NotFound(_) => false,
        }
    }
}

/// Result type for quote providers.
pub type QuoteResult<T> = Result<T, QuoteError>;

/// Errors returned by the durable comparison log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("stored entry is malformed: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_str_roundtrip() {
        for reason in [
            RejectReason::UnsupportedSymbol,
            RejectReason::FetchFailed,
            RejectReason::PriceTooLow,
            RejectReason::VolumeTooLow,
            RejectReason::SpreadTooHigh,
        ] {
            assert_eq!(reason.as_str().parse::<RejectReason>(), Ok(reason));
        }
        assert_eq!(
            "Other".parse::<RejectReason>(),
            Err(ParseReasonError("Other".to_string()))
        );
    }

    #[test]
    fn test_quote_error_transient() {
        assert!(QuoteError::Http("reset".into()).is_transient());
        assert!(QuoteError::Timeout {
            venue: "OKX".into(),
            timeout: Duration::from_secs(10)
        }
        .is_transient());
        assert!(QuoteError::Status { status: 503, body: String::new() }.is_transient());
        assert!(QuoteError::Status { status: 429, body: String::new() }.is_transient());
        assert!(!QuoteError::Status { status: 404, body: String::new() }.is_transient());
        assert!(!QuoteError::Parse("bad json".into()).is_transient());
    }

    #[test]
    fn test_timeout_message() {
        let err = QuoteError::Timeout {
            venue: "Jupiter".into(),
            timeout: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "Jupiter did not respond within 10s");
    }
}
