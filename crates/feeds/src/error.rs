//! Mapping from HTTP client failures to [`QuoteError`].

use serde::de::DeserializeOwned;
use spread_core::{QuoteError, QuoteResult};
use std::time::Duration;
use tracing::debug;

/// Convert a reqwest failure, keeping timeouts distinguishable.
pub fn from_reqwest(venue: &str, timeout: Duration, err: reqwest::Error) -> QuoteError {
    if err.is_timeout() {
        QuoteError::Timeout {
            venue: venue.to_string(),
            timeout,
        }
    } else if err.is_decode() {
        QuoteError::Parse(err.to_string())
    } else {
        QuoteError::Http(err.to_string())
    }
}

/// Convert a JSON decoding failure.
pub fn from_json(err: serde_json::Error) -> QuoteError {
    QuoteError::Parse(err.to_string())
}

/// GET `url` and return the body of a successful response.
pub(crate) async fn get_body(
    client: &reqwest::Client,
    venue: &str,
    timeout: Duration,
    url: &str,
    query: &[(&str, String)],
) -> QuoteResult<String> {
    debug!("{}: GET {}", venue, url);

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| from_reqwest(venue, timeout, e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| from_reqwest(venue, timeout, e))?;

    if !status.is_success() {
        debug!("{}: HTTP {} from {}", venue, status, url);
        return Err(QuoteError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// Parse a body that was already checked for a success status.
pub(crate) fn parse_body<T: DeserializeOwned>(body: &str) -> QuoteResult<T> {
    serde_json::from_str(body).map_err(from_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_body_error_is_parse() {
        let err = parse_body::<serde_json::Value>("{not json").unwrap_err();
        assert!(matches!(err, QuoteError::Parse(_)));
        assert!(!err.is_transient());
    }
}
