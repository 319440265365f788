//! OKX spot ticker client.
//!
//! Public market data only; no credentials are needed.

use crate::error::{get_body, parse_body};
use async_trait::async_trait;
use serde::Deserialize;
use spread_core::{normalize_symbol, CexQuoteProvider, CexTicker, QuoteError, QuoteResult};
use std::time::Duration;

pub const OKX_BASE_URL: &str = "https://www.okx.com";

#[derive(Debug, Deserialize)]
struct TickerEnvelope {
    code: String,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Vec<TickerData>,
}

#[derive(Debug, Deserialize)]
struct TickerData {
    last: String,
    vol24h: String,
    #[serde(default)]
    open24h: Option<String>,
}

fn parse_number(field: &str, value: &str) -> QuoteResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| QuoteError::Parse(format!("{} is not a number: {:?}", field, value)))
}

/// Parse a `/api/v5/market/ticker` response body.
pub fn parse_ticker(inst_id: &str, body: &str) -> QuoteResult<CexTicker> {
    let envelope: TickerEnvelope = parse_body(body)?;
    if envelope.code != "0" {
        return Err(QuoteError::Parse(format!(
            "OKX error code {}: {}",
            envelope.code, envelope.msg
        )));
    }

    let ticker = envelope
        .data
        .into_iter()
        .next()
        .ok_or_else(|| QuoteError::NotFound(inst_id.to_string()))?;

    let last = parse_number("last", &ticker.last)?;
    let volume = parse_number("vol24h", &ticker.vol24h)?;
    let change = match ticker.open24h.as_deref() {
        Some(open) => {
            let open = parse_number("open24h", open)?;
            (open != 0.0).then(|| (last - open) / open * 100.0)
        }
        None => None,
    };

    Ok(CexTicker {
        last_price: last,
        volume_24h_base: volume,
        change_24h_pct: change,
    })
}

/// CEX provider backed by the OKX REST API.
#[derive(Debug, Clone)]
pub struct OkxClient {
    client: reqwest::Client,
    base_url: String,
    quote_symbol: String,
    timeout: Duration,
}

impl OkxClient {
    pub fn new(base_url: impl Into<String>, quote_symbol: &str, timeout: Duration) -> QuoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::Http(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            quote_symbol: normalize_symbol(quote_symbol).to_string(),
            timeout,
        })
    }

    /// Instrument id for `symbol`, e.g. `SOL-USDC`.
    pub fn inst_id(&self, symbol: &str) -> String {
        format!("{}-{}", normalize_symbol(symbol), self.quote_symbol)
    }
}

#[async_trait]
impl CexQuoteProvider for OkxClient {
    fn name(&self) -> &str {
        "OKX"
    }

    async fn get_ticker(&self, symbol: &str) -> QuoteResult<CexTicker> {
        let inst_id = self.inst_id(symbol);
        let url = format!("{}/api/v5/market/ticker", self.base_url);
        let body = get_body(
            &self.client,
            self.name(),
            self.timeout,
            &url,
            &[("instId", inst_id.clone())],
        )
        .await?;
        parse_ticker(&inst_id, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SOL_TICKER: &str = r#"{
        "code": "0",
        "msg": "",
        "data": [{
            "instType": "SPOT",
            "instId": "SOL-USDC",
            "last": "150.5",
            "lastSz": "0.1",
            "open24h": "140",
            "high24h": "152",
            "low24h": "139",
            "vol24h": "12000.5",
            "volCcy24h": "1800000",
            "ts": "1700000000000"
        }]
    }"#;

    #[test]
    fn test_parse_ticker() {
        let ticker = parse_ticker("SOL-USDC", SOL_TICKER).unwrap();
        assert_eq!(ticker.last_price, 150.5);
        assert_eq!(ticker.volume_24h_base, 12000.5);
        assert!((ticker.change_24h_pct.unwrap() - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_open_has_no_trend() {
        let body = r#"{"code":"0","data":[{"last":"1.0","vol24h":"10","open24h":"0"}]}"#;
        let ticker = parse_ticker("X-USDC", body).unwrap();
        assert_eq!(ticker.change_24h_pct, None);
    }

    #[test]
    fn test_empty_data_is_not_found() {
        let body = r#"{"code":"0","msg":"","data":[]}"#;
        assert_eq!(
            parse_ticker("DOGE-USDC", body),
            Err(QuoteError::NotFound("DOGE-USDC".to_string()))
        );
    }

    #[test]
    fn test_error_code() {
        let body = r#"{"code":"51001","msg":"Instrument ID does not exist","data":[]}"#;
        let err = parse_ticker("FOO-USDC", body).unwrap_err();
        assert!(err.to_string().contains("51001"));
    }

    #[test]
    fn test_non_numeric_field() {
        let body = r#"{"code":"0","data":[{"last":"abc","vol24h":"10","open24h":"1"}]}"#;
        assert!(matches!(parse_ticker("X-USDC", body), Err(QuoteError::Parse(_))));
    }

    #[test]
    fn test_inst_id() {
        let client = OkxClient::new("https://www.okx.com/", "usdc", Duration::from_secs(10)).unwrap();
        assert_eq!(client.inst_id("sol"), "SOL-USDC");
        assert_eq!(client.base_url, "https://www.okx.com");
    }
}
