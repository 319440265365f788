//! Jupiter swap quote client.
//!
//! A quote needs two calls: the swap quote itself and the token info record
//! that carries 24h volume. Both run concurrently.

use crate::error::{get_body, parse_body};
use async_trait::async_trait;
use serde::Deserialize;
use spread_core::{DexQuote, DexQuoteProvider, DexQuoteRequest, QuoteError, QuoteResult};
use std::time::Duration;

pub const JUPITER_QUOTE_URL: &str = "https://quote-api.jup.ag";
pub const JUPITER_TOKENS_URL: &str = "https://tokens.jup.ag";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    in_amount: String,
    out_amount: String,
    #[serde(default)]
    price_impact_pct: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    daily_volume: Option<f64>,
}

/// Swap quote fields, before volume is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapQuote {
    pub in_amount: u64,
    pub out_amount: u64,
    pub price_impact_pct: f64,
}

/// Parse a `/v6/quote` response body.
pub fn parse_quote(body: &str) -> QuoteResult<SwapQuote> {
    let quote: QuoteResponse = parse_body(body)?;
    let amount = |field: &str, value: &str| {
        value
            .parse::<u64>()
            .map_err(|_| QuoteError::Parse(format!("{} is not an integer: {:?}", field, value)))
    };

    let price_impact_pct = match quote.price_impact_pct.as_deref() {
        Some(s) => s
            .parse::<f64>()
            .map_err(|_| QuoteError::Parse(format!("priceImpactPct is not a number: {:?}", s)))?,
        None => 0.0,
    };

    Ok(SwapQuote {
        in_amount: amount("inAmount", &quote.in_amount)?,
        out_amount: amount("outAmount", &quote.out_amount)?,
        price_impact_pct,
    })
}

/// Parse a `/token/{mint}` response body into its daily volume.
pub fn parse_daily_volume(body: &str) -> QuoteResult<f64> {
    let token: TokenResponse = parse_body(body)?;
    Ok(token.daily_volume.unwrap_or(0.0))
}

/// DEX provider backed by the Jupiter quote and token APIs.
#[derive(Debug, Clone)]
pub struct JupiterClient {
    client: reqwest::Client,
    quote_url: String,
    tokens_url: String,
    timeout: Duration,
}

impl JupiterClient {
    pub fn new(
        quote_url: impl Into<String>,
        tokens_url: impl Into<String>,
        timeout: Duration,
    ) -> QuoteResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::Http(e.to_string()))?;
        Ok(Self {
            client,
            quote_url: quote_url.into().trim_end_matches('/').to_string(),
            tokens_url: tokens_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    async fn fetch_swap(&self, request: &DexQuoteRequest) -> QuoteResult<SwapQuote> {
        let url = format!("{}/v6/quote", self.quote_url);
        let query = [
            ("inputMint", request.input_mint.to_string()),
            ("outputMint", request.output_mint.to_string()),
            ("amount", request.amount.to_string()),
            ("slippageBps", request.slippage_bps.to_string()),
        ];
        let body = get_body(&self.client, self.name(), self.timeout, &url, &query).await?;
        parse_quote(&body)
    }

    async fn fetch_daily_volume(&self, mint: &str) -> QuoteResult<f64> {
        let url = format!("{}/token/{}", self.tokens_url, mint);
        let body = get_body(&self.client, self.name(), self.timeout, &url, &[]).await?;
        parse_daily_volume(&body)
    }
}

#[async_trait]
impl DexQuoteProvider for JupiterClient {
    fn name(&self) -> &str {
        "Jupiter"
    }

    async fn get_quote(&self, request: &DexQuoteRequest) -> QuoteResult<DexQuote> {
        let (swap, volume) = tokio::join!(
            self.fetch_swap(request),
            self.fetch_daily_volume(&request.input_mint)
        );
        let swap = swap?;

        Ok(DexQuote {
            in_amount: swap.in_amount,
            out_amount: swap.out_amount,
            price_impact_pct: swap.price_impact_pct,
            daily_volume: volume?,
        })
    }
}
