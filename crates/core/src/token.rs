//! Supported instruments and their on-chain identifiers.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// USDC mint on Solana.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// Largest decimals value whose unit amount fits in a `u64`.
pub const MAX_DECIMALS: u8 = 19;

/// A token tradable on both venues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Ticker symbol (e.g., "SOL", "JUP")
    pub symbol: CompactString,
    /// Mint address on the DEX network
    pub mint: CompactString,
    /// Decimal places of the on-chain token
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(symbol: &str, mint: &str, decimals: u8) -> Self {
        Self {
            symbol: normalize_symbol(symbol),
            mint: CompactString::new(mint),
            decimals,
        }
    }

    /// Base units that make up one whole token, or `None` past [`MAX_DECIMALS`].
    #[inline]
    pub fn unit_amount(&self) -> Option<u64> {
        10u64.checked_pow(u32::from(self.decimals))
    }

    /// `10^decimals` as a float divisor.
    #[inline]
    pub fn unit_scale(&self) -> f64 {
        10f64.powi(i32::from(self.decimals))
    }

    /// USDC, the quote asset for every pair.
    pub fn usdc() -> Self {
        Self::new("USDC", USDC_MINT, 6)
    }
}

/// Upper-case a user supplied symbol.
pub fn normalize_symbol(symbol: &str) -> CompactString {
    CompactString::new(symbol.trim().to_ascii_uppercase())
}

/// The configured set of supported instruments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRegistry {
    /// Quote asset shared by all pairs.
    pub quote: TokenInfo,
    tokens: BTreeMap<CompactString, TokenInfo>,
}

impl TokenRegistry {
    /// Create a registry quoted in `quote`.
    pub fn new(quote: TokenInfo, tokens: impl IntoIterator<Item = TokenInfo>) -> Self {
        let tokens = tokens
            .into_iter()
            .map(|t| (t.symbol.clone(), t))
            .collect();
        Self { quote, tokens }
    }

    /// Solana tokens listed on OKX spot against USDC.
    pub fn default_solana() -> Self {
        Self::new(
            TokenInfo::usdc(),
            [
                TokenInfo::new("SOL", "So11111111111111111111111111111111111111112", 9),
                TokenInfo::new("JUP", "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN", 6),
                TokenInfo::new("BONK", "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263", 5),
                TokenInfo::new("WIF", "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm", 6),
                TokenInfo::new("RAY", "4k3Dyjzvzp8eMZWUXbBCjEvwSkkk59S5iCNLY3QrkX6R", 6),
                TokenInfo::new("JTO", "jtojtomepa8beP8AuQc6eXt5FriJwfFMwQx2v2f9mCL", 9),
                TokenInfo::new("PYTH", "HZ1JovNiVvGrGNiiYvEozEVgZ58xaU3RKwX8eACQBCt3", 6),
            ],
        )
    }

    /// Look up a token by symbol (case-insensitive).
    pub fn get(&self, symbol: &str) -> Option<&TokenInfo> {
        self.tokens.get(&normalize_symbol(symbol))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.get(symbol).is_some()
    }

    /// All supported symbols in ascending order.
    pub fn symbols(&self) -> Vec<CompactString> {
        self.tokens.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::default_solana()
    }
}
