//! Venue quote providers.
//!
//! - `okx` - centralized exchange ticker (CEX leg)
//! - `jupiter` - Solana swap aggregator quote (DEX leg)

pub mod error;
pub mod jupiter;
pub mod okx;

pub use error::*;
pub use jupiter::*;
pub use okx::*;
