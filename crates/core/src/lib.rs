//! Core data types for CEX/DEX spread comparison.

pub mod comparison;
pub mod error;
pub mod provider;
pub mod quote;
pub mod token;

pub use comparison::*;
pub use error::*;
pub use provider::*;
pub use quote::*;
pub use token::*;
