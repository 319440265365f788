//! Spread comparison engine.
//!
//! Validation, spread calculation, bounded history and ranking, plus the
//! orchestrator that drives them against the venue providers.

pub mod config;
pub mod history;
pub mod memory_log;
pub mod mock;
pub mod normalize;
pub mod orchestrator;
pub mod ranker;
pub mod spread;
pub mod validator;

pub use config::*;
pub use history::*;
pub use memory_log::*;
pub use normalize::*;
pub use orchestrator::*;
pub use ranker::*;
pub use spread::*;
pub use validator::*;
