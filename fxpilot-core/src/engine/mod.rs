//! Decision pipeline: snapshot → features → forecast → risk → optimized trade.
//!
//! Each call runs the four stages in order and owns all intermediate state,
//! so one [`DecisionEngine`] can serve concurrent callers.

pub mod config;
pub mod decision;

pub use config::{EngineConfig, EngineError};
pub use decision::{Decision, DecisionEngine};
