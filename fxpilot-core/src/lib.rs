//! fxpilot core: a deterministic decision engine for FX trade recommendations.
//!
//! One call turns a market snapshot, a trader profile and a portfolio into a
//! single recommendation:
//! - Feature extraction over the recent candle window
//! - Bayesian-style trend forecast with calibrated probabilities
//! - Risk sizing as a constraint-satisfaction problem
//! - Beam search over candidate trades, scored per profile
//!
//! The crate does no I/O and holds no global state.

pub mod domain;
pub mod engine;
pub mod features;
pub mod forecast;
pub mod indicators;
pub mod risk;
pub mod search;
pub mod stats;

pub use domain::{
    MarketSnapshot, Ohlcv, Portfolio, TradeAction, TradeRecommendation, TraderProfile,
};
pub use engine::{Decision, DecisionEngine, EngineConfig, EngineError};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: engine inputs, outputs and the engine itself can
    /// cross threads, so batch callers can share one engine.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<DecisionEngine>();
        require_sync::<DecisionEngine>();
        require_send::<MarketSnapshot>();
        require_sync::<MarketSnapshot>();
        require_send::<Portfolio>();
        require_sync::<Portfolio>();
        require_send::<Decision>();
        require_sync::<Decision>();
        require_send::<EngineError>();
        require_sync::<EngineError>();

        require_send::<features::FeatureVector>();
        require_sync::<features::FeatureVector>();
        require_send::<forecast::TrendForecast>();
        require_sync::<forecast::TrendForecast>();
        require_send::<risk::RiskSolution>();
        require_sync::<risk::RiskSolution>();
        require_send::<search::StateArena>();
        require_sync::<search::StateArena>();
    }
}
