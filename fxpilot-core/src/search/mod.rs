//! Beam search over candidate trade states.

pub mod optimizer;
pub mod scoring;
pub mod state;

pub use optimizer::{Optimization, StrategyOptimizer};
pub use scoring::{ScoreSignals, ScoringWeights};
pub use state::{SearchState, StateArena};

use serde::{Deserialize, Serialize};

/// Beam search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// States kept per depth. Values below 1 are treated as 1.
    pub beam_width: usize,
    /// Expansion rounds after the initial states.
    pub max_depth: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            beam_width: 5,
            max_depth: 3,
        }
    }
}
