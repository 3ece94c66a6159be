//! Trend forecasting: feature vector → directional probability distribution.

mod explain;
pub mod forecaster;
pub mod weights;

pub use forecaster::TrendForecaster;
pub use weights::{Priors, WeightTable};

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Bullish,
    Bearish,
    Neutral,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of [`TrendForecaster::forecast`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendForecast {
    pub pair: String,
    pub reference_price: f64,
    pub direction: TrendDirection,
    /// Largest posterior.
    pub confidence: f64,
    pub probability_up: f64,
    pub probability_down: f64,
    pub probability_neutral: f64,
    /// Absolute expected price delta.
    pub expected_move: f64,
    /// Blended short/medium/long realized volatility.
    pub volatility: f64,
    /// Normalized entropy of the posteriors, in [0, 1].
    pub uncertainty: f64,
    pub explanation: String,
}

impl TrendForecast {
    /// Posteriors in evaluation order: up, down, neutral.
    pub fn probabilities(&self) -> [f64; 3] {
        [
            self.probability_up,
            self.probability_down,
            self.probability_neutral,
        ]
    }

    /// Posterior supporting a directional action.
    pub fn probability_of(&self, direction: TrendDirection) -> f64 {
        match direction {
            TrendDirection::Bullish => self.probability_up,
            TrendDirection::Bearish => self.probability_down,
            TrendDirection::Neutral => self.probability_neutral,
        }
    }
}
