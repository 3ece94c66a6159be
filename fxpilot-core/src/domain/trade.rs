//! Trade actions and the final recommendation value object.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
    Close,
}

impl TradeAction {
    /// HOLD and CLOSE have no successors in the search tree.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Hold | Self::Close)
    }

    /// True for actions that open exposure.
    pub fn opens_position(self) -> bool {
        matches!(self, Self::Buy | Self::Sell)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
            Self::Hold => "hold",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecommendation {
    pub action: TradeAction,
    pub pair: String,
    pub entry_price: f64,
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub leverage: f64,
    pub expected_profit: f64,
    pub risk_reward_ratio: f64,
    /// In [0, 1].
    pub confidence_score: f64,
    pub reasoning: String,
}

impl TradeRecommendation {
    /// A no-trade recommendation at `price`.
    pub fn hold(pair: impl Into<String>, price: f64, reasoning: impl Into<String>) -> Self {
        Self {
            action: TradeAction::Hold,
            pair: pair.into(),
            entry_price: price,
            position_size: 0.0,
            stop_loss: price,
            take_profit: price,
            leverage: 1.0,
            expected_profit: 0.0,
            risk_reward_ratio: 0.0,
            confidence_score: 0.0,
            reasoning: reasoning.into(),
        }
    }
}
