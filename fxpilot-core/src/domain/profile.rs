//! Trader profiles and their fixed risk parameters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trader profile '{0}' (expected conservative, balanced or aggressive)")]
pub struct ProfileError(pub String);

/// Named risk appetite selecting one of three fixed parameter records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraderProfile {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

/// Qualitative volatility tolerance carried by each profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityTolerance {
    Low,
    Medium,
    High,
}

/// Risk parameters for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileParams {
    /// Fraction of capital that may be lost on one trade.
    pub max_risk_per_trade: f64,
    pub max_leverage: f64,
    pub volatility_tolerance: VolatilityTolerance,
    /// Minimum take-profit / stop-loss ratio.
    pub profit_target_multiplier: f64,
    pub max_drawdown: f64,
}

impl TraderProfile {
    pub const ALL: [TraderProfile; 3] = [
        TraderProfile::Conservative,
        TraderProfile::Balanced,
        TraderProfile::Aggressive,
    ];

    pub fn params(self) -> ProfileParams {
        match self {
            Self::Conservative => ProfileParams {
                max_risk_per_trade: 0.01,
                max_leverage: 2.0,
                volatility_tolerance: VolatilityTolerance::Low,
                profit_target_multiplier: 1.5,
                max_drawdown: 0.05,
            },
            Self::Balanced => ProfileParams {
                max_risk_per_trade: 0.02,
                max_leverage: 5.0,
                volatility_tolerance: VolatilityTolerance::Medium,
                profit_target_multiplier: 2.0,
                max_drawdown: 0.10,
            },
            Self::Aggressive => ProfileParams {
                max_risk_per_trade: 0.05,
                max_leverage: 10.0,
                volatility_tolerance: VolatilityTolerance::High,
                profit_target_multiplier: 3.0,
                max_drawdown: 0.20,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for TraderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TraderProfile {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "conservative" => Ok(Self::Conservative),
            "balanced" => Ok(Self::Balanced),
            "aggressive" => Ok(Self::Aggressive),
            _ => Err(ProfileError(s.to_string())),
        }
    }
}

impl fmt::Display for VolatilityTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}
