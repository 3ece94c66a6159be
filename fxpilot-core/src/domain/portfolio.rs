//! Portfolio: account state supplied by the caller, read-only to the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
    #[error("capital must be finite and positive, got {0}")]
    InvalidCapital(f64),
    #[error("cumulative profit/loss must be finite, got {0}")]
    InvalidProfitLoss(f64),
    #[error("max drawdown must be a fraction in [0, 1], got {0}")]
    InvalidDrawdown(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PortfolioRecord")]
pub struct Portfolio {
    capital: f64,
    open_positions: u32,
    total_profit_loss: f64,
    max_drawdown: f64,
}

impl Portfolio {
    pub fn new(
        capital: f64,
        open_positions: u32,
        total_profit_loss: f64,
        max_drawdown: f64,
    ) -> Result<Self, PortfolioError> {
        if !capital.is_finite() || capital <= 0.0 {
            return Err(PortfolioError::InvalidCapital(capital));
        }
        if !total_profit_loss.is_finite() {
            return Err(PortfolioError::InvalidProfitLoss(total_profit_loss));
        }
        if !(0.0..=1.0).contains(&max_drawdown) {
            return Err(PortfolioError::InvalidDrawdown(max_drawdown));
        }
        Ok(Self {
            capital,
            open_positions,
            total_profit_loss,
            max_drawdown,
        })
    }

    /// A fresh account: no positions, no history.
    pub fn with_capital(capital: f64) -> Result<Self, PortfolioError> {
        Self::new(capital, 0, 0.0, 0.0)
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    pub fn open_positions(&self) -> u32 {
        self.open_positions
    }

    pub fn total_profit_loss(&self) -> f64 {
        self.total_profit_loss
    }

    pub fn max_drawdown(&self) -> f64 {
        self.max_drawdown
    }

    pub fn has_open_positions(&self) -> bool {
        self.open_positions > 0
    }
}

#[derive(Deserialize)]
struct PortfolioRecord {
    capital: f64,
    #[serde(default)]
    open_positions: u32,
    #[serde(default)]
    total_profit_loss: f64,
    #[serde(default)]
    max_drawdown: f64,
}

impl TryFrom<PortfolioRecord> for Portfolio {
    type Error = PortfolioError;

    fn try_from(r: PortfolioRecord) -> Result<Self, Self::Error> {
        Self::new(r.capital, r.open_positions, r.total_profit_loss, r.max_drawdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_account() {
        let p = Portfolio::with_capital(10_000.0).unwrap();
        assert_eq!(p.capital(), 10_000.0);
        assert!(!p.has_open_positions());
        assert_eq!(p.max_drawdown(), 0.0);
    }

    #[test]
    fn rejects_non_positive_capital() {
        assert_eq!(
            Portfolio::with_capital(0.0),
            Err(PortfolioError::InvalidCapital(0.0))
        );
        assert!(Portfolio::with_capital(f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_drawdown_outside_unit_interval() {
        assert_eq!(
            Portfolio::new(1000.0, 0, 0.0, 1.5),
            Err(PortfolioError::InvalidDrawdown(1.5))
        );
        assert!(Portfolio::new(1000.0, 0, 0.0, -0.1).is_err());
    }

    #[test]
    fn deserialize_defaults_and_validates() {
        let p: Portfolio = serde_json::from_str(r#"{"capital": 5000.0}"#).unwrap();
        assert_eq!(p, Portfolio::with_capital(5000.0).unwrap());

        let bad = serde_json::from_str::<Portfolio>(r#"{"capital": -5.0}"#);
        assert!(bad.is_err());
    }
}
