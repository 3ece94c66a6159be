use serde::{Deserialize, Serialize};

use super::constraint::Assignment;
use crate::domain::TradeAction;

/// Output of [`RiskConstraintSolver::solve`](super::RiskConstraintSolver::solve).
///
/// Levels are expressed for a long position. Use [`RiskSolution::levels_for`]
/// to get the mirrored levels of a short one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSolution {
    pub max_position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub leverage: f64,
    pub risk_amount: f64,
    pub is_valid: bool,
    /// Empty iff `is_valid`.
    pub violations: Vec<String>,
    pub reference_price: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl RiskSolution {
    pub(crate) fn from_assignment(a: &Assignment, price: f64) -> Self {
        Self {
            max_position_size: a.position_size,
            stop_loss: price * (1.0 - a.stop_loss_pct),
            take_profit: price * (1.0 + a.take_profit_pct),
            leverage: a.leverage,
            risk_amount: a.risk_amount(),
            is_valid: true,
            violations: Vec::new(),
            reference_price: price,
            stop_loss_pct: a.stop_loss_pct,
            take_profit_pct: a.take_profit_pct,
        }
    }

    pub(crate) fn infeasible(price: f64, violations: Vec<String>) -> Self {
        Self {
            max_position_size: 0.0,
            stop_loss: price,
            take_profit: price,
            leverage: 1.0,
            risk_amount: 0.0,
            is_valid: false,
            violations,
            reference_price: price,
            stop_loss_pct: 0.0,
            take_profit_pct: 0.0,
        }
    }

    /// `(stop_loss, take_profit)` for `action`; SELL mirrors around the
    /// reference price, HOLD and CLOSE use the price itself.
    pub fn levels_for(&self, action: TradeAction) -> (f64, f64) {
        let p = self.reference_price;
        match action {
            TradeAction::Buy => (self.stop_loss, self.take_profit),
            TradeAction::Sell => (
                p * (1.0 + self.stop_loss_pct),
                p * (1.0 - self.take_profit_pct),
            ),
            TradeAction::Hold | TradeAction::Close => (p, p),
        }
    }

    /// Recovers the winning assignment. `None` for an infeasible solution.
    pub fn assignment(&self) -> Option<Assignment> {
        self.is_valid.then(|| Assignment {
            position_size: self.max_position_size,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            leverage: self.leverage,
        })
    }
}
