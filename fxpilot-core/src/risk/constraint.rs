//! The four risk constraints, evaluated over an explicit assignment.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::ProfileParams;

/// Fraction of capital usable as margin.
pub const MARGIN_FRACTION: f64 = 0.9;

/// Slack for float comparisons at the constraint boundaries.
const EPS: f64 = 1e-9;

/// One candidate point in the solver's search space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub position_size: f64,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub leverage: f64,
}

impl Assignment {
    /// Capital lost if the stop is hit.
    pub fn risk_amount(&self) -> f64 {
        self.position_size * self.stop_loss_pct
    }

    /// Objective maximized by the solver.
    pub fn objective(&self) -> f64 {
        if self.leverage <= 0.0 {
            return 0.0;
        }
        self.position_size / self.leverage
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    RiskCap,
    LeverageCap,
    RewardRatio,
    MarginCap,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 4] = [
        ConstraintKind::RiskCap,
        ConstraintKind::LeverageCap,
        ConstraintKind::RewardRatio,
        ConstraintKind::MarginCap,
    ];
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::RiskCap => "risk cap",
            Self::LeverageCap => "leverage cap",
            Self::RewardRatio => "reward ratio",
            Self::MarginCap => "margin cap",
        })
    }
}

/// A constraint with its bound resolved for one profile and account.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constraint {
    /// position_size × stop_loss_pct ≤ max_risk_amount
    RiskCap { max_risk_amount: f64 },
    /// leverage ≤ max_leverage
    LeverageCap { max_leverage: f64 },
    /// take_profit_pct ≥ stop_loss_pct × multiplier
    RewardRatio { multiplier: f64 },
    /// position_size / leverage ≤ max_margin
    MarginCap { max_margin: f64 },
}

impl Constraint {
    pub fn kind(&self) -> ConstraintKind {
        match self {
            Self::RiskCap { .. } => ConstraintKind::RiskCap,
            Self::LeverageCap { .. } => ConstraintKind::LeverageCap,
            Self::RewardRatio { .. } => ConstraintKind::RewardRatio,
            Self::MarginCap { .. } => ConstraintKind::MarginCap,
        }
    }

    pub fn is_satisfied(&self, a: &Assignment) -> bool {
        match *self {
            Self::RiskCap { max_risk_amount } => a.risk_amount() <= max_risk_amount + EPS,
            Self::LeverageCap { max_leverage } => a.leverage <= max_leverage + EPS,
            Self::RewardRatio { multiplier } => {
                a.take_profit_pct + EPS >= a.stop_loss_pct * multiplier
            }
            Self::MarginCap { max_margin } => {
                a.leverage > 0.0 && a.position_size / a.leverage <= max_margin + EPS
            }
        }
    }

    /// Human-readable statement of the bound.
    pub fn describe(&self) -> String {
        match *self {
            Self::RiskCap { max_risk_amount } => {
                format!("position size × stop-loss ≤ {max_risk_amount:.2}")
            }
            Self::LeverageCap { max_leverage } => format!("leverage ≤ {max_leverage:.1}x"),
            Self::RewardRatio { multiplier } => {
                format!("take-profit ≥ {multiplier:.1} × stop-loss")
            }
            Self::MarginCap { max_margin } => {
                format!("position size / leverage ≤ {max_margin:.2}")
            }
        }
    }

    /// Description of how `a` breaks this constraint.
    pub fn violation(&self, a: &Assignment) -> String {
        match *self {
            Self::RiskCap { max_risk_amount } => format!(
                "{}: risk {:.2} exceeds {:.2}",
                self.kind(),
                a.risk_amount(),
                max_risk_amount
            ),
            Self::LeverageCap { max_leverage } => format!(
                "{}: leverage {:.1}x exceeds {:.1}x",
                self.kind(),
                a.leverage,
                max_leverage
            ),
            Self::RewardRatio { multiplier } => format!(
                "{}: take-profit {:.2}% is below {:.1} × stop-loss {:.2}%",
                self.kind(),
                a.take_profit_pct * 100.0,
                multiplier,
                a.stop_loss_pct * 100.0
            ),
            Self::MarginCap { max_margin } => format!(
                "{}: margin {:.2} exceeds {:.2}",
                self.kind(),
                a.objective(),
                max_margin
            ),
        }
    }
}

/// The full constraint set for one profile and capital.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    constraints: [Constraint; 4],
}

impl ConstraintSet {
    pub fn for_profile(params: &ProfileParams, capital: f64) -> Self {
        Self {
            constraints: [
                Constraint::RiskCap {
                    max_risk_amount: capital * params.max_risk_per_trade,
                },
                Constraint::LeverageCap {
                    max_leverage: params.max_leverage,
                },
                Constraint::RewardRatio {
                    multiplier: params.profit_target_multiplier,
                },
                Constraint::MarginCap {
                    max_margin: capital * MARGIN_FRACTION,
                },
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    pub fn get(&self, kind: ConstraintKind) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.kind() == kind)
    }

    /// First constraint `a` breaks, in declaration order.
    pub fn first_violation(&self, a: &Assignment) -> Option<&Constraint> {
        self.constraints.iter().find(|c| !c.is_satisfied(a))
    }

    pub fn is_satisfied(&self, a: &Assignment) -> bool {
        self.first_violation(a).is_none()
    }

    /// Every violation of `a`, one line each.
    pub fn violations(&self, a: &Assignment) -> Vec<String> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(a))
            .map(|c| c.violation(a))
            .collect()
    }
}
