//! Performance metrics for profile evaluation.
//!
//! Every metric is a pure function: equity curve and/or trade list in,
//! scalar out. Returns are per evaluation period and are not annualized.

use fxpilot_core::domain::{TradeAction, TraderProfile};
use fxpilot_core::stats;
use serde::{Deserialize, Serialize};

/// One simulated trade and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeOutcome {
    pub period: usize,
    pub action: TradeAction,
    pub entry_price: f64,
    pub exit_price: f64,
    pub position_size: f64,
    pub pnl: f64,
    /// True when the stop was hit, false when the target was.
    pub stopped_out: bool,
}

impl TradeOutcome {
    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}

/// Aggregate results of one profile over an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileMetrics {
    pub profile: TraderProfile,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub initial_capital: f64,
    pub final_capital: f64,
    /// Fraction: 0.05 = +5 %.
    pub total_return: f64,
    /// Positive fraction: 0.03 = 3 % below the running peak.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    /// Fraction of trades that made money.
    pub win_rate: f64,
    pub avg_pnl_per_trade: f64,
    pub max_consecutive_losses: usize,
    /// Periods where no assignment satisfied the risk constraints.
    pub constraint_violations: usize,
    pub avg_volatility: f64,
}

impl ProfileMetrics {
    pub fn compute(
        profile: TraderProfile,
        equity_curve: &[f64],
        trades: &[TradeOutcome],
        constraint_violations: usize,
        volatility_samples: &[f64],
    ) -> Self {
        let initial_capital = equity_curve.first().copied().unwrap_or(0.0);
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        Self {
            profile,
            total_trades: trades.len(),
            winning_trades,
            losing_trades: trades.len() - winning_trades,
            initial_capital,
            final_capital: equity_curve.last().copied().unwrap_or(initial_capital),
            total_return: total_return(equity_curve),
            max_drawdown: max_drawdown(equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve),
            win_rate: win_rate(trades),
            avg_pnl_per_trade: average_pnl(trades),
            max_consecutive_losses: max_consecutive_losses(trades),
            constraint_violations,
            avg_volatility: stats::mean(volatility_samples),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(equity_curve: &[f64]) -> f64 {
    match (equity_curve.first(), equity_curve.last()) {
        (Some(&initial), Some(&last)) if equity_curve.len() >= 2 && initial > 0.0 => {
            (last - initial) / initial
        }
        _ => 0.0,
    }
}

/// Per-period Sharpe: mean(period returns) / population std(period returns).
///
/// Returns 0.0 when there are no returns or their spread is zero.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.is_empty() {
        return 0.0;
    }
    let std = stats::population_std(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    stats::mean(&returns) / std
}

/// Largest fall from a running peak, as a positive fraction.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;
    for &eq in equity_curve {
        peak = peak.max(eq);
        if peak > 0.0 {
            max_dd = max_dd.max((peak - eq) / peak);
        }
    }
    max_dd
}

/// Fraction of trades that were winners.
pub fn win_rate(trades: &[TradeOutcome]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_winner()).count() as f64 / trades.len() as f64
}

pub fn average_pnl(trades: &[TradeOutcome]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64
}

/// Longest run of non-winning trades.
pub fn max_consecutive_losses(trades: &[TradeOutcome]) -> usize {
    let mut max_streak = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() {
            current = 0;
        } else {
            current += 1;
            max_streak = max_streak.max(current);
        }
    }
    max_streak
}

// ─── Helpers ────────────────────────────────────────────────────────

/// Simple returns between consecutive equity points.
pub fn period_returns(equity_curve: &[f64]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { (w[1] - w[0]) / w[0] } else { 0.0 })
        .collect()
}
