//! Heuristic state evaluation.
//!
//! A state's score is the dot product of seven signals with the weight row
//! of the active profile. Penalty signals are positive and carry negative
//! weights.

use serde::{Deserialize, Serialize};

use super::state::SearchState;
use crate::domain::{Portfolio, TradeAction, TraderProfile};
use crate::forecast::{TrendDirection, TrendForecast};

/// Score of a HOLD state.
pub const HOLD_SCORE: f64 = 0.0;
/// Score of a CLOSE state.
pub const CLOSE_SCORE: f64 = 0.1;
/// Reward/risk ratio mapped to a normalized 1.0.
pub const RISK_REWARD_CEILING: f64 = 3.0;

const PROFIT_SCALE: f64 = 1_000.0;
const VOLATILITY_SCALE: f64 = 10.0;

/// Columns: profit, risk/reward, trend, confidence, volatility, drawdown,
/// uncertainty. Rows follow [`TraderProfile::ALL`].
const WEIGHT_MATRIX: [[f64; 7]; 3] = [
    [0.25, 0.35, 0.15, 0.10, -0.10, -0.05, -0.05],
    [0.35, 0.30, 0.20, 0.10, -0.05, 0.00, -0.02],
    [0.60, 0.20, 0.15, 0.05, 0.00, 0.00, 0.00],
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub expected_profit: f64,
    pub risk_reward: f64,
    pub trend_alignment: f64,
    pub confidence: f64,
    pub volatility: f64,
    pub drawdown: f64,
    pub uncertainty: f64,
}

impl ScoringWeights {
    pub fn for_profile(profile: TraderProfile) -> Self {
        let row = match profile {
            TraderProfile::Conservative => WEIGHT_MATRIX[0],
            TraderProfile::Balanced => WEIGHT_MATRIX[1],
            TraderProfile::Aggressive => WEIGHT_MATRIX[2],
        };
        Self {
            expected_profit: row[0],
            risk_reward: row[1],
            trend_alignment: row[2],
            confidence: row[3],
            volatility: row[4],
            drawdown: row[5],
            uncertainty: row[6],
        }
    }

    pub fn apply(&self, s: &ScoreSignals) -> f64 {
        self.expected_profit * s.expected_profit
            + self.risk_reward * s.risk_reward
            + self.trend_alignment * s.trend_alignment
            + self.confidence * s.confidence
            + self.volatility * s.volatility
            + self.drawdown * s.drawdown
            + self.uncertainty * s.uncertainty
    }
}

/// Raw inputs to the score of a BUY or SELL state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSignals {
    /// `tanh` of the probability-weighted P&L, in (-1, 1).
    pub expected_profit: f64,
    /// Reward/risk over 3, capped at 1.
    pub risk_reward: f64,
    /// Posterior of the state's direction.
    pub trend_alignment: f64,
    pub confidence: f64,
    pub volatility: f64,
    pub drawdown: f64,
    pub uncertainty: f64,
}

impl ScoreSignals {
    pub fn compute(state: &SearchState, forecast: &TrendForecast, portfolio: &Portfolio) -> Self {
        let (with, against) = match state.action {
            TradeAction::Sell => (TrendDirection::Bearish, TrendDirection::Bullish),
            _ => (TrendDirection::Bullish, TrendDirection::Bearish),
        };
        let p_dir = forecast.probability_of(with);
        let p_opp = forecast.probability_of(against);
        let (reward, risk) = price_distances(state);
        Self {
            expected_profit: ((p_dir * reward - p_opp * risk) * state.position_size / PROFIT_SCALE)
                .tanh(),
            risk_reward: normalized_risk_reward(state),
            trend_alignment: p_dir,
            confidence: forecast.confidence,
            volatility: VOLATILITY_SCALE * forecast.volatility,
            drawdown: portfolio.max_drawdown(),
            uncertainty: forecast.uncertainty,
        }
    }
}

/// `(reward, risk)` per unit, both non-negative.
fn price_distances(state: &SearchState) -> (f64, f64) {
    (
        (state.take_profit - state.entry_price).abs(),
        (state.entry_price - state.stop_loss).abs(),
    )
}

/// Reward/risk of a directional state over [`RISK_REWARD_CEILING`], capped at 1.
/// Zero for flat states or a zero-width stop.
pub fn normalized_risk_reward(state: &SearchState) -> f64 {
    if !state.action.opens_position() {
        return 0.0;
    }
    let (reward, risk) = price_distances(state);
    if risk == 0.0 {
        return 0.0;
    }
    (reward / risk / RISK_REWARD_CEILING).min(1.0)
}

pub fn score(
    weights: &ScoringWeights,
    state: &SearchState,
    forecast: &TrendForecast,
    portfolio: &Portfolio,
) -> f64 {
    match state.action {
        TradeAction::Hold => HOLD_SCORE,
        TradeAction::Close => CLOSE_SCORE,
        TradeAction::Buy | TradeAction::Sell => {
            weights.apply(&ScoreSignals::compute(state, forecast, portfolio))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn forecast() -> TrendForecast {
        TrendForecast {
            pair: "EURUSD".into(),
            reference_price: 1.0,
            direction: TrendDirection::Bullish,
            confidence: 0.6,
            probability_up: 0.6,
            probability_down: 0.3,
            probability_neutral: 0.1,
            expected_move: 0.01,
            volatility: 0.01,
            uncertainty: 0.8,
            explanation: String::new(),
        }
    }

    fn state(action: TradeAction, stop: f64, take: f64, size: f64) -> SearchState {
        SearchState {
            action,
            entry_price: 1.0,
            position_size: size,
            stop_loss: stop,
            take_profit: take,
            leverage: 1.0,
            score: 0.0,
            depth: 0,
            parent: None,
            note: String::new(),
        }
    }

    #[test]
    fn matrix_rows_match_profiles() {
        let c = ScoringWeights::for_profile(TraderProfile::Conservative);
        assert_eq!(c.risk_reward, 0.35);
        assert_eq!(c.volatility, -0.10);
        let a = ScoringWeights::for_profile(TraderProfile::Aggressive);
        assert_eq!(a.expected_profit, 0.60);
        assert_eq!(a.uncertainty, 0.0);
    }

    #[test]
    fn buy_signals() {
        let portfolio = Portfolio::new(10_000.0, 0, 0.0, 0.02).unwrap();
        let s = state(TradeAction::Buy, 0.99, 1.02, 10_000.0);
        let sig = ScoreSignals::compute(&s, &forecast(), &portfolio);
        // (0.6 * 0.02 - 0.3 * 0.01) * 10000 / 1000 = 0.09
        assert_approx(sig.expected_profit, 0.09_f64.tanh());
        // 0.02 / 0.01 / 3
        assert_approx(sig.risk_reward, 2.0 / 3.0);
        assert_approx(sig.trend_alignment, 0.6);
        assert_approx(sig.volatility, 0.1);
        assert_approx(sig.drawdown, 0.02);
        assert_approx(sig.uncertainty, 0.8);
    }

    #[test]
    fn sell_uses_down_probability() {
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let s = state(TradeAction::Sell, 1.01, 0.98, 10_000.0);
        let sig = ScoreSignals::compute(&s, &forecast(), &portfolio);
        // (0.3 * 0.02 - 0.6 * 0.01) * 10 = 0
        assert_approx(sig.expected_profit, 0.0);
        assert_approx(sig.trend_alignment, 0.3);
    }

    #[test]
    fn risk_reward_capped_and_zero_when_flat() {
        assert_eq!(
            normalized_risk_reward(&state(TradeAction::Buy, 0.99, 1.05, 1.0)),
            1.0
        );
        assert_eq!(
            normalized_risk_reward(&state(TradeAction::Buy, 1.0, 1.05, 1.0)),
            0.0
        );
        assert_eq!(
            normalized_risk_reward(&state(TradeAction::Hold, 0.99, 1.02, 0.0)),
            0.0
        );
    }

    #[test]
    fn flat_actions_have_fixed_scores() {
        let w = ScoringWeights::for_profile(TraderProfile::Balanced);
        let p = Portfolio::with_capital(1_000.0).unwrap();
        let fc = forecast();
        assert_eq!(score(&w, &state(TradeAction::Hold, 1.0, 1.0, 0.0), &fc, &p), 0.0);
        assert_eq!(score(&w, &state(TradeAction::Close, 1.0, 1.0, 0.0), &fc, &p), 0.1);
    }

    #[test]
    fn conservative_score_dot_product() {
        let w = ScoringWeights::for_profile(TraderProfile::Conservative);
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let s = state(TradeAction::Buy, 0.99, 1.02, 10_000.0);
        let got = score(&w, &s, &forecast(), &portfolio);
        // 0.25*tanh(0.09) + 0.35*(2/3) + 0.15*0.6 + 0.10*0.6 - 0.10*0.1 - 0 - 0.05*0.8
        let expected = 0.25 * 0.09_f64.tanh() + 0.35 * (2.0 / 3.0) + 0.09 + 0.06 - 0.01 - 0.04;
        assert_approx(got, expected);
    }
}
