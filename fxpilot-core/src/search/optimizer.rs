//! Strategy optimizer: beam search from the risk solution to one recommendation.
//!
//! Depth 0 holds the initial BUY/SELL/HOLD/CLOSE candidates. Each later
//! depth resizes the non-terminal beam states by ±25 % and keeps the best
//! `beam_width` of the new states together with the current beam, so the
//! best score can only improve from one depth to the next.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::scoring::{self, normalized_risk_reward, ScoringWeights, RISK_REWARD_CEILING};
use super::state::{SearchState, StateArena};
use super::SearchConfig;
use crate::domain::{Portfolio, TradeAction, TradeRecommendation, TraderProfile};
use crate::forecast::TrendForecast;
use crate::risk::{RiskSolution, MIN_POSITION_SIZE};
use crate::stats::clamp01;

/// Posterior a direction needs before it is worth opening.
pub const DIRECTION_THRESHOLD: f64 = 0.3;
/// Fractions of the solver's max size tried at depth 0.
pub const INITIAL_SIZE_FRACTIONS: [f64; 3] = [1.0, 0.75, 0.5];
pub const RESIZE_FACTORS: [f64; 2] = [1.25, 0.75];

/// Result of one [`StrategyOptimizer::optimize`] call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Optimization {
    pub recommendation: TradeRecommendation,
    /// Every state created, in creation order.
    pub explored: StateArena,
    /// Human-readable beam trace, one line per step.
    pub trace: Vec<String>,
    /// Best beam score after each depth, starting at depth 0.
    pub best_scores: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyOptimizer {
    profile: TraderProfile,
    config: SearchConfig,
    weights: ScoringWeights,
}

impl StrategyOptimizer {
    pub fn new(profile: TraderProfile, config: SearchConfig) -> Self {
        Self {
            profile,
            config,
            weights: ScoringWeights::for_profile(profile),
        }
    }

    pub fn profile(&self) -> TraderProfile {
        self.profile
    }

    pub fn config(&self) -> SearchConfig {
        self.config
    }

    pub fn optimize(
        &self,
        forecast: &TrendForecast,
        risk: &RiskSolution,
        portfolio: &Portfolio,
    ) -> Optimization {
        if !risk.is_valid {
            let reasoning = format!(
                "Risk constraints cannot be satisfied for the {} profile: {}",
                self.profile,
                risk.violations.join("; ")
            );
            debug!(profile = %self.profile, "risk solution invalid, holding");
            return Optimization {
                recommendation: TradeRecommendation::hold(
                    forecast.pair.clone(),
                    risk.reference_price,
                    reasoning,
                ),
                explored: StateArena::default(),
                trace: vec!["Search skipped: no feasible risk solution".to_string()],
                best_scores: Vec::new(),
            };
        }

        let width = self.config.beam_width.max(1);
        let mut arena = StateArena::default();
        let mut trace = Vec::new();
        let mut best_scores = Vec::new();

        let initial = self.initial_states(forecast, risk, portfolio);
        trace.push(format!("Generated {} initial candidate states", initial.len()));

        let mut seen = HashSet::new();
        let mut beam: Vec<usize> = initial
            .into_iter()
            .map(|mut s| {
                s.score = scoring::score(&self.weights, &s, forecast, portfolio);
                seen.insert(size_key(&s));
                arena.push(s)
            })
            .collect();
        let evaluated = beam.len();
        rank(&arena, &mut beam);
        beam.truncate(width);
        trace.push(format!(
            "Depth 0: evaluated {evaluated} states, kept top {}",
            beam.len()
        ));
        best_scores.push(best_score(&arena, &beam));

        for depth in 1..=self.config.max_depth {
            let mut successors = Vec::new();
            for &index in &beam {
                let Some(parent) = arena.get(index) else {
                    continue;
                };
                for child in expand(parent, index, risk.max_position_size) {
                    if seen.insert(size_key(&child)) {
                        successors.push(child);
                    }
                }
            }
            if successors.is_empty() {
                trace.push(format!("Depth {depth}: no successors, search stopped"));
                break;
            }

            let evaluated = successors.len();
            let mut candidates = beam.clone();
            for mut s in successors {
                s.score = scoring::score(&self.weights, &s, forecast, portfolio);
                candidates.push(arena.push(s));
            }
            rank(&arena, &mut candidates);
            candidates.truncate(width);
            beam = candidates;
            trace.push(format!(
                "Depth {depth}: evaluated {evaluated} states, kept top {}",
                beam.len()
            ));
            best_scores.push(best_score(&arena, &beam));
        }

        let best = beam.first().copied();
        let recommendation = match best.and_then(|i| arena.get(i)) {
            Some(state) => {
                trace.push(format!(
                    "Best score: {:.4} ({} at size {:.0})",
                    state.score, state.action, state.position_size
                ));
                self.to_recommendation(state, &arena, best, forecast, &trace)
            }
            None => TradeRecommendation::hold(
                forecast.pair.clone(),
                risk.reference_price,
                "No candidate states were generated",
            ),
        };

        debug!(
            profile = %self.profile,
            explored = arena.len(),
            action = %recommendation.action,
            "beam search finished"
        );

        Optimization {
            recommendation,
            explored: arena,
            trace,
            best_scores,
        }
    }

    /// BUY/SELL at three fractions of max size when their posterior clears
    /// the threshold, HOLD always, CLOSE only with open positions.
    pub fn initial_states(
        &self,
        forecast: &TrendForecast,
        risk: &RiskSolution,
        portfolio: &Portfolio,
    ) -> Vec<SearchState> {
        let price = risk.reference_price;
        let mut states = Vec::with_capacity(8);

        for (action, p) in [
            (TradeAction::Buy, forecast.probability_up),
            (TradeAction::Sell, forecast.probability_down),
        ] {
            if p <= DIRECTION_THRESHOLD {
                continue;
            }
            let (stop_loss, take_profit) = risk.levels_for(action);
            for fraction in INITIAL_SIZE_FRACTIONS {
                states.push(SearchState {
                    action,
                    entry_price: price,
                    position_size: risk.max_position_size * fraction,
                    stop_loss,
                    take_profit,
                    leverage: risk.leverage,
                    score: 0.0,
                    depth: 0,
                    parent: None,
                    note: format!(
                        "Open {} position ({:.0}% of max size)",
                        action.as_str().to_uppercase(),
                        fraction * 100.0
                    ),
                });
            }
        }

        states.push(SearchState::flat(
            TradeAction::Hold,
            price,
            "Hold current position - no trade",
        ));
        if portfolio.has_open_positions() {
            states.push(SearchState::flat(
                TradeAction::Close,
                price,
                "Close existing positions",
            ));
        }
        states
    }

    fn to_recommendation(
        &self,
        state: &SearchState,
        arena: &StateArena,
        index: Option<usize>,
        forecast: &TrendForecast,
        trace: &[String],
    ) -> TradeRecommendation {
        let expected_profit = match state.action {
            TradeAction::Buy => (state.take_profit - state.entry_price) * state.position_size,
            TradeAction::Sell => (state.entry_price - state.take_profit) * state.position_size,
            TradeAction::Hold | TradeAction::Close => 0.0,
        };

        let headline = match state.action {
            TradeAction::Buy => format!(
                "Bullish trend ({:.1}% confidence). {}",
                forecast.confidence * 100.0,
                state.note
            ),
            TradeAction::Sell => format!(
                "Bearish trend ({:.1}% confidence). {}",
                forecast.confidence * 100.0,
                state.note
            ),
            TradeAction::Hold | TradeAction::Close => {
                format!("No strong trend signal. {}", state.note)
            }
        };

        let mut reasoning = format!("{} profile: {headline}", capitalize(self.profile.as_str()));
        if let Some(i) = index {
            reasoning.push_str("\n\nDecision path:");
            for step in arena.path(i) {
                reasoning.push_str(&format!(
                    "\n  depth {}: {} (score {:.4})",
                    step.depth, step.note, step.score
                ));
            }
        }
        reasoning.push_str("\n\nSearch trace:\n");
        reasoning.push_str(&trace.join("\n"));

        TradeRecommendation {
            action: state.action,
            pair: forecast.pair.clone(),
            entry_price: state.entry_price,
            position_size: state.position_size,
            stop_loss: state.stop_loss,
            take_profit: state.take_profit,
            leverage: state.leverage,
            expected_profit,
            risk_reward_ratio: normalized_risk_reward(state) * RISK_REWARD_CEILING,
            confidence_score: clamp01(state.score),
            reasoning,
        }
    }
}

/// Resized successors of a directional state, clamped to
/// `[MIN_POSITION_SIZE, max_size]`. No-op resizes are dropped.
fn expand(state: &SearchState, index: usize, max_size: f64) -> Vec<SearchState> {
    if state.action.is_terminal() {
        return Vec::new();
    }
    let upper = max_size.max(MIN_POSITION_SIZE);
    let mut out: Vec<SearchState> = Vec::with_capacity(RESIZE_FACTORS.len());
    for factor in RESIZE_FACTORS {
        let size = (state.position_size * factor).clamp(MIN_POSITION_SIZE, upper);
        if size == state.position_size || out.iter().any(|s| s.position_size == size) {
            continue;
        }
        out.push(state.resized(index, size));
    }
    out
}

/// Stable sort, highest score first.
fn rank(arena: &StateArena, indices: &mut [usize]) {
    indices.sort_by(|&a, &b| {
        let sa = arena.get(a).map_or(f64::NEG_INFINITY, |s| s.score);
        let sb = arena.get(b).map_or(f64::NEG_INFINITY, |s| s.score);
        sb.total_cmp(&sa)
    });
}

fn best_score(arena: &StateArena, beam: &[usize]) -> f64 {
    beam.first()
        .and_then(|&i| arena.get(i))
        .map_or(0.0, |s| s.score)
}

fn size_key(state: &SearchState) -> (TradeAction, u64) {
    (state.action, state.position_size.to_bits())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::TrendDirection;
    use crate::risk::RiskConstraintSolver;

    fn forecast(p_up: f64, p_down: f64) -> TrendForecast {
        let p_neutral = 1.0 - p_up - p_down;
        let (direction, confidence) = if p_up >= p_down && p_up >= p_neutral {
            (TrendDirection::Bullish, p_up)
        } else if p_down >= p_neutral {
            (TrendDirection::Bearish, p_down)
        } else {
            (TrendDirection::Neutral, p_neutral)
        };
        TrendForecast {
            pair: "EURUSD".into(),
            reference_price: 1.1,
            direction,
            confidence,
            probability_up: p_up,
            probability_down: p_down,
            probability_neutral: p_neutral,
            expected_move: 0.0,
            volatility: 0.005,
            uncertainty: 0.7,
            explanation: String::new(),
        }
    }

    fn solve(profile: TraderProfile, portfolio: &Portfolio) -> RiskSolution {
        RiskConstraintSolver::new().solve(&profile.params(), portfolio, 1.1)
    }

    #[test]
    fn invalid_risk_holds_without_search() {
        let portfolio = Portfolio::with_capital(10.0).unwrap();
        let risk = solve(TraderProfile::Conservative, &portfolio);
        let opt = StrategyOptimizer::new(TraderProfile::Conservative, SearchConfig::default())
            .optimize(&forecast(0.7, 0.2), &risk, &portfolio);
        assert_eq!(opt.recommendation.action, TradeAction::Hold);
        assert_eq!(opt.recommendation.position_size, 0.0);
        assert_eq!(opt.recommendation.entry_price, 1.1);
        assert!(opt.recommendation.reasoning.contains("position size domain is empty"));
        assert!(opt.explored.is_empty());
    }

    #[test]
    fn initial_states_follow_thresholds() {
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let risk = solve(TraderProfile::Balanced, &portfolio);
        let opt = StrategyOptimizer::new(TraderProfile::Balanced, SearchConfig::default());

        // both directions above 0.3: 3 BUY + 3 SELL + HOLD
        let states = opt.initial_states(&forecast(0.45, 0.35), &risk, &portfolio);
        assert_eq!(states.len(), 7);
        assert_eq!(states[0].position_size, 5_000.0);
        assert_eq!(states[1].position_size, 3_750.0);
        assert_eq!(states[2].position_size, 2_500.0);

        // only HOLD when neither direction clears the threshold
        let states = opt.initial_states(&forecast(0.3, 0.3), &risk, &portfolio);
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].action, TradeAction::Hold);

        // CLOSE appears with open positions
        let open = Portfolio::new(10_000.0, 2, 0.0, 0.0).unwrap();
        let states = opt.initial_states(&forecast(0.3, 0.3), &risk, &open);
        assert_eq!(states.last().unwrap().action, TradeAction::Close);
    }

    #[test]
    fn sell_states_use_mirrored_levels() {
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let risk = solve(TraderProfile::Balanced, &portfolio);
        let states = StrategyOptimizer::new(TraderProfile::Balanced, SearchConfig::default())
            .initial_states(&forecast(0.1, 0.8), &risk, &portfolio);
        let sell = &states[0];
        assert_eq!(sell.action, TradeAction::Sell);
        assert!(sell.stop_loss > sell.entry_price);
        assert!(sell.take_profit < sell.entry_price);
    }

    #[test]
    fn expand_clamps_and_skips_noops() {
        let mut s = SearchState::flat(TradeAction::Buy, 1.0, "");
        s.position_size = 5_000.0;
        // 6250 clamps to 5000 (no-op), 3750 kept
        let kids = expand(&s, 0, 5_000.0);
        assert_eq!(kids.len(), 1);
        assert_eq!(kids[0].position_size, 3_750.0);

        s.position_size = 120.0;
        // 150 kept, 90 clamps to 100
        let kids = expand(&s, 0, 5_000.0);
        let sizes: Vec<f64> = kids.iter().map(|k| k.position_size).collect();
        assert_eq!(sizes, vec![150.0, 100.0]);

        assert!(expand(&SearchState::flat(TradeAction::Hold, 1.0, ""), 0, 5_000.0).is_empty());
    }

    #[test]
    fn bullish_forecast_recommends_buy() {
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let risk = solve(TraderProfile::Balanced, &portfolio);
        let opt = StrategyOptimizer::new(TraderProfile::Balanced, SearchConfig::default())
            .optimize(&forecast(0.7, 0.2), &risk, &portfolio);
        let rec = &opt.recommendation;
        assert_eq!(rec.action, TradeAction::Buy);
        assert!(rec.position_size >= MIN_POSITION_SIZE);
        assert!(rec.position_size <= risk.max_position_size);
        assert!(rec.expected_profit > 0.0);
        // take 1 %, stop 0.5 %: reward/risk 2
        assert!((rec.risk_reward_ratio - 2.0).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&rec.confidence_score));
        assert!(rec.reasoning.starts_with("Balanced profile: Bullish trend"));
        assert!(rec.reasoning.contains("Decision path:"));
        assert!(opt.trace[0].starts_with("Generated 7 initial candidate states"));
    }

    #[test]
    fn best_score_never_decreases() {
        let portfolio = Portfolio::new(20_000.0, 1, 0.0, 0.03).unwrap();
        let risk = solve(TraderProfile::Aggressive, &portfolio);
        let opt = StrategyOptimizer::new(TraderProfile::Aggressive, SearchConfig::default())
            .optimize(&forecast(0.5, 0.35), &risk, &portfolio);
        assert!(!opt.best_scores.is_empty());
        for w in opt.best_scores.windows(2) {
            assert!(w[1] >= w[0], "{:?}", opt.best_scores);
        }
    }

    #[test]
    fn parent_links_point_backwards() {
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let risk = solve(TraderProfile::Balanced, &portfolio);
        let opt = StrategyOptimizer::new(TraderProfile::Balanced, SearchConfig::default())
            .optimize(&forecast(0.7, 0.2), &risk, &portfolio);
        for (i, s) in opt.explored.iter().enumerate() {
            if let Some(p) = s.parent {
                assert!(p < i);
                assert_eq!(opt.explored.get(p).unwrap().depth + 1, s.depth);
            } else {
                assert_eq!(s.depth, 0);
            }
        }
    }

    #[test]
    fn zero_width_beam_treated_as_one() {
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let risk = solve(TraderProfile::Balanced, &portfolio);
        let config = SearchConfig {
            beam_width: 0,
            max_depth: 2,
        };
        let opt = StrategyOptimizer::new(TraderProfile::Balanced, config)
            .optimize(&forecast(0.7, 0.2), &risk, &portfolio);
        assert!(opt.trace[1].ends_with("kept top 1"));
    }
}
