//! Profile evaluation over simulated market periods.
//!
//! Each period draws a synthetic snapshot whose regime follows the period
//! index (bullish, then bearish, then sideways, then mixed), asks the
//! engine for a decision, and settles any opened trade at its stop or its
//! target. The stop is hit with probability `min(0.4 + 20·σ, 0.6)` where σ
//! is the snapshot's volatility. Every draw is seeded, so an evaluation is
//! reproducible from its config.

use fxpilot_core::domain::{MarketSnapshot, Portfolio, TradeRecommendation, TraderProfile};
use fxpilot_core::engine::DecisionEngine;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::EvaluationConfig;
use crate::metrics::{ProfileMetrics, TradeOutcome};
use crate::runner::RunError;
use crate::synthetic::{generate_snapshot, MarketRegime, SyntheticSpec};

/// Periods per regime block before the schedule moves on.
pub const REGIME_BLOCK: usize = 7;
const BASE_STOP_PROBABILITY: f64 = 0.4;
const STOP_VOLATILITY_SCALE: f64 = 20.0;
const MAX_STOP_PROBABILITY: f64 = 0.6;

/// Regime schedule: 0–6 bullish, 7–13 bearish, 14–20 sideways, then mixed.
pub fn regime_for_period(period: usize) -> MarketRegime {
    match period / REGIME_BLOCK {
        0 => MarketRegime::Bullish,
        1 => MarketRegime::Bearish,
        2 => MarketRegime::Sideways,
        _ => MarketRegime::Mixed,
    }
}

/// Chance that a trade hits its stop before its target.
pub fn stop_probability(volatility: f64) -> f64 {
    (BASE_STOP_PROBABILITY + STOP_VOLATILITY_SCALE * volatility.max(0.0)).min(MAX_STOP_PROBABILITY)
}

/// Settles an opening recommendation at its stop or its target.
///
/// P&L is the notional position size times the fractional price move.
/// Returns `None` for HOLD and CLOSE.
pub fn settle(
    period: usize,
    rec: &TradeRecommendation,
    volatility: f64,
    rng: &mut impl Rng,
) -> Option<TradeOutcome> {
    if !rec.action.opens_position() || rec.entry_price <= 0.0 {
        return None;
    }
    let stopped_out = rng.gen::<f64>() < stop_probability(volatility);
    let (exit_price, sign) = if stopped_out {
        (rec.stop_loss, -1.0)
    } else {
        (rec.take_profit, 1.0)
    };
    let moved = (exit_price - rec.entry_price).abs() / rec.entry_price;
    Some(TradeOutcome {
        period,
        action: rec.action,
        entry_price: rec.entry_price,
        exit_price,
        position_size: rec.position_size,
        pnl: sign * rec.position_size * moved,
        stopped_out,
    })
}

/// Full record of one profile's run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRun {
    pub metrics: ProfileMetrics,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<TradeOutcome>,
}

/// Results for every evaluated profile, best total return first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub pair: String,
    pub periods: usize,
    pub initial_capital: f64,
    pub seed: u64,
    pub runs: Vec<ProfileRun>,
}

impl EvaluationReport {
    pub fn ranking(&self) -> Vec<TraderProfile> {
        self.runs.iter().map(|r| r.metrics.profile).collect()
    }

    pub fn best(&self) -> Option<&ProfileRun> {
        self.runs.first()
    }

    pub fn get(&self, profile: TraderProfile) -> Option<&ProfileRun> {
        self.runs.iter().find(|r| r.metrics.profile == profile)
    }
}

pub struct ProfileEvaluator {
    engine: DecisionEngine,
    config: EvaluationConfig,
}

impl ProfileEvaluator {
    pub fn new(engine: DecisionEngine, config: EvaluationConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// The market seen in `period`; identical for every profile.
    pub fn snapshot_for(&self, period: usize) -> Result<MarketSnapshot, RunError> {
        let spec = SyntheticSpec::new(
            self.config.pair.as_str(),
            regime_for_period(period),
            self.config.seed,
        )
        .with_period(period);
        Ok(generate_snapshot(&spec)?)
    }

    fn outcome_rng(&self, profile: TraderProfile, period: usize) -> StdRng {
        let key = format!("outcome:{}:{}:{}", profile, self.config.seed, period);
        StdRng::from_seed(*blake3::hash(key.as_bytes()).as_bytes())
    }

    pub fn evaluate_profile(&self, profile: TraderProfile) -> Result<ProfileRun, RunError> {
        let initial = self.config.capital;
        let mut capital = initial;
        let mut peak = initial;
        let mut total_pnl = 0.0;
        let mut drawdown = 0.0_f64;
        let mut equity_curve = vec![initial];
        let mut trades = Vec::new();
        let mut violations = 0;
        let mut volatilities = Vec::with_capacity(self.config.periods);

        for period in 0..self.config.periods {
            if capital <= 0.0 {
                warn!(%profile, period, "capital exhausted, stopping evaluation");
                break;
            }
            let snapshot = self.snapshot_for(period)?;
            let volatility = snapshot.indicators().volatility;
            volatilities.push(volatility);

            let portfolio = Portfolio::new(capital, 0, total_pnl, drawdown.min(1.0))?;
            let decision = self.engine.decide(&snapshot, profile, &portfolio)?;
            if !decision.risk.is_valid {
                violations += 1;
                debug!(%profile, period, "risk constraints infeasible, period skipped");
                continue;
            }

            let mut rng = self.outcome_rng(profile, period);
            if let Some(trade) = settle(period, &decision.recommendation, volatility, &mut rng) {
                capital += trade.pnl;
                total_pnl += trade.pnl;
                peak = peak.max(capital);
                if peak > 0.0 {
                    drawdown = drawdown.max((peak - capital) / peak);
                }
                debug!(%profile, period, pnl = trade.pnl, capital, "trade settled");
                trades.push(trade);
            }
            equity_curve.push(capital);
        }

        let metrics =
            ProfileMetrics::compute(profile, &equity_curve, &trades, violations, &volatilities);
        info!(
            %profile,
            trades = metrics.total_trades,
            total_return = metrics.total_return,
            "profile evaluated"
        );
        Ok(ProfileRun {
            metrics,
            equity_curve,
            trades,
        })
    }

    /// Evaluates `profiles` in parallel and ranks them by total return.
    ///
    /// Ties keep the order of `profiles`.
    pub fn evaluate(&self, profiles: &[TraderProfile]) -> Result<EvaluationReport, RunError> {
        let mut runs = profiles
            .par_iter()
            .map(|&p| self.evaluate_profile(p))
            .collect::<Result<Vec<_>, _>>()?;
        runs.sort_by(|a, b| b.metrics.total_return.total_cmp(&a.metrics.total_return));
        Ok(EvaluationReport {
            pair: self.config.pair.clone(),
            periods: self.config.periods,
            initial_capital: self.config.capital,
            seed: self.config.seed,
            runs,
        })
    }

    pub fn evaluate_all(&self) -> Result<EvaluationReport, RunError> {
        self.evaluate(&TraderProfile::ALL)
    }
}
