//! Single-request runner: wires a snapshot, profile and portfolio through
//! the engine and wraps the decision in a fingerprinted report.

use chrono::NaiveDate;
use fxpilot_core::domain::{MarketSnapshot, Portfolio, PortfolioError, SnapshotError, TraderProfile};
use fxpilot_core::engine::{Decision, DecisionEngine, EngineError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::ConfigError;
use crate::fingerprint::{request_id, RequestId};
use crate::loader::{snapshot_as_of, LoadError};
use crate::report::DecisionReport;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("load error: {0}")]
    Load(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything one decision depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRequest {
    pub snapshot: MarketSnapshot,
    pub profile: TraderProfile,
    pub portfolio: Portfolio,
}

impl DecisionRequest {
    pub fn new(snapshot: MarketSnapshot, profile: TraderProfile, portfolio: Portfolio) -> Self {
        Self {
            snapshot,
            profile,
            portfolio,
        }
    }

    /// Restricts the market to what was known on `as_of`.
    pub fn as_of(self, as_of: NaiveDate) -> Result<Self, RunError> {
        Ok(Self {
            snapshot: snapshot_as_of(&self.snapshot, as_of)?,
            ..self
        })
    }

    pub fn request_id(&self, engine: &DecisionEngine) -> Result<RequestId, RunError> {
        Ok(request_id(
            &self.snapshot,
            self.profile,
            &self.portfolio,
            engine.config(),
        )?)
    }
}

/// Outcome of one request: the raw decision and its report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub decision: Decision,
    pub report: DecisionReport,
}

impl RunOutcome {
    pub fn request_id(&self) -> &RequestId {
        &self.report.request_id
    }
}

/// Runs one request through the engine.
pub fn run_single(engine: &DecisionEngine, request: &DecisionRequest) -> Result<RunOutcome, RunError> {
    let id = request.request_id(engine)?;
    let decision = engine.decide(&request.snapshot, request.profile, &request.portfolio)?;
    info!(
        request = id.short(),
        pair = request.snapshot.pair(),
        profile = %request.profile,
        action = %decision.recommendation.action,
        "request complete"
    );
    let report = DecisionReport::new(&decision, &request.snapshot, id);
    Ok(RunOutcome { decision, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{generate_snapshot, MarketRegime, SyntheticSpec};

    fn request(profile: TraderProfile) -> DecisionRequest {
        let snapshot =
            generate_snapshot(&SyntheticSpec::new("USDJPY", MarketRegime::Bearish, 9)).unwrap();
        DecisionRequest::new(snapshot, profile, Portfolio::with_capital(25_000.0).unwrap())
    }

    #[test]
    fn report_matches_decision() {
        let engine = DecisionEngine::default();
        let out = run_single(&engine, &request(TraderProfile::Aggressive)).unwrap();
        assert_eq!(out.report.strategy.action, out.decision.recommendation.action);
        assert_eq!(out.report.final_recommendation.pair, "USDJPY");
        assert_eq!(
            out.request_id(),
            &request(TraderProfile::Aggressive).request_id(&engine).unwrap()
        );
    }

    #[test]
    fn as_of_request_decides_on_the_earlier_market() {
        let engine = DecisionEngine::default();
        let full = request(TraderProfile::Balanced);
        let as_of = full.snapshot.history()[39].date;
        let earlier = full.clone().as_of(as_of).unwrap();
        assert_eq!(earlier.snapshot.history().len(), 40);
        assert_eq!(earlier.snapshot.current_price(), full.snapshot.history()[39].close);

        let out = run_single(&engine, &earlier).unwrap();
        assert_eq!(out.report.market_data.candles, 40);
        assert_ne!(out.request_id(), &full.request_id(&engine).unwrap());
    }

    #[test]
    fn as_of_before_history_is_a_load_error() {
        let err = request(TraderProfile::Balanced)
            .as_of(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
            .unwrap_err();
        assert!(matches!(err, RunError::Load(LoadError::NoHistoryAsOf(_))));
    }

    #[test]
    fn repeated_runs_agree_on_decision() {
        let engine = DecisionEngine::default();
        let a = run_single(&engine, &request(TraderProfile::Balanced)).unwrap();
        let b = run_single(&engine, &request(TraderProfile::Balanced)).unwrap();
        assert_eq!(a.decision, b.decision);
        assert_eq!(a.request_id(), b.request_id());
    }
}
