//! Batch execution of independent decision requests.

use fxpilot_core::domain::{Portfolio, TraderProfile};
use fxpilot_core::engine::DecisionEngine;
use rayon::prelude::*;
use tracing::info;

use crate::config::RunnerConfig;
use crate::runner::{run_single, DecisionRequest, RunError, RunOutcome};
use crate::synthetic::{generate_snapshot, MarketRegime, SyntheticSpec};

/// Grid of synthetic requests: every pair crossed with every profile.
#[derive(Debug, Clone)]
pub struct BatchGrid {
    pub pairs: Vec<String>,
    pub profiles: Vec<TraderProfile>,
    pub regime: MarketRegime,
    pub seed: u64,
}

impl BatchGrid {
    /// Pair-major request list; the same pair shares one snapshot.
    pub fn requests(&self, portfolio: &Portfolio) -> Result<Vec<DecisionRequest>, RunError> {
        let mut requests = Vec::with_capacity(self.pairs.len() * self.profiles.len());
        for pair in &self.pairs {
            let snapshot = generate_snapshot(&SyntheticSpec::new(pair.as_str(), self.regime, self.seed))?;
            for &profile in &self.profiles {
                requests.push(DecisionRequest::new(
                    snapshot.clone(),
                    profile,
                    portfolio.clone(),
                ));
            }
        }
        Ok(requests)
    }
}

/// Runs requests through one engine, optionally in parallel.
///
/// Results come back in request order either way.
pub struct BatchRunner {
    engine: DecisionEngine,
    parallel: bool,
}

impl BatchRunner {
    pub fn new(engine: DecisionEngine) -> Self {
        Self {
            engine,
            parallel: true,
        }
    }

    pub fn from_config(config: &RunnerConfig) -> Result<Self, RunError> {
        Ok(Self::new(DecisionEngine::new(config.engine)?).with_parallelism(config.batch.parallel))
    }

    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// One result per request; a failing request does not stop the rest.
    pub fn run(&self, requests: &[DecisionRequest]) -> Vec<Result<RunOutcome, RunError>> {
        info!(
            requests = requests.len(),
            parallel = self.parallel,
            "running batch"
        );
        if self.parallel {
            requests
                .par_iter()
                .map(|r| run_single(&self.engine, r))
                .collect()
        } else {
            requests.iter().map(|r| run_single(&self.engine, r)).collect()
        }
    }

    /// Like `run`, but stops at the first error.
    pub fn run_all(&self, requests: &[DecisionRequest]) -> Result<Vec<RunOutcome>, RunError> {
        self.run(requests).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> BatchGrid {
        BatchGrid {
            pairs: vec!["EURUSD".into(), "GBPUSD".into()],
            profiles: TraderProfile::ALL.to_vec(),
            regime: MarketRegime::Mixed,
            seed: 42,
        }
    }

    #[test]
    fn grid_is_pair_major() {
        let reqs = grid()
            .requests(&Portfolio::with_capital(10_000.0).unwrap())
            .unwrap();
        assert_eq!(reqs.len(), 6);
        assert_eq!(reqs[0].snapshot.pair(), "EURUSD");
        assert_eq!(reqs[2].profile, TraderProfile::Aggressive);
        assert_eq!(reqs[3].snapshot.pair(), "GBPUSD");
        assert_eq!(reqs[0].snapshot, reqs[1].snapshot);
    }

    #[test]
    fn results_keep_request_order() {
        let reqs = grid()
            .requests(&Portfolio::with_capital(10_000.0).unwrap())
            .unwrap();
        let out = BatchRunner::new(DecisionEngine::default())
            .run_all(&reqs)
            .unwrap();
        for (req, o) in reqs.iter().zip(&out) {
            assert_eq!(o.decision.profile, req.profile);
            assert_eq!(o.report.market_data.pair, req.snapshot.pair());
        }
    }
}
