use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::{EngineConfig, EngineError};
use crate::domain::{MarketSnapshot, Portfolio, TradeRecommendation, TraderProfile};
use crate::features::{FeatureExtractor, FeatureVector};
use crate::forecast::{TrendForecast, TrendForecaster};
use crate::risk::{RiskConstraintSolver, RiskSolution};
use crate::search::{SearchState, StrategyOptimizer};

/// Everything one pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub profile: TraderProfile,
    pub recommendation: TradeRecommendation,
    pub forecast: TrendForecast,
    pub risk: RiskSolution,
    pub features: FeatureVector,
    /// First `trace_limit` explored states, in creation order.
    pub explored: Vec<SearchState>,
    pub explored_total: usize,
    pub search_trace: Vec<String>,
}

/// Stateless orchestrator over the four pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    config: EngineConfig,
    forecaster: TrendForecaster,
    solver: RiskConstraintSolver,
}

impl DecisionEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            forecaster: TrendForecaster::default(),
            solver: RiskConstraintSolver::new(),
        })
    }

    /// Engine with a custom forecaster (alternate weights or priors).
    pub fn with_forecaster(
        config: EngineConfig,
        forecaster: TrendForecaster,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            forecaster,
            ..Self::new(config)?
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn decide(
        &self,
        snapshot: &MarketSnapshot,
        profile: TraderProfile,
        portfolio: &Portfolio,
    ) -> Result<Decision, EngineError> {
        let features = FeatureExtractor::new(self.config.feature_window).extract(snapshot)?;
        debug!(pair = snapshot.pair(), features = features.len(), "features extracted");

        let forecast = self.forecaster.forecast(&features);
        debug!(
            direction = %forecast.direction,
            confidence = forecast.confidence,
            uncertainty = forecast.uncertainty,
            "trend forecast"
        );

        let params = profile.params();
        let risk = self
            .solver
            .solve(&params, portfolio, snapshot.current_price());
        debug!(
            valid = risk.is_valid,
            size = risk.max_position_size,
            leverage = risk.leverage,
            "risk solution"
        );

        let optimization =
            StrategyOptimizer::new(profile, self.config.search).optimize(&forecast, &risk, portfolio);
        let explored_total = optimization.explored.len();
        let explored: Vec<SearchState> = optimization
            .explored
            .into_vec()
            .into_iter()
            .take(self.config.trace_limit)
            .collect();

        let recommendation = optimization.recommendation;
        info!(
            pair = snapshot.pair(),
            %profile,
            action = %recommendation.action,
            size = recommendation.position_size,
            confidence = recommendation.confidence_score,
            "trade decision"
        );

        Ok(Decision {
            profile,
            recommendation,
            forecast,
            risk,
            features,
            explored,
            explored_total,
            search_trace: optimization.trace,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Ohlcv, TradeAction};
    use crate::forecast::{Priors, TrendDirection, WeightTable};
    use chrono::NaiveDate;

    fn rising_history(n: usize) -> Vec<Ohlcv> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                let close = 1.10 + 0.001 * i as f64;
                Ohlcv {
                    date: start + chrono::Days::new(i as u64),
                    open: close - 0.0005,
                    high: close + 0.001,
                    low: close - 0.001,
                    close,
                    volume: 1_000.0,
                }
            })
            .collect()
    }

    fn snapshot() -> MarketSnapshot {
        let history = rising_history(30);
        let price = history.last().unwrap().close;
        MarketSnapshot::from_history("EURUSD", price, history).unwrap()
    }

    #[test]
    fn new_validates_config() {
        let config = EngineConfig {
            feature_window: 0,
            ..EngineConfig::default()
        };
        assert!(DecisionEngine::new(config).is_err());
    }

    #[test]
    fn decision_carries_every_stage() {
        let engine = DecisionEngine::new(EngineConfig::default()).unwrap();
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let d = engine
            .decide(&snapshot(), TraderProfile::Balanced, &portfolio)
            .unwrap();
        assert_eq!(d.features.pair, "EURUSD");
        assert_eq!(d.forecast.pair, "EURUSD");
        assert!(d.risk.is_valid);
        assert!(d.explored.len() <= 20);
        assert!(d.explored_total >= d.explored.len());
        assert_eq!(d.recommendation.pair, "EURUSD");
    }

    #[test]
    fn trace_limit_caps_explored_prefix() {
        let config = EngineConfig {
            trace_limit: 2,
            ..EngineConfig::default()
        };
        let engine = DecisionEngine::new(config).unwrap();
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let d = engine
            .decide(&snapshot(), TraderProfile::Aggressive, &portfolio)
            .unwrap();
        assert_eq!(d.explored.len(), 2);
    }

    #[test]
    fn custom_forecaster_drives_the_decision() {
        // all prior mass on neutral: no directional candidate survives
        let forecaster = TrendForecaster::new(
            WeightTable::default(),
            Priors {
                up: 0.0,
                down: 0.0,
                neutral: 1.0,
            },
        );
        let engine = DecisionEngine::with_forecaster(EngineConfig::default(), forecaster).unwrap();
        let portfolio = Portfolio::with_capital(10_000.0).unwrap();
        let d = engine
            .decide(&snapshot(), TraderProfile::Aggressive, &portfolio)
            .unwrap();
        assert_eq!(d.forecast.direction, TrendDirection::Neutral);
        assert_eq!(d.forecast.probability_up, 0.0);
        assert_eq!(d.recommendation.action, TradeAction::Hold);

        // the default engine buys the same rising market
        let d = DecisionEngine::default()
            .decide(&snapshot(), TraderProfile::Aggressive, &portfolio)
            .unwrap();
        assert_eq!(d.recommendation.action, TradeAction::Buy);
    }

    #[test]
    fn custom_forecaster_still_validates_config() {
        let config = EngineConfig {
            feature_window: 1,
            ..EngineConfig::default()
        };
        assert!(DecisionEngine::with_forecaster(config, TrendForecaster::default()).is_err());
    }

    #[test]
    fn tiny_capital_holds() {
        let engine = DecisionEngine::default();
        let portfolio = Portfolio::with_capital(10.0).unwrap();
        let d = engine
            .decide(&snapshot(), TraderProfile::Conservative, &portfolio)
            .unwrap();
        assert!(!d.risk.is_valid);
        assert_eq!(d.recommendation.action, TradeAction::Hold);
        assert!(d.explored.is_empty());
    }
}
