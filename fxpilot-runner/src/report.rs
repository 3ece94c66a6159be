//! Serializable decision reports.
//!
//! A `DecisionReport` flattens a `Decision` into the sections a caller
//! displays: trend, strategy, risk analysis, final recommendation, market
//! data and a sectioned plain-text explanation.

use chrono::{DateTime, Utc};
use fxpilot_core::domain::{MarketSnapshot, TradeAction, TraderProfile};
use fxpilot_core::engine::Decision;
use fxpilot_core::forecast::TrendForecast;
use serde::{Deserialize, Serialize};

use crate::fingerprint::RequestId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategySummary {
    pub action: TradeAction,
    pub entry_price: f64,
    pub position_size: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub leverage: f64,
    pub expected_profit: f64,
    pub risk_reward_ratio: f64,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub is_valid: bool,
    pub max_position_size: f64,
    pub risk_amount: f64,
    pub leverage: f64,
    pub constraint_violations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRecommendation {
    pub action: TradeAction,
    pub pair: String,
    pub trader_profile: TraderProfile,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    pub pair: String,
    pub current_price: f64,
    pub volatility: f64,
    pub candles: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub request_id: RequestId,
    pub trend: TrendForecast,
    pub strategy: StrategySummary,
    pub risk_analysis: RiskAnalysis,
    pub final_recommendation: FinalRecommendation,
    pub market_data: MarketData,
    pub explanation: String,
}

impl DecisionReport {
    /// Report stamped with the current time.
    pub fn new(decision: &Decision, snapshot: &MarketSnapshot, request_id: RequestId) -> Self {
        Self::at(decision, snapshot, request_id, Utc::now())
    }

    pub fn at(
        decision: &Decision,
        snapshot: &MarketSnapshot,
        request_id: RequestId,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let rec = &decision.recommendation;
        let risk = &decision.risk;
        Self {
            request_id,
            trend: decision.forecast.clone(),
            strategy: StrategySummary {
                action: rec.action,
                entry_price: rec.entry_price,
                position_size: rec.position_size,
                stop_loss: rec.stop_loss,
                take_profit: rec.take_profit,
                leverage: rec.leverage,
                expected_profit: rec.expected_profit,
                risk_reward_ratio: rec.risk_reward_ratio,
                confidence_score: rec.confidence_score,
            },
            risk_analysis: RiskAnalysis {
                is_valid: risk.is_valid,
                max_position_size: risk.max_position_size,
                risk_amount: risk.risk_amount,
                leverage: risk.leverage,
                constraint_violations: risk.violations.clone(),
            },
            final_recommendation: FinalRecommendation {
                action: rec.action,
                pair: rec.pair.clone(),
                trader_profile: decision.profile,
                generated_at,
            },
            market_data: MarketData {
                pair: snapshot.pair().to_string(),
                current_price: snapshot.current_price(),
                volatility: snapshot.indicators().volatility,
                candles: snapshot.history().len(),
            },
            explanation: explanation(decision),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Sectioned plain-text account of a decision.
pub fn explanation(decision: &Decision) -> String {
    let fc = &decision.forecast;
    let risk = &decision.risk;
    let rec = &decision.recommendation;
    let mut lines = vec![
        format!("[Market Analysis] {} profile", decision.profile),
        format!(
            "Trend: {} with {:.1}% confidence",
            fc.direction.as_str(),
            fc.confidence * 100.0
        ),
        format!(
            "Probabilities: up {:.1}% / down {:.1}% / neutral {:.1}%",
            fc.probability_up * 100.0,
            fc.probability_down * 100.0,
            fc.probability_neutral * 100.0
        ),
        format!("Uncertainty: {:.2}", fc.uncertainty),
        String::new(),
        "[Risk Assessment]".to_string(),
    ];

    if risk.is_valid {
        lines.push("Risk constraints satisfied".to_string());
        lines.push(format!("Max position: {:.0} units", risk.max_position_size));
        lines.push(format!("Risk amount: {:.2}", risk.risk_amount));
        lines.push(format!("Leverage: {:.0}x", risk.leverage));
    } else {
        lines.push("Risk constraints violated:".to_string());
        lines.extend(risk.violations.iter().map(|v| format!("  - {v}")));
    }

    lines.push(String::new());
    lines.push("[Strategy Recommendation]".to_string());
    lines.push(format!("Action: {}", rec.action.as_str().to_uppercase()));
    if rec.action.opens_position() {
        lines.push(format!("Position size: {:.0} units", rec.position_size));
        lines.push(format!("Entry: {:.5}", rec.entry_price));
        lines.push(format!("Stop loss: {:.5}", rec.stop_loss));
        lines.push(format!("Take profit: {:.5}", rec.take_profit));
        lines.push(format!("Risk/reward: {:.2}:1", rec.risk_reward_ratio));
        lines.push(format!("Expected profit: {:.2}", rec.expected_profit));
    }
    lines.push(format!("Confidence score: {:.3}", rec.confidence_score));

    lines.push(String::new());
    lines.push("[Reasoning]".to_string());
    lines.push(rec.reasoning.clone());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fxpilot_core::domain::Portfolio;
    use fxpilot_core::engine::{DecisionEngine, EngineConfig};

    use crate::fingerprint::request_id;
    use crate::synthetic::{generate_snapshot, MarketRegime, SyntheticSpec};

    fn report_for(capital: f64) -> DecisionReport {
        let snapshot =
            generate_snapshot(&SyntheticSpec::new("EURUSD", MarketRegime::Bullish, 3)).unwrap();
        let portfolio = Portfolio::with_capital(capital).unwrap();
        let config = EngineConfig::default();
        let engine = DecisionEngine::new(config).unwrap();
        let decision = engine
            .decide(&snapshot, TraderProfile::Balanced, &portfolio)
            .unwrap();
        let id = request_id(&snapshot, TraderProfile::Balanced, &portfolio, &config).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        DecisionReport::at(&decision, &snapshot, id, at)
    }

    #[test]
    fn sections_mirror_decision() {
        let r = report_for(10_000.0);
        assert_eq!(r.strategy.action, r.final_recommendation.action);
        assert_eq!(r.final_recommendation.trader_profile, TraderProfile::Balanced);
        assert_eq!(r.market_data.pair, "EURUSD");
        assert_eq!(r.market_data.candles, 60);
        assert!(r.risk_analysis.is_valid);
        for header in [
            "[Market Analysis]",
            "[Risk Assessment]",
            "[Strategy Recommendation]",
            "[Reasoning]",
        ] {
            assert!(r.explanation.contains(header), "missing {header}");
        }
    }

    #[test]
    fn infeasible_report_lists_violations() {
        let r = report_for(10.0);
        assert!(!r.risk_analysis.is_valid);
        assert!(!r.risk_analysis.constraint_violations.is_empty());
        assert_eq!(r.strategy.action, TradeAction::Hold);
        assert!(r.explanation.contains("Risk constraints violated:"));
        assert!(r.explanation.contains("Action: HOLD"));
    }

    #[test]
    fn json_roundtrip_preserves_report() {
        let r = report_for(10_000.0);
        let json = r.to_json_pretty().unwrap();
        let back: DecisionReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.request_id, r.request_id);
        assert_eq!(back.final_recommendation.generated_at, r.final_recommendation.generated_at);
        assert_eq!(back.strategy.action, r.strategy.action);
    }
}
