//! Bayesian-style trend forecaster.
//!
//! # Algorithm
//!
//! ```text
//! L(up)      = sigmoid(Σ w·x)
//! L(down)    = sigmoid(Σ w·x')          x' = -x unless down-oriented
//! L(neutral) = clamp01((1 - |momentum|) · (1 - |osc_dev|) · (1 - 10·vol_medium))
//! P(c)       = prior(c)·L(c) / Σ prior·L     (priors if Σ ≤ 0)
//! ```
//!
//! Direction is the argmax of P with ties resolved up → down → neutral.
//! The forecaster never fails: missing features read as 0.

use super::explain::explain;
use super::weights::{Priors, WeightTable};
use super::{TrendDirection, TrendForecast};
use crate::features::{Feature, FeatureVector};
use crate::stats::{clamp01, sigmoid};

/// Lower clip applied to each posterior before taking logs.
const ENTROPY_FLOOR: f64 = 1e-10;

const DIRECTIONS: [TrendDirection; 3] = [
    TrendDirection::Bullish,
    TrendDirection::Bearish,
    TrendDirection::Neutral,
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendForecaster {
    weights: WeightTable,
    priors: Priors,
}

impl TrendForecaster {
    pub fn new(weights: WeightTable, priors: Priors) -> Self {
        Self { weights, priors }
    }

    pub fn forecast(&self, features: &FeatureVector) -> TrendForecast {
        let likelihoods = self.likelihoods(features);
        let posteriors = posteriors(&self.priors.as_array(), &likelihoods);
        let (direction, confidence) = argmax(&posteriors);
        let [p_up, p_down, p_neutral] = posteriors;

        let forecast = TrendForecast {
            pair: features.pair.clone(),
            reference_price: features.reference_price,
            direction,
            confidence,
            probability_up: p_up,
            probability_down: p_down,
            probability_neutral: p_neutral,
            expected_move: expected_move(features, p_up, p_down),
            volatility: blended_volatility(features),
            uncertainty: normalized_entropy(&posteriors),
            explanation: String::new(),
        };
        TrendForecast {
            explanation: explain(&forecast, features),
            ..forecast
        }
    }

    /// Class likelihoods in up, down, neutral order.
    pub fn likelihoods(&self, features: &FeatureVector) -> [f64; 3] {
        let up = sigmoid(self.weights.up_score(features));
        let down = sigmoid(self.weights.down_score(features));
        let neutral = clamp01(
            (1.0 - features.get(Feature::MomentumStrength).abs())
                * (1.0 - features.get(Feature::OscillatorDeviation).abs())
                * (1.0 - 10.0 * features.get(Feature::VolatilityMedium)),
        );
        [up, down, neutral]
    }
}

fn posteriors(priors: &[f64; 3], likelihoods: &[f64; 3]) -> [f64; 3] {
    let joint = [
        priors[0] * likelihoods[0],
        priors[1] * likelihoods[1],
        priors[2] * likelihoods[2],
    ];
    let total: f64 = joint.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return *priors;
    }
    joint.map(|j| j / total)
}

/// First maximal entry wins.
fn argmax(p: &[f64; 3]) -> (TrendDirection, f64) {
    let mut best = 0;
    for i in 1..3 {
        if p[i] > p[best] {
            best = i;
        }
    }
    (DIRECTIONS[best], p[best])
}

fn normalized_entropy(p: &[f64; 3]) -> f64 {
    let h: f64 = p
        .iter()
        .map(|&x| {
            let x = x.max(ENTROPY_FLOOR);
            -x * x.ln()
        })
        .sum();
    clamp01(h / 3.0_f64.ln())
}

/// `|(p_up·up_move − p_down·down_move) · price|` where the base move is twice
/// the medium-horizon volatility, skewed by momentum.
fn expected_move(features: &FeatureVector, p_up: f64, p_down: f64) -> f64 {
    let base = 2.0 * features.get(Feature::VolatilityMedium);
    let momentum = features.get(Feature::MomentumStrength);
    let up_move = base * (1.0 + momentum);
    let down_move = base * (1.0 - momentum);
    ((p_up * up_move - p_down * down_move) * features.reference_price).abs()
}

fn blended_volatility(features: &FeatureVector) -> f64 {
    0.5 * features.get(Feature::VolatilityShort)
        + 0.3 * features.get(Feature::VolatilityMedium)
        + 0.2 * features.get(Feature::VolatilityLong)
}
