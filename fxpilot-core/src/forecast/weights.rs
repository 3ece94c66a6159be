//! Fixed likelihood weights and class priors.
//!
//! Weights apply to raw feature values, so return-scaled features (price
//! changes, crossover ratios) carry large coefficients and count features
//! carry small ones. The raw oscillator level is not weighted; its
//! normalized deviation is. Ratio features whose no-signal level is not
//! zero are centred on that level before weighting, so a flat market
//! scores 0 for both directions.

use serde::{Deserialize, Serialize};

use crate::features::{Feature, FeatureVector};

/// Linear weights for the up-class score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    weights: Vec<(Feature, f64)>,
}

/// Coefficients assume features in their extracted units: returns and MA
/// ratios as fractions (0.001 = 0.1 %), streaks as candle counts, and the
/// oscillator deviation and centred ratios in [-1, 1].
const DEFAULT_WEIGHTS: [(Feature, f64); 20] = [
    (Feature::PriceChange1, 25.0),
    (Feature::PriceChange5, 40.0),
    (Feature::PriceChange10, 50.0),
    (Feature::PriceDispersion, -0.3),
    (Feature::PriceRange, -2.0),
    (Feature::BullishRatio, 1.0),
    (Feature::MomentumStrength, 12.0),
    (Feature::ConsecutiveUps, 0.15),
    (Feature::ConsecutiveDowns, -0.15),
    (Feature::VolatilityShort, -8.0),
    (Feature::VolatilityMedium, -5.0),
    (Feature::VolatilityLong, -3.0),
    (Feature::AvgTrueRange, -0.3),
    (Feature::VolatilityTrend, -0.2),
    (Feature::OscillatorDeviation, 1.5),
    (Feature::MaCrossover, 150.0),
    (Feature::PriceVsShortMa, 80.0),
    (Feature::AtrRatio, -10.0),
    (Feature::VolumeRatio, 0.3),
    (Feature::VolumeDeviation, 0.2),
];

/// No-signal level of features that are not centred on zero.
const NEUTRAL_LEVELS: [(Feature, f64); 2] = [
    (Feature::BullishRatio, 0.5),
    (Feature::VolumeRatio, 1.0),
];

/// Signed deviation of `feature` from its neutral level. Missing features
/// contribute nothing.
fn signal(features: &FeatureVector, feature: Feature) -> f64 {
    if !features.contains(feature) {
        return 0.0;
    }
    let level = NEUTRAL_LEVELS
        .iter()
        .find(|(f, _)| *f == feature)
        .map_or(0.0, |(_, level)| *level);
    features.get(feature) - level
}

impl Default for WeightTable {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }
}

impl WeightTable {
    pub fn weight(&self, feature: Feature) -> f64 {
        self.weights
            .iter()
            .find(|(f, _)| *f == feature)
            .map_or(0.0, |(_, w)| *w)
    }

    /// Σ w·x for the up class.
    pub fn up_score(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .map(|(f, w)| w * signal(features, *f))
            .sum()
    }

    /// Σ w·x' for the down class, where x' flips the sign of every feature
    /// that is not down-oriented.
    pub fn down_score(&self, features: &FeatureVector) -> f64 {
        self.weights
            .iter()
            .map(|(f, w)| {
                let x = signal(features, *f);
                if f.is_down_oriented() {
                    w * x
                } else {
                    -w * x
                }
            })
            .sum()
    }
}

/// Class priors for up, down and neutral.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Priors {
    pub up: f64,
    pub down: f64,
    pub neutral: f64,
}

impl Default for Priors {
    fn default() -> Self {
        Self {
            up: 0.40,
            down: 0.40,
            neutral: 0.20,
        }
    }
}

impl Priors {
    pub fn as_array(&self) -> [f64; 3] {
        [self.up, self.down, self.neutral]
    }
}
