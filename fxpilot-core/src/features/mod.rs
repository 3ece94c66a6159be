//! Named feature vectors extracted from a market snapshot.
//!
//! The key set is closed: [`Feature`] enumerates every name the forecaster
//! knows. A [`FeatureVector`] may still lack entries (e.g. when assembled by
//! hand), and a missing entry reads as 0.

pub mod extractor;

pub use extractor::{extract, FeatureError, FeatureExtractor, DEFAULT_WINDOW};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    // ─── Price change ───
    PriceChange1,
    PriceChange5,
    PriceChange10,
    PriceDispersion,
    PriceRange,
    // ─── Momentum ───
    BullishRatio,
    MomentumStrength,
    ConsecutiveUps,
    ConsecutiveDowns,
    // ─── Volatility ───
    VolatilityShort,
    VolatilityMedium,
    VolatilityLong,
    AvgTrueRange,
    VolatilityTrend,
    // ─── Oscillator / moving averages ───
    Oscillator,
    OscillatorDeviation,
    MaCrossover,
    PriceVsShortMa,
    AtrRatio,
    // ─── Volume ───
    VolumeRatio,
    VolumeDeviation,
}

impl Feature {
    pub const COUNT: usize = 21;

    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::PriceChange1,
        Feature::PriceChange5,
        Feature::PriceChange10,
        Feature::PriceDispersion,
        Feature::PriceRange,
        Feature::BullishRatio,
        Feature::MomentumStrength,
        Feature::ConsecutiveUps,
        Feature::ConsecutiveDowns,
        Feature::VolatilityShort,
        Feature::VolatilityMedium,
        Feature::VolatilityLong,
        Feature::AvgTrueRange,
        Feature::VolatilityTrend,
        Feature::Oscillator,
        Feature::OscillatorDeviation,
        Feature::MaCrossover,
        Feature::PriceVsShortMa,
        Feature::AtrRatio,
        Feature::VolumeRatio,
        Feature::VolumeDeviation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::PriceChange1 => "price_change_1",
            Self::PriceChange5 => "price_change_5",
            Self::PriceChange10 => "price_change_10",
            Self::PriceDispersion => "price_dispersion",
            Self::PriceRange => "price_range",
            Self::BullishRatio => "bullish_ratio",
            Self::MomentumStrength => "momentum_strength",
            Self::ConsecutiveUps => "consecutive_ups",
            Self::ConsecutiveDowns => "consecutive_downs",
            Self::VolatilityShort => "volatility_short",
            Self::VolatilityMedium => "volatility_medium",
            Self::VolatilityLong => "volatility_long",
            Self::AvgTrueRange => "avg_true_range",
            Self::VolatilityTrend => "volatility_trend",
            Self::Oscillator => "oscillator",
            Self::OscillatorDeviation => "oscillator_deviation",
            Self::MaCrossover => "ma_crossover",
            Self::PriceVsShortMa => "price_vs_short_ma",
            Self::AtrRatio => "atr_ratio",
            Self::VolumeRatio => "volume_ratio",
            Self::VolumeDeviation => "volume_deviation",
        }
    }

    /// Features that already measure downward evidence. The forecaster does
    /// not sign-flip these when scoring the down class.
    pub fn is_down_oriented(self) -> bool {
        matches!(self, Self::ConsecutiveDowns)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Feature values for one pair at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub pair: String,
    /// Price the features were extracted at; scales the expected move.
    pub reference_price: f64,
    values: BTreeMap<Feature, f64>,
}

impl FeatureVector {
    pub fn new(pair: impl Into<String>, reference_price: f64) -> Self {
        Self {
            pair: pair.into(),
            reference_price,
            values: BTreeMap::new(),
        }
    }

    /// Value of `feature`, or 0 when absent.
    pub fn get(&self, feature: Feature) -> f64 {
        self.values.get(&feature).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.values.contains_key(&feature)
    }

    /// Inserts a value; non-finite values are stored as 0.
    pub fn set(&mut self, feature: Feature, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.values.insert(feature, value);
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
