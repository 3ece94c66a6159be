//! Feature extraction: candle window + indicators → [`FeatureVector`].
//!
//! Pure function of the snapshot. Sub-windows shorter than requested (5 or
//! 10 returns) shrink to the available returns, and every ratio with a zero
//! denominator yields 0.

use thiserror::Error;

use super::{Feature, FeatureVector};
use crate::domain::MarketSnapshot;
use crate::indicators::true_range;
use crate::stats::{mean, population_std, safe_ratio, tail};

/// Number of most recent candles used by default.
pub const DEFAULT_WINDOW: usize = 20;

const SHORT: usize = 5;
const MEDIUM: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("feature window holds {got} candles, at least 2 are required")]
    InsufficientHistory { got: usize },
}

/// Extracts features from the last `window` candles of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureExtractor {
    window: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

impl FeatureExtractor {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn extract(&self, snapshot: &MarketSnapshot) -> Result<FeatureVector, FeatureError> {
        extract(snapshot, self.window)
    }
}

/// Computes the full feature set over the most recent `window` candles.
pub fn extract(snapshot: &MarketSnapshot, window: usize) -> Result<FeatureVector, FeatureError> {
    let candles = snapshot.window(window);
    if candles.len() < 2 {
        return Err(FeatureError::InsufficientHistory { got: candles.len() });
    }

    let price = snapshot.current_price();
    let ind = snapshot.indicators();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();
    let returns: Vec<f64> = closes
        .windows(2)
        .map(|w| safe_ratio(w[1] - w[0], w[0]))
        .collect();

    let mut fv = FeatureVector::new(snapshot.pair(), price);

    // ─── Price change ───
    fv.set(Feature::PriceChange1, returns.last().copied().unwrap_or(0.0));
    fv.set(Feature::PriceChange5, mean(tail(&returns, SHORT)));
    fv.set(Feature::PriceChange10, mean(tail(&returns, MEDIUM)));
    fv.set(Feature::PriceDispersion, population_std(&closes));
    let (lo, hi) = closes
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
            (lo.min(c), hi.max(c))
        });
    fv.set(Feature::PriceRange, safe_ratio(hi - lo, mean(&closes)));

    // ─── Momentum ───
    let gains: f64 = returns.iter().filter(|r| **r > 0.0).sum();
    let losses: f64 = returns.iter().filter(|r| **r < 0.0).sum();
    let up_days = returns.iter().filter(|r| **r > 0.0).count();
    let down_days = returns.iter().filter(|r| **r < 0.0).count();
    // share of moving candles that rose; 0.5 when nothing moved
    let bullish_ratio = if up_days + down_days == 0 {
        0.5
    } else {
        up_days as f64 / (up_days + down_days) as f64
    };
    fv.set(Feature::BullishRatio, bullish_ratio);
    fv.set(Feature::MomentumStrength, gains - losses.abs());
    let (ups, downs) = streaks(&returns);
    fv.set(Feature::ConsecutiveUps, ups as f64);
    fv.set(Feature::ConsecutiveDowns, downs as f64);

    // ─── Volatility ───
    fv.set(Feature::VolatilityShort, population_std(tail(&returns, SHORT)));
    fv.set(Feature::VolatilityMedium, population_std(tail(&returns, MEDIUM)));
    fv.set(Feature::VolatilityLong, population_std(&returns));
    fv.set(Feature::AvgTrueRange, mean(&true_range(candles)));
    fv.set(Feature::VolatilityTrend, volatility_trend(&returns));

    // ─── Oscillator / moving averages ───
    fv.set(Feature::Oscillator, ind.oscillator);
    fv.set(
        Feature::OscillatorDeviation,
        ((ind.oscillator - 50.0) / 50.0).clamp(-1.0, 1.0),
    );
    fv.set(
        Feature::MaCrossover,
        safe_ratio(ind.sma_short - ind.sma_long, ind.sma_long),
    );
    fv.set(
        Feature::PriceVsShortMa,
        safe_ratio(price - ind.sma_short, ind.sma_short),
    );
    fv.set(Feature::AtrRatio, safe_ratio(ind.atr, price));

    // ─── Volume ───
    let avg_volume = mean(&volumes);
    fv.set(
        Feature::VolumeRatio,
        safe_ratio(mean(tail(&volumes, SHORT)), avg_volume),
    );
    let last_volume = volumes.last().copied().unwrap_or(0.0);
    fv.set(
        Feature::VolumeDeviation,
        safe_ratio(last_volume - avg_volume, avg_volume),
    );

    Ok(fv)
}

/// Same-sign streaks counted backward from the most recent return.
/// A zero return ends both streaks.
fn streaks(returns: &[f64]) -> (usize, usize) {
    let ups = returns.iter().rev().take_while(|r| **r > 0.0).count();
    let downs = returns.iter().rev().take_while(|r| **r < 0.0).count();
    (ups, downs)
}

/// Relative change in volatility between the last 5 returns and the 5
/// before them. 0 with fewer than 10 returns.
fn volatility_trend(returns: &[f64]) -> f64 {
    let n = returns.len();
    if n < 2 * SHORT {
        return 0.0;
    }
    let recent = population_std(&returns[n - SHORT..]);
    let older = population_std(&returns[n - 2 * SHORT..n - SHORT]);
    safe_ratio(recent - older, older)
}
