//! Indicator kernels and the derivation of a snapshot's indicator bundle.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! The first `lookback()` values of a series are `f64::NAN` (warmup).
//! No value at index t may depend on candles after t.

pub mod atr;
pub mod rsi;
pub mod sma;

pub use atr::{true_range, Atr};
pub use rsi::Rsi;
pub use sma::Sma;

use serde::{Deserialize, Serialize};

use crate::domain::{Indicators, Ohlcv};
use crate::stats;

/// Trait for indicator kernels.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator over the whole history. Same length as input.
    fn compute(&self, candles: &[Ohlcv]) -> Vec<f64>;

    /// Most recent valid value, if the history covers the lookback.
    fn latest(&self, candles: &[Ohlcv]) -> Option<f64> {
        self.compute(candles)
            .last()
            .copied()
            .filter(|v| v.is_finite())
    }
}

/// Periods used when deriving a snapshot's indicator bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorPeriods {
    pub sma_short: usize,
    pub sma_long: usize,
    pub rsi: usize,
    pub atr: usize,
    /// Trailing returns used for mean return and volatility.
    pub volatility: usize,
}

impl Default for IndicatorPeriods {
    fn default() -> Self {
        Self {
            sma_short: 20,
            sma_long: 50,
            rsi: 14,
            atr: 14,
            volatility: 20,
        }
    }
}

/// Derive the indicator bundle from a candle history.
///
/// Periods longer than the history shrink to what is available, so any
/// history of two or more candles yields a fully populated bundle. Callers
/// guarantee `history.len() >= 2`.
pub fn derive(history: &[Ohlcv], periods: &IndicatorPeriods) -> Indicators {
    let n = history.len();
    let closes: Vec<f64> = history.iter().map(|c| c.close).collect();
    let returns = stats::simple_returns(&closes);
    let recent = stats::tail(&returns, periods.volatility);

    let change_span = n.saturating_sub(1).max(1);
    let sma_short = Sma::new(periods.sma_short.min(n)).latest(history);
    let sma_long = Sma::new(periods.sma_long.min(n)).latest(history);
    let rsi = Rsi::new(periods.rsi.min(change_span)).latest(history);
    let atr = Atr::new(periods.atr.min(change_span)).latest(history);

    let fallback_close = stats::mean(&closes);
    Indicators {
        mean_return: stats::mean(recent),
        volatility: stats::sample_std(recent),
        sma_short: sma_short.unwrap_or(fallback_close),
        sma_long: sma_long.unwrap_or(fallback_close),
        oscillator: rsi.unwrap_or(50.0),
        atr: atr.unwrap_or_else(|| stats::mean(&true_range(history))),
    }
}
