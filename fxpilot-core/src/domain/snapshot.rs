//! Market snapshot: the immutable input to one decision.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::candle::{CandleError, Ohlcv};
use crate::indicators::{self, IndicatorPeriods};

/// Minimum number of candles a snapshot must carry.
pub const MIN_HISTORY: usize = 2;

/// Errors from snapshot construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapshotError {
    #[error("pair identifier must not be empty")]
    EmptyPair,
    #[error("current price must be finite and positive, got {0}")]
    InvalidPrice(f64),
    #[error("history has {got} candles, at least {min} required")]
    InsufficientHistory { got: usize, min: usize },
    #[error("history is not chronological at index {index}")]
    NotChronological { index: usize },
    #[error(transparent)]
    Candle(#[from] CandleError),
    #[error("indicator {name} is out of range: {value}")]
    IndicatorOutOfRange { name: &'static str, value: f64 },
}

/// Precomputed indicator bundle for a snapshot's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicators {
    /// Mean simple return over the trailing volatility window.
    pub mean_return: f64,
    /// Standard deviation of the same returns.
    pub volatility: f64,
    pub sma_short: f64,
    pub sma_long: f64,
    /// RSI in [0, 100].
    pub oscillator: f64,
    pub atr: f64,
}

impl Indicators {
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let checks: [(&'static str, f64, bool); 6] = [
            ("mean_return", self.mean_return, true),
            ("volatility", self.volatility, self.volatility >= 0.0),
            ("sma_short", self.sma_short, self.sma_short > 0.0),
            ("sma_long", self.sma_long, self.sma_long > 0.0),
            (
                "oscillator",
                self.oscillator,
                (0.0..=100.0).contains(&self.oscillator),
            ),
            ("atr", self.atr, self.atr >= 0.0),
        ];
        for (name, value, in_range) in checks {
            if !value.is_finite() || !in_range {
                return Err(SnapshotError::IndicatorOutOfRange { name, value });
            }
        }
        Ok(())
    }
}

/// A pair's current price, its candle history, and the indicators derived
/// from that history.
///
/// Fields are private: a snapshot is built once (validated) and never
/// mutated, so the indicators cannot drift from the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SnapshotRecord")]
pub struct MarketSnapshot {
    pair: String,
    current_price: f64,
    history: Vec<Ohlcv>,
    indicators: Indicators,
}

impl MarketSnapshot {
    /// Builds a snapshot from explicit indicators, validating every field.
    pub fn new(
        pair: impl Into<String>,
        current_price: f64,
        history: Vec<Ohlcv>,
        indicators: Indicators,
    ) -> Result<Self, SnapshotError> {
        let pair = pair.into();
        validate_parts(&pair, current_price, &history)?;
        indicators.validate()?;
        Ok(Self {
            pair,
            current_price,
            history,
            indicators,
        })
    }

    /// Builds a snapshot whose indicators are derived from `history` with the
    /// default periods.
    pub fn from_history(
        pair: impl Into<String>,
        current_price: f64,
        history: Vec<Ohlcv>,
    ) -> Result<Self, SnapshotError> {
        Self::from_history_with(pair, current_price, history, &IndicatorPeriods::default())
    }

    pub fn from_history_with(
        pair: impl Into<String>,
        current_price: f64,
        history: Vec<Ohlcv>,
        periods: &IndicatorPeriods,
    ) -> Result<Self, SnapshotError> {
        let pair = pair.into();
        validate_parts(&pair, current_price, &history)?;
        let indicators = indicators::derive(&history, periods);
        indicators.validate()?;
        Ok(Self {
            pair,
            current_price,
            history,
            indicators,
        })
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn history(&self) -> &[Ohlcv] {
        &self.history
    }

    pub fn indicators(&self) -> &Indicators {
        &self.indicators
    }

    /// The most recent `window` candles (all of them if fewer exist).
    pub fn window(&self, window: usize) -> &[Ohlcv] {
        &self.history[self.history.len().saturating_sub(window)..]
    }
}

fn validate_parts(pair: &str, price: f64, history: &[Ohlcv]) -> Result<(), SnapshotError> {
    if pair.trim().is_empty() {
        return Err(SnapshotError::EmptyPair);
    }
    if !price.is_finite() || price <= 0.0 {
        return Err(SnapshotError::InvalidPrice(price));
    }
    if history.len() < MIN_HISTORY {
        return Err(SnapshotError::InsufficientHistory {
            got: history.len(),
            min: MIN_HISTORY,
        });
    }
    for candle in history {
        candle.validate()?;
    }
    if let Some(index) = history
        .windows(2)
        .position(|w| w[1].date <= w[0].date)
    {
        return Err(SnapshotError::NotChronological { index: index + 1 });
    }
    Ok(())
}

/// Wire form of a snapshot; indicators are derived when omitted.
#[derive(Deserialize)]
struct SnapshotRecord {
    pair: String,
    current_price: f64,
    history: Vec<Ohlcv>,
    #[serde(default)]
    indicators: Option<Indicators>,
}

impl TryFrom<SnapshotRecord> for MarketSnapshot {
    type Error = SnapshotError;

    fn try_from(record: SnapshotRecord) -> Result<Self, Self::Error> {
        match record.indicators {
            Some(ind) => Self::new(record.pair, record.current_price, record.history, ind),
            None => Self::from_history(record.pair, record.current_price, record.history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::candles_from_closes;

    fn rising(n: usize) -> Vec<Ohlcv> {
        candles_from_closes(&(0..n).map(|i| 1.10 + i as f64 * 0.001).collect::<Vec<_>>())
    }

    #[test]
    fn from_history_derives_consistent_indicators() {
        let history = rising(60);
        let snap = MarketSnapshot::from_history("EURUSD", 1.16, history.clone()).unwrap();
        let expected = indicators::derive(&history, &IndicatorPeriods::default());
        assert_eq!(snap.indicators(), &expected);
        assert_eq!(snap.history().len(), 60);
        assert_eq!(snap.pair(), "EURUSD");
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = MarketSnapshot::from_history("EURUSD", 0.0, rising(10)).unwrap_err();
        assert_eq!(err, SnapshotError::InvalidPrice(0.0));
    }

    #[test]
    fn rejects_empty_pair() {
        let err = MarketSnapshot::from_history("  ", 1.1, rising(10)).unwrap_err();
        assert_eq!(err, SnapshotError::EmptyPair);
    }

    #[test]
    fn rejects_single_candle() {
        let err = MarketSnapshot::from_history("EURUSD", 1.1, rising(1)).unwrap_err();
        assert!(matches!(err, SnapshotError::InsufficientHistory { got: 1, .. }));
    }

    #[test]
    fn rejects_out_of_order_history() {
        let mut history = rising(5);
        history.swap(2, 3);
        let err = MarketSnapshot::from_history("EURUSD", 1.1, history).unwrap_err();
        assert_eq!(err, SnapshotError::NotChronological { index: 2 });
    }

    #[test]
    fn rejects_oscillator_out_of_range() {
        let history = rising(10);
        let mut ind = indicators::derive(&history, &IndicatorPeriods::default());
        ind.oscillator = 120.0;
        let err = MarketSnapshot::new("EURUSD", 1.1, history, ind).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::IndicatorOutOfRange { name: "oscillator", .. }
        ));
    }

    #[test]
    fn window_takes_most_recent_candles() {
        let snap = MarketSnapshot::from_history("EURUSD", 1.2, rising(30)).unwrap();
        let w = snap.window(5);
        assert_eq!(w.len(), 5);
        assert_eq!(w.last(), snap.history().last());
        assert_eq!(snap.window(100).len(), 30);
    }

    #[test]
    fn deserialize_without_indicators_derives_them() {
        let snap = MarketSnapshot::from_history("EURUSD", 1.16, rising(20)).unwrap();
        let json = serde_json::json!({
            "pair": "EURUSD",
            "current_price": 1.16,
            "history": snap.history(),
        });
        let parsed: MarketSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.history().len(), 20);
        assert!((parsed.indicators().sma_short - snap.indicators().sma_short).abs() < 1e-12);
        assert!((parsed.indicators().oscillator - snap.indicators().oscillator).abs() < 1e-9);
    }

    #[test]
    fn deserialize_runs_validation() {
        let json = serde_json::json!({
            "pair": "EURUSD",
            "current_price": -1.0,
            "history": rising(5),
        });
        assert!(serde_json::from_value::<MarketSnapshot>(json).is_err());
    }
}
