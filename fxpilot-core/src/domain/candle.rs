//! Candle: one OHLCV observation of a currency pair.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from candle validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle {date}: {field} must be a finite positive price, got {value}")]
    InvalidPrice {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },
    #[error("candle {date}: high {high} is below low {low}")]
    HighBelowLow { date: NaiveDate, high: f64, low: f64 },
    #[error("candle {date}: volume must be finite and non-negative, got {volume}")]
    InvalidVolume { date: NaiveDate, volume: f64 },
}

/// OHLCV observation for a single period.
///
/// Volume is a float because FX tick volume is frequently reported as a
/// fractional lot count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Ohlcv {
    /// Checks that prices are finite and positive, high ≥ low, and volume is
    /// finite and non-negative.
    pub fn validate(&self) -> Result<(), CandleError> {
        for (field, value) in [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(CandleError::InvalidPrice {
                    date: self.date,
                    field,
                    value,
                });
            }
        }
        if self.high < self.low {
            return Err(CandleError::HighBelowLow {
                date: self.date,
                high: self.high,
                low: self.low,
            });
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(CandleError::InvalidVolume {
                date: self.date,
                volume: self.volume,
            });
        }
        Ok(())
    }

    /// True range against the previous close:
    /// max(high − low, |high − prev_close|, |low − prev_close|).
    pub fn true_range(&self, prev_close: Option<f64>) -> f64 {
        let hl = self.high - self.low;
        match prev_close {
            Some(pc) => hl.max((self.high - pc).abs()).max((self.low - pc).abs()),
            None => hl,
        }
    }
}
