//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period), seeded with the mean
//! of the first `period` true ranges that have a previous close.
//! Lookback: period.

use super::Indicator;
use crate::domain::Ohlcv;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range series. TR[0] = high[0] - low[0] (no previous close).
pub fn true_range(candles: &[Ohlcv]) -> Vec<f64> {
    candles
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let prev_close = if i == 0 { None } else { Some(candles[i - 1].close) };
            c.true_range(prev_close)
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Ohlcv]) -> Vec<f64> {
        let n = candles.len();
        let mut result = vec![f64::NAN; n];
        if n < self.period + 1 {
            return result;
        }

        let tr = true_range(candles);
        let mut atr = tr[1..=self.period].iter().sum::<f64>() / self.period as f64;
        result[self.period] = atr;

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            atr = alpha * tr[i] + (1.0 - alpha) * atr;
            result[i] = atr;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_approx, candles_from_closes};

    #[test]
    fn true_range_first_candle_is_high_minus_low() {
        let candles = candles_from_closes(&[1.10, 1.12]);
        let tr = true_range(&candles);
        // helper candles span close ± 0.002
        assert_approx(tr[0], 0.004, 1e-12);
        // high 1.122 - prev close 1.10 = 0.022
        assert_approx(tr[1], 0.022, 1e-12);
    }

    #[test]
    fn atr_constant_range() {
        // Flat closes: every TR = high - low = 0.004
        let candles = candles_from_closes(&[1.1; 10]);
        let result = Atr::new(3).compute(&candles);
        assert!(result[..3].iter().all(|v| v.is_nan()));
        for v in &result[3..] {
            assert_approx(*v, 0.004, 1e-12);
        }
    }

    #[test]
    fn atr_wilder_step() {
        // closes 1.10, 1.10, 1.10, 1.10, 1.13
        // TR[1..=3] = 0.004 each → seed 0.004
        // TR[4] = max(0.004, |1.132-1.10|, |1.128-1.10|) = 0.032
        // ATR[4] = 0.032/3 + 0.004*2/3 = 0.013333...
        let candles = candles_from_closes(&[1.10, 1.10, 1.10, 1.10, 1.13]);
        let result = Atr::new(3).compute(&candles);
        assert_approx(result[3], 0.004, 1e-12);
        assert_approx(result[4], 0.032 / 3.0 + 0.004 * 2.0 / 3.0, 1e-12);
    }

    #[test]
    fn atr_short_history_is_warmup() {
        let candles = candles_from_closes(&[1.1, 1.2]);
        assert!(Atr::new(14).compute(&candles).iter().all(|v| v.is_nan()));
    }
}
