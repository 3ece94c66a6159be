//! Seeded synthetic market snapshots.
//!
//! Produces a regime-shaped random walk for a pair. The RNG is seeded from
//! a BLAKE3 hash of the pair, seed and period, so the same inputs always
//! yield the same candles. Synthetic snapshots are for demos and
//! evaluation only.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use fxpilot_core::domain::{MarketSnapshot, Ohlcv, SnapshotError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Candles generated per snapshot by default.
pub const DEFAULT_CANDLES: usize = 60;

/// Pairs with a known reference price.
pub const KNOWN_PAIRS: [(&str, f64); 7] = [
    ("EURUSD", 1.1000),
    ("GBPUSD", 1.2500),
    ("USDJPY", 110.00),
    ("AUDUSD", 0.7500),
    ("USDCAD", 1.2500),
    ("NZDUSD", 0.7000),
    ("USDCHF", 0.9200),
];

/// Starting price for a pair; unknown pairs start at 1.0.
pub fn base_price(pair: &str) -> f64 {
    KNOWN_PAIRS
        .iter()
        .find(|(p, _)| p.eq_ignore_ascii_case(pair))
        .map_or(1.0, |(_, price)| *price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegime {
    Bullish,
    Bearish,
    Sideways,
    #[default]
    Mixed,
}

impl MarketRegime {
    pub const ALL: [MarketRegime; 4] = [
        MarketRegime::Bullish,
        MarketRegime::Bearish,
        MarketRegime::Sideways,
        MarketRegime::Mixed,
    ];

    /// Per-candle drift range and return volatility.
    fn shape(self) -> ((f64, f64), f64) {
        match self {
            Self::Bullish => ((0.0008, 0.002), 0.004),
            Self::Bearish => ((-0.002, -0.0008), 0.005),
            Self::Sideways => ((-0.0002, 0.0002), 0.002),
            Self::Mixed => ((-0.001, 0.001), 0.0045),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Sideways => "sideways",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketRegime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bullish" => Ok(Self::Bullish),
            "bearish" => Ok(Self::Bearish),
            "sideways" => Ok(Self::Sideways),
            "mixed" => Ok(Self::Mixed),
            other => Err(format!(
                "unknown market regime '{other}' (expected bullish, bearish, sideways or mixed)"
            )),
        }
    }
}

/// Parameters of one synthetic snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub pair: String,
    pub regime: MarketRegime,
    pub seed: u64,
    /// Distinguishes successive snapshots of one run.
    pub period: Option<usize>,
    pub candles: usize,
}

impl SyntheticSpec {
    pub fn new(pair: impl Into<String>, regime: MarketRegime, seed: u64) -> Self {
        Self {
            pair: pair.into(),
            regime,
            seed,
            period: None,
            candles: DEFAULT_CANDLES,
        }
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_candles(mut self, candles: usize) -> Self {
        self.candles = candles;
        self
    }

    fn rng(&self) -> StdRng {
        let key = match self.period {
            Some(p) => format!("{}:{}:{}", self.pair, self.seed, p),
            None => format!("{}:{}", self.pair, self.seed),
        };
        let seed: [u8; 32] = *blake3::hash(key.as_bytes()).as_bytes();
        StdRng::from_seed(seed)
    }
}

/// Generates the candle history for `spec`.
pub fn generate_candles(spec: &SyntheticSpec) -> Vec<Ohlcv> {
    let mut rng = spec.rng();
    let ((drift_lo, drift_hi), vol) = spec.regime.shape();
    let drift = rng.gen_range(drift_lo..=drift_hi);
    // Uniform noise on [-a, a] has std a/√3.
    let noise = vol * 3.0_f64.sqrt();
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();

    let mut price = base_price(&spec.pair) * (1.0 + rng.gen_range(-0.005..0.005));
    let mut candles = Vec::with_capacity(spec.candles);
    for i in 0..spec.candles {
        let open = price;
        let close = open * (1.0 + drift + rng.gen_range(-noise..noise));
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..vol / 2.0));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..vol / 2.0));
        candles.push(Ohlcv {
            date: start + Duration::days(i as i64),
            open,
            high,
            low,
            close,
            volume: rng.gen_range(100_000.0..1_000_000.0_f64).round(),
        });
        price = close;
    }
    candles
}

/// A validated snapshot priced at the last synthetic close.
pub fn generate_snapshot(spec: &SyntheticSpec) -> Result<MarketSnapshot, SnapshotError> {
    let candles = generate_candles(spec);
    let price = candles.last().map_or(0.0, |c| c.close);
    MarketSnapshot::from_history(spec.pair.clone(), price, candles)
}
