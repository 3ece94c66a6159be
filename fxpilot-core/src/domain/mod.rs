//! Domain types for the decision engine.

pub mod candle;
pub mod portfolio;
pub mod profile;
pub mod snapshot;
pub mod trade;

pub use candle::{CandleError, Ohlcv};
pub use portfolio::{Portfolio, PortfolioError};
pub use profile::{ProfileError, ProfileParams, TraderProfile, VolatilityTolerance};
pub use snapshot::{Indicators, MarketSnapshot, SnapshotError, MIN_HISTORY};
pub use trade::{TradeAction, TradeRecommendation};
