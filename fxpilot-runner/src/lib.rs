//! fxpilot runner: orchestration around the decision engine.
//!
//! This crate builds on `fxpilot-core` to provide:
//! - TOML configuration for the engine, batches and evaluations
//! - Snapshot loading from JSON and OHLCV CSV
//! - Seeded synthetic market snapshots
//! - Single and batch (rayon) decision runs with request fingerprints
//! - Serializable decision reports
//! - Profile evaluation with performance metrics

pub mod batch;
pub mod config;
pub mod evaluation;
pub mod fingerprint;
pub mod loader;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod synthetic;

pub use batch::{BatchGrid, BatchRunner};
pub use config::{BatchConfig, ConfigError, EvaluationConfig, RunnerConfig};
pub use evaluation::{EvaluationReport, ProfileEvaluator, ProfileRun};
pub use fingerprint::{request_id, RequestId};
pub use loader::{load_csv, load_rates, load_snapshot_json, snapshot_as_of, LoadError, RateTable};
pub use metrics::{ProfileMetrics, TradeOutcome};
pub use report::DecisionReport;
pub use runner::{run_single, DecisionRequest, RunError, RunOutcome};
pub use synthetic::{base_price, generate_snapshot, MarketRegime, SyntheticSpec, KNOWN_PAIRS};
