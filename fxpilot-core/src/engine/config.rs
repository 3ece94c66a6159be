//! Engine configuration and the engine error type.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureError, DEFAULT_WINDOW};
use crate::search::SearchConfig;

/// Explored states copied into each [`Decision`](super::Decision) by default.
pub const DEFAULT_TRACE_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("feature extraction failed: {0}")]
    Features(#[from] FeatureError),
    #[error("invalid engine config: {0}")]
    Config(String),
}

/// Configuration for a [`DecisionEngine`](super::DecisionEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Candles fed to feature extraction.
    pub feature_window: usize,
    /// Cap on explored states returned with a decision.
    pub trace_limit: usize,
    pub search: SearchConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            feature_window: DEFAULT_WINDOW,
            trace_limit: DEFAULT_TRACE_LIMIT,
            search: SearchConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.feature_window < 2 {
            return Err(EngineError::Config(format!(
                "feature_window must be at least 2, got {}",
                self.feature_window
            )));
        }
        if self.search.beam_width == 0 {
            return Err(EngineError::Config(
                "search.beam_width must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.feature_window, 20);
        assert_eq!(c.trace_limit, 20);
        assert_eq!(c.search.beam_width, 5);
        assert_eq!(c.search.max_depth, 3);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c: EngineConfig =
            serde_json::from_str(r#"{"feature_window": 30, "search": {"max_depth": 1}}"#).unwrap();
        assert_eq!(c.feature_window, 30);
        assert_eq!(c.trace_limit, 20);
        assert_eq!(c.search.beam_width, 5);
        assert_eq!(c.search.max_depth, 1);
    }

    #[test]
    fn rejects_tiny_window_and_empty_beam() {
        let mut c = EngineConfig {
            feature_window: 1,
            ..EngineConfig::default()
        };
        assert!(matches!(c.validate(), Err(EngineError::Config(_))));
        c.feature_window = 2;
        c.search.beam_width = 0;
        assert!(c.validate().is_err());
    }
}
