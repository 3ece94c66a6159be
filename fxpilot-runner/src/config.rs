//! Runner configuration loaded from TOML.
//!
//! Every section and field is optional; missing values take their defaults.
//!
//! ```toml
//! [engine]
//! feature_window = 20
//! trace_limit = 20
//!
//! [engine.search]
//! beam_width = 5
//! max_depth = 3
//!
//! [batch]
//! parallel = true
//!
//! [evaluation]
//! periods = 30
//! capital = 10000.0
//! seed = 42
//! ```

use std::path::Path;

use fxpilot_core::engine::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub engine: EngineConfig,
    pub batch: BatchConfig,
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Fan requests out over the rayon pool.
    pub parallel: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub pair: String,
    pub periods: usize,
    pub capital: f64,
    pub seed: u64,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            pair: "EURUSD".to_string(),
            periods: 30,
            capital: 10_000.0,
            seed: 42,
        }
    }
}

impl RunnerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: RunnerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.evaluation.periods == 0 {
            return Err(ConfigError::Invalid(
                "evaluation.periods must be at least 1".to_string(),
            ));
        }
        if !self.evaluation.capital.is_finite() || self.evaluation.capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "evaluation.capital must be positive, got {}",
                self.evaluation.capital
            )));
        }
        if self.evaluation.pair.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "evaluation.pair must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let c = RunnerConfig::from_toml_str("").unwrap();
        assert_eq!(c, RunnerConfig::default());
        assert!(c.batch.parallel);
        assert_eq!(c.evaluation.periods, 30);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let c = RunnerConfig::from_toml_str(
            r#"
            [engine.search]
            beam_width = 8

            [evaluation]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(c.engine.search.beam_width, 8);
        assert_eq!(c.engine.search.max_depth, 3);
        assert_eq!(c.engine.feature_window, 20);
        assert_eq!(c.evaluation.seed, 7);
        assert_eq!(c.evaluation.capital, 10_000.0);
    }

    #[test]
    fn zero_beam_width_rejected() {
        let err = RunnerConfig::from_toml_str("[engine.search]\nbeam_width = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{err}");
    }

    #[test]
    fn small_window_rejected() {
        let err = RunnerConfig::from_toml_str("[engine]\nfeature_window = 1\n").unwrap_err();
        assert!(err.to_string().contains("feature_window"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = RunnerConfig::from_toml_str("[engine\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn toml_roundtrip() {
        let c = RunnerConfig::default();
        let text = c.to_toml_string().unwrap();
        assert_eq!(RunnerConfig::from_toml_str(&text).unwrap(), c);
    }
}
