//! Request fingerprinting.
//!
//! A `RequestId` is the BLAKE3 hash of the canonical JSON encoding of
//! everything a decision depends on: snapshot, profile, portfolio and
//! engine configuration. The engine is deterministic, so two requests with
//! the same id always produce the same decision.

use std::fmt;

use fxpilot_core::domain::{MarketSnapshot, Portfolio, TraderProfile};
use fxpilot_core::engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Hex-encoded BLAKE3 digest identifying one decision request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines and tables.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize)]
struct Canonical<'a> {
    snapshot: &'a MarketSnapshot,
    profile: TraderProfile,
    portfolio: &'a Portfolio,
    engine: &'a EngineConfig,
}

/// Fingerprint of a decision request.
pub fn request_id(
    snapshot: &MarketSnapshot,
    profile: TraderProfile,
    portfolio: &Portfolio,
    engine: &EngineConfig,
) -> Result<RequestId, serde_json::Error> {
    let json = serde_json::to_vec(&Canonical {
        snapshot,
        profile,
        portfolio,
        engine,
    })?;
    Ok(RequestId::from_bytes(&json))
}
