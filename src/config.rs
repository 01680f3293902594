// Engine configuration
// Tunables that are policy rather than physics; loaded from the environment.

use serde::{Deserialize, Serialize};

use crate::error::{ImpactError, Result};

pub const ENV_CLASSIFIER_SEED: &str = "IMPACT_CLASSIFIER_SEED";
pub const ENV_OCEAN_DEPTH_M: &str = "IMPACT_OCEAN_DEPTH_M";
pub const ENV_SAFE_DELTA_V_MS: &str = "IMPACT_SAFE_DELTA_V_MS";

/// Seed used by the default latitude-band classifier.
pub const DEFAULT_CLASSIFIER_SEED: u64 = 42;

/// Reference ocean depth for tsunami scaling (m).
pub const DEFAULT_OCEAN_DEPTH_M: f64 = 4000.0;

/// Delta-v above which a deflection counts as successful (m/s).
/// Calibrated placeholder carried over for compatibility.
pub const DEFAULT_SAFE_DELTA_V_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub classifier_seed: u64,
    pub ocean_depth_m: f64,
    pub safe_delta_v_ms: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier_seed: DEFAULT_CLASSIFIER_SEED,
            ocean_depth_m: DEFAULT_OCEAN_DEPTH_M,
            safe_delta_v_ms: DEFAULT_SAFE_DELTA_V_MS,
        }
    }
}

impl EngineConfig {
    /// Read configuration from the process environment, loading `.env` first
    /// when one exists.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is the normal case in production.
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Absent keys keep their
    /// defaults; present but malformed values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CLASSIFIER_SEED) {
            config.classifier_seed = raw.trim().parse().map_err(|_| ImpactError::Config {
                key: ENV_CLASSIFIER_SEED,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(ENV_OCEAN_DEPTH_M) {
            config.ocean_depth_m = parse_non_negative(ENV_OCEAN_DEPTH_M, &raw)?;
        }

        if let Some(raw) = lookup(ENV_SAFE_DELTA_V_MS) {
            config.safe_delta_v_ms = parse_non_negative(ENV_SAFE_DELTA_V_MS, &raw)?;
        }

        tracing::debug!(?config, "engine config loaded");
        Ok(config)
    }
}

fn parse_non_negative(key: &'static str, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
        _ => Err(ImpactError::Config {
            key,
            value: raw.to_string(),
        }),
    }
}
