// Deflection Simulator
// Applies a delta-v to the body's speed. The success verdict is a separate
// policy owned by the simulation controller.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_SAFE_DELTA_V_MS;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeflectionOutcome {
    pub new_velocity_km_s: f64,
    pub delta_v_applied_km_s: f64,
    /// Carried through; trajectory bending is not modelled.
    pub deflection_angle_deg: f64,
    /// `None` until a [`SafetyPolicy`] has judged the outcome.
    pub is_safe: Option<bool>,
}

/// Head-on deflection (angle 0).
pub fn apply_deflection(original_velocity_km_s: f64, delta_v_ms: f64) -> DeflectionOutcome {
    apply_deflection_at_angle(original_velocity_km_s, delta_v_ms, 0.0)
}

/// `delta_v_ms` is converted to km/s and added to the original speed.
pub fn apply_deflection_at_angle(
    original_velocity_km_s: f64,
    delta_v_ms: f64,
    angle_deg: f64,
) -> DeflectionOutcome {
    let delta_v_km_s = delta_v_ms / 1000.0;
    // -0.0 + 0.0 is +0.0; keep the input bit-for-bit.
    let new_velocity_km_s = if delta_v_ms == 0.0 {
        original_velocity_km_s
    } else {
        original_velocity_km_s + delta_v_km_s
    };

    DeflectionOutcome {
        new_velocity_km_s,
        delta_v_applied_km_s: delta_v_km_s,
        deflection_angle_deg: angle_deg,
        is_safe: None,
    }
}

/// Threshold rule for "deflection succeeded".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyPolicy {
    pub min_delta_v_ms: f64,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            min_delta_v_ms: DEFAULT_SAFE_DELTA_V_MS,
        }
    }
}

impl SafetyPolicy {
    pub fn new(min_delta_v_ms: f64) -> Self {
        Self { min_delta_v_ms }
    }

    pub fn is_safe(&self, delta_v_ms: f64) -> bool {
        delta_v_ms > self.min_delta_v_ms
    }

    /// Judge against the raw m/s input rather than the converted km/s value.
    pub fn assess(&self, delta_v_ms: f64, outcome: DeflectionOutcome) -> DeflectionOutcome {
        DeflectionOutcome {
            is_safe: Some(self.is_safe(delta_v_ms)),
            ..outcome
        }
    }
}
