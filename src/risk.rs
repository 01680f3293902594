// Risk classification for catalogued events
// Coarse, numeric-only ratings; wording is left to the display layer.

use serde::{Deserialize, Serialize};

use crate::physics_engine::ImpactEvent;

pub const HIGH_RISK_MISS_KM: f64 = 50_000.0;
pub const MODERATE_RISK_MISS_KM: f64 = 500_000.0;

/// Size/speed reference point: a 1 km body at 50 km/s scores 100%.
pub const RISK_REFERENCE_DIAMETER_M: f64 = 1000.0;
pub const RISK_REFERENCE_VELOCITY_KM_S: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissDistanceRisk {
    High,
    Moderate,
    Low,
}

impl MissDistanceRisk {
    pub fn from_miss_km(miss_km: f64) -> Self {
        if miss_km <= HIGH_RISK_MISS_KM {
            MissDistanceRisk::High
        } else if miss_km <= MODERATE_RISK_MISS_KM {
            MissDistanceRisk::Moderate
        } else {
            MissDistanceRisk::Low
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0..=100
    pub percent: f64,
    pub level: RiskLevel,
}

impl RiskAssessment {
    /// Missing or non-finite size/speed count as zero here, unlike the
    /// physics pipeline which substitutes defaults.
    pub fn for_event(event: &ImpactEvent) -> Self {
        let diameter = event.diameter.filter(|d| d.is_finite()).unwrap_or(0.0);
        let velocity = event.velocity_km_s.filter(|v| v.is_finite()).unwrap_or(0.0);
        Self::from_size_and_speed(diameter, velocity)
    }

    pub fn from_size_and_speed(diameter_m: f64, velocity_km_s: f64) -> Self {
        let raw = (diameter_m / RISK_REFERENCE_DIAMETER_M)
            * (velocity_km_s / RISK_REFERENCE_VELOCITY_KM_S)
            * 100.0;
        let percent = if raw.is_nan() { 0.0 } else { raw.clamp(0.0, 100.0) };
        let level = if percent > 70.0 {
            RiskLevel::High
        } else if percent > 30.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        Self { percent, level }
    }
}
