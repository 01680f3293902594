// Physics Engine - Impact Energy & Secondary Effects
// Normalizes raw event data and runs the energy -> effects pipeline

use serde::{Deserialize, Deserializer, Serialize};
use std::f64::consts::PI;

use crate::classifier::ImpactSiteClassifier;
use crate::config::EngineConfig;

// =============================================================================
// PHYSICAL CONSTANTS (SI Units)
// =============================================================================

/// Mean rocky-body density (kg/m³)
pub const DENSITY_KG_M3: f64 = 3000.0;

/// 1 ton TNT (J)
pub const TNT_EQUIVALENT_JOULE: f64 = 4.184e9;

/// 1 megaton TNT (J)
pub const JOULES_PER_MEGATON: f64 = TNT_EQUIVALENT_JOULE * 1e6;

/// erg per joule
pub const ERGS_PER_JOULE: f64 = 1e7;

/// Crater scaling coefficient for water impacts (m)
pub const CRATER_COEFF_OCEANIC: f64 = 500.0;

/// Crater scaling coefficient for land impacts (m)
pub const CRATER_COEFF_TERRESTRIAL: f64 = 800.0;

/// Crater scaling exponent: D ∝ E^(1/3.4)
pub const CRATER_EXPONENT: f64 = 1.0 / 3.4;

/// Tsunami base radius per Mt^0.25 (km)
pub const TSUNAMI_BASE_KM: f64 = 50.0;

/// Depth at which the tsunami depth factor is 1 (m)
pub const TSUNAMI_REFERENCE_DEPTH_M: f64 = 4000.0;

/// Floor applied to the seismic magnitude estimate
pub const MIN_SEISMIC_MAGNITUDE: f64 = 0.0;

/// Fallbacks for missing feed data
pub const DEFAULT_DIAMETER_M: f64 = 100.0;
pub const DEFAULT_VELOCITY_KM_S: f64 = 20.0;

// =============================================================================
// IMPACT EVENT (raw feed record)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactPoint {
    pub lat: f64,
    pub lon: f64,
}

impl ImpactPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A body as delivered by the data source. Numeric fields are optional and
/// lenient: absent, null or non-numeric values become `None` and are
/// resolved by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    /// meters
    #[serde(default, deserialize_with = "lenient_f64")]
    pub diameter: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub velocity_km_s: Option<f64>,
    #[serde(default)]
    pub impact_point_2d: Option<ImpactPoint>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub miss_distance_km: Option<f64>,
}

impl ImpactEvent {
    pub fn new(diameter_m: f64, velocity_km_s: f64) -> Self {
        Self {
            diameter: finite(diameter_m),
            velocity_km_s: finite(velocity_km_s),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_impact_point(mut self, lat: f64, lon: f64) -> Self {
        self.impact_point_2d = Some(ImpactPoint::new(lat, lon));
        self
    }
}

pub(crate) fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LenientNumber {
    Number(f64),
    Text(String),
    #[allow(dead_code)]
    Other(serde::de::IgnoredAny),
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<LenientNumber>::deserialize(deserializer)?;
    Ok(match raw {
        Some(LenientNumber::Number(v)) => finite(v),
        Some(LenientNumber::Text(s)) => parse_leading_f64(&s),
        Some(LenientNumber::Other(_)) | None => None,
    })
}

/// Parse the longest numeric prefix of `s` ("123.4 m" -> 123.4).
pub fn parse_leading_f64(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().and_then(finite)
}

// =============================================================================
// UNIT & DEFAULTING LAYER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedParams {
    pub diameter_m: f64,
    pub velocity_km_s: f64,
    pub velocity_ms: f64,
    pub latitude: f64,
    pub longitude: f64,
}

/// Resolve a raw event into physical quantities. Never fails.
pub fn normalize(event: &ImpactEvent) -> NormalizedParams {
    let diameter_m = event
        .diameter
        .and_then(finite)
        .unwrap_or(DEFAULT_DIAMETER_M)
        .max(0.0);
    let velocity_km_s = event
        .velocity_km_s
        .and_then(finite)
        .unwrap_or(DEFAULT_VELOCITY_KM_S)
        .max(0.0);
    let (latitude, longitude) = event
        .impact_point_2d
        .map(|p| {
            (
                finite(p.lat).unwrap_or(0.0).clamp(-90.0, 90.0),
                finite(p.lon).unwrap_or(0.0).clamp(-180.0, 180.0),
            )
        })
        .unwrap_or((0.0, 0.0));

    NormalizedParams {
        diameter_m,
        velocity_km_s,
        velocity_ms: saturate(velocity_km_s * 1000.0),
        latitude,
        longitude,
    }
}

/// Map overflow to f64::MAX and NaN to 0 so every output stays finite.
pub fn saturate(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-f64::MAX, f64::MAX)
    }
}

// =============================================================================
// ENERGY CALCULATOR
// =============================================================================

/// Mass of a sphere of diameter `diameter_m` at [`DENSITY_KG_M3`].
pub fn calculate_mass(diameter_m: f64) -> f64 {
    let radius = diameter_m.max(0.0) / 2.0;
    let volume = (4.0 / 3.0) * PI * radius.powi(3);
    saturate(volume * DENSITY_KG_M3)
}

pub fn calculate_kinetic_energy(mass_kg: f64, velocity_ms: f64) -> f64 {
    saturate(0.5 * mass_kg.max(0.0) * velocity_ms.powi(2))
}

pub fn energy_to_megatons(energy_joules: f64) -> f64 {
    saturate(energy_joules / JOULES_PER_MEGATON)
}

// =============================================================================
// SECONDARY EFFECTS ESTIMATOR
// =============================================================================

/// Crater diameter (m). Water cushions the impact, hence the smaller
/// coefficient for oceanic sites.
pub fn estimate_crater_diameter(energy_joules: f64, is_oceanic: bool) -> f64 {
    let megatons = energy_to_megatons(energy_joules.max(0.0));
    let k = if is_oceanic {
        CRATER_COEFF_OCEANIC
    } else {
        CRATER_COEFF_TERRESTRIAL
    };
    saturate(megatons.powf(CRATER_EXPONENT) * k)
}

/// Richter-like proxy: M = (log10(E_ergs) - 4.8) / 1.5, floored at
/// [`MIN_SEISMIC_MAGNITUDE`]. Non-positive energy yields the floor.
pub fn estimate_seismic_magnitude(energy_joules: f64) -> f64 {
    if energy_joules.is_nan() || energy_joules <= 0.0 {
        return MIN_SEISMIC_MAGNITUDE;
    }
    let energy_ergs = saturate(energy_joules * ERGS_PER_JOULE);
    let magnitude = (energy_ergs.log10() - 4.8) / 1.5;
    if magnitude.is_finite() {
        magnitude.max(MIN_SEISMIC_MAGNITUDE)
    } else {
        MIN_SEISMIC_MAGNITUDE
    }
}

/// Tsunami radius (km) for an oceanic impact at water depth `depth_m`.
pub fn estimate_tsunami_radius(energy_joules: f64, depth_m: f64) -> f64 {
    let megatons = energy_to_megatons(energy_joules.max(0.0));
    let base_radius = megatons.powf(0.25) * TSUNAMI_BASE_KM;
    let depth_factor = (depth_m.max(0.0) / TSUNAMI_REFERENCE_DEPTH_M).sqrt();
    saturate(base_radius * depth_factor)
}

// =============================================================================
// PHYSICS RESULT
// =============================================================================

/// Full set of derived quantities for one event. Always produced whole.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicsResult {
    pub mass_kg: f64,
    pub mass_tons: f64,
    pub energy_joules: f64,
    pub energy_megatons: f64,
    pub crater_diameter_m: f64,
    pub seismic_magnitude: f64,
    pub is_oceanic: bool,
    /// 0 for terrestrial impacts
    pub tsunami_radius_km: f64,
    pub velocity_ms: f64,
}

/// Run the whole pipeline for one event, classifying the impact site with
/// `classifier`.
pub fn compute_impact_physics(
    event: &ImpactEvent,
    classifier: &mut dyn ImpactSiteClassifier,
    config: &EngineConfig,
) -> PhysicsResult {
    let params = normalize(event);
    let is_oceanic = classifier.classify(params.latitude, params.longitude);
    compute_with_site(&params, is_oceanic, config.ocean_depth_m)
}

/// Same as [`compute_impact_physics`] with the site classification already
/// known, e.g. after a deferred lookup resolved.
pub fn compute_impact_physics_with_site(
    event: &ImpactEvent,
    is_oceanic: bool,
    config: &EngineConfig,
) -> PhysicsResult {
    compute_with_site(&normalize(event), is_oceanic, config.ocean_depth_m)
}

fn compute_with_site(params: &NormalizedParams, is_oceanic: bool, depth_m: f64) -> PhysicsResult {
    let mass_kg = calculate_mass(params.diameter_m);
    let energy_joules = calculate_kinetic_energy(mass_kg, params.velocity_ms);
    let result = PhysicsResult {
        mass_kg,
        mass_tons: mass_kg / 1000.0,
        energy_joules,
        energy_megatons: energy_to_megatons(energy_joules),
        crater_diameter_m: estimate_crater_diameter(energy_joules, is_oceanic),
        seismic_magnitude: estimate_seismic_magnitude(energy_joules),
        is_oceanic,
        tsunami_radius_km: if is_oceanic {
            estimate_tsunami_radius(energy_joules, depth_m)
        } else {
            0.0
        },
        velocity_ms: params.velocity_ms,
    };

    tracing::debug!(
        diameter_m = params.diameter_m,
        velocity_ms = params.velocity_ms,
        megatons = result.energy_megatons,
        is_oceanic,
        "impact physics computed"
    );
    result
}

// =============================================================================
// TESTS
// =============================================================================
