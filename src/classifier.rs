// Impact-Site Classifier
// Decides oceanic vs terrestrial impact. Pluggable so a real land/ocean
// mask can replace the latitude-band approximation.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::error::{ImpactError, Result};

/// Latitude band (degrees) inside which an impact may be oceanic.
pub const OCEAN_BAND_LATITUDE_DEG: f64 = 60.0;

/// Uniform draws above this are oceanic, i.e. 70% inside the band.
pub const OCEAN_DRAW_THRESHOLD: f64 = 0.3;

/// Outcome of a possibly out-of-process site lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Ready(bool),
    /// Answer not yet available; resolve later and feed it back through
    /// `compute_impact_physics_with_site`.
    Pending,
}

impl Classification {
    pub fn resolve_or(self, fallback: bool) -> bool {
        match self {
            Classification::Ready(is_oceanic) => is_oceanic,
            Classification::Pending => fallback,
        }
    }
}

pub trait ImpactSiteClassifier {
    /// `true` when the impact point lies in open water.
    fn classify(&mut self, latitude: f64, longitude: f64) -> bool;

    /// Non-blocking variant. Synchronous classifiers answer immediately.
    fn classify_deferred(&mut self, latitude: f64, longitude: f64) -> Classification {
        Classification::Ready(self.classify(latitude, longitude))
    }
}

// =============================================================================
// LATITUDE BAND (probabilistic)
// =============================================================================

/// |lat| < 60° is oceanic with 70% likelihood, anything else terrestrial.
/// Randomness comes from an owned, seedable generator.
#[derive(Debug, Clone)]
pub struct LatitudeBandClassifier<R: Rng = Pcg32> {
    rng: R,
}

impl LatitudeBandClassifier<Pcg32> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Pcg32::from_entropy(),
        }
    }
}

impl<R: Rng> LatitudeBandClassifier<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ImpactSiteClassifier for LatitudeBandClassifier<R> {
    fn classify(&mut self, latitude: f64, _longitude: f64) -> bool {
        // Only draw inside the band so polar impacts don't advance the stream.
        latitude.abs() < OCEAN_BAND_LATITUDE_DEG
            && self.rng.gen::<f64>() > OCEAN_DRAW_THRESHOLD
    }
}

// =============================================================================
// FIXED
// =============================================================================

/// Always answers the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClassifier(pub bool);

impl ImpactSiteClassifier for FixedClassifier {
    fn classify(&mut self, _latitude: f64, _longitude: f64) -> bool {
        self.0
    }
}

// =============================================================================
// OCEAN MASK (deterministic grid lookup)
// =============================================================================

/// Equirectangular land/ocean grid. Row 0 starts at +90° latitude, column 0
/// at -180° longitude. `true` cells are water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOceanMask")]
pub struct OceanMask {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

#[derive(Deserialize)]
struct RawOceanMask {
    rows: usize,
    cols: usize,
    cells: Vec<bool>,
}

impl TryFrom<RawOceanMask> for OceanMask {
    type Error = ImpactError;

    fn try_from(raw: RawOceanMask) -> Result<Self> {
        Self::new(raw.rows, raw.cols, raw.cells)
    }
}

/// Cell count for a `rows x cols` grid; empty or overflowing shapes fail.
fn grid_len(rows: usize, cols: usize, actual: usize) -> Result<usize> {
    match rows.checked_mul(cols) {
        Some(expected) if expected > 0 => Ok(expected),
        Some(expected) => Err(ImpactError::MaskShape { expected, actual }),
        None => Err(ImpactError::MaskShape {
            expected: usize::MAX,
            actual,
        }),
    }
}

impl OceanMask {
    pub fn new(rows: usize, cols: usize, cells: Vec<bool>) -> Result<Self> {
        let expected = grid_len(rows, cols, cells.len())?;
        if cells.len() != expected {
            return Err(ImpactError::MaskShape {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { rows, cols, cells })
    }

    /// Sample `is_water(lat, lon)` at every cell center.
    pub fn from_fn<F>(rows: usize, cols: usize, is_water: F) -> Result<Self>
    where
        F: Fn(f64, f64) -> bool,
    {
        let len = grid_len(rows, cols, 0)?;
        let lat_step = 180.0 / rows as f64;
        let lon_step = 360.0 / cols as f64;
        let cells = (0..len)
            .map(|i| {
                let (row, col) = (i / cols, i % cols);
                let lat = 90.0 - (row as f64 + 0.5) * lat_step;
                let lon = -180.0 + (col as f64 + 0.5) * lon_step;
                is_water(lat, lon)
            })
            .collect();
        Self::new(rows, cols, cells)
    }

    /// Parse a mask serialized as `{"rows":..,"cols":..,"cells":[..]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawOceanMask = serde_json::from_str(json)?;
        Self::try_from(raw)
    }

    pub fn is_water(&self, latitude: f64, longitude: f64) -> bool {
        let lat = if latitude.is_finite() { latitude.clamp(-90.0, 90.0) } else { 0.0 };
        let lon = if longitude.is_finite() { longitude.clamp(-180.0, 180.0) } else { 0.0 };
        let row = (((90.0 - lat) / 180.0) * self.rows as f64) as usize;
        let col = (((lon + 180.0) / 360.0) * self.cols as f64) as usize;
        let row = row.min(self.rows - 1);
        let col = col.min(self.cols - 1);
        self.cells[row * self.cols + col]
    }
}

impl ImpactSiteClassifier for OceanMask {
    fn classify(&mut self, latitude: f64, longitude: f64) -> bool {
        self.is_water(latitude, longitude)
    }
}
