// NASA NeoWs Feed Adapter
// Turns already-fetched NeoWs payloads into impact events. No network here.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::error::{ImpactError, Result};
use crate::physics_engine::{ImpactEvent, ImpactPoint};

pub const BROWSE_MIN_YEAR: i32 = 1900;
pub const BROWSE_MAX_YEAR: i32 = 2030;

/// Pseudo impact points are squeezed by this factor away from the poles.
const COORD_SCALE: f64 = 0.8;

// =============================================================================
// API RESPONSE TYPES
// =============================================================================

/// `/feed` payload: objects grouped by approach date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeoWsResponse {
    pub element_count: Option<i32>,
    #[serde(default)]
    pub near_earth_objects: BTreeMap<String, Vec<NeoObject>>,
}

/// `/neo/browse` payload: one flat page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowseResponse {
    pub page: Option<PageInfo>,
    #[serde(default)]
    pub near_earth_objects: Vec<NeoObject>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub size: i32,
    pub total_elements: i32,
    pub total_pages: i32,
    pub number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeoObject {
    pub id: String,
    pub name: Option<String>,
    pub estimated_diameter: Option<EstimatedDiameter>,
    pub is_potentially_hazardous_asteroid: Option<bool>,
    #[serde(default)]
    pub close_approach_data: Vec<CloseApproachData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatedDiameter {
    pub meters: Option<DiameterRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiameterRange {
    #[serde(default)]
    pub estimated_diameter_min: f64,
    #[serde(default)]
    pub estimated_diameter_max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseApproachData {
    pub close_approach_date: Option<String>,
    pub relative_velocity: Option<RelativeVelocity>,
    pub miss_distance: Option<MissDistance>,
    pub orbiting_body: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeVelocity {
    pub kilometers_per_second: Option<String>,
    pub kilometers_per_hour: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissDistance {
    pub kilometers: Option<String>,
}

// =============================================================================
// CONVERSION
// =============================================================================

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn parse_positive(raw: Option<&String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

impl NeoObject {
    /// Mean of the estimated meter range, or `None` when NeoWs has no size.
    pub fn diameter_m(&self) -> Option<f64> {
        let range = self.estimated_diameter.as_ref()?.meters.as_ref()?;
        let mean = (range.estimated_diameter_min + range.estimated_diameter_max) / 2.0;
        (mean.is_finite() && mean > 0.0).then(|| round_to(mean, 1))
    }

    fn to_event(&self, date: Option<String>, approach: Option<&CloseApproachData>, coord_seed: &str) -> ImpactEvent {
        let velocity_km_s = approach
            .and_then(|ca| ca.relative_velocity.as_ref())
            .and_then(|v| parse_positive(v.kilometers_per_hour.as_ref()))
            .map(|kph| round_to(kph / 3600.0, 2));
        let miss_distance_km = approach
            .and_then(|ca| ca.miss_distance.as_ref())
            .and_then(|m| parse_positive(m.kilometers.as_ref()))
            .map(|km| km.round());

        ImpactEvent {
            id: Some(self.id.clone()),
            name: Some(self.name.clone().unwrap_or_else(|| "Unknown".to_string())),
            date,
            diameter: self.diameter_m(),
            velocity_km_s,
            impact_point_2d: Some(pseudo_impact_point(coord_seed)),
            miss_distance_km,
        }
    }
}

impl NeoWsResponse {
    /// One event per object, in approach-date order.
    pub fn into_events(self) -> Vec<ImpactEvent> {
        let mut events = Vec::new();
        for (date, neos) in &self.near_earth_objects {
            for neo in neos {
                events.push(neo.to_event(Some(date.clone()), neo.close_approach_data.first(), &neo.id));
            }
        }
        tracing::info!(count = events.len(), "feed payload converted");
        events
    }
}

impl BrowseResponse {
    /// Objects with a close approach in `year`, sorted by that approach date.
    pub fn events_for_year(self, year: i32) -> Result<Vec<ImpactEvent>> {
        check_browse_year(year)?;

        let coord_suffix = year.to_string();
        let mut dated: Vec<(NaiveDate, ImpactEvent)> = Vec::new();
        for neo in &self.near_earth_objects {
            let hit = neo.close_approach_data.iter().find_map(|ca| {
                let raw = ca.close_approach_date.as_deref()?;
                match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                    Ok(date) if date.year() == year => Some((date, ca)),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::warn!(neo = %neo.id, date = raw, %err, "skipping unparsable approach date");
                        None
                    }
                }
            });
            if let Some((date, approach)) = hit {
                let seed = format!("{}{}", neo.id, coord_suffix);
                let event = neo.to_event(Some(date.format("%Y-%m-%d").to_string()), Some(approach), &seed);
                dated.push((date, event));
            }
        }

        dated.sort_by_key(|(date, _)| *date);
        tracing::info!(year, count = dated.len(), "browse payload filtered");
        Ok(dated.into_iter().map(|(_, event)| event).collect())
    }
}

pub fn check_browse_year(year: i32) -> Result<()> {
    if (BROWSE_MIN_YEAR..=BROWSE_MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ImpactError::YearOutOfRange {
            year,
            min: BROWSE_MIN_YEAR,
            max: BROWSE_MAX_YEAR,
        })
    }
}

pub fn parse_feed(json: &str) -> Result<Vec<ImpactEvent>> {
    let response: NeoWsResponse = serde_json::from_str(json)?;
    Ok(response.into_events())
}

pub fn parse_browse(json: &str, year: i32) -> Result<Vec<ImpactEvent>> {
    let response: BrowseResponse = serde_json::from_str(json)?;
    response.events_for_year(year)
}

// =============================================================================
// PSEUDO IMPACT POINT
// =============================================================================

/// Stable stand-in coordinates derived from SHA-256 of `seed`. The digest is
/// read as a big-endian 256-bit integer `h`:
/// lat = (h mod 180 - 90) * 0.8, lon = (floor(h / 180) mod 360 - 180) * 0.8.
pub fn pseudo_impact_point(seed: &str) -> ImpactPoint {
    let digest = Sha256::digest(seed.as_bytes());

    // Long division by 180, folding quotient digits into `mod 360` as we go.
    let mut rem: u32 = 0;
    let mut quotient_mod_360: u32 = 0;
    for &byte in digest.iter() {
        let cur = rem * 256 + byte as u32;
        let q = cur / 180;
        rem = cur % 180;
        quotient_mod_360 = (quotient_mod_360 * 256 + q) % 360;
    }

    let lat = (rem as f64 - 90.0) * COORD_SCALE;
    let lon = (quotient_mod_360 as f64 - 180.0) * COORD_SCALE;
    ImpactPoint::new(round_to(lat, 3), round_to(lon, 3))
}
