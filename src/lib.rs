// CosmoRisk - Impact Physics & Deflection Engine
// Library entry point: module wiring, re-exports and logging setup

pub mod catalog;
pub mod classifier;
pub mod config;
pub mod deflection;
pub mod error;
pub mod feed;
pub mod physics_engine;
pub mod risk;
pub mod state_manager;

pub use catalog::{CatalogMode, EventCatalog};
pub use classifier::{
    Classification, FixedClassifier, ImpactSiteClassifier, LatitudeBandClassifier, OceanMask,
};
pub use config::EngineConfig;
pub use deflection::{apply_deflection, apply_deflection_at_angle, DeflectionOutcome, SafetyPolicy};
pub use error::{ImpactError, Result};
pub use physics_engine::{
    compute_impact_physics, compute_impact_physics_with_site, normalize, ImpactEvent, ImpactPoint,
    NormalizedParams, PhysicsResult,
};
pub use risk::{MissDistanceRisk, RiskAssessment, RiskLevel};
pub use state_manager::{AppState, ImpactZone, ResultSink, SimulationSnapshot, SimulationState, SimulationUpdate};

/// Install a global `tracing` subscriber. Honors `RUST_LOG` (default
/// `info`) and `LOG_FORMAT=json`. Safe to call more than once.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    let installed = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
