// State Manager - Original / what-if simulation state
// Owns the selected event pair, recomputes atomically and publishes results

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::catalog::{CatalogMode, EventCatalog};
use crate::classifier::{ImpactSiteClassifier, LatitudeBandClassifier};
use crate::config::EngineConfig;
use crate::deflection::{apply_deflection, DeflectionOutcome, SafetyPolicy};
use crate::physics_engine::{
    compute_impact_physics, finite, normalize, saturate, ImpactEvent, PhysicsResult,
    DEFAULT_VELOCITY_KM_S,
};
use crate::risk::{MissDistanceRisk, RiskAssessment};

// =============================================================================
// PUBLISHED DATA
// =============================================================================

/// The `(lat, lon, result)` triple map overlays are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactZone {
    pub latitude: f64,
    pub longitude: f64,
    pub crater_radius_m: f64,
    /// 0 for terrestrial impacts
    pub tsunami_radius_m: f64,
}

impl ImpactZone {
    pub fn new(latitude: f64, longitude: f64, result: &PhysicsResult) -> Self {
        Self {
            latitude,
            longitude,
            crater_radius_m: result.crater_diameter_m / 2.0,
            tsunami_radius_m: result.tsunami_radius_km * 1000.0,
        }
    }
}

/// Everything a display consumer needs after one committed transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationUpdate {
    pub event: ImpactEvent,
    pub result: PhysicsResult,
    pub deflection: Option<DeflectionOutcome>,
    pub impact_zone: ImpactZone,
}

/// Receives every committed result, after state has been updated.
///
/// Sinks subscribed on a [`SimulationState`] run inside the transition, so
/// under an [`AppState`] they run with the write lock held and must not call
/// back into it. Sinks subscribed on the [`AppState`] run after the lock is
/// released and may read it.
pub trait ResultSink: Send + Sync {
    fn publish(&self, update: &SimulationUpdate);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub original_event: Option<ImpactEvent>,
    pub current_event: Option<ImpactEvent>,
    pub is_deflected: bool,
    pub is_modified: bool,
    pub last_result: Option<PhysicsResult>,
    pub last_deflection: Option<DeflectionOutcome>,
    pub risk: Option<RiskAssessment>,
    pub miss_risk: Option<MissDistanceRisk>,
}

// =============================================================================
// SIMULATION STATE CONTROLLER
// =============================================================================

/// Nominal: `current == original`. Modified: an `apply` has diverged them.
/// Nothing outside this type writes these fields.
pub struct SimulationState {
    original_event: Option<ImpactEvent>,
    current_event: Option<ImpactEvent>,
    is_deflected: bool,
    is_modified: bool,
    last_result: Option<PhysicsResult>,
    last_deflection: Option<DeflectionOutcome>,
    classifier: Box<dyn ImpactSiteClassifier + Send + Sync>,
    safety: SafetyPolicy,
    config: EngineConfig,
    sinks: Vec<Box<dyn ResultSink>>,
}

impl SimulationState {
    /// Uses the latitude-band classifier seeded from `config`.
    pub fn new(config: EngineConfig) -> Self {
        let classifier = LatitudeBandClassifier::seeded(config.classifier_seed);
        Self::with_classifier(config, classifier)
    }

    pub fn with_classifier<C>(config: EngineConfig, classifier: C) -> Self
    where
        C: ImpactSiteClassifier + Send + Sync + 'static,
    {
        Self {
            original_event: None,
            current_event: None,
            is_deflected: false,
            is_modified: false,
            last_result: None,
            last_deflection: None,
            classifier: Box::new(classifier),
            safety: SafetyPolicy::new(config.safe_delta_v_ms),
            config,
            sinks: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, sink: Box<dyn ResultSink>) {
        self.sinks.push(sink);
    }

    pub fn original_event(&self) -> Option<&ImpactEvent> {
        self.original_event.as_ref()
    }

    pub fn current_event(&self) -> Option<&ImpactEvent> {
        self.current_event.as_ref()
    }

    pub fn is_deflected(&self) -> bool {
        self.is_deflected
    }

    pub fn is_modified(&self) -> bool {
        self.is_modified
    }

    pub fn last_result(&self) -> Option<&PhysicsResult> {
        self.last_result.as_ref()
    }

    pub fn last_deflection(&self) -> Option<&DeflectionOutcome> {
        self.last_deflection.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Make `event` both the original and the working copy. Discards any
    /// previous what-if state.
    pub fn select(&mut self, event: ImpactEvent) -> PhysicsResult {
        let result = self.compute(&event);

        tracing::info!(id = ?event.id, name = ?event.name, "event selected");
        self.original_event = Some(event.clone());
        self.current_event = Some(event);
        self.is_deflected = false;
        self.is_modified = false;
        self.last_result = Some(result);
        self.last_deflection = None;

        self.publish();
        result
    }

    /// Replace size and speed of the working copy, optionally deflecting it
    /// by `delta_v_ms`. Returns `None` (and changes nothing) when no event
    /// is selected.
    pub fn apply(&mut self, diameter_m: f64, velocity_km_s: f64, delta_v_ms: f64) -> Option<PhysicsResult> {
        let base = self.current_event.as_ref().or(self.original_event.as_ref())?;

        let mut next = base.clone();
        next.diameter = finite(diameter_m);
        // NaN delta-v means no burn; +inf saturates.
        let delta_v_ms = saturate(delta_v_ms);
        let deflection = if delta_v_ms > 0.0 {
            let base_velocity = finite(velocity_km_s)
                .unwrap_or(DEFAULT_VELOCITY_KM_S)
                .max(0.0);
            let mut outcome = self
                .safety
                .assess(delta_v_ms, apply_deflection(base_velocity, delta_v_ms));
            outcome.new_velocity_km_s = saturate(outcome.new_velocity_km_s);
            next.velocity_km_s = Some(outcome.new_velocity_km_s);
            Some(outcome)
        } else {
            next.velocity_km_s = finite(velocity_km_s);
            None
        };

        // Compute first; nothing below can fail, so the commit is all-or-nothing.
        let result = self.compute(&next);

        tracing::info!(
            id = ?next.id,
            diameter_m,
            velocity_km_s,
            delta_v_ms,
            is_safe = ?deflection.and_then(|d| d.is_safe),
            "what-if applied"
        );
        self.current_event = Some(next);
        self.is_deflected = deflection.is_some();
        self.is_modified = true;
        self.last_result = Some(result);
        self.last_deflection = deflection;

        self.publish();
        Some(result)
    }

    /// Restore the working copy to the selected original. `None` when there
    /// is nothing to undo.
    pub fn reset(&mut self) -> Option<PhysicsResult> {
        if !self.is_modified {
            return None;
        }
        let original = self.original_event.clone()?;
        let result = self.compute(&original);

        tracing::info!(id = ?original.id, "what-if reset");
        self.current_event = Some(original);
        self.is_deflected = false;
        self.is_modified = false;
        self.last_result = Some(result);
        self.last_deflection = None;

        self.publish();
        Some(result)
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            original_event: self.original_event.clone(),
            current_event: self.current_event.clone(),
            is_deflected: self.is_deflected,
            is_modified: self.is_modified,
            last_result: self.last_result,
            last_deflection: self.last_deflection,
            risk: self.current_event.as_ref().map(RiskAssessment::for_event),
            miss_risk: self
                .current_event
                .as_ref()
                .and_then(|e| e.miss_distance_km.and_then(finite))
                .map(MissDistanceRisk::from_miss_km),
        }
    }

    /// Update for the current event/result pair, if any.
    pub fn current_update(&self) -> Option<SimulationUpdate> {
        let event = self.current_event.as_ref()?;
        let result = self.last_result?;
        let params = normalize(event);
        Some(SimulationUpdate {
            event: event.clone(),
            result,
            deflection: self.last_deflection,
            impact_zone: ImpactZone::new(params.latitude, params.longitude, &result),
        })
    }

    fn compute(&mut self, event: &ImpactEvent) -> PhysicsResult {
        compute_impact_physics(event, self.classifier.as_mut(), &self.config)
    }

    fn publish(&self) {
        if self.sinks.is_empty() {
            return;
        }
        if let Some(update) = self.current_update() {
            for sink in &self.sinks {
                sink.publish(&update);
            }
        }
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// =============================================================================
// SHARED STATE (for display consumers on other threads)
// =============================================================================

/// Controller plus the loaded catalog behind locks. Each transition holds
/// the simulation write lock from compute to commit; handle-level sinks are
/// notified once it is released.
#[derive(Clone)]
pub struct AppState {
    pub simulation: Arc<RwLock<SimulationState>>,
    pub catalog: Arc<RwLock<EventCatalog>>,
    sinks: Arc<RwLock<Vec<Box<dyn ResultSink>>>>,
}

impl AppState {
    pub fn new(config: EngineConfig) -> Self {
        Self::from_simulation(SimulationState::new(config))
    }

    pub fn from_simulation(simulation: SimulationState) -> Self {
        Self {
            simulation: Arc::new(RwLock::new(simulation)),
            catalog: Arc::new(RwLock::new(EventCatalog::default())),
            sinks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn subscribe(&self, sink: Box<dyn ResultSink>) {
        self.sinks.write().push(sink);
    }

    pub fn snapshot(&self) -> SimulationSnapshot {
        self.simulation.read().snapshot()
    }

    pub fn select(&self, event: ImpactEvent) -> PhysicsResult {
        let (result, update) = {
            let mut simulation = self.simulation.write();
            let result = simulation.select(event);
            (result, simulation.current_update())
        };
        self.publish(update);
        result
    }

    pub fn apply(&self, diameter_m: f64, velocity_km_s: f64, delta_v_ms: f64) -> Option<PhysicsResult> {
        self.transition(|simulation| simulation.apply(diameter_m, velocity_km_s, delta_v_ms))
    }

    pub fn reset(&self) -> Option<PhysicsResult> {
        self.transition(SimulationState::reset)
    }

    /// New feed load or browse search: replace the catalog and select its
    /// first event.
    pub fn load_catalog(&self, mode: CatalogMode, events: Vec<ImpactEvent>) -> Option<PhysicsResult> {
        let first = self.catalog.write().load(mode, events).cloned()?;
        Some(self.select(first))
    }

    /// Feed "next meteor".
    pub fn advance(&self) -> Option<PhysicsResult> {
        let event = self.catalog.write().advance().cloned()?;
        Some(self.select(event))
    }

    pub fn next(&self) -> Option<PhysicsResult> {
        let event = self.catalog.write().next().cloned()?;
        Some(self.select(event))
    }

    pub fn previous(&self) -> Option<PhysicsResult> {
        let event = self.catalog.write().previous().cloned()?;
        Some(self.select(event))
    }

    fn transition<F>(&self, op: F) -> Option<PhysicsResult>
    where
        F: FnOnce(&mut SimulationState) -> Option<PhysicsResult>,
    {
        let (result, update) = {
            let mut simulation = self.simulation.write();
            let result = op(&mut *simulation);
            let update = result.and_then(|_| simulation.current_update());
            (result, update)
        };
        self.publish(update);
        result
    }

    fn publish(&self, update: Option<SimulationUpdate>) {
        let Some(update) = update else { return };
        for sink in self.sinks.read().iter() {
            sink.publish(&update);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FixedClassifier;
    use parking_lot::Mutex;

    fn terrestrial() -> SimulationState {
        SimulationState::with_classifier(EngineConfig::default(), FixedClassifier(false))
    }

    fn event_x() -> ImpactEvent {
        ImpactEvent::new(150.0, 20.0)
            .with_id("x")
            .with_name("Event X")
            .with_impact_point(12.0, -30.0)
    }

    fn event_y() -> ImpactEvent {
        ImpactEvent::new(320.0, 17.5).with_id("y").with_impact_point(-5.0, 100.0)
    }

    struct Recorder(Arc<Mutex<Vec<SimulationUpdate>>>);

    impl ResultSink for Recorder {
        fn publish(&self, update: &SimulationUpdate) {
            self.0.lock().push(update.clone());
        }
    }

    #[test]
    fn test_apply_and_reset_without_selection_are_noops() {
        let mut state = terrestrial();
        assert!(state.apply(200.0, 30.0, 100.0).is_none());
        assert!(state.reset().is_none());
        assert!(state.current_event().is_none());
        assert!(state.last_result().is_none());
        assert!(!state.is_deflected());
    }

    #[test]
    fn test_select_sets_nominal_state() {
        let mut state = terrestrial();
        let result = state.select(event_x());
        assert_eq!(state.original_event(), Some(&event_x()));
        assert_eq!(state.current_event(), Some(&event_x()));
        assert!(!state.is_deflected());
        assert!(!state.is_modified());
        assert_eq!(state.last_result(), Some(&result));
    }

    #[test]
    fn test_reset_without_apply_is_noop() {
        let mut state = terrestrial();
        let selected = state.select(event_x());
        assert!(state.reset().is_none());
        assert_eq!(state.last_result(), Some(&selected));
    }

    #[test]
    fn test_apply_with_deflection() {
        let mut state = terrestrial();
        state.select(event_x());
        let result = state.apply(150.0, 20.0, 100.0).unwrap();

        assert!(state.is_deflected());
        assert!(state.is_modified());
        let current = state.current_event().unwrap();
        assert!((current.velocity_km_s.unwrap() - 20.1).abs() < 1e-12);
        assert_eq!(current.diameter, Some(150.0));
        assert_eq!(current.id.as_deref(), Some("x"));

        let deflection = state.last_deflection().unwrap();
        assert_eq!(deflection.is_safe, Some(true));
        assert!((result.velocity_ms - 20_100.0).abs() < 1e-6);

        // Original untouched.
        assert_eq!(state.original_event(), Some(&event_x()));
    }

    #[test]
    fn test_apply_without_deflection_sets_velocity_directly() {
        let mut state = terrestrial();
        state.select(event_x());
        state.apply(150.0, 20.0, 100.0);
        state.apply(90.0, 11.0, 0.0).unwrap();
        assert!(!state.is_deflected());
        assert!(state.last_deflection().is_none());
        assert_eq!(state.current_event().unwrap().velocity_km_s, Some(11.0));
        assert_eq!(state.current_event().unwrap().diameter, Some(90.0));
    }

    #[test]
    fn test_small_delta_v_is_not_safe() {
        let mut state = terrestrial();
        state.select(event_x());
        state.apply(150.0, 20.0, 30.0);
        assert!(state.is_deflected());
        assert_eq!(state.last_deflection().unwrap().is_safe, Some(false));
    }

    #[test]
    fn test_result_consistent_with_current_event() {
        let mut state = terrestrial();
        state.select(event_x());
        let result = state.apply(420.0, 33.0, 250.0).unwrap();
        let recomputed = compute_impact_physics(
            state.current_event().unwrap(),
            &mut FixedClassifier(false),
            state.config(),
        );
        assert_eq!(result, recomputed);
        assert_eq!(state.last_result(), Some(&recomputed));
    }

    #[test]
    fn test_reset_restores_original_exactly() {
        let mut state = terrestrial();
        let selected = state.select(event_x());
        state.apply(999.0, 70.0, 500.0);
        state.apply(12.0, 5.0, 0.0);

        let reset = state.reset().unwrap();
        assert_eq!(state.current_event(), Some(&event_x()));
        assert_eq!(state.current_event(), state.original_event());
        assert!(!state.is_deflected());
        assert!(!state.is_modified());
        assert!(state.last_deflection().is_none());
        assert_eq!(reset, selected);
    }

    #[test]
    fn test_select_discards_previous_modification() {
        let mut state = terrestrial();
        state.select(event_x());
        state.apply(10.0, 10.0, 80.0);
        state.select(event_y());

        assert_eq!(state.original_event(), Some(&event_y()));
        assert_eq!(state.current_event(), Some(&event_y()));
        assert!(!state.is_deflected());
        assert!(state.reset().is_none());
    }

    #[test]
    fn test_non_finite_apply_inputs_fall_back_to_defaults() {
        let mut state = terrestrial();
        state.select(event_x());
        let result = state.apply(f64::NAN, f64::INFINITY, 0.0).unwrap();
        let current = state.current_event().unwrap();
        assert_eq!(current.diameter, None);
        assert_eq!(current.velocity_km_s, None);
        assert_eq!(result.velocity_ms, 20_000.0);
        assert!(result.energy_joules.is_finite());
    }

    #[test]
    fn test_deflecting_unknown_velocity_starts_from_default() {
        let mut state = terrestrial();
        state.select(event_x());
        let result = state.apply(150.0, f64::NAN, 100.0).unwrap();

        let deflection = state.last_deflection().unwrap();
        assert!((deflection.new_velocity_km_s - 20.1).abs() < 1e-12);
        assert_eq!(deflection.is_safe, Some(true));
        assert!(state.is_deflected());
        assert_eq!(state.current_event().unwrap().velocity_km_s, Some(deflection.new_velocity_km_s));
        assert!((result.velocity_ms - 20_100.0).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_delta_v_stays_finite() {
        let mut state = terrestrial();
        state.select(event_x());

        state.apply(150.0, f64::INFINITY, f64::INFINITY).unwrap();
        let deflection = state.last_deflection().unwrap();
        assert!(deflection.new_velocity_km_s.is_finite());
        assert!(deflection.delta_v_applied_km_s.is_finite());
        assert!(state.last_result().unwrap().energy_joules.is_finite());

        // NaN burn is no burn.
        state.apply(150.0, 20.0, f64::NAN).unwrap();
        assert!(!state.is_deflected());
        assert!(state.last_deflection().is_none());
        assert_eq!(state.current_event().unwrap().velocity_km_s, Some(20.0));
    }

    #[test]
    fn test_snapshot_carries_miss_distance_band() {
        let mut state = terrestrial();
        assert!(state.snapshot().miss_risk.is_none());

        let mut close = event_x();
        close.miss_distance_km = Some(40_000.0);
        state.select(close);
        assert_eq!(state.snapshot().miss_risk, Some(MissDistanceRisk::High));

        state.select(event_y());
        assert!(state.snapshot().miss_risk.is_none());
    }

    #[test]
    fn test_app_state_sink_can_read_back() {
        struct ReadBack {
            simulation: Arc<RwLock<SimulationState>>,
            seen: Arc<Mutex<Vec<bool>>>,
        }

        impl ResultSink for ReadBack {
            fn publish(&self, update: &SimulationUpdate) {
                let snapshot = self.simulation.read().snapshot();
                self.seen
                    .lock()
                    .push(snapshot.current_event.as_ref() == Some(&update.event));
            }
        }

        let app = AppState::from_simulation(terrestrial());
        let seen = Arc::new(Mutex::new(Vec::new()));
        app.subscribe(Box::new(ReadBack {
            simulation: app.simulation.clone(),
            seen: seen.clone(),
        }));

        app.select(event_x());
        app.apply(200.0, 25.0, 75.0);
        app.reset();
        assert!(app.reset().is_none());

        assert_eq!(*seen.lock(), vec![true, true, true]);
    }

    #[test]
    fn test_sinks_see_committed_state() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut state = terrestrial();
        state.subscribe(Box::new(Recorder(log.clone())));

        state.select(event_x());
        state.apply(150.0, 20.0, 100.0);
        state.reset();
        state.reset();

        let updates = log.lock();
        assert_eq!(updates.len(), 3);
        assert!(updates[0].deflection.is_none());
        assert_eq!(updates[1].deflection.unwrap().is_safe, Some(true));
        assert_eq!(updates[1].event.id.as_deref(), Some("x"));
        assert_eq!(updates[2].event, event_x());

        let zone = updates[0].impact_zone;
        assert_eq!((zone.latitude, zone.longitude), (12.0, -30.0));
        assert_eq!(zone.crater_radius_m, updates[0].result.crater_diameter_m / 2.0);
        assert_eq!(zone.tsunami_radius_m, 0.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut state = terrestrial();
        state.select(event_x());
        state.apply(500.0, 40.0, 0.0);
        let snapshot = state.snapshot();
        assert!(snapshot.is_modified);
        assert_eq!(snapshot.risk.unwrap().percent, 40.0);

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SimulationSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.current_event, snapshot.current_event);
    }

    #[test]
    fn test_app_state_catalog_navigation() {
        let app = AppState::from_simulation(terrestrial());
        let events = vec![event_x(), event_y()];

        assert!(app.load_catalog(CatalogMode::Browse { year: 2024 }, events).is_some());
        assert_eq!(app.snapshot().original_event, Some(event_x()));

        app.apply(10.0, 10.0, 60.0);
        assert!(app.snapshot().is_deflected);

        app.next().unwrap();
        let snapshot = app.snapshot();
        assert_eq!(snapshot.original_event, Some(event_y()));
        assert!(!snapshot.is_deflected);
        assert!(app.next().is_none());

        app.previous().unwrap();
        assert_eq!(app.snapshot().current_event, Some(event_x()));
        assert!(app.advance().is_none());
    }
}
