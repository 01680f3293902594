// End-to-end: NeoWs payload -> catalog -> controller -> what-if -> reset

use impact_core::{
    feed, AppState, CatalogMode, EngineConfig, FixedClassifier, ImpactEvent, LatitudeBandClassifier,
    OceanMask, SimulationState,
};

const FEED: &str = r#"{
    "element_count": 2,
    "near_earth_objects": {
        "2025-10-01": [
            {
                "id": "3542519",
                "name": "(2010 PK9)",
                "estimated_diameter": {"meters": {"estimated_diameter_min": 120.0, "estimated_diameter_max": 180.0}},
                "close_approach_data": [{
                    "close_approach_date": "2025-10-01",
                    "relative_velocity": {"kilometers_per_hour": "72000"},
                    "miss_distance": {"kilometers": "40000"}
                }]
            },
            {
                "id": "2000433",
                "name": "433 Eros",
                "close_approach_data": []
            }
        ]
    }
}"#;

#[test]
fn feed_to_what_if_and_back() {
    let events = feed::parse_feed(FEED).unwrap();
    let app = AppState::from_simulation(SimulationState::with_classifier(
        EngineConfig::default(),
        FixedClassifier(false),
    ));

    let first = app.load_catalog(CatalogMode::Feed, events).unwrap();
    // 150 m at 20 km/s
    assert!((first.energy_megatons - 253.4).abs() < 0.5);
    assert!((first.crater_diameter_m - 4075.0).abs() < 0.05 * 4075.0);

    let deflected = app.apply(150.0, 20.0, 100.0).unwrap();
    assert!(deflected.energy_joules > first.energy_joules);
    let snapshot = app.snapshot();
    assert!(snapshot.is_deflected);
    assert_eq!(snapshot.last_deflection.unwrap().is_safe, Some(true));

    let reset = app.reset().unwrap();
    assert_eq!(reset, first);
    let snapshot = app.snapshot();
    assert_eq!(snapshot.current_event, snapshot.original_event);
    assert!(!snapshot.is_deflected);

    // Feed advance selects Eros with defaulted size and speed.
    let eros = app.advance().unwrap();
    assert_eq!(eros.velocity_ms, 20_000.0);
    assert_eq!(
        app.snapshot().original_event.and_then(|e| e.id),
        Some("2000433".to_string())
    );
}

#[test]
fn new_selection_replaces_original() {
    let mut state = SimulationState::with_classifier(EngineConfig::default(), FixedClassifier(true));
    let x = ImpactEvent::new(150.0, 20.0).with_id("x");
    let y = ImpactEvent::new(40.0, 12.0).with_id("y");

    state.select(x);
    state.apply(300.0, 25.0, 0.0);
    state.select(y.clone());

    assert_eq!(state.original_event(), Some(&y));
    assert_eq!(state.current_event(), Some(&y));
    assert!(!state.is_deflected());
}

#[test]
fn seeded_classifier_is_reproducible() {
    let run = |seed: u64| {
        let mut state = SimulationState::with_classifier(
            EngineConfig::default(),
            LatitudeBandClassifier::seeded(seed),
        );
        (0..40)
            .map(|i| {
                let event = ImpactEvent::new(100.0 + i as f64, 20.0).with_impact_point(i as f64 - 20.0, 0.0);
                state.select(event).is_oceanic
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(7), run(7));
    assert!(run(7).iter().any(|&o| o));
}

#[test]
fn ocean_mask_drives_tsunami() {
    let mask = OceanMask::from_fn(90, 180, |lat, _| lat.abs() < 30.0).unwrap();
    let mut state = SimulationState::with_classifier(EngineConfig::default(), mask);

    let wet = state.select(ImpactEvent::new(150.0, 20.0).with_impact_point(0.0, 0.0));
    assert!(wet.is_oceanic);
    assert!(wet.tsunami_radius_km > 0.0);

    let dry = state.select(ImpactEvent::new(150.0, 20.0).with_impact_point(45.0, 0.0));
    assert!(!dry.is_oceanic);
    assert_eq!(dry.tsunami_radius_km, 0.0);
    assert!(dry.crater_diameter_m > wet.crater_diameter_m);
}
