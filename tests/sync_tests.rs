//! Live synchronization tests against a scripted source

use green_wave::simulation::{
    full_sync, incremental_sync, incremental_sync_with, EntityStore, ErrorCode, Position, ScriptedSource,
    SimulationSource, Snapshot, TrafficLightState, Vehicle, VehicleRole, VehicleType,
};

fn base_snapshot() -> Snapshot {
    Snapshot::new()
        .with_traffic_light("mock_tl1", "rGrG")
        .with_traffic_light("mock_tl2", "rrrr")
        .with_vehicle("mock_vehicle1", Position::new(10.0, 20.0))
        .with_vehicle("mock_vehicle2", Position::new(30.0, 40.0))
}

fn started(source: ScriptedSource) -> ScriptedSource {
    let mut source = source;
    source.start().unwrap();
    source
}

#[test]
fn test_full_sync_builds_store_from_source() {
    let source = started(ScriptedSource::new(base_snapshot()));
    let mut store = EntityStore::new();

    let report = full_sync(&mut store, &source).unwrap();

    assert_eq!(report.intersections_added, 2);
    assert_eq!(report.lights_added, 2);
    assert_eq!(report.vehicles_added, 2);
    assert!(report.skipped.is_empty());

    assert_eq!(store.intersection_count(), 2);
    assert_eq!(
        store.get_intersection("mock_tl1").unwrap().position,
        Position::default()
    );
    assert!(store.get_traffic_light("mock_tl2").is_some());

    let v1 = store.get_vehicle("mock_vehicle1").unwrap();
    assert_eq!(v1.position, Position::new(10.0, 20.0));
    assert_eq!(v1.vehicle_type, VehicleType::Car);
    assert_eq!(v1.role, VehicleRole::Normal);
    assert_eq!(
        store.get_vehicle("mock_vehicle2").unwrap().position,
        Position::new(30.0, 40.0)
    );
}

#[test]
fn test_full_sync_replaces_previous_contents() {
    let source = started(ScriptedSource::new(base_snapshot()));
    let mut store = EntityStore::new();
    store
        .add_vehicle(Vehicle::car("stale", Position::default()))
        .unwrap();

    full_sync(&mut store, &source).unwrap();

    assert!(store.get_vehicle("stale").is_none());
    assert_eq!(store.vehicle_count(), 2);
}

#[test]
fn test_incremental_sync_removes_vanished_entities() {
    let step2 = Snapshot::new()
        .with_traffic_light("mock_tl1", "rGrG")
        .with_vehicle("mock_vehicle1", Position::new(12.0, 20.0));
    let mut source = started(ScriptedSource::from_frames(vec![base_snapshot(), step2]));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();

    source.step().unwrap();
    let report = incremental_sync(&mut store, &source).unwrap();

    assert_eq!(report.vehicles_removed, 1);
    assert_eq!(report.lights_removed, 1);
    assert!(store.get_vehicle("mock_vehicle2").is_none());
    assert!(store.get_traffic_light("mock_tl2").is_none());
    assert_eq!(
        store.get_vehicle("mock_vehicle1").unwrap().position,
        Position::new(12.0, 20.0)
    );
    // Intersections are structural and never diffed
    assert!(store.get_intersection("mock_tl2").is_some());
}

#[test]
fn test_incremental_sync_matches_external_vehicle_set() {
    let step2 = Snapshot::new()
        .with_traffic_light("mock_tl1", "rGrG")
        .with_vehicle("mock_vehicle2", Position::new(31.0, 41.0))
        .with_vehicle("newcomer", Position::new(0.5, 0.5))
        .with_vehicle_type("newcomer", "truck");
    let mut source = started(ScriptedSource::from_frames(vec![base_snapshot(), step2]));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();

    source.step().unwrap();
    incremental_sync(&mut store, &source).unwrap();

    let mut local = store.vehicle_ids();
    local.sort();
    let mut external = source.vehicle_ids().unwrap();
    external.sort();
    assert_eq!(local, external);

    for id in &external {
        assert_eq!(
            store.get_vehicle(id).unwrap().position,
            source.vehicle_position(id).unwrap()
        );
    }
    assert_eq!(
        store.get_vehicle("newcomer").unwrap().vehicle_type,
        VehicleType::Truck
    );
}

#[test]
fn test_incremental_sync_is_idempotent() {
    let source = started(ScriptedSource::new(
        base_snapshot().with_traffic_light("late_light", "yyyy"),
    ));
    let mut store = EntityStore::new();
    store
        .add_vehicle(Vehicle::car("gone", Position::default()))
        .unwrap();

    incremental_sync(&mut store, &source).unwrap();
    let first = store.clone();
    let report = incremental_sync(&mut store, &source).unwrap();

    assert_eq!(report.vehicles_added, 0);
    assert_eq!(report.vehicles_removed, 0);
    assert_eq!(report.lights_added, 0);
    assert_eq!(report.lights_updated, 0);
    assert_eq!(store.summary(), first.summary());
    assert_eq!(store.vehicle_ids(), first.vehicle_ids());
    for light in first.all_traffic_lights() {
        assert_eq!(store.get_traffic_light(&light.id), Some(light));
    }
    for vehicle in first.all_vehicles() {
        assert_eq!(store.get_vehicle(&vehicle.id), Some(vehicle));
    }
}

#[test]
fn test_light_state_precedence() {
    let source = started(ScriptedSource::new(
        Snapshot::new()
            .with_traffic_light("green", "rGrG")
            .with_traffic_light("lower_green", "ryg")
            .with_traffic_light("red", "rryy")
            .with_traffic_light("yellow", "yyyy")
            .with_traffic_light("off", "OOO"),
    ));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();
    incremental_sync(&mut store, &source).unwrap();

    let state = |id: &str| store.get_traffic_light(id).unwrap().state;
    assert_eq!(state("green"), TrafficLightState::Green);
    assert_eq!(state("lower_green"), TrafficLightState::Green);
    assert_eq!(state("red"), TrafficLightState::Red);
    assert_eq!(state("yellow"), TrafficLightState::Yellow);
    assert_eq!(state("off"), TrafficLightState::Yellow);
}

#[test]
fn test_sync_requires_running_source() {
    let source = ScriptedSource::new(base_snapshot());
    let mut store = EntityStore::new();

    let err = full_sync(&mut store, &source).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotRunning);
    let err = incremental_sync(&mut store, &source).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotRunning);
}

#[test]
fn test_readded_light_keeps_existing_intersection() {
    let source = started(ScriptedSource::new(base_snapshot()));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();

    store.remove_traffic_light("mock_tl1");
    let report = incremental_sync(&mut store, &source).unwrap();

    assert_eq!(report.lights_added, 1);
    assert!(report.skipped.is_empty());
    assert_eq!(store.traffic_light_count(), 2);
    assert_eq!(store.intersection_count(), 2);
}

#[test]
fn test_pedestrians_are_counted_separately() {
    let step2 = base_snapshot()
        .with_vehicle("walker", Position::new(1.0, 1.0))
        .with_vehicle_type("walker", "pedestrian");
    let mut source = started(ScriptedSource::from_frames(vec![base_snapshot(), step2]));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();

    source.step().unwrap();
    let report = incremental_sync(&mut store, &source).unwrap();

    assert_eq!(report.vehicles_added, 1);
    assert_eq!(report.pedestrians_added, 1);
    assert!(report.pedestrians_changed());
}

fn snapshot_with_blank_vehicle() -> Snapshot {
    Snapshot::new()
        .with_traffic_light("mock_tl1", "rGrG")
        .with_vehicle("", Position::new(1.0, 1.0))
        .with_vehicle("v1", Position::new(2.0, 2.0))
}

#[test]
fn test_full_sync_skips_bad_entity_and_continues() {
    let source = started(ScriptedSource::new(snapshot_with_blank_vehicle()));
    let mut store = EntityStore::new();

    let report = full_sync(&mut store, &source).unwrap();

    assert_eq!(report.skipped, vec![String::new()]);
    assert_eq!(report.vehicles_added, 1);
    assert_eq!(store.vehicle_ids(), vec!["v1"]);
    assert!(store.get_traffic_light("mock_tl1").is_some());
}

#[test]
fn test_incremental_sync_skips_bad_entity_and_continues() {
    let step2 = snapshot_with_blank_vehicle();
    let mut source = started(ScriptedSource::from_frames(vec![base_snapshot(), step2]));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();

    source.step().unwrap();
    let report = incremental_sync(&mut store, &source).unwrap();

    assert_eq!(report.skipped, vec![String::new()]);
    assert_eq!(report.vehicles_added, 1);
    assert_eq!(report.vehicles_removed, 2);
    assert_eq!(store.vehicle_ids(), vec!["v1"]);
}

#[test]
fn test_controlled_lights_keep_local_state() {
    let step2 = Snapshot::new()
        .with_traffic_light("mock_tl1", "rrrr")
        .with_traffic_light("mock_tl2", "GGGG");
    let mut source = started(ScriptedSource::from_frames(vec![base_snapshot(), step2]));
    let mut store = EntityStore::new();
    full_sync(&mut store, &source).unwrap();
    assert_eq!(
        store.get_traffic_light("mock_tl1").unwrap().state,
        TrafficLightState::Green
    );

    source.step().unwrap();
    let report = incremental_sync_with(&mut store, &source, |id| id == "mock_tl1").unwrap();

    assert_eq!(report.lights_updated, 1);
    assert_eq!(
        store.get_traffic_light("mock_tl1").unwrap().state,
        TrafficLightState::Green
    );
    assert_eq!(
        store.get_traffic_light("mock_tl2").unwrap().state,
        TrafficLightState::Green
    );
}
