//! Topology loading tests

use std::sync::Arc;

use green_wave::simulation::{
    grid_junction_id, load_topology, EntityStore, ErrorCode, EventBus, EventKind, EventRecorder,
    Intersection, LoadReport, Position, RoadRecord, StaticTopology, Topology, TopologySource,
};

type LoadOutcome = (
    green_wave::simulation::Result<LoadReport>,
    EntityStore,
    Arc<EventRecorder>,
);

/// Load `topology` into a copy of `store`, recording every event
fn load(store: &EntityStore, topology: &StaticTopology) -> LoadOutcome {
    let shared = store.clone().shared();
    let bus = EventBus::new();
    let recorder = EventRecorder::new();
    bus.subscribe(recorder.clone());

    let result = load_topology(&shared, topology.records(), &bus);
    let store = shared.read().unwrap().clone();
    (result, store, recorder)
}

#[test]
fn test_grid_topology_loads_junctions_and_roads() {
    let topology = StaticTopology::grid(2, 3, 50.0);
    let (result, store, _) = load(&EntityStore::new(), &topology);
    let report = result.unwrap();

    assert_eq!(report.intersections_created, 6);
    assert_eq!(report.traffic_lights_created, 6);
    // 2 rows x 2 horizontal + 3 columns x 1 vertical, both directions
    assert_eq!(report.roads_added, 14);
    assert_eq!(report.roads_skipped, 0);

    let corner = store.get_intersection(&grid_junction_id(1, 2)).unwrap();
    assert_eq!(corner.position, Position::new(100.0, 50.0));
    assert_eq!(store.summary().road_connections, 14);

    let origin = store.get_intersection("J0_0").unwrap();
    let east = origin.road_to("J0_1").unwrap();
    assert_eq!(east.distance, 50.0);
    assert_eq!(east.traffic_light, "J0_1");
}

#[test]
fn test_loading_reports_monotonic_progress() {
    let topology = StaticTopology::grid(2, 2, 100.0);
    let (result, _, recorder) = load(&EntityStore::new(), &topology);
    result.unwrap();

    let events = recorder.events();
    assert_eq!(events.first().unwrap().kind, EventKind::LoadingStart);
    assert_eq!(events.last().unwrap().kind, EventKind::LoadingComplete);

    let ratios: Vec<f32> = events.iter().filter_map(|event| event.progress()).collect();
    assert_eq!(ratios.len(), topology.records().record_count());
    assert!(ratios.iter().all(|ratio| (0.0..=1.0).contains(ratio)));
    assert!(ratios.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(*ratios.last().unwrap(), 1.0);
}

#[test]
fn test_empty_topology_reports_completion() {
    let (result, store, recorder) = load(&EntityStore::new(), &StaticTopology::new());
    result.unwrap();

    assert_eq!(store.summary().intersections, 0);
    assert_eq!(
        recorder.kinds(),
        vec![
            EventKind::LoadingStart,
            EventKind::LoadingProgress,
            EventKind::LoadingComplete
        ]
    );
    assert_eq!(recorder.events()[1].progress(), Some(1.0));
}

#[test]
fn test_existing_intersections_get_positions() {
    let mut store = EntityStore::new();
    store
        .add_intersection(Intersection::new("A", Position::default()))
        .unwrap();

    let topology = StaticTopology::new().with_junction("A", Position::new(12.0, -4.0));
    let (result, store, _) = load(&store, &topology);
    let report = result.unwrap();

    assert_eq!(report.intersections_created, 0);
    assert_eq!(report.intersections_updated, 1);
    assert_eq!(report.traffic_lights_created, 1);
    assert_eq!(
        store.get_intersection("A").unwrap().position,
        Position::new(12.0, -4.0)
    );
}

#[test]
fn test_roads_with_missing_endpoints_are_skipped() {
    let topology = StaticTopology::new()
        .with_junction("A", Position::new(0.0, 0.0))
        .with_junction("B", Position::new(100.0, 0.0))
        .with_road("A", "B", 100.0)
        .with_road("A", "ghost", 40.0)
        .with_controlled_road("B", "A", 100.0, "no-such-light");

    let (result, store, _) = load(&EntityStore::new(), &topology);
    let report = result.unwrap();

    assert_eq!(report.roads_added, 1);
    assert_eq!(report.roads_skipped, 2);
    assert_eq!(store.get_intersection("A").unwrap().road_count(), 1);
    assert_eq!(store.get_intersection("B").unwrap().road_count(), 0);
}

#[test]
fn test_controlled_road_uses_named_light() {
    let topology = StaticTopology::new()
        .with_junction("A", Position::new(0.0, 0.0))
        .with_intersection("B", Position::new(80.0, 0.0))
        .with_controlled_road("A", "B", 80.0, "A");

    let (result, store, _) = load(&EntityStore::new(), &topology);
    assert_eq!(result.unwrap().roads_added, 1);
    assert_eq!(
        store.get_intersection("A").unwrap().road_to("B").unwrap().traffic_light,
        "A"
    );
}

#[test]
fn test_invalid_road_length_is_a_parsing_error() {
    let topology = Topology {
        roads: vec![RoadRecord {
            from: "A".to_string(),
            to: "B".to_string(),
            distance: f64::INFINITY,
            traffic_light: None,
        }],
        ..Topology::default()
    };
    assert_eq!(topology.validate().unwrap_err().code(), ErrorCode::ParsingError);

    let shared = EntityStore::new().shared();
    let bus = EventBus::new();
    let recorder = EventRecorder::new();
    bus.subscribe(recorder.clone());

    let err = load_topology(&shared, &topology, &bus).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ParsingError);
    assert_eq!(shared.read().unwrap().summary().intersections, 0);
    // No LOADING_START without a matching LOADING_COMPLETE
    assert!(recorder.events().is_empty());
}

#[test]
fn test_static_topology_is_a_topology_source() {
    let topology = StaticTopology::new()
        .with_junction("A", Position::default())
        .with_two_way_road("A", "A", 0.0);
    let records = topology.topology().unwrap();
    assert_eq!(records.intersections.len(), 1);
    assert_eq!(records.traffic_lights.len(), 1);
    assert_eq!(records.roads.len(), 2);
}
