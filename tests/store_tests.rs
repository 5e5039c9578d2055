//! Entity store validation tests

use green_wave::simulation::{
    EntityKind, EntityStore, Error, ErrorCode, Intersection, Position, RoadConnection,
    TrafficLight, Vehicle, VehicleRole, VehicleType,
};

fn store_with_junctions(ids: &[&str]) -> EntityStore {
    let mut store = EntityStore::new();
    for id in ids {
        store
            .add_intersection(Intersection::new(*id, Position::default()))
            .unwrap();
        store.add_traffic_light(TrafficLight::new(*id)).unwrap();
    }
    store
}

#[test]
fn test_intersection_round_trip_keeps_id_and_position() {
    let mut store = EntityStore::new();
    let samples = [
        ("int1", Position::new(1.0, 2.0)),
        ("int2", Position::new(-15.5, 0.25)),
        ("x", Position::new(0.0, 0.0)),
    ];

    for (id, position) in samples {
        store.add_intersection(Intersection::new(id, position)).unwrap();
    }

    for (id, position) in samples {
        let intersection = store.get_intersection(id).expect("intersection stored");
        assert_eq!(intersection.id, id);
        assert_eq!(intersection.position, position);
    }
    assert_eq!(store.all_intersections().len(), 3);
}

#[test]
fn test_duplicate_insert_is_rejected_and_size_unchanged() {
    let mut store = EntityStore::new();
    store
        .add_intersection(Intersection::new("int1", Position::new(1.0, 1.0)))
        .unwrap();
    store.add_traffic_light(TrafficLight::new("light1")).unwrap();
    store
        .add_vehicle(Vehicle::car("v1", Position::new(5.0, 5.0)))
        .unwrap();

    let err = store
        .add_intersection(Intersection::new("int1", Position::new(9.0, 9.0)))
        .unwrap_err();
    assert_eq!(err, Error::duplicate(EntityKind::Intersection, "int1"));
    assert_eq!(store.intersection_count(), 1);
    // The original is kept
    assert_eq!(
        store.get_intersection("int1").unwrap().position,
        Position::new(1.0, 1.0)
    );

    let err = store.add_traffic_light(TrafficLight::new("light1")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateEntity);
    assert_eq!(store.traffic_light_count(), 1);

    let err = store
        .add_vehicle(Vehicle::car("v1", Position::default()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateEntity);
    assert_eq!(store.vehicle_count(), 1);
}

#[test]
fn test_empty_id_is_invalid_argument() {
    let mut store = EntityStore::new();
    let err = store
        .add_intersection(Intersection::new("", Position::default()))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    let err = store.add_vehicle(Vehicle::car("", Position::default())).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
    assert_eq!(store.summary().intersections, 0);
    assert_eq!(store.summary().vehicles, 0);
}

#[test]
fn test_intersection_and_light_may_share_an_id() {
    let store = store_with_junctions(&["A"]);
    assert!(store.get_intersection("A").is_some());
    assert!(store.get_traffic_light("A").is_some());
}

#[test]
fn test_missing_ids_return_none() {
    let store = EntityStore::new();
    assert!(store.get_intersection("nope").is_none());
    assert!(store.get_traffic_light("nope").is_none());
    assert!(store.get_vehicle("nope").is_none());
}

#[test]
fn test_road_connection_requires_existing_targets() {
    let mut store = store_with_junctions(&["A", "B"]);

    store
        .add_road_connection("A", 1, RoadConnection::new("B", "B", 100.0))
        .unwrap();

    // Unknown destination
    let err = store
        .add_road_connection("A", 2, RoadConnection::new("Z", "B", 50.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    // Unknown controlling light
    let err = store
        .add_road_connection("A", 3, RoadConnection::new("B", "no-light", 50.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    // Unknown source
    let err = store
        .add_road_connection("Q", 1, RoadConnection::new("B", "B", 50.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);

    // Colliding local road id
    let err = store
        .add_road_connection("A", 1, RoadConnection::new("B", "A", 70.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::DuplicateEntity);

    let a = store.get_intersection("A").unwrap();
    assert_eq!(a.road_count(), 1);
    assert_eq!(a.road(1).unwrap().distance, 100.0);
    assert_eq!(store.summary().road_connections, 1);
}

#[test]
fn test_road_ids_are_local_to_their_intersection() {
    let mut store = store_with_junctions(&["A", "B"]);
    store
        .add_road_connection("A", 1, RoadConnection::new("B", "B", 100.0))
        .unwrap();
    store
        .add_road_connection("B", 1, RoadConnection::new("A", "A", 100.0))
        .unwrap();
    assert_eq!(store.summary().road_connections, 2);
}

#[test]
fn test_negative_distance_is_rejected() {
    let mut store = store_with_junctions(&["A", "B"]);
    let err = store
        .add_road_connection("A", 1, RoadConnection::new("B", "B", -1.0))
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidArgument);
}

#[test]
fn test_clear_all_empties_every_collection() {
    let mut store = store_with_junctions(&["A", "B"]);
    store
        .add_vehicle(Vehicle::new(
            "bus1",
            VehicleType::Bus,
            VehicleRole::Normal,
            Position::new(3.0, 4.0),
        ))
        .unwrap();

    store.clear_all();

    let summary = store.summary();
    assert_eq!(summary.intersections, 0);
    assert_eq!(summary.traffic_lights, 0);
    assert_eq!(summary.vehicles, 0);
    assert_eq!(summary.road_connections, 0);
}

#[test]
fn test_intersection_statistics_accumulate() {
    let mut store = store_with_junctions(&["A"]);
    let stats = &mut store.get_intersection_mut("A").unwrap().statistics;

    assert_eq!(stats.average_vehicle_waiting_time(), 0.0);
    assert_eq!(stats.average_pedestrian_waiting_time(), 0.0);

    stats.add_vehicle_pass(10.0);
    stats.add_vehicle_pass(20.0);
    stats.add_pedestrian_pass(6.0);

    assert_eq!(stats.total_vehicles_passed(), 2);
    assert_eq!(stats.total_vehicle_waiting_time(), 30.0);
    assert_eq!(stats.average_vehicle_waiting_time(), 15.0);
    assert_eq!(stats.total_pedestrians_passed(), 1);
    assert_eq!(stats.total_pedestrian_waiting_time(), 6.0);

    let averages = stats.average_waiting_times();
    assert_eq!(averages.vehicles, 15.0);
    assert_eq!(averages.pedestrians, 6.0);
}

#[test]
fn test_vehicle_classification_from_external_strings() {
    assert_eq!(VehicleType::from_external("passenger"), VehicleType::Car);
    assert_eq!(VehicleType::from_external("trailer"), VehicleType::Truck);
    assert_eq!(VehicleType::from_external("emergency"), VehicleType::Emergency);
    assert_eq!(VehicleType::from_external("hovercraft"), VehicleType::Car);
    assert_eq!(VehicleRole::from_external("ambulance"), VehicleRole::Emergency);
    assert_eq!(VehicleRole::from_external("passenger"), VehicleRole::Normal);

    let ambulance = Vehicle::new(
        "amb",
        VehicleType::Car,
        VehicleRole::Emergency,
        Position::default(),
    );
    assert!(ambulance.is_emergency());
}
