//! Reconciles the entity store with snapshots of the external source
//!
//! Per-entity insert failures are logged and skipped so that one bad id
//! never aborts a whole pass. A source that is not running is fatal.

use log::{debug, warn};
use std::collections::BTreeSet;

use super::error::{Error, Result};
use super::intersection::Intersection;
use super::source::SimulationSource;
use super::store::EntityStore;
use super::traffic_light::TrafficLight;
use super::types::{Position, TrafficLightState, VehicleRole, VehicleType};
use super::vehicle::Vehicle;

/// What a sync pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub intersections_added: usize,
    pub lights_added: usize,
    pub lights_removed: usize,
    /// Lights whose mirrored state changed
    pub lights_updated: usize,
    pub vehicles_added: usize,
    pub vehicles_removed: usize,
    /// Vehicles whose position was refreshed
    pub vehicles_updated: usize,
    pub pedestrians_added: usize,
    pub pedestrians_removed: usize,
    /// Ids that could not be inserted
    pub skipped: Vec<String>,
}

impl SyncReport {
    pub fn vehicles_changed(&self) -> bool {
        self.vehicles_added > 0 || self.vehicles_removed > 0
    }

    pub fn pedestrians_changed(&self) -> bool {
        self.pedestrians_added > 0 || self.pedestrians_removed > 0
    }
}

fn ensure_running<S: SimulationSource + ?Sized>(source: &S, action: &str) -> Result<()> {
    if !source.is_running() {
        return Err(Error::NotRunning(format!("cannot {action}")));
    }
    Ok(())
}

/// Build a vehicle from what the source reports about it
fn observe_vehicle<S: SimulationSource + ?Sized>(source: &S, id: &str) -> Result<Vehicle> {
    let position = source.vehicle_position(id)?;
    let (vehicle_type, role) = match source.vehicle_type(id)? {
        Some(class) => (
            VehicleType::from_external(&class),
            VehicleRole::from_external(&class),
        ),
        None => (VehicleType::Car, VehicleRole::Normal),
    };
    Ok(Vehicle::new(id, vehicle_type, role, position))
}

/// New traffic light with the default profile, mirroring the external state
fn observe_traffic_light<S: SimulationSource + ?Sized>(
    source: &S,
    id: &str,
) -> Result<TrafficLight> {
    let mut light = TrafficLight::new(id);
    light.set_state(TrafficLightState::from_signal_string(
        &source.traffic_light_state(id)?,
    ));
    Ok(light)
}

fn record_skip(report: &mut SyncReport, id: &str, error: &Error) {
    warn!("Sync skipped {}: {}", id, error);
    report.skipped.push(id.to_string());
}

/// Clear the store and rebuild it from the source.
///
/// Every external traffic light becomes both an intersection (at the
/// origin) and a traffic light with the same id.
pub fn full_sync<S: SimulationSource + ?Sized>(
    store: &mut EntityStore,
    source: &S,
) -> Result<SyncReport> {
    ensure_running(source, "run full sync")?;

    let light_ids = source.traffic_light_ids()?;
    let vehicle_ids = source.vehicle_ids()?;
    let mut report = SyncReport::default();

    store.clear_all();

    for id in &light_ids {
        match store.add_intersection(Intersection::new(id.clone(), Position::default())) {
            Ok(()) => report.intersections_added += 1,
            Err(e) => record_skip(&mut report, id, &e),
        }
        match store.add_traffic_light(observe_traffic_light(source, id)?) {
            Ok(()) => report.lights_added += 1,
            Err(e) => record_skip(&mut report, id, &e),
        }
    }

    for id in &vehicle_ids {
        let vehicle = observe_vehicle(source, id)?;
        let is_pedestrian = vehicle.vehicle_type == VehicleType::Pedestrian;
        match store.add_vehicle(vehicle) {
            Ok(()) => {
                report.vehicles_added += 1;
                if is_pedestrian {
                    report.pedestrians_added += 1;
                }
            }
            Err(e) => record_skip(&mut report, id, &e),
        }
    }

    debug!(
        "Full sync: {} intersections, {} lights, {} vehicles",
        report.intersections_added, report.lights_added, report.vehicles_added
    );
    Ok(report)
}

/// Diff vehicles and traffic lights against the source.
///
/// Vanished entities are removed, new ones created, and surviving ones get
/// their mutable fields refreshed. Intersections are not touched.
pub fn incremental_sync<S: SimulationSource + ?Sized>(
    store: &mut EntityStore,
    source: &S,
) -> Result<SyncReport> {
    incremental_sync_with(store, source, |_| false)
}

/// Like [`incremental_sync`], but lights for which `controlled` returns true
/// keep their local state. They are still added and removed with the source.
pub fn incremental_sync_with<S, F>(
    store: &mut EntityStore,
    source: &S,
    controlled: F,
) -> Result<SyncReport>
where
    S: SimulationSource + ?Sized,
    F: Fn(&str) -> bool,
{
    ensure_running(source, "run incremental sync")?;

    let mut report = SyncReport::default();
    sync_vehicles(store, source, &mut report)?;
    sync_traffic_lights(store, source, &controlled, &mut report)?;

    debug!(
        "Incremental sync: vehicles +{} -{} ~{}, lights +{} -{} ~{}",
        report.vehicles_added,
        report.vehicles_removed,
        report.vehicles_updated,
        report.lights_added,
        report.lights_removed,
        report.lights_updated
    );
    Ok(report)
}

fn sync_vehicles<S: SimulationSource + ?Sized>(
    store: &mut EntityStore,
    source: &S,
    report: &mut SyncReport,
) -> Result<()> {
    let external: BTreeSet<String> = source.vehicle_ids()?.into_iter().collect();
    let local: BTreeSet<String> = store.vehicle_ids().into_iter().collect();

    for id in local.difference(&external) {
        if let Some(vehicle) = store.remove_vehicle(id) {
            report.vehicles_removed += 1;
            if vehicle.vehicle_type == VehicleType::Pedestrian {
                report.pedestrians_removed += 1;
            }
        }
    }

    for id in external.difference(&local) {
        let vehicle = observe_vehicle(source, id)?;
        let is_pedestrian = vehicle.vehicle_type == VehicleType::Pedestrian;
        match store.add_vehicle(vehicle) {
            Ok(()) => {
                report.vehicles_added += 1;
                if is_pedestrian {
                    report.pedestrians_added += 1;
                }
            }
            Err(e) => record_skip(report, id, &e),
        }
    }

    for id in external.intersection(&local) {
        let position = source.vehicle_position(id)?;
        if let Some(vehicle) = store.get_vehicle_mut(id) {
            vehicle.position = position;
            report.vehicles_updated += 1;
        }
    }
    Ok(())
}

fn sync_traffic_lights<S, F>(
    store: &mut EntityStore,
    source: &S,
    controlled: &F,
    report: &mut SyncReport,
) -> Result<()>
where
    S: SimulationSource + ?Sized,
    F: Fn(&str) -> bool,
{
    let external: BTreeSet<String> = source.traffic_light_ids()?.into_iter().collect();
    let local: BTreeSet<String> = store.traffic_light_ids().into_iter().collect();

    for id in local.difference(&external) {
        if store.remove_traffic_light(id).is_some() {
            report.lights_removed += 1;
        }
    }

    for id in external.difference(&local) {
        match store.add_traffic_light(observe_traffic_light(source, id)?) {
            Ok(()) => report.lights_added += 1,
            Err(e) => record_skip(report, id, &e),
        }
    }

    for id in external.intersection(&local) {
        if controlled(id) {
            continue;
        }
        let state = TrafficLightState::from_signal_string(&source.traffic_light_state(id)?);
        if let Some(light) = store.get_traffic_light_mut(id) {
            if light.set_state(state) {
                report.lights_updated += 1;
            }
        }
    }
    Ok(())
}
