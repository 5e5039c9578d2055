//! Entity store: the single owner of intersections, traffic lights and vehicles
//!
//! Every other component receives the store by reference (or through a
//! [`SharedStore`] handle) and works with non-owning views of its entities.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::{EntityKind, Error, Result};
use super::intersection::{Intersection, RoadConnection};
use super::traffic_light::TrafficLight;
use super::types::RoadId;
use super::vehicle::Vehicle;

/// Store handle shared between the control loop and concurrent readers
pub type SharedStore = Arc<RwLock<EntityStore>>;

/// Entity counts at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreSummary {
    pub intersections: usize,
    pub traffic_lights: usize,
    pub vehicles: usize,
    pub road_connections: usize,
}

/// Owns every entity of a simulation run
///
/// Identifiers are unique per entity class. An intersection and a traffic
/// light may share an id, meaning the light belongs to that junction.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    intersections: BTreeMap<String, Intersection>,
    traffic_lights: BTreeMap<String, TrafficLight>,
    vehicles: BTreeMap<String, Vehicle>,
}

fn require_id(kind: EntityKind, id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::InvalidArgument(format!("{kind} id must not be empty")));
    }
    Ok(())
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the store in a handle that can be shared across threads
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    pub fn add_intersection(&mut self, intersection: Intersection) -> Result<()> {
        require_id(EntityKind::Intersection, &intersection.id)?;
        if self.intersections.contains_key(&intersection.id) {
            return Err(Error::duplicate(EntityKind::Intersection, intersection.id));
        }
        self.intersections
            .insert(intersection.id.clone(), intersection);
        Ok(())
    }

    pub fn add_traffic_light(&mut self, traffic_light: TrafficLight) -> Result<()> {
        require_id(EntityKind::TrafficLight, &traffic_light.id)?;
        if self.traffic_lights.contains_key(&traffic_light.id) {
            return Err(Error::duplicate(EntityKind::TrafficLight, traffic_light.id));
        }
        self.traffic_lights
            .insert(traffic_light.id.clone(), traffic_light);
        Ok(())
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) -> Result<()> {
        require_id(EntityKind::Vehicle, &vehicle.id)?;
        if self.vehicles.contains_key(&vehicle.id) {
            return Err(Error::duplicate(EntityKind::Vehicle, vehicle.id));
        }
        self.vehicles.insert(vehicle.id.clone(), vehicle);
        Ok(())
    }

    /// Add a directed road leaving `from`.
    ///
    /// Both the destination intersection and the controlling traffic light
    /// must already exist, and `road_id` must be unused at `from`.
    pub fn add_road_connection(
        &mut self,
        from: &str,
        road_id: RoadId,
        road: RoadConnection,
    ) -> Result<()> {
        if !road.distance.is_finite() || road.distance < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "road {road_id} from {from} has invalid distance {}",
                road.distance
            )));
        }
        if !self.intersections.contains_key(&road.to_intersection) {
            return Err(Error::InvalidArgument(format!(
                "road {road_id} from {from} targets unknown intersection {}",
                road.to_intersection
            )));
        }
        if !self.traffic_lights.contains_key(&road.traffic_light) {
            return Err(Error::InvalidArgument(format!(
                "road {road_id} from {from} references unknown traffic light {}",
                road.traffic_light
            )));
        }

        let source = self.intersections.get_mut(from).ok_or_else(|| {
            Error::InvalidArgument(format!("road {road_id} starts at unknown intersection {from}"))
        })?;

        if !source.insert_road(road_id, road) {
            return Err(Error::duplicate(
                EntityKind::RoadConnection,
                format!("{from}#{road_id}"),
            ));
        }
        Ok(())
    }

    pub fn get_intersection(&self, id: &str) -> Option<&Intersection> {
        self.intersections.get(id)
    }

    pub fn get_intersection_mut(&mut self, id: &str) -> Option<&mut Intersection> {
        self.intersections.get_mut(id)
    }

    pub fn get_traffic_light(&self, id: &str) -> Option<&TrafficLight> {
        self.traffic_lights.get(id)
    }

    pub fn get_traffic_light_mut(&mut self, id: &str) -> Option<&mut TrafficLight> {
        self.traffic_lights.get_mut(id)
    }

    pub fn get_vehicle(&self, id: &str) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    pub fn get_vehicle_mut(&mut self, id: &str) -> Option<&mut Vehicle> {
        self.vehicles.get_mut(id)
    }

    pub fn remove_traffic_light(&mut self, id: &str) -> Option<TrafficLight> {
        self.traffic_lights.remove(id)
    }

    pub fn remove_vehicle(&mut self, id: &str) -> Option<Vehicle> {
        self.vehicles.remove(id)
    }

    pub fn all_intersections(&self) -> Vec<&Intersection> {
        self.intersections.values().collect()
    }

    pub fn all_traffic_lights(&self) -> Vec<&TrafficLight> {
        self.traffic_lights.values().collect()
    }

    pub fn all_vehicles(&self) -> Vec<&Vehicle> {
        self.vehicles.values().collect()
    }

    pub fn intersection_ids(&self) -> Vec<String> {
        self.intersections.keys().cloned().collect()
    }

    pub fn traffic_light_ids(&self) -> Vec<String> {
        self.traffic_lights.keys().cloned().collect()
    }

    pub fn vehicle_ids(&self) -> Vec<String> {
        self.vehicles.keys().cloned().collect()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn traffic_light_count(&self) -> usize {
        self.traffic_lights.len()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    /// Empty all three collections at once
    pub fn clear_all(&mut self) {
        self.intersections.clear();
        self.traffic_lights.clear();
        self.vehicles.clear();
    }

    pub fn summary(&self) -> StoreSummary {
        StoreSummary {
            intersections: self.intersections.len(),
            traffic_lights: self.traffic_lights.len(),
            vehicles: self.vehicles.len(),
            road_connections: self
                .intersections
                .values()
                .map(Intersection::road_count)
                .sum(),
        }
    }
}

/// Acquire a read guard, mapping lock poisoning to an error
pub fn read_store(store: &SharedStore) -> Result<RwLockReadGuard<'_, EntityStore>> {
    store
        .read()
        .map_err(|_| Error::Unknown("entity store lock poisoned".to_string()))
}

/// Acquire a write guard, mapping lock poisoning to an error
pub fn write_store(store: &SharedStore) -> Result<RwLockWriteGuard<'_, EntityStore>> {
    store
        .write()
        .map_err(|_| Error::Unknown("entity store lock poisoned".to_string()))
}
