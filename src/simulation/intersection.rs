//! Intersections and the road connections leaving them

use std::collections::BTreeMap;

use super::statistics::IntersectionStatistics;
use super::types::{Position, RoadId};

/// A directed road from its owning intersection to a neighbor
///
/// Holds identifiers only; both targets are resolved through the entity store.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadConnection {
    /// Destination intersection
    pub to_intersection: String,
    /// Traffic light controlling entry onto this road
    pub traffic_light: String,
    /// Length of the road in meters
    pub distance: f64,
}

impl RoadConnection {
    pub fn new(
        to_intersection: impl Into<String>,
        traffic_light: impl Into<String>,
        distance: f64,
    ) -> Self {
        Self {
            to_intersection: to_intersection.into(),
            traffic_light: traffic_light.into(),
            distance,
        }
    }
}

/// An intersection node in the road network
#[derive(Debug, Clone)]
pub struct Intersection {
    pub id: String,
    pub position: Position,
    /// Outgoing roads keyed by their intersection-local id
    roads: BTreeMap<RoadId, RoadConnection>,
    pub statistics: IntersectionStatistics,
}

impl Intersection {
    pub fn new(id: impl Into<String>, position: Position) -> Self {
        Self {
            id: id.into(),
            position,
            roads: BTreeMap::new(),
            statistics: IntersectionStatistics::new(),
        }
    }

    /// Outgoing roads in iteration order (ascending road id)
    pub fn roads(&self) -> impl Iterator<Item = (RoadId, &RoadConnection)> {
        self.roads.iter().map(|(id, road)| (*id, road))
    }

    pub fn road(&self, road_id: RoadId) -> Option<&RoadConnection> {
        self.roads.get(&road_id)
    }

    pub fn has_road(&self, road_id: RoadId) -> bool {
        self.roads.contains_key(&road_id)
    }

    pub fn road_count(&self) -> usize {
        self.roads.len()
    }

    /// First road (in iteration order) leading to `to_intersection`
    pub fn road_to(&self, to_intersection: &str) -> Option<&RoadConnection> {
        self.roads
            .values()
            .find(|road| road.to_intersection == to_intersection)
    }

    /// Insert a road; the entity store validates ids before calling this.
    /// Returns false if the road id is already taken.
    pub(crate) fn insert_road(&mut self, road_id: RoadId, road: RoadConnection) -> bool {
        if self.roads.contains_key(&road_id) {
            return false;
        }
        self.roads.insert(road_id, road);
        true
    }
}
