//! Static network topology and its loading into the entity store
//!
//! Parsing map files is the job of an external collaborator; it hands over
//! plain [`Topology`] records through the [`TopologySource`] trait.

use log::{info, warn};

use super::error::{Error, Result};
use super::events::{Event, EventBus, EventKind, EventPayload};
use super::intersection::{Intersection, RoadConnection};
use super::store::{write_store, SharedStore};
use super::traffic_light::TrafficLight;
use super::types::{Position, RoadId};

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionRecord {
    pub id: String,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLightRecord {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoadRecord {
    pub from: String,
    pub to: String,
    /// Meters
    pub distance: f64,
    /// Controlling light; the destination intersection's id when absent
    pub traffic_light: Option<String>,
}

/// Everything a static network description provides
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Topology {
    pub intersections: Vec<IntersectionRecord>,
    pub traffic_lights: Vec<TrafficLightRecord>,
    pub roads: Vec<RoadRecord>,
}

impl Topology {
    pub fn record_count(&self) -> usize {
        self.intersections.len() + self.traffic_lights.len() + self.roads.len()
    }

    /// Reject records that could never describe a real network
    pub fn validate(&self) -> Result<()> {
        for record in &self.intersections {
            if record.id.is_empty() {
                return Err(Error::Parsing("intersection record without id".to_string()));
            }
            if !record.position.x.is_finite() || !record.position.y.is_finite() {
                return Err(Error::Parsing(format!(
                    "intersection {} has a non-finite position",
                    record.id
                )));
            }
        }
        if self.traffic_lights.iter().any(|record| record.id.is_empty()) {
            return Err(Error::Parsing("traffic light record without id".to_string()));
        }
        for road in &self.roads {
            if road.from.is_empty() || road.to.is_empty() {
                return Err(Error::Parsing("road record without endpoints".to_string()));
            }
            if !road.distance.is_finite() || road.distance < 0.0 {
                return Err(Error::Parsing(format!(
                    "road {} -> {} has invalid length {}",
                    road.from, road.to, road.distance
                )));
            }
        }
        Ok(())
    }
}

/// Produces the static topology of the network
pub trait TopologySource: Send {
    fn topology(&self) -> Result<Topology>;
}

/// Topology described in code
#[derive(Debug, Clone, Default)]
pub struct StaticTopology {
    topology: Topology,
}

impl StaticTopology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intersection(mut self, id: impl Into<String>, position: Position) -> Self {
        self.topology.intersections.push(IntersectionRecord {
            id: id.into(),
            position,
        });
        self
    }

    pub fn with_traffic_light(mut self, id: impl Into<String>) -> Self {
        self.topology
            .traffic_lights
            .push(TrafficLightRecord { id: id.into() });
        self
    }

    /// Signalised junction: an intersection plus a light with the same id
    pub fn with_junction(self, id: impl Into<String>, position: Position) -> Self {
        let id = id.into();
        self.with_intersection(id.clone(), position)
            .with_traffic_light(id)
    }

    pub fn with_road(mut self, from: impl Into<String>, to: impl Into<String>, distance: f64) -> Self {
        self.topology.roads.push(RoadRecord {
            from: from.into(),
            to: to.into(),
            distance,
            traffic_light: None,
        });
        self
    }

    pub fn with_controlled_road(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        distance: f64,
        traffic_light: impl Into<String>,
    ) -> Self {
        self.topology.roads.push(RoadRecord {
            from: from.into(),
            to: to.into(),
            distance,
            traffic_light: Some(traffic_light.into()),
        });
        self
    }

    pub fn with_two_way_road(self, a: impl Into<String>, b: impl Into<String>, distance: f64) -> Self {
        let a = a.into();
        let b = b.into();
        self.with_road(a.clone(), b.clone(), distance)
            .with_road(b, a, distance)
    }

    /// A `rows` x `cols` grid of signalised junctions `J{row}_{col}`,
    /// neighbors joined by two-way roads `spacing` meters long
    pub fn grid(rows: usize, cols: usize, spacing: f64) -> Self {
        let mut topology = Self::new();
        for row in 0..rows {
            for col in 0..cols {
                topology = topology.with_junction(
                    grid_junction_id(row, col),
                    Position::new(col as f64 * spacing, row as f64 * spacing),
                );
            }
        }
        for row in 0..rows {
            for col in 0..cols {
                if col + 1 < cols {
                    topology = topology.with_two_way_road(
                        grid_junction_id(row, col),
                        grid_junction_id(row, col + 1),
                        spacing,
                    );
                }
                if row + 1 < rows {
                    topology = topology.with_two_way_road(
                        grid_junction_id(row, col),
                        grid_junction_id(row + 1, col),
                        spacing,
                    );
                }
            }
        }
        topology
    }

    pub fn records(&self) -> &Topology {
        &self.topology
    }
}

pub fn grid_junction_id(row: usize, col: usize) -> String {
    format!("J{row}_{col}")
}

impl TopologySource for StaticTopology {
    fn topology(&self) -> Result<Topology> {
        Ok(self.topology.clone())
    }
}

/// What [`load_topology`] did with the records it was given
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub intersections_created: usize,
    /// Existing intersections whose position was refined
    pub intersections_updated: usize,
    pub traffic_lights_created: usize,
    pub roads_added: usize,
    pub roads_skipped: usize,
}

/// Apply topology records to the store, reporting progress on `bus`.
///
/// Validation failures return `Parsing` without emitting any event, so a
/// `LOADING_START` is always followed by `LOADING_COMPLETE` unless the store
/// itself fails.
///
/// The store lock is held only while a single record is applied, never
/// while events are delivered.
pub fn load_topology(store: &SharedStore, topology: &Topology, bus: &EventBus) -> Result<LoadReport> {
    topology.validate()?;
    bus.notify(
        EventKind::LoadingStart,
        format!("Loading {} topology records", topology.record_count()),
    );

    let total = topology.record_count();
    let mut done = 0usize;
    let mut report = LoadReport::default();
    let mut next_road_id: RoadId = 1;

    let progress = |done: usize| {
        let ratio = if total == 0 {
            1.0
        } else {
            done as f32 / total as f32
        };
        bus.emit(
            Event::new(EventKind::LoadingProgress, format!("{done}/{total} records"))
                .with_payload(EventPayload::Progress(ratio.clamp(0.0, 1.0))),
        );
    };

    if total == 0 {
        progress(0);
    }

    for record in &topology.intersections {
        {
            let mut store = write_store(store)?;
            match store.get_intersection_mut(&record.id) {
                Some(existing) => {
                    existing.position = record.position;
                    report.intersections_updated += 1;
                }
                None => {
                    store.add_intersection(Intersection::new(record.id.clone(), record.position))?;
                    report.intersections_created += 1;
                }
            }
        }
        done += 1;
        progress(done);
    }

    for record in &topology.traffic_lights {
        {
            let mut store = write_store(store)?;
            if store.get_traffic_light(&record.id).is_none() {
                store.add_traffic_light(TrafficLight::new(record.id.clone()))?;
                report.traffic_lights_created += 1;
            }
        }
        done += 1;
        progress(done);
    }

    for road in &topology.roads {
        {
            let mut store = write_store(store)?;
            let light_id = road.traffic_light.as_deref().unwrap_or(&road.to);
            let connection = RoadConnection::new(road.to.clone(), light_id, road.distance);
            match store.add_road_connection(&road.from, next_road_id, connection) {
                Ok(()) => {
                    next_road_id += 1;
                    report.roads_added += 1;
                }
                Err(e) => {
                    warn!("Skipping road {} -> {}: {}", road.from, road.to, e);
                    report.roads_skipped += 1;
                }
            }
        }
        done += 1;
        progress(done);
    }

    info!(
        "Topology loaded: {} intersections ({} refined), {} lights, {} roads ({} skipped)",
        report.intersections_created,
        report.intersections_updated,
        report.traffic_lights_created,
        report.roads_added,
        report.roads_skipped
    );
    bus.notify(
        EventKind::LoadingComplete,
        format!(
            "Loaded {} intersections and {} roads",
            report.intersections_created + report.intersections_updated,
            report.roads_added
        ),
    );
    Ok(report)
}
