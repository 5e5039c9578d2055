//! Green wave offset scheduling
//!
//! Each intersection on a corridor gets the offset (seconds into the shared
//! cycle) at which its green window opens, so that a vehicle holding the
//! corridor's target speed arrives just as the light turns green.

use log::debug;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;

use super::error::{Error, Result};
use super::road_graph::RoadGraph;
use super::store::EntityStore;
use super::types::{GreenWaveCorridor, DEFAULT_CYCLE_LENGTH, DEFAULT_GREEN_DURATION};

/// Fixed-cycle signal policy shared by every coordinated intersection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalPlan {
    cycle_length: f64,
    green_duration: f64,
}

impl Default for SignalPlan {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            green_duration: DEFAULT_GREEN_DURATION,
        }
    }
}

impl SignalPlan {
    /// Requires `0 < green_duration <= cycle_length`
    pub fn new(cycle_length: f64, green_duration: f64) -> Result<Self> {
        if !cycle_length.is_finite() || !green_duration.is_finite() {
            return Err(Error::InvalidArgument(
                "signal plan durations must be finite".to_string(),
            ));
        }
        if green_duration <= 0.0 || green_duration > cycle_length {
            return Err(Error::InvalidArgument(format!(
                "green duration {green_duration}s must be in (0, {cycle_length}]"
            )));
        }
        Ok(Self {
            cycle_length,
            green_duration,
        })
    }

    pub fn cycle_length(&self) -> f64 {
        self.cycle_length
    }

    pub fn green_duration(&self) -> f64 {
        self.green_duration
    }
}

/// Per-intersection green offsets, always in `[0, cycle_length)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OffsetSchedule {
    plan: SignalPlan,
    offsets: BTreeMap<String, f64>,
}

impl OffsetSchedule {
    pub fn empty(plan: SignalPlan) -> Self {
        Self {
            plan,
            offsets: BTreeMap::new(),
        }
    }

    /// Walk each corridor accumulating travel time between consecutive
    /// intersections.
    ///
    /// A step with no direct road leaves the accumulated time unchanged.
    pub fn compute(store: &EntityStore, corridors: &[GreenWaveCorridor], plan: SignalPlan) -> Self {
        let graph = RoadGraph::from_store(store);
        let cycle = plan.cycle_length();
        let mut offsets = BTreeMap::new();

        for corridor in corridors {
            let mut accumulated = 0.0_f64;
            for (i, current) in corridor.intersection_ids.iter().enumerate() {
                offsets.insert(current.clone(), accumulated.rem_euclid(cycle));

                let Some(next) = corridor.intersection_ids.get(i + 1) else {
                    continue;
                };
                match graph.distance(current, next) {
                    Some(distance) if corridor.target_speed > 0.0 => {
                        accumulated += distance / corridor.target_speed;
                    }
                    _ => debug!("No road from {} to {}, offset not advanced", current, next),
                }
            }
        }

        Self { plan, offsets }
    }

    pub fn plan(&self) -> SignalPlan {
        self.plan
    }

    pub fn offset(&self, intersection_id: &str) -> Option<f64> {
        self.offsets.get(intersection_id).copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.offsets
            .iter()
            .map(|(id, offset)| (id.as_str(), *offset))
    }

    /// Offsets in ascending order, ties broken by intersection id
    pub fn ordered_by_offset(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .offsets
            .iter()
            .map(|(id, offset)| (id.clone(), *offset))
            .collect();
        entries.sort_by_key(|(id, offset)| (OrderedFloat(*offset), id.clone()));
        entries
    }
}

/// Holds the current schedule and replaces it wholesale on recompute
#[derive(Debug, Clone, Default)]
pub struct GreenWaveScheduler {
    schedule: OffsetSchedule,
}

impl GreenWaveScheduler {
    pub fn new(plan: SignalPlan) -> Self {
        Self {
            schedule: OffsetSchedule::empty(plan),
        }
    }

    pub fn plan(&self) -> SignalPlan {
        self.schedule.plan()
    }

    pub fn schedule(&self) -> &OffsetSchedule {
        &self.schedule
    }

    /// Recompute offsets for `corridors`, swapping in the new schedule
    pub fn recompute(&mut self, store: &EntityStore, corridors: &[GreenWaveCorridor]) -> &OffsetSchedule {
        self.schedule = OffsetSchedule::compute(store, corridors, self.plan());
        &self.schedule
    }
}
