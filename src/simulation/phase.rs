//! Applies the offset schedule to traffic lights at a given simulation time

use log::debug;

use super::scheduler::{OffsetSchedule, SignalPlan};
use super::store::EntityStore;
use super::types::TrafficLightState;

/// A light that switched state during [`apply_phases`]
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseChange {
    pub intersection_id: String,
    pub state: TrafficLightState,
    /// Seconds into the intersection's own cycle
    pub local_time: f64,
}

/// Position of time `t` within a cycle shifted by `offset`, always non-negative
pub fn local_cycle_time(t: f64, offset: f64, cycle_length: f64) -> f64 {
    ((t - offset) % cycle_length + cycle_length) % cycle_length
}

/// GREEN inside the green window of the shifted cycle, RED otherwise
pub fn phase_state(t: f64, offset: f64, plan: &SignalPlan) -> TrafficLightState {
    if local_cycle_time(t, offset, plan.cycle_length()) < plan.green_duration() {
        TrafficLightState::Green
    } else {
        TrafficLightState::Red
    }
}

/// Set every scheduled intersection's traffic light to GREEN or RED.
///
/// The light is looked up by the intersection's id; intersections without
/// a light are skipped. Returns the lights whose state actually changed.
pub fn apply_phases(store: &mut EntityStore, schedule: &OffsetSchedule, t: f64) -> Vec<PhaseChange> {
    let plan = schedule.plan();
    let mut changes = Vec::new();

    for (intersection_id, offset) in schedule.iter() {
        let local_time = local_cycle_time(t, offset, plan.cycle_length());
        let state = phase_state(t, offset, &plan);

        let Some(light) = store.get_traffic_light_mut(intersection_id) else {
            continue;
        };
        debug!(
            "Intersection {} local time {:.2} -> {}",
            intersection_id, local_time, state
        );
        if light.set_state(state) {
            changes.push(PhaseChange {
                intersection_id: intersection_id.to_string(),
                state,
                local_time,
            });
        }
    }

    changes
}
