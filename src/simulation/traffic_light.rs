//! Traffic light entity

use super::types::{Position, TrafficLightDurations, TrafficLightState};

/// A single traffic light
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLight {
    pub id: String,
    pub state: TrafficLightState,
    pub durations: TrafficLightDurations,
    pub position: Position,
}

impl TrafficLight {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: TrafficLightState::Unknown,
            durations: TrafficLightDurations::default(),
            position: Position::default(),
        }
    }

    pub fn with_durations(mut self, durations: TrafficLightDurations) -> Self {
        self.durations = durations;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Set the state, returning true if it changed
    pub fn set_state(&mut self, state: TrafficLightState) -> bool {
        let changed = self.state != state;
        self.state = state;
        changed
    }

    /// Configured duration of a state; UNKNOWN has no duration
    pub fn duration_for(&self, state: TrafficLightState) -> Option<f64> {
        match state {
            TrafficLightState::Red => Some(self.durations.red),
            TrafficLightState::Yellow => Some(self.durations.yellow),
            TrafficLightState::Green => Some(self.durations.green),
            TrafficLightState::Walk => Some(self.durations.walk),
            TrafficLightState::DontWalk => Some(self.durations.dont_walk),
            TrafficLightState::Unknown => None,
        }
    }
}
