//! Core types for the green wave coordinator
//!
//! These are plain value types shared by the entity store, the
//! synchronizer and the scheduler.

/// Identifier of a road connection, local to its source intersection
pub type RoadId = u32;

/// Target speed used for every discovered corridor (about 50 km/h)
pub const DEFAULT_TARGET_SPEED: f64 = 13.9;

/// Default length of one red/green cycle in seconds
pub const DEFAULT_CYCLE_LENGTH: f64 = 90.0;

/// Default green window inside one cycle in seconds
pub const DEFAULT_GREEN_DURATION: f64 = 45.0;

/// A 2D position in the simulation (meters)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// State of a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrafficLightState {
    Red,
    Yellow,
    Green,
    Walk,
    DontWalk,
    /// Flashing yellow, the light is malfunctioning or not yet observed
    #[default]
    Unknown,
}

impl TrafficLightState {
    /// Derive the logical state from an external signal string.
    ///
    /// Any green marker wins, then any red marker, everything else is yellow.
    pub fn from_signal_string(signal: &str) -> Self {
        if signal.chars().any(|c| matches!(c, 'G' | 'g')) {
            TrafficLightState::Green
        } else if signal.chars().any(|c| matches!(c, 'R' | 'r')) {
            TrafficLightState::Red
        } else {
            TrafficLightState::Yellow
        }
    }

    /// Encode as an external signal string of `len` identical signals.
    /// Only green and red have a signal character; other states return None.
    pub fn to_signal_string(self, len: usize) -> Option<String> {
        let marker = match self {
            TrafficLightState::Green => 'G',
            TrafficLightState::Red => 'r',
            _ => return None,
        };
        Some(std::iter::repeat(marker).take(len.max(1)).collect())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrafficLightState::Red => "RED",
            TrafficLightState::Yellow => "YELLOW",
            TrafficLightState::Green => "GREEN",
            TrafficLightState::Walk => "WALK",
            TrafficLightState::DontWalk => "DONT_WALK",
            TrafficLightState::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for TrafficLightState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durations (seconds) of each traffic light state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficLightDurations {
    pub red: f64,
    pub yellow: f64,
    pub green: f64,
    pub walk: f64,
    pub dont_walk: f64,
}

impl Default for TrafficLightDurations {
    fn default() -> Self {
        Self {
            red: 30.0,
            yellow: 5.0,
            green: 30.0,
            walk: 15.0,
            dont_walk: 5.0,
        }
    }
}

/// Semantic type of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleType {
    #[default]
    Car,
    Bus,
    Motorcycle,
    Truck,
    Tram,
    Scooter,
    Bicycle,
    Pedestrian,
    Emergency,
}

impl VehicleType {
    /// Interpret a vehicle class string reported by the external source
    pub fn from_external(class: &str) -> Self {
        match class {
            "passenger" => VehicleType::Car,
            "bus" | "coach" => VehicleType::Bus,
            "motorcycle" | "moped" => VehicleType::Motorcycle,
            "truck" | "trailer" | "delivery" => VehicleType::Truck,
            "tram" => VehicleType::Tram,
            "scooter" | "e_scooter" => VehicleType::Scooter,
            "bicycle" => VehicleType::Bicycle,
            "pedestrian" => VehicleType::Pedestrian,
            "emergency" => VehicleType::Emergency,
            _ => VehicleType::Car,
        }
    }
}

/// Role of a vehicle in traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VehicleRole {
    #[default]
    Normal,
    Emergency,
}

impl VehicleRole {
    pub fn from_external(role: &str) -> Self {
        match role {
            "police" | "fire" | "ambulance" => VehicleRole::Emergency,
            _ => VehicleRole::Normal,
        }
    }
}

/// An ordered chain of intersections sharing one coordinated green phase
#[derive(Debug, Clone, PartialEq)]
pub struct GreenWaveCorridor {
    pub intersection_ids: Vec<String>,
    /// Speed (m/s) a vehicle must hold to ride the wave
    pub target_speed: f64,
}

impl GreenWaveCorridor {
    pub fn new(intersection_ids: Vec<String>, target_speed: f64) -> Self {
        Self {
            intersection_ids,
            target_speed,
        }
    }

    pub fn len(&self) -> usize {
        self.intersection_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intersection_ids.is_empty()
    }
}
