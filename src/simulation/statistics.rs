//! Per-intersection traffic statistics

/// Average waiting times at an intersection, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AverageWaitingTimes {
    pub vehicles: f64,
    pub pedestrians: f64,
}

/// Cumulative pass counts and waiting times for one intersection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionStatistics {
    vehicles_passed: usize,
    vehicle_waiting: f64,
    pedestrians_passed: usize,
    pedestrian_waiting: f64,
}

impl IntersectionStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a vehicle that waited `waiting_time` seconds before passing
    pub fn add_vehicle_pass(&mut self, waiting_time: f64) {
        self.vehicles_passed += 1;
        self.vehicle_waiting += waiting_time;
    }

    pub fn total_vehicles_passed(&self) -> usize {
        self.vehicles_passed
    }

    pub fn total_vehicle_waiting_time(&self) -> f64 {
        self.vehicle_waiting
    }

    pub fn average_vehicle_waiting_time(&self) -> f64 {
        average(self.vehicle_waiting, self.vehicles_passed)
    }

    /// Record a pedestrian that waited `waiting_time` seconds before crossing
    pub fn add_pedestrian_pass(&mut self, waiting_time: f64) {
        self.pedestrians_passed += 1;
        self.pedestrian_waiting += waiting_time;
    }

    pub fn total_pedestrians_passed(&self) -> usize {
        self.pedestrians_passed
    }

    pub fn total_pedestrian_waiting_time(&self) -> f64 {
        self.pedestrian_waiting
    }

    pub fn average_pedestrian_waiting_time(&self) -> f64 {
        average(self.pedestrian_waiting, self.pedestrians_passed)
    }

    pub fn average_waiting_times(&self) -> AverageWaitingTimes {
        AverageWaitingTimes {
            vehicles: self.average_vehicle_waiting_time(),
            pedestrians: self.average_pedestrian_waiting_time(),
        }
    }
}

fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}
