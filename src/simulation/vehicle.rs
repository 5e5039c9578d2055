//! Vehicles mirrored from the external source

use super::types::{Position, VehicleRole, VehicleType};

/// A vehicle currently present in the external simulation
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: String,
    pub vehicle_type: VehicleType,
    pub role: VehicleRole,
    pub position: Position,
}

impl Vehicle {
    pub fn new(
        id: impl Into<String>,
        vehicle_type: VehicleType,
        role: VehicleRole,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            vehicle_type,
            role,
            position,
        }
    }

    /// A normal car, the default for vehicles first seen in a snapshot
    pub fn car(id: impl Into<String>, position: Position) -> Self {
        Self::new(id, VehicleType::Car, VehicleRole::Normal, position)
    }

    pub fn is_emergency(&self) -> bool {
        self.role == VehicleRole::Emergency || self.vehicle_type == VehicleType::Emergency
    }
}
