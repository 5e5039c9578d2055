//! The external, continuously stepping traffic source
//!
//! The coordinator never simulates vehicles itself. It pulls snapshots
//! from a [`SimulationSource`] once per tick and mirrors them into the
//! entity store. Two in-memory sources are provided: a scripted one that
//! replays fixed snapshots, and a seeded random demo source.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use super::error::{Error, Result};
use super::types::Position;

/// Interface to the external microscopic simulator
///
/// Every query fails with [`Error::NotRunning`] before `start` or after `stop`.
pub trait SimulationSource: Send {
    fn start(&mut self) -> Result<()>;
    fn step(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;

    fn vehicle_ids(&self) -> Result<Vec<String>>;
    fn vehicle_position(&self, vehicle_id: &str) -> Result<Position>;
    fn traffic_light_ids(&self) -> Result<Vec<String>>;
    /// Raw signal string, e.g. `"rGrG"`
    fn traffic_light_state(&self, light_id: &str) -> Result<String>;

    /// Push a signal string back into the source. Optional.
    fn set_traffic_light_state(&mut self, light_id: &str, _state: &str) -> Result<()> {
        Err(Error::Unknown(format!(
            "source does not accept traffic light states (light {light_id})"
        )))
    }

    /// External vehicle class, if the source reports one
    fn vehicle_type(&self, _vehicle_id: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

/// One frame of a [`ScriptedSource`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub traffic_lights: BTreeMap<String, String>,
    pub vehicles: BTreeMap<String, Position>,
    pub vehicle_types: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_traffic_light(mut self, id: impl Into<String>, state: impl Into<String>) -> Self {
        self.traffic_lights.insert(id.into(), state.into());
        self
    }

    pub fn with_vehicle(mut self, id: impl Into<String>, position: Position) -> Self {
        self.vehicles.insert(id.into(), position);
        self
    }

    pub fn with_vehicle_type(mut self, id: impl Into<String>, class: impl Into<String>) -> Self {
        self.vehicle_types.insert(id.into(), class.into());
        self
    }
}

/// Replays a fixed list of snapshots, one per step
///
/// Stepping past the last frame keeps the last frame.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    frames: Vec<Snapshot>,
    frame: usize,
    running: bool,
    steps: u64,
    fail_at_step: Option<u64>,
    fail_on_start: bool,
    writes: Vec<(String, String)>,
}

impl ScriptedSource {
    pub fn new(first: Snapshot) -> Self {
        Self::from_frames(vec![first])
    }

    pub fn from_frames(frames: Vec<Snapshot>) -> Self {
        Self {
            frames,
            ..Self::default()
        }
    }

    pub fn push_frame(&mut self, frame: Snapshot) {
        self.frames.push(frame);
    }

    /// Make the n-th call to `step` (1-based) fail
    pub fn fail_at_step(mut self, step: u64) -> Self {
        self.fail_at_step = Some(step);
        self
    }

    /// Make `start` fail
    pub fn fail_on_start(mut self) -> Self {
        self.fail_on_start = true;
        self
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Every `set_traffic_light_state` call, in order
    pub fn written_states(&self) -> &[(String, String)] {
        &self.writes
    }

    fn current(&self, action: &str) -> Result<&Snapshot> {
        if !self.running {
            return Err(Error::NotRunning(format!("cannot {action}")));
        }
        self.frames
            .get(self.frame)
            .ok_or_else(|| Error::Unknown("scripted source has no frames".to_string()))
    }
}

impl SimulationSource for ScriptedSource {
    fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(Error::AlreadyRunning);
        }
        if self.fail_on_start {
            return Err(Error::Unknown("scripted start failure".to_string()));
        }
        self.running = true;
        self.frame = 0;
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        if !self.running {
            return Err(Error::NotRunning("cannot step".to_string()));
        }
        self.steps += 1;
        if self.fail_at_step == Some(self.steps) {
            return Err(Error::Unknown(format!("scripted failure at step {}", self.steps)));
        }
        if self.frame + 1 < self.frames.len() {
            self.frame += 1;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if !self.running {
            return Err(Error::NotRunning("cannot stop".to_string()));
        }
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn vehicle_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .current("retrieve vehicles")?
            .vehicles
            .keys()
            .cloned()
            .collect())
    }

    fn vehicle_position(&self, vehicle_id: &str) -> Result<Position> {
        self.current("retrieve position")?
            .vehicles
            .get(vehicle_id)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown vehicle {vehicle_id}")))
    }

    fn traffic_light_ids(&self) -> Result<Vec<String>> {
        Ok(self
            .current("retrieve traffic lights")?
            .traffic_lights
            .keys()
            .cloned()
            .collect())
    }

    fn traffic_light_state(&self, light_id: &str) -> Result<String> {
        self.current("retrieve traffic light state")?
            .traffic_lights
            .get(light_id)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(format!("unknown traffic light {light_id}")))
    }

    fn set_traffic_light_state(&mut self, light_id: &str, state: &str) -> Result<()> {
        if !self.running {
            return Err(Error::NotRunning("cannot set traffic light state".to_string()));
        }
        let frame = self
            .frames
            .get_mut(self.frame)
            .ok_or_else(|| Error::Unknown("scripted source has no frames".to_string()))?;
        let slot = frame
            .traffic_lights
            .get_mut(light_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown traffic light {light_id}")))?;
        *slot = state.to_string();
        self.writes.push((light_id.to_string(), state.to_string()));
        Ok(())
    }

    fn vehicle_type(&self, vehicle_id: &str) -> Result<Option<String>> {
        Ok(self
            .current("get vehicle type")?
            .vehicle_types
            .get(vehicle_id)
            .cloned())
    }
}

/// Chance per step that a new vehicle enters the demo network
const DEMO_SPAWN_CHANCE: f64 = 0.4;
/// Chance per step that an existing vehicle leaves
const DEMO_DESPAWN_CHANCE: f64 = 0.05;
/// Steps each demo signal phase is held
const DEMO_PHASE_STEPS: u64 = 6;
const DEMO_PHASES: [&str; 4] = ["GGrr", "yyrr", "rrGG", "rryy"];

#[derive(Debug, Clone)]
struct DemoVehicle {
    position: Position,
    velocity: (f64, f64),
    class: &'static str,
}

/// Seeded random traffic over a fixed set of signalised junctions
#[derive(Debug)]
pub struct DemoSource {
    rng: StdRng,
    lights: Vec<(String, Position)>,
    overrides: BTreeMap<String, String>,
    vehicles: BTreeMap<String, DemoVehicle>,
    next_vehicle: u64,
    steps: u64,
    running: bool,
}

impl DemoSource {
    pub fn new(seed: u64, lights: Vec<(String, Position)>) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            lights,
            overrides: BTreeMap::new(),
            vehicles: BTreeMap::new(),
            next_vehicle: 0,
            steps: 0,
            running: false,
        }
    }

    pub fn step_count(&self) -> u64 {
        self.steps
    }

    fn ensure_running(&self, action: &str) -> Result<()> {
        if !self.running {
            return Err(Error::NotRunning(format!("cannot {action}")));
        }
        Ok(())
    }

    fn spawn_vehicle(&mut self) {
        if self.lights.is_empty() {
            return;
        }
        let index = self.rng.random_range(0..self.lights.len());
        let origin = self.lights[index].1;
        let speed = self.rng.random_range(8.0..16.0);
        let velocity = if self.rng.random_bool(0.5) {
            (speed, 0.0)
        } else {
            (0.0, speed)
        };
        let class = match self.rng.random_range(0..10) {
            0 => "truck",
            1 => "bus",
            2 => "emergency",
            _ => "passenger",
        };
        let id = format!("veh{}", self.next_vehicle);
        self.next_vehicle += 1;
        self.vehicles.insert(
            id,
            DemoVehicle {
                position: origin,
                velocity,
                class,
            },
        );
    }
}

impl SimulationSource for DemoSource {
    fn start(&mut self) -> Result<()> {
        if self.running {
            return Err(Error::AlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.ensure_running("step")?;
        self.steps += 1;
        self.overrides.clear();

        for vehicle in self.vehicles.values_mut() {
            vehicle.position.x += vehicle.velocity.0;
            vehicle.position.y += vehicle.velocity.1;
        }

        let leaving: Vec<String> = self
            .vehicles
            .keys()
            .filter(|_| self.rng.random_bool(DEMO_DESPAWN_CHANCE))
            .cloned()
            .collect();
        for id in leaving {
            self.vehicles.remove(&id);
        }

        if self.rng.random_bool(DEMO_SPAWN_CHANCE) {
            self.spawn_vehicle();
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.ensure_running("stop")?;
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn vehicle_ids(&self) -> Result<Vec<String>> {
        self.ensure_running("retrieve vehicles")?;
        Ok(self.vehicles.keys().cloned().collect())
    }

    fn vehicle_position(&self, vehicle_id: &str) -> Result<Position> {
        self.ensure_running("retrieve position")?;
        self.vehicles
            .get(vehicle_id)
            .map(|vehicle| vehicle.position)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown vehicle {vehicle_id}")))
    }

    fn traffic_light_ids(&self) -> Result<Vec<String>> {
        self.ensure_running("retrieve traffic lights")?;
        Ok(self.lights.iter().map(|(id, _)| id.clone()).collect())
    }

    fn traffic_light_state(&self, light_id: &str) -> Result<String> {
        self.ensure_running("retrieve traffic light state")?;
        if let Some(state) = self.overrides.get(light_id) {
            return Ok(state.clone());
        }
        let index = self
            .lights
            .iter()
            .position(|(id, _)| id == light_id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown traffic light {light_id}")))?;
        // Stagger junctions so they do not all switch together
        let phase = (self.steps / DEMO_PHASE_STEPS + index as u64) as usize % DEMO_PHASES.len();
        Ok(DEMO_PHASES[phase].to_string())
    }

    fn set_traffic_light_state(&mut self, light_id: &str, state: &str) -> Result<()> {
        self.ensure_running("set traffic light state")?;
        if !self.lights.iter().any(|(id, _)| id == light_id) {
            return Err(Error::InvalidArgument(format!("unknown traffic light {light_id}")));
        }
        self.overrides
            .insert(light_id.to_string(), state.to_string());
        Ok(())
    }

    fn vehicle_type(&self, vehicle_id: &str) -> Result<Option<String>> {
        self.ensure_running("get vehicle type")?;
        Ok(self
            .vehicles
            .get(vehicle_id)
            .map(|vehicle| vehicle.class.to_string()))
    }
}
