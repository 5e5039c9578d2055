//! Green wave coordination core
//!
//! This module contains the entity store, the live synchronizer for an
//! external traffic simulator, corridor discovery, offset scheduling and
//! the control loop. None of it simulates vehicles; that is the job of
//! the [`SimulationSource`] it is connected to.

mod corridor;
mod error;
mod events;
mod intersection;
mod phase;
mod road_graph;
mod scheduler;
mod source;
mod statistics;
mod store;
mod sync;
mod system;
mod topology;
mod traffic_light;
mod types;
mod vehicle;

pub use corridor::find_main_corridors;
pub use error::{EntityKind, Error, ErrorCode, Result};
pub use events::{
    Event, EventBus, EventKind, EventPayload, EventRecorder, LogSubscriber, Subscriber,
};
pub use intersection::{Intersection, RoadConnection};
pub use phase::{apply_phases, local_cycle_time, phase_state, PhaseChange};
pub use road_graph::RoadGraph;
pub use scheduler::{GreenWaveScheduler, OffsetSchedule, SignalPlan};
pub use source::{DemoSource, ScriptedSource, SimulationSource, Snapshot};
pub use statistics::{AverageWaitingTimes, IntersectionStatistics};
pub use store::{read_store, write_store, EntityStore, SharedStore, StoreSummary};
pub use sync::{full_sync, incremental_sync, incremental_sync_with, SyncReport};
pub use system::{StopHandle, SystemConfig, SystemState, TrafficSystem};
pub use topology::{
    grid_junction_id, load_topology, IntersectionRecord, LoadReport, RoadRecord, StaticTopology,
    Topology, TopologySource, TrafficLightRecord,
};
pub use traffic_light::TrafficLight;
pub use types::{
    GreenWaveCorridor, Position, RoadId, TrafficLightDurations, TrafficLightState, VehicleRole,
    VehicleType, DEFAULT_CYCLE_LENGTH, DEFAULT_GREEN_DURATION, DEFAULT_TARGET_SPEED,
};
pub use vehicle::Vehicle;
