//! Green Wave Coordination Library
//!
//! Keeps a road network model in sync with an external traffic simulator
//! and schedules traffic light offsets so that vehicles at a target speed
//! meet green lights along a corridor.

pub mod simulation;
