//! Control loop tying the source, the store and the scheduler together
//!
//! `Idle -> Starting -> Running -> Stopping -> Stopped`, or
//! `Idle -> Starting -> Failed` when start-up fails.

use log::{debug, error, info, warn};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::corridor::find_main_corridors;
use super::error::{Error, Result};
use super::events::{Event, EventBus, EventKind, EventPayload};
use super::phase::{apply_phases, PhaseChange};
use super::scheduler::{GreenWaveScheduler, OffsetSchedule, SignalPlan};
use super::source::SimulationSource;
use super::store::{read_store, write_store, EntityStore, SharedStore};
use super::sync::{full_sync, incremental_sync_with, SyncReport};
use super::topology::{load_topology, TopologySource};
use super::types::GreenWaveCorridor;

/// Lifecycle of a [`TrafficSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    Idle,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// Settings for one run of the control loop
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Simulated seconds added per tick, finite and positive
    update_frequency: f64,
    /// Wall-clock pause between ticks
    pub tick_interval: Duration,
    pub signal_plan: SignalPlan,
    /// Also write scheduled phases back into the external source
    pub push_phases_to_source: bool,
    /// Stop on its own after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            update_frequency: 5.0,
            tick_interval: Duration::from_millis(100),
            signal_plan: SignalPlan::default(),
            push_phases_to_source: false,
            max_ticks: None,
        }
    }
}

impl SystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `InvalidArgument` unless `seconds` is finite and positive
    pub fn with_update_frequency(mut self, seconds: f64) -> Result<Self> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "update frequency {seconds}s must be finite and positive"
            )));
        }
        self.update_frequency = seconds;
        Ok(self)
    }

    pub fn update_frequency(&self) -> f64 {
        self.update_frequency
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_signal_plan(mut self, plan: SignalPlan) -> Self {
        self.signal_plan = plan;
        self
    }

    pub fn with_push_phases(mut self, push: bool) -> Self {
        self.push_phases_to_source = push;
        self
    }

    pub fn with_max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }
}

/// Cooperative stop request, checked once per tick
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Drives the external source and keeps the green wave applied
pub struct TrafficSystem<S: SimulationSource, T: TopologySource> {
    config: SystemConfig,
    source: S,
    topology: T,
    store: SharedStore,
    bus: Arc<EventBus>,
    scheduler: GreenWaveScheduler,
    corridors: Vec<GreenWaveCorridor>,
    stop: StopHandle,
    state: SystemState,
    time: f64,
    ticks: u64,
}

impl<S: SimulationSource, T: TopologySource> TrafficSystem<S, T> {
    pub fn new(source: S, topology: T, config: SystemConfig) -> Self {
        let scheduler = GreenWaveScheduler::new(config.signal_plan);
        Self {
            config,
            source,
            topology,
            store: EntityStore::new().shared(),
            bus: Arc::new(EventBus::new()),
            scheduler,
            corridors: Vec::new(),
            stop: StopHandle::default(),
            state: SystemState::Idle,
            time: 0.0,
            ticks: 0,
        }
    }

    /// Use an existing store instead of a fresh one
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = store;
        self
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn simulation_time(&self) -> f64 {
        self.time
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    pub fn event_bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn request_stop(&self) {
        self.stop.request_stop();
    }

    pub fn corridors(&self) -> &[GreenWaveCorridor] {
        &self.corridors
    }

    pub fn schedule(&self) -> &OffsetSchedule {
        self.scheduler.schedule()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Run until a stop is requested (or `max_ticks` is reached).
    ///
    /// Start-up failures leave the system `Failed` without emitting any
    /// simulation event. A failure while running ends the loop and is
    /// reported on the single `SIMULATION_END` event.
    pub fn run(&mut self) -> Result<()> {
        match self.state {
            SystemState::Idle => {}
            SystemState::Stopped | SystemState::Failed => self.stop.reset(),
            _ => return Err(Error::AlreadyRunning),
        }

        self.state = SystemState::Starting;
        if let Err(e) = self.start() {
            error!("Start-up failed: {}", e);
            if self.source.is_running() {
                if let Err(stop_error) = self.source.stop() {
                    warn!("Could not stop source after failed start: {}", stop_error);
                }
            }
            self.state = SystemState::Failed;
            return Err(e);
        }

        self.state = SystemState::Running;
        let outcome = self.run_loop();
        if let Err(e) = &outcome {
            error!("Run aborted after {} ticks: {}", self.ticks, e);
        }

        self.state = SystemState::Stopping;
        let stopped = if self.source.is_running() {
            self.source.stop()
        } else {
            Ok(())
        };
        let outcome = outcome.and(stopped);

        let end = Event::new(
            EventKind::SimulationEnd,
            format!("Simulation ended after {} ticks at t={:.1}s", self.ticks, self.time),
        );
        let end = match &outcome {
            Ok(()) => end,
            Err(e) => end.with_payload(EventPayload::Error(e.to_string())),
        };
        self.bus.emit(end);

        self.state = SystemState::Stopped;
        info!("Traffic system stopped");
        outcome
    }

    fn start(&mut self) -> Result<()> {
        info!("Starting traffic system");
        self.time = 0.0;
        self.ticks = 0;
        self.source.start()?;

        let synced = {
            let mut store = write_store(&self.store)?;
            full_sync(&mut store, &self.source)?
        };
        debug!("Initial sync: {:?}", synced);

        let topology = self.topology.topology()?;
        load_topology(&self.store, &topology, &self.bus)?;

        self.establish_corridors()?;

        let summary = read_store(&self.store)?.summary();
        self.bus.notify(
            EventKind::SimulationStart,
            format!(
                "Simulation started: {} intersections, {} lights, {} vehicles, {} corridors",
                summary.intersections,
                summary.traffic_lights,
                summary.vehicles,
                self.corridors.len()
            ),
        );
        Ok(())
    }

    /// Find corridors and compute their offsets from the current graph
    pub fn establish_corridors(&mut self) -> Result<()> {
        let store = read_store(&self.store)?;
        let corridors = find_main_corridors(&store);
        let schedule = self.scheduler.recompute(&store, &corridors);
        info!(
            "Green wave: {} corridors, {} intersections scheduled",
            corridors.len(),
            schedule.len()
        );
        drop(store);
        self.corridors = corridors;
        Ok(())
    }

    fn run_loop(&mut self) -> Result<()> {
        while !self.stop.is_stop_requested() {
            if self.config.max_ticks.is_some_and(|max| self.ticks >= max) {
                break;
            }
            self.tick()?;
            std::thread::sleep(self.config.tick_interval);
            self.time += self.config.update_frequency;
        }
        Ok(())
    }

    /// One pass: step the source, mirror it, apply phases, notify
    fn tick(&mut self) -> Result<()> {
        self.source.step()?;

        let (report, changes) = {
            let mut store = write_store(&self.store)?;
            let schedule = self.scheduler.schedule();
            // Scheduled lights have a single writer: the phase applier
            let report = incremental_sync_with(&mut store, &self.source, |id| {
                schedule.offset(id).is_some()
            })?;
            let changes = apply_phases(&mut store, schedule, self.time);
            (report, changes)
        };

        if self.config.push_phases_to_source {
            self.push_phases(&changes)?;
        }

        self.notify_sync(&report);
        for change in changes {
            self.bus.emit(
                Event::new(
                    EventKind::TrafficLightChange,
                    format!("Traffic light {} -> {}", change.intersection_id, change.state),
                )
                .with_payload(EventPayload::LightState {
                    light_id: change.intersection_id,
                    state: change.state,
                }),
            );
        }

        self.ticks += 1;
        self.bus.emit(
            Event::new(EventKind::SimulationStep, format!("Step {} at t={:.1}s", self.ticks, self.time))
                .with_payload(EventPayload::Time(self.time)),
        );
        Ok(())
    }

    fn push_phases(&mut self, changes: &[PhaseChange]) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let external: BTreeSet<String> = self.source.traffic_light_ids()?.into_iter().collect();
        for change in changes {
            if !external.contains(&change.intersection_id) {
                continue;
            }
            let current = self.source.traffic_light_state(&change.intersection_id)?;
            if let Some(signal) = change.state.to_signal_string(current.chars().count()) {
                self.source
                    .set_traffic_light_state(&change.intersection_id, &signal)?;
            }
        }
        Ok(())
    }

    fn notify_sync(&self, report: &SyncReport) {
        if report.vehicles_changed() {
            self.bus.notify(
                EventKind::VehicleStatusChange,
                format!(
                    "{} vehicles entered, {} left",
                    report.vehicles_added, report.vehicles_removed
                ),
            );
        }
        if report.pedestrians_changed() {
            self.bus.notify(
                EventKind::PedestrianStatusChange,
                format!(
                    "{} pedestrians entered, {} left",
                    report.pedestrians_added, report.pedestrians_removed
                ),
            );
        }
    }
}
