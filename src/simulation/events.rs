//! Event bus for lifecycle and progress notifications
//!
//! Delivery is synchronous: every subscriber is invoked, in registration
//! order, before `emit` returns. A subscriber that blocks stalls the emitter.

use log::{debug, error, info};
use std::sync::{Arc, Mutex};

use super::types::TrafficLightState;

/// Kinds of events published by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SimulationStart,
    SimulationStep,
    SimulationEnd,
    TrafficLightChange,
    VehicleStatusChange,
    PedestrianStatusChange,
    LoadingStart,
    LoadingProgress,
    LoadingComplete,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SimulationStart => "SIMULATION_START",
            EventKind::SimulationStep => "SIMULATION_STEP",
            EventKind::SimulationEnd => "SIMULATION_END",
            EventKind::TrafficLightChange => "TRAFFIC_LIGHT_CHANGE",
            EventKind::VehicleStatusChange => "VEHICLE_STATUS_CHANGE",
            EventKind::PedestrianStatusChange => "PEDESTRIAN_STATUS_CHANGE",
            EventKind::LoadingStart => "LOADING_START",
            EventKind::LoadingProgress => "LOADING_PROGRESS",
            EventKind::LoadingComplete => "LOADING_COMPLETE",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed data attached to an event
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Completion ratio in [0, 1]
    Progress(f32),
    /// Simulation time in seconds
    Time(f64),
    /// New state of a traffic light
    LightState {
        light_id: String,
        state: TrafficLightState,
    },
    /// The run ended because of this failure
    Error(String),
}

/// A single notification
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub message: String,
    pub payload: Option<EventPayload>,
}

impl Event {
    pub fn new(kind: EventKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn progress(&self) -> Option<f32> {
        match self.payload {
            Some(EventPayload::Progress(ratio)) => Some(ratio),
            _ => None,
        }
    }

    pub fn time(&self) -> Option<f64> {
        match self.payload {
            Some(EventPayload::Time(time)) => Some(time),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.payload {
            Some(EventPayload::Error(message)) => Some(message),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error().is_some()
    }
}

/// Receives events from an [`EventBus`]
pub trait Subscriber: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> Subscriber for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

fn same_subscriber(a: &Arc<dyn Subscriber>, b: &Arc<dyn Subscriber>) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Publish/subscribe channel with identity-based registration
#[derive(Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. Returns false if it was already registered.
    pub fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if subscribers.iter().any(|s| same_subscriber(s, &subscriber)) {
            return false;
        }
        subscribers.push(subscriber);
        true
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, subscriber: &Arc<dyn Subscriber>) -> bool {
        let mut subscribers = match self.subscribers.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let before = subscribers.len();
        subscribers.retain(|s| !same_subscriber(s, subscriber));
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        match self.subscribers.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Deliver an event to every subscriber in registration order
    pub fn emit(&self, event: Event) {
        // Snapshot so subscribers may (un)subscribe while being notified
        let subscribers: Vec<Arc<dyn Subscriber>> = match self.subscribers.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for subscriber in &subscribers {
            subscriber.on_event(&event);
        }
    }

    pub fn notify(&self, kind: EventKind, message: impl Into<String>) {
        self.emit(Event::new(kind, message));
    }
}

/// Forwards every event to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSubscriber;

impl Subscriber for LogSubscriber {
    fn on_event(&self, event: &Event) {
        if let Some(message) = event.error() {
            error!("[{}] {} ({})", event.kind, event.message, message);
            return;
        }
        match event.kind {
            EventKind::SimulationStep
            | EventKind::TrafficLightChange
            | EventKind::VehicleStatusChange
            | EventKind::PedestrianStatusChange
            | EventKind::LoadingProgress => debug!("[{}] {}", event.kind, event.message),
            _ => info!("[{}] {}", event.kind, event.message),
        }
    }
}

/// Keeps a copy of every event it receives
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|event| event.kind).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events().iter().filter(|event| event.kind == kind).count()
    }
}

impl Subscriber for EventRecorder {
    fn on_event(&self, event: &Event) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}
