use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::sync::Arc;
use std::time::Duration;

use green_wave::simulation::{
    grid_junction_id, read_store, DemoSource, EventKind, EventRecorder, LogSubscriber, Position,
    SignalPlan, StaticTopology, SystemConfig, TrafficLightState, TrafficSystem,
};

#[derive(Parser)]
#[command(name = "green_wave")]
#[command(about = "Green wave traffic light coordination over a demo network")]
struct Cli {
    /// Number of ticks to run before stopping
    #[arg(long, default_value = "20")]
    ticks: u64,

    /// Simulated seconds per tick
    #[arg(long, default_value = "5.0")]
    update_frequency: f64,

    /// Wall-clock pause between ticks in milliseconds
    #[arg(long, default_value = "100")]
    tick_interval_ms: u64,

    /// Signal cycle length in seconds
    #[arg(long, default_value = "90.0")]
    cycle: f64,

    /// Green window per cycle in seconds
    #[arg(long, default_value = "45.0")]
    green: f64,

    /// Junctions per side of the square demo grid
    #[arg(long, default_value = "3")]
    grid: usize,

    /// Distance between neighboring junctions in meters
    #[arg(long, default_value = "100.0")]
    spacing: f64,

    /// Seed for the demo traffic
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Write scheduled phases back into the demo source
    #[arg(long)]
    push_phases: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let plan = SignalPlan::new(cli.cycle, cli.green).context("Invalid signal plan")?;

    let mut lights = Vec::new();
    for row in 0..cli.grid {
        for col in 0..cli.grid {
            lights.push((
                grid_junction_id(row, col),
                Position::new(col as f64 * cli.spacing, row as f64 * cli.spacing),
            ));
        }
    }

    let source = DemoSource::new(cli.seed, lights);
    let topology = StaticTopology::grid(cli.grid, cli.grid, cli.spacing);
    let config = SystemConfig::new()
        .with_update_frequency(cli.update_frequency)
        .context("Invalid update frequency")?
        .with_tick_interval(Duration::from_millis(cli.tick_interval_ms))
        .with_signal_plan(plan)
        .with_push_phases(cli.push_phases)
        .with_max_ticks(cli.ticks);

    info!(
        "Running green wave over a {}x{} grid for {} ticks",
        cli.grid, cli.grid, cli.ticks
    );

    let mut system = TrafficSystem::new(source, topology, config);
    let recorder = EventRecorder::new();
    let bus = system.event_bus();
    bus.subscribe(Arc::new(LogSubscriber));
    bus.subscribe(recorder.clone());

    system.run().context("Traffic system run failed")?;

    for (id, offset) in system.schedule().ordered_by_offset() {
        info!("Offset {:>6.2}s  {}", offset, id);
    }

    let store = system.store();
    let store = read_store(&store).context("Could not read entity store")?;
    let summary = store.summary();
    let green = store
        .all_traffic_lights()
        .iter()
        .filter(|light| light.state == TrafficLightState::Green)
        .count();

    info!("=== SIMULATION COMPLETE ===");
    info!("Simulated time: {:.1}s", system.simulation_time());
    info!("Ticks: {}", system.tick_count());
    info!("Intersections: {}", summary.intersections);
    info!("Road connections: {}", summary.road_connections);
    info!("Traffic lights: {} ({} green)", summary.traffic_lights, green);
    info!("Vehicles: {}", summary.vehicles);
    info!(
        "Light changes: {}",
        recorder.count(EventKind::TrafficLightChange)
    );
    Ok(())
}
