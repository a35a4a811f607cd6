use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::time::Duration;

use traffic_cams::simulation::{
    demo_grid, entry_cells, SimConfig, SimWorld, SimulationScheduler, SimulationStats, TurnPolicy,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TurnPolicyArg {
    Random,
    StraightFirst,
}

impl From<TurnPolicyArg> for TurnPolicy {
    fn from(arg: TurnPolicyArg) -> Self {
        match arg {
            TurnPolicyArg::Random => TurnPolicy::Random,
            TurnPolicyArg::StraightFirst => TurnPolicy::StraightFirst,
        }
    }
}

#[derive(Parser)]
#[command(name = "traffic_cams")]
#[command(about = "Grid traffic simulation with vehicle-counting cameras")]
struct Cli {
    /// Number of simulation ticks to run
    #[arg(long, default_value = "1000")]
    ticks: u64,

    /// Cells per side of the road grid
    #[arg(long, default_value = "16")]
    grid_size: usize,

    /// World units per cell
    #[arg(long, default_value = "40.0")]
    cell_size: f32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Tick period in milliseconds (realtime mode)
    #[arg(long, default_value = "50")]
    interval_ms: u64,

    /// Drive the simulation from the background scheduler instead of a plain loop
    #[arg(long)]
    realtime: bool,

    #[arg(long, value_enum, default_value = "random")]
    turn_policy: TurnPolicyArg,

    /// Print the map and a summary every N ticks (0 = only at the end)
    #[arg(long, default_value = "0")]
    map_every: u64,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig {
            grid_size: self.grid_size,
            cell_size: self.cell_size,
            tick_interval: Duration::from_millis(self.interval_ms),
            turn_policy: self.turn_policy.into(),
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate().context("Invalid simulation settings")?;

    let stats = if cli.realtime {
        let runtime = tokio::runtime::Runtime::new().context("Failed to start the tokio runtime")?;
        runtime.block_on(run_realtime(config, cli.ticks))?
    } else {
        run_headless(config, cli.ticks, cli.map_every)?
    };

    stats.log_summary();
    Ok(())
}

/// Run the simulation in a plain loop, as fast as possible
fn run_headless(config: SimConfig, ticks: u64, map_every: u64) -> Result<SimulationStats> {
    info!("Running traffic simulation in headless mode for {} ticks", ticks);

    let mut world = SimWorld::with_demo_layout(config)?;
    world.start();

    println!("Initial state:");
    world.print_summary();
    world.draw_map();

    for tick in 1..=ticks {
        world.tick();

        if map_every > 0 && tick % map_every == 0 {
            println!("--- After tick {} ---", tick);
            world.print_summary();
            world.draw_map();
        }
    }

    println!("=== Final State ===");
    world.print_summary();
    world.draw_map();

    let stats = world.stats().clone();
    world.stop();
    Ok(stats)
}

/// Run the simulation on the background scheduler for `ticks` tick periods
async fn run_realtime(config: SimConfig, ticks: u64) -> Result<SimulationStats> {
    let period = config.tick_interval;
    let grid_size = config.grid_size;
    let (mut scheduler, mut observers) = SimulationScheduler::with_channels(config)?;

    scheduler.set_entry_cells(entry_cells(grid_size)).await;
    scheduler.set_cells(demo_grid(grid_size)).await;

    info!("Running traffic simulation in realtime mode, {:?} per tick", period);
    scheduler.start().await;

    let listener = tokio::spawn(async move {
        let (mut cars, mut trucks) = (0u32, 0u32);
        loop {
            tokio::select! {
                Some(camera) = observers.cars_detected.recv() => {
                    cars += 1;
                    info!("Camera {} counted a car", camera.get());
                }
                Some(camera) = observers.trucks_detected.recv() => {
                    trucks += 1;
                    info!("Camera {} counted a truck", camera.get());
                }
                else => break,
            }
        }
        (cars, trucks)
    });

    let run_time = period.saturating_mul(u32::try_from(ticks).unwrap_or(u32::MAX));
    tokio::time::sleep(run_time).await;

    let world = scheduler.world();
    let stats = world.lock().await.stats().clone();
    scheduler.stop().await;

    // Dropping the scheduler closes the detection channels and ends the listener
    drop(scheduler);
    let (cars, trucks) = listener.await.context("Detection listener failed")?;
    info!("Detections received: {} cars, {} trucks", cars, trucks);

    Ok(stats)
}
