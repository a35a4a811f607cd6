//! Background tick loop
//!
//! The scheduler owns a `SimWorld` behind an async mutex and drives it from a
//! single tokio task. The mutex is held for exactly one tick, so `stop` can
//! never clear state while a tick is half done.

use anyhow::Result;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::config::SimConfig;
use super::events::{self, Notifier, SimulationObservers};
use super::types::Cell;
use super::world::SimWorld;

struct TickTask {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

pub struct SimulationScheduler {
    world: Arc<Mutex<SimWorld>>,
    notifier: Arc<Notifier>,
    tick_interval: Duration,
    drain_delay: Duration,
    task: Option<TickTask>,
}

impl SimulationScheduler {
    pub fn new(config: SimConfig, notifier: Notifier) -> Result<Self> {
        let tick_interval = config.tick_interval;
        let drain_delay = config.drain_delay;
        let world = SimWorld::new(config)?;

        Ok(Self {
            world: Arc::new(Mutex::new(world)),
            notifier: Arc::new(notifier),
            tick_interval,
            drain_delay,
            task: None,
        })
    }

    /// A scheduler together with the observers listening to it
    pub fn with_channels(config: SimConfig) -> Result<(Self, SimulationObservers)> {
        let (notifier, observers) = events::channels();
        let scheduler = Self::new(config, notifier)?;
        Ok((scheduler, observers))
    }

    /// Shared handle to the world, for inspection between ticks
    pub fn world(&self) -> Arc<Mutex<SimWorld>> {
        Arc::clone(&self.world)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    pub async fn set_cells(&self, cells: Vec<Cell>) {
        self.world.lock().await.set_cells(cells);
    }

    pub async fn set_entry_cells(&self, cells: Vec<Cell>) {
        self.world.lock().await.set_entry_cells(cells);
    }

    /// Rebuilds the world from the latest snapshots and arms the tick.
    /// Does nothing while already running.
    pub async fn start(&mut self) {
        if self.task.is_some() {
            debug!("Scheduler already running");
            return;
        }

        {
            let mut world = self.world.lock().await;
            world.start();
            self.notifier.vehicles(world.snapshot());
        }
        self.notifier.simulating(true);

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_ticks(
            Arc::clone(&self.world),
            Arc::clone(&self.notifier),
            self.tick_interval,
            shutdown_rx,
        ));
        self.task = Some(TickTask {
            shutdown: shutdown_tx,
            handle,
        });
        info!("Scheduler started, ticking every {:?}", self.tick_interval);
    }

    /// Disarms the tick, waits out the drain delay, then clears the world.
    /// Does nothing while idle.
    pub async fn stop(&mut self) {
        let Some(task) = self.task.take() else {
            debug!("Scheduler already idle");
            return;
        };

        // The task may already be gone, in which case there is nothing to signal
        let _ = task.shutdown.send(());
        if let Err(err) = task.handle.await {
            warn!("Tick task ended abnormally: {}", err);
        }

        time::sleep(self.drain_delay).await;

        self.world.lock().await.stop();
        self.notifier.vehicles(Vec::new());
        self.notifier.simulating(false);
        info!("Scheduler stopped");
    }
}

impl Drop for SimulationScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.handle.abort();
        }
    }
}

async fn run_ticks(
    world: Arc<Mutex<SimWorld>>,
    notifier: Arc<Notifier>,
    period: Duration,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = interval.tick() => {
                let mut world = world.lock().await;
                let report = world.tick();
                notifier.detections(&report.detections);
                notifier.vehicles(world.snapshot());
            }
        }
    }
    debug!("Tick task finished");
}
