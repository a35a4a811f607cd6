//! Tunable parameters of a simulation run

use anyhow::{bail, Result};
use std::time::Duration;

use super::types::{GridGeometry, MAX_GRID_SIZE, MIN_GRID_SIZE};

/// How a vehicle picks an exit when a junction offers more than one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPolicy {
    /// Uniform choice among the legal exits
    #[default]
    Random,
    /// Straight ahead if possible, otherwise right, otherwise left
    StraightFirst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Cells per side of the user grid
    pub grid_size: usize,
    /// World units per cell
    pub cell_size: f32,
    /// Period of the background tick
    pub tick_interval: Duration,
    /// Pause between disarming the tick and clearing state on stop
    pub drain_delay: Duration,
    /// World units per tick
    pub car_speed: f32,
    pub truck_speed: f32,
    /// Ticks a vehicle may stay blocked before it turns back
    pub max_stop_ticks: u32,
    pub turn_policy: TurnPolicy,
    /// Seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: 16,
            cell_size: 40.0,
            tick_interval: Duration::from_millis(50),
            drain_delay: Duration::from_millis(100),
            car_speed: 2.0,
            truck_speed: 1.5,
            max_stop_ticks: 120,
            turn_policy: TurnPolicy::Random,
            seed: None,
        }
    }
}

impl SimConfig {
    pub fn geometry(&self) -> GridGeometry {
        GridGeometry::new(self.grid_size, self.cell_size)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.grid_size) {
            bail!(
                "Grid size {} is outside {}..={}",
                self.grid_size,
                MIN_GRID_SIZE,
                MAX_GRID_SIZE
            );
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            bail!("Cell size must be positive, got {}", self.cell_size);
        }
        if !is_positive(self.car_speed) || !is_positive(self.truck_speed) {
            bail!(
                "Vehicle speeds must be positive (car {}, truck {})",
                self.car_speed,
                self.truck_speed
            );
        }
        if self.tick_interval.is_zero() {
            bail!("Tick interval must be non-zero");
        }
        Ok(())
    }
}

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
