//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the whole simulation state: the latest cell snapshots, the
//! active road network, the live vehicles and cameras. It is synchronous; the
//! scheduler drives it from a background task, tests and the headless runner
//! call `tick` directly.

use anyhow::Result;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::camera::{CameraVisionTracker, Detection};
use super::collision::{self, CollisionReport};
use super::config::SimConfig;
use super::layout;
use super::road_network::{RoadNetwork, SegmentKind};
use super::spawner::SpawnController;
use super::stats::SimulationStats;
use super::types::{
    Axis, Cell, Direction, GridCoord, GridGeometry, Rect, VehicleId, VehicleKind, ENTRY_ROWS,
};
use super::vehicle::{DrivingRules, StepOutcome, Traffic, Vehicle, VehicleSnapshot};

/// Everything that happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub spawned: Option<VehicleId>,
    pub despawned: Option<VehicleId>,
    pub turned: usize,
    pub collisions: CollisionReport,
    pub detections: Vec<Detection>,
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,
    geometry: GridGeometry,

    /// Latest snapshots from the editor
    grid_cells: Vec<Cell>,
    entry_cells: Vec<Cell>,

    /// Active road segments, rebuilt on start
    pub road_network: RoadNetwork,

    /// All live vehicles
    pub vehicles: Vec<Vehicle>,

    /// Cameras and their counters
    pub cameras: CameraVisionTracker,

    spawner: SpawnController,
    rules: DrivingRules,
    exit_zone: Option<Rect>,
    is_simulating: bool,
    rng: StdRng,
    stats: SimulationStats,
}

impl SimWorld {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let geometry = config.geometry();
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            geometry,
            grid_cells: Vec::new(),
            entry_cells: Vec::new(),
            road_network: RoadNetwork::new(geometry),
            vehicles: Vec::new(),
            cameras: CameraVisionTracker::new(),
            spawner: SpawnController::new(geometry, config.car_speed, config.truck_speed),
            rules: DrivingRules {
                turn_policy: config.turn_policy,
                max_stop_ticks: config.max_stop_ticks,
            },
            exit_zone: None,
            is_simulating: false,
            rng,
            stats: SimulationStats::default(),
            config,
        })
    }

    /// A world with the standard entry board and the demo road layout
    pub fn with_demo_layout(config: SimConfig) -> Result<Self> {
        let mut world = Self::new(config)?;
        let grid_size = world.geometry.grid_size;
        world.set_entry_cells(layout::entry_cells(grid_size));
        world.set_cells(layout::demo_grid(grid_size));
        Ok(world)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn is_simulating(&self) -> bool {
        self.is_simulating
    }

    pub fn exit_zone(&self) -> Option<Rect> {
        self.exit_zone
    }

    /// Replaces the user grid snapshot. Takes effect on the next start.
    pub fn set_cells(&mut self, cells: Vec<Cell>) {
        self.grid_cells = cells;
    }

    /// Replaces the entry board snapshot. Takes effect on the next start.
    pub fn set_entry_cells(&mut self, cells: Vec<Cell>) {
        self.entry_cells = cells;
    }

    /// Rebuilds roads and cameras from the latest snapshots and starts simulating
    pub fn start(&mut self) {
        if self.is_simulating {
            return;
        }

        self.road_network.replace(&self.grid_cells, &self.entry_cells);
        self.cameras = CameraVisionTracker::from_cells(&self.grid_cells, &self.road_network);
        self.vehicles.clear();
        self.exit_zone = Some(layout::exit_zone(&self.geometry));
        self.stats = SimulationStats {
            road_segments: self.road_network.len() as u32,
            cameras: self.cameras.len() as u32,
            ..Default::default()
        };

        if !self.entry_cells.is_empty() && !self.road_network.entry_connected() {
            warn!("Entry lane is not connected to any road on the grid");
        }

        self.is_simulating = true;
        info!(
            "Simulation started: {} road segments, {} cameras",
            self.road_network.len(),
            self.cameras.len()
        );
    }

    /// Clears vehicles, cameras and roads and stops simulating
    pub fn stop(&mut self) {
        if self.is_simulating {
            info!(
                "Simulation stopped after {} ticks ({} vehicles on the road)",
                self.stats.ticks,
                self.vehicles.len()
            );
        }
        self.is_simulating = false;
        self.vehicles.clear();
        self.cameras.clear();
        self.road_network.clear();
        self.exit_zone = None;
        self.stats.active_vehicles = 0;
    }

    /// Puts a vehicle on the road outside the spawn lottery
    pub fn add_vehicle(&mut self, kind: VehicleKind, coord: GridCoord, heading: Direction) -> VehicleId {
        let id = self
            .spawner
            .spawn_at(kind, coord, heading, &mut self.vehicles);
        self.stats.record_spawn(kind);
        id
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    /// Main simulation tick: spawn, step, collide, watch, despawn
    pub fn tick(&mut self) -> TickReport {
        if !self.is_simulating {
            return TickReport::default();
        }
        self.stats.ticks += 1;

        let spawned = self
            .spawner
            .maybe_spawn(&self.road_network, &mut self.vehicles, &mut self.rng);
        if let Some(id) = spawned {
            if let Some(kind) = self.vehicle(id).map(|v| v.kind) {
                self.stats.record_spawn(kind);
            }
        }

        // Bodies are refreshed as vehicles move, so later vehicles see earlier moves
        let mut bodies: Vec<Rect> = self.vehicles.iter().map(Vehicle::footprint).collect();
        let mut turned = 0;
        for (index, vehicle) in self.vehicles.iter_mut().enumerate() {
            let traffic = Traffic::new(&bodies, index);
            let outcome =
                vehicle.step_in_traffic(&self.road_network, &self.rules, &traffic, &mut self.rng);
            if matches!(outcome, StepOutcome::Turned(_) | StepOutcome::TurnedBack) {
                turned += 1;
            }
            bodies[index] = vehicle.footprint();
        }

        let collisions = collision::update(&mut self.vehicles);
        let detections = self.cameras.update(&mut self.vehicles);
        let despawned = self.despawn_exited();

        self.stats.active_vehicles = self.vehicles.len() as u32;
        self.stats.camera_counts = *self.cameras.counts();

        TickReport {
            spawned,
            despawned,
            turned,
            collisions,
            detections,
        }
    }

    /// Removes the first vehicle found in the exit zone, at most one per tick
    fn despawn_exited(&mut self) -> Option<VehicleId> {
        let zone = self.exit_zone?;
        let index = self
            .vehicles
            .iter()
            .position(|vehicle| vehicle.footprint().intersects(&zone))?;

        let vehicle = self.vehicles.remove(index);
        self.stats.vehicles_exited += 1;
        debug!("{:?} {:?} left the city", vehicle.kind, vehicle.id);
        Some(vehicle.id)
    }

    /// Read-only copies of every live vehicle
    pub fn snapshot(&self) -> Vec<VehicleSnapshot> {
        self.vehicles.iter().map(Vehicle::snapshot).collect()
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        println!("=== Traffic Simulation Summary ===");
        println!("Tick: {}", self.stats.ticks);
        println!(
            "Simulating: {}, Road segments: {}, Cameras: {}",
            self.is_simulating,
            self.road_network.len(),
            self.cameras.len()
        );
        println!("Vehicles: {}", self.vehicles.len());

        if !self.vehicles.is_empty() {
            println!("--- Active Vehicles ---");
            for vehicle in &self.vehicles {
                println!(
                    "  {:?} {:?}: position=({:.1}, {:.1}), heading={:?}, state={:?}",
                    vehicle.kind,
                    vehicle.id.0,
                    vehicle.position.x,
                    vehicle.position.y,
                    vehicle.heading,
                    vehicle.state
                );
            }
        }

        let counts = self.cameras.counts();
        println!("--- Cameras ---");
        for camera in self.cameras.cameras() {
            println!(
                "  Camera {} at {:?}: cars={}, trucks={}",
                camera.index.get(),
                self.road_network
                    .get(camera.segment)
                    .map(|segment| segment.coord),
                counts.cars(camera.index),
                counts.trucks(camera.index)
            );
        }
    }

    /// Draw a visual map of the world in the terminal
    pub fn draw_map(&self) {
        let size = self.geometry.grid_size as i32;
        let first_row = -ENTRY_ROWS;

        let mut grid: Vec<Vec<char>> = (first_row..size)
            .map(|_| vec![' '; size as usize])
            .collect();

        let to_grid = |coord: GridCoord| -> Option<(usize, usize)> {
            if coord.row < first_row || coord.row >= size || coord.col < 0 || coord.col >= size {
                return None;
            }
            Some(((coord.row - first_row) as usize, coord.col as usize))
        };

        // Draw roads
        for segment in self.road_network.segments() {
            if let Some((row, col)) = to_grid(segment.coord) {
                grid[row][col] = match segment.kind {
                    SegmentKind::Isolated | SegmentKind::DeadEnd(_) => 'o',
                    SegmentKind::Straight(Axis::Horizontal) => '-',
                    SegmentKind::Straight(Axis::Vertical) => '|',
                    SegmentKind::Turn(_) | SegmentKind::TJunction(_) | SegmentKind::Intersection => '+',
                };
            }
        }

        // Draw cameras
        for camera in self.cameras.cameras() {
            if let Some(segment) = self.road_network.get(camera.segment) {
                if let Some((row, col)) = to_grid(segment.coord) {
                    grid[row][col] = char::from(b'0' + camera.index.get());
                }
            }
        }

        // Draw vehicles
        for vehicle in &self.vehicles {
            let Some(handle) = vehicle.current_segment else {
                continue;
            };
            if let Some((row, col)) = self
                .road_network
                .get(handle)
                .and_then(|segment| to_grid(segment.coord))
            {
                grid[row][col] = match vehicle.kind {
                    VehicleKind::Car => 'C',
                    VehicleKind::Truck => 'T',
                };
            }
        }

        println!("\n=== World Map ===");
        println!("Legend: o=Dead end, -/|=Straight, +=Junction, 1-3=Camera, C=Car, T=Truck");
        println!();
        for (index, row) in grid.iter().enumerate() {
            let line: String = row.iter().collect();
            println!("{}", line);
            if index as i32 == -first_row - 1 {
                println!("{}", "~".repeat(size as usize));
            }
        }
        println!();
    }
}
