//! Grid traffic simulation core
//!
//! Roads are built from a grid of cells, vehicles leave two garages on the
//! entry board, drive on the right-hand lane, stop for each other and are
//! counted by up to three cameras. Everything here runs without a renderer;
//! observers receive snapshots and detections over typed channels.

mod camera;
mod collision;
mod config;
mod events;
mod layout;
mod road_network;
mod scheduler;
mod spawner;
mod stats;
mod types;
mod vehicle;
mod world;

pub use camera::{classify_footprint, Camera, CameraCounts, CameraVisionTracker, Detection};
pub use collision::{overlap_count, update as update_collisions, CollisionReport};
pub use config::{SimConfig, TurnPolicy};
pub use events::{channels, Notifier, SimulationObservers};
pub use layout::{connector_coord, demo_grid, empty_grid, entry_cells, exit_zone, Garage};
pub use road_network::{
    classify_segments, rebuild, Adjacency, RoadNetwork, RoadSegment, SegmentHandle, SegmentKind,
};
pub use scheduler::SimulationScheduler;
pub use spawner::{spawn_for_roll, SpawnController, SPAWN_ROLL, SPAWN_TABLE};
pub use stats::SimulationStats;
pub use types::{
    Axis, CameraIndex, Cell, CellSource, Corner, Direction, GridCoord, GridGeometry, Position,
    Rect, VehicleId, VehicleKind, CAMERA_CAPACITY, ENTRY_CONNECTOR_COL, ENTRY_ROWS, MAX_GRID_SIZE,
    MIN_GRID_SIZE,
};
pub use vehicle::{DrivingRules, StepOutcome, Traffic, Vehicle, VehicleSnapshot, VehicleState};
pub use world::{SimWorld, TickReport};
