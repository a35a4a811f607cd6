//! Run statistics for the traffic simulation

use log::info;

use super::camera::CameraCounts;
use super::types::{CameraIndex, VehicleKind};

/// Totals collected over one simulation run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationStats {
    pub ticks: u64,
    pub cars_spawned: u32,
    pub trucks_spawned: u32,
    pub vehicles_exited: u32,
    pub active_vehicles: u32,
    pub road_segments: u32,
    pub cameras: u32,
    pub camera_counts: CameraCounts,
}

impl SimulationStats {
    pub fn record_spawn(&mut self, kind: VehicleKind) {
        match kind {
            VehicleKind::Car => self.cars_spawned += 1,
            VehicleKind::Truck => self.trucks_spawned += 1,
        }
    }

    pub fn total_spawned(&self) -> u32 {
        self.cars_spawned + self.trucks_spawned
    }

    /// Share of spawned vehicles that made it to the exit, in percent
    pub fn exit_rate(&self) -> f32 {
        if self.total_spawned() > 0 {
            (self.vehicles_exited as f32 / self.total_spawned() as f32) * 100.0
        } else {
            0.0
        }
    }

    pub fn log_summary(&self) {
        info!("=== SIMULATION COMPLETE ===");
        info!("Ticks: {}", self.ticks);
        info!("Total vehicles spawned: {}", self.total_spawned());
        info!("Cars spawned: {}", self.cars_spawned);
        info!("Trucks spawned: {}", self.trucks_spawned);
        info!("Vehicles exited: {}", self.vehicles_exited);
        info!("Active vehicles: {}", self.active_vehicles);
        info!("Road segments: {}", self.road_segments);
        info!("Cameras: {}", self.cameras);
        for camera in CameraIndex::all() {
            info!(
                "Camera {}: cars={}, trucks={}",
                camera.get(),
                self.camera_counts.cars(camera),
                self.camera_counts.trucks(camera)
            );
        }
        info!("Exit rate: {:.1}%", self.exit_rate());
    }
}
