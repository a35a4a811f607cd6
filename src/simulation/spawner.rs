//! Spawning of new vehicles at the garages
//!
//! Every tick one uniform roll in `1..=100` decides whether a vehicle leaves a
//! garage, which kind it is and from which garage. About 6% of ticks spawn.

use log::{debug, trace};
use rand::Rng;
use std::ops::RangeInclusive;

use super::layout::Garage;
use super::road_network::RoadNetwork;
use super::types::{Direction, GridCoord, GridGeometry, VehicleId, VehicleKind};
use super::vehicle::Vehicle;

/// Roll ranges and what they spawn; rolls above the table spawn nothing
pub const SPAWN_TABLE: [(RangeInclusive<u32>, VehicleKind, Garage); 4] = [
    (1..=2, VehicleKind::Car, Garage::East),
    (3..=4, VehicleKind::Car, Garage::West),
    (5..=5, VehicleKind::Truck, Garage::East),
    (6..=6, VehicleKind::Truck, Garage::West),
];

/// Range of the spawn roll
pub const SPAWN_ROLL: RangeInclusive<u32> = 1..=100;

/// Looks up a roll in the spawn table
pub fn spawn_for_roll(roll: u32) -> Option<(VehicleKind, Garage)> {
    SPAWN_TABLE
        .iter()
        .find(|(range, _, _)| range.contains(&roll))
        .map(|(_, kind, garage)| (*kind, *garage))
}

#[derive(Debug, Clone)]
pub struct SpawnController {
    geometry: GridGeometry,
    car_speed: f32,
    truck_speed: f32,
    next_id: usize,
}

impl SpawnController {
    pub fn new(geometry: GridGeometry, car_speed: f32, truck_speed: f32) -> Self {
        Self {
            geometry,
            car_speed,
            truck_speed,
            next_id: 0,
        }
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Both start cells are clear of every vehicle footprint
    pub fn start_cells_free(&self, vehicles: &[Vehicle]) -> bool {
        [Garage::West, Garage::East].into_iter().all(|garage| {
            let cell = self.geometry.cell_rect(garage.start_coord(&self.geometry));
            !vehicles.iter().any(|v| v.footprint().intersects(&cell))
        })
    }

    /// Fewer vehicles than half the road segments
    pub fn has_capacity(&self, network: &RoadNetwork, vehicles: &[Vehicle]) -> bool {
        vehicles.len() < network.len() / 2
    }

    /// Rolls for a spawn and, on success, appends the new vehicle to `vehicles`
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &mut self,
        network: &RoadNetwork,
        vehicles: &mut Vec<Vehicle>,
        rng: &mut R,
    ) -> Option<VehicleId> {
        if !self.has_capacity(network, vehicles) {
            trace!("Spawn skipped: {} vehicles at capacity", vehicles.len());
            return None;
        }
        if !self.start_cells_free(vehicles) {
            trace!("Spawn skipped: start cell occupied");
            return None;
        }

        let roll = rng.random_range(SPAWN_ROLL);
        let (kind, garage) = spawn_for_roll(roll)?;
        Some(self.spawn(kind, garage, vehicles))
    }

    /// Creates a vehicle at `garage` unconditionally
    pub fn spawn(&mut self, kind: VehicleKind, garage: Garage, vehicles: &mut Vec<Vehicle>) -> VehicleId {
        let start = garage.start_coord(&self.geometry);
        let id = self.spawn_at(kind, start, garage.heading(), vehicles);
        debug!("Spawned {:?} {:?} from the {:?} garage", kind, id, garage);
        id
    }

    /// Places a vehicle on the right-hand lane in the middle of `coord`
    pub fn spawn_at(
        &mut self,
        kind: VehicleKind,
        coord: GridCoord,
        heading: Direction,
        vehicles: &mut Vec<Vehicle>,
    ) -> VehicleId {
        let id = self.next_vehicle_id();
        let speed = match kind {
            VehicleKind::Car => self.car_speed,
            VehicleKind::Truck => self.truck_speed,
        };
        let vehicle = Vehicle::on_lane(
            id,
            kind,
            self.geometry.cell_center(coord),
            heading,
            speed,
            self.geometry.cell_size,
        );

        trace!(
            "Vehicle {:?} placed at ({:.1}, {:.1}) heading {:?}",
            id,
            vehicle.position.x,
            vehicle.position.y,
            heading
        );
        vehicles.push(vehicle);
        id
    }
}
