//! Spawn table and spawn gating tests

use rand::rngs::StdRng;
use rand::SeedableRng;
use traffic_cams::simulation::{
    entry_cells, spawn_for_roll, Cell, Direction, Garage, GridCoord, GridGeometry, RoadNetwork,
    SpawnController, Vehicle, VehicleKind, SPAWN_ROLL,
};

const CELL: f32 = 32.0;

fn geometry() -> GridGeometry {
    GridGeometry::new(8, CELL)
}

/// Entry board plus one grid cell under the connector: 10 segments, room for 5 vehicles
fn network() -> RoadNetwork {
    let grid = vec![Cell::road(0, geometry().connector_col())];
    RoadNetwork::build(&grid, &entry_cells(8), geometry())
}

fn controller() -> SpawnController {
    SpawnController::new(geometry(), 2.0, 1.5)
}

#[test]
fn test_spawn_table() {
    assert_eq!(*SPAWN_ROLL.start(), 1);
    assert_eq!(*SPAWN_ROLL.end(), 100);

    for roll in SPAWN_ROLL {
        let expected = match roll {
            1 | 2 => Some((VehicleKind::Car, Garage::East)),
            3 | 4 => Some((VehicleKind::Car, Garage::West)),
            5 => Some((VehicleKind::Truck, Garage::East)),
            6 => Some((VehicleKind::Truck, Garage::West)),
            _ => None,
        };
        assert_eq!(spawn_for_roll(roll), expected, "roll {}", roll);
    }
}

#[test]
fn test_garages() {
    let geometry = geometry();
    assert_eq!(Garage::West.coord(&geometry), GridCoord::new(-2, 0));
    assert_eq!(Garage::East.coord(&geometry), GridCoord::new(-2, 7));
    assert_eq!(Garage::West.start_coord(&geometry), GridCoord::new(-2, 1));
    assert_eq!(Garage::East.start_coord(&geometry), GridCoord::new(-2, 6));
    assert_eq!(Garage::West.heading(), Direction::East);
    assert_eq!(Garage::East.heading(), Direction::West);
}

#[test]
fn test_spawned_vehicle_leaves_its_garage() {
    let geometry = geometry();
    let mut spawner = controller();
    let mut vehicles = Vec::new();

    let car = spawner.spawn(VehicleKind::Car, Garage::West, &mut vehicles);
    let truck = spawner.spawn(VehicleKind::Truck, Garage::East, &mut vehicles);
    assert_ne!(car, truck);

    let start = geometry.cell_center(Garage::West.start_coord(&geometry));
    assert_eq!(vehicles[0].heading, Direction::East);
    assert_eq!(vehicles[0].position.x, start.x);
    assert_eq!(vehicles[0].position.y, start.y + CELL / 4.0);
    assert_eq!(vehicles[0].speed, 2.0);

    assert_eq!(vehicles[1].kind, VehicleKind::Truck);
    assert_eq!(vehicles[1].heading, Direction::West);
    assert_eq!(vehicles[1].speed, 1.5);
}

#[test]
fn test_spawns_eventually() {
    let network = network();
    let mut spawner = controller();
    let mut vehicles = Vec::new();
    let mut rng = StdRng::seed_from_u64(5);

    let mut spawned = None;
    for _ in 0..1000 {
        spawned = spawner.maybe_spawn(&network, &mut vehicles, &mut rng);
        if spawned.is_some() {
            break;
        }
    }

    assert!(spawned.is_some());
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].id, spawned.expect("spawned"));
}

#[test]
fn test_capacity_respected_regardless_of_roll() {
    let network = network();
    assert_eq!(network.len(), 10);

    let mut spawner = controller();
    let mut vehicles = Vec::new();
    // Park five vehicles away from the start cells
    for _ in 0..5 {
        spawner.spawn_at(VehicleKind::Car, GridCoord::new(0, 4), Direction::South, &mut vehicles);
    }
    assert!(!spawner.has_capacity(&network, &vehicles));

    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..1000 {
        assert!(spawner.maybe_spawn(&network, &mut vehicles, &mut rng).is_none());
    }
    assert_eq!(vehicles.len(), 5);
}

#[test]
fn test_no_capacity_on_an_empty_network() {
    let network = RoadNetwork::new(geometry());
    let spawner = controller();
    assert!(!spawner.has_capacity(&network, &[]));
}

#[test]
fn test_occupied_start_cell_blocks_spawning() {
    let network = network();
    let mut spawner = controller();
    let mut vehicles: Vec<Vehicle> = Vec::new();
    spawner.spawn(VehicleKind::Car, Garage::East, &mut vehicles);

    assert!(spawner.has_capacity(&network, &vehicles));
    assert!(!spawner.start_cells_free(&vehicles));

    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..1000 {
        assert!(spawner.maybe_spawn(&network, &mut vehicles, &mut rng).is_none());
    }
    assert_eq!(vehicles.len(), 1);

    // Once it has driven off, spawning resumes
    vehicles[0].position.x -= CELL;
    assert!(spawner.start_cells_free(&vehicles));
}
