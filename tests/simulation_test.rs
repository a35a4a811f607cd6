//! Whole-world simulation tests and a headless run of the binary

use std::process::Command;
use traffic_cams::simulation::{
    entry_cells, CameraIndex, Cell, Direction, GridCoord, SimConfig, SimWorld, TurnPolicy,
    VehicleKind,
};

fn config(grid_size: usize) -> SimConfig {
    SimConfig {
        grid_size,
        cell_size: 32.0,
        seed: Some(42),
        ..SimConfig::default()
    }
}

#[test]
fn test_invalid_config_rejected() {
    assert!(SimWorld::new(config(2)).is_err());
    assert!(SimWorld::new(config(65)).is_err());
    assert!(SimWorld::new(SimConfig {
        cell_size: 0.0,
        ..config(8)
    })
    .is_err());
    assert!(SimWorld::new(SimConfig {
        car_speed: -1.0,
        ..config(8)
    })
    .is_err());
    assert!(SimWorld::new(config(4)).is_ok());
}

#[test]
fn test_tick_before_start_does_nothing() {
    let mut world = SimWorld::with_demo_layout(config(8)).expect("world");
    assert!(!world.is_simulating());

    for _ in 0..100 {
        let report = world.tick();
        assert!(report.spawned.is_none());
    }
    assert!(world.vehicles.is_empty());
    assert_eq!(world.stats().ticks, 0);
}

#[test]
fn test_straight_road_camera_detects_car_once() {
    // Three cells in a row, camera 1 in the middle, car advancing one cell per tick
    let mut world = SimWorld::new(SimConfig {
        car_speed: 32.0,
        turn_policy: TurnPolicy::StraightFirst,
        ..config(4)
    })
    .expect("world");
    world.set_cells(vec![
        Cell::road(1, 0),
        Cell::road_with_camera(1, 1, 1),
        Cell::road(1, 2),
    ]);
    world.start();
    assert_eq!(world.road_network.len(), 3);
    assert_eq!(world.cameras.len(), 1);

    let id = world.add_vehicle(VehicleKind::Car, GridCoord::new(1, 0), Direction::East);
    let camera = CameraIndex::new(1).expect("camera index");

    // First tick moves the car into the camera cell
    let report = world.tick();
    assert!(report.spawned.is_none(), "road is at capacity");
    assert_eq!(report.detections.len(), 1);
    assert_eq!(report.detections[0].camera, camera);
    assert_eq!(report.detections[0].kind, VehicleKind::Car);
    assert_eq!(world.vehicle(id).expect("car").position.x, 48.0);

    // Leaving the camera cell is not a sighting
    assert!(world.tick().detections.is_empty());
    assert_eq!(world.cameras.counts().cars(camera), 1);
    assert_eq!(world.cameras.counts().trucks(camera), 0);

    // The dead end turns it around and the rest of the tick carries it back
    // into the camera cell, which counts as a new sighting
    assert_eq!(world.tick().detections.len(), 1);
    let car = world.vehicle(id).expect("car still on the road");
    assert_eq!(car.heading, Direction::West);
    assert_eq!(car.position.x, 48.0);
    assert_eq!(world.cameras.counts().cars(camera), 2);
}

/// Entry board plus a short road down from the connector
fn exit_world() -> SimWorld {
    let mut world = SimWorld::new(config(8)).expect("world");
    world.set_entry_cells(entry_cells(8));
    world.set_cells(vec![Cell::road(0, 4), Cell::road(1, 4)]);
    world.start();
    world
}

#[test]
fn test_vehicle_in_exit_zone_is_removed() {
    let mut world = exit_world();
    let exit = world.exit_zone().expect("exit zone while simulating");

    let id = world.add_vehicle(VehicleKind::Car, GridCoord::new(-1, 4), Direction::North);
    assert!(world.vehicle(id).expect("car").footprint().intersects(&exit));

    let report = world.tick();
    assert_eq!(report.despawned, Some(id));
    assert!(world.vehicle(id).is_none());
    assert_eq!(world.stats().vehicles_exited, 1);
}

#[test]
fn test_at_most_one_despawn_per_tick() {
    let mut world = exit_world();
    let first = world.add_vehicle(VehicleKind::Car, GridCoord::new(-1, 4), Direction::North);
    let second = world.add_vehicle(VehicleKind::Car, GridCoord::new(-1, 4), Direction::North);

    assert_eq!(world.tick().despawned, Some(first));
    assert!(world.vehicle(second).is_some());

    assert_eq!(world.tick().despawned, Some(second));
    assert_eq!(world.stats().vehicles_exited, 2);
}

#[test]
fn test_southbound_lane_is_not_an_exit() {
    let mut world = exit_world();
    let id = world.add_vehicle(VehicleKind::Car, GridCoord::new(-1, 4), Direction::South);

    let report = world.tick();
    assert!(report.despawned.is_none());
    assert!(world.vehicle(id).is_some());
}

#[test]
fn test_spawn_capacity_respected_over_long_run() {
    let mut world = SimWorld::with_demo_layout(config(8)).expect("world");
    world.start();
    let capacity = world.road_network.len() / 2;

    let mut spawned = 0;
    for _ in 0..3000 {
        if world.tick().spawned.is_some() {
            spawned += 1;
        }
        assert!(world.vehicles.len() <= capacity);
    }

    assert!(spawned > 0);
    assert_eq!(world.stats().total_spawned(), spawned);
}

#[test]
fn test_stacked_vehicles_separate() {
    let mut world = SimWorld::new(SimConfig {
        max_stop_ticks: 5,
        turn_policy: TurnPolicy::StraightFirst,
        ..config(4)
    })
    .expect("world");
    world.set_cells((0..4).map(|col| Cell::road(1, col)).collect());
    world.start();

    // Two cars on exactly the same spot stop each other
    let first = world.add_vehicle(VehicleKind::Car, GridCoord::new(1, 1), Direction::East);
    let second = world.add_vehicle(VehicleKind::Car, GridCoord::new(1, 1), Direction::East);
    world.tick();
    assert!(world.vehicles.iter().all(|v| v.is_stopped()));

    // The first runs out of patience one tick earlier and backs off alone
    for _ in 0..15 {
        world.tick();
    }
    let first = world.vehicle(first).expect("first car");
    let second = world.vehicle(second).expect("second car");
    assert_eq!(first.heading, Direction::West);
    assert_eq!(second.heading, Direction::East);
    assert!(first.is_moving() && second.is_moving());
    assert!(!first.footprint().intersects(&second.footprint()));
}

#[test]
fn test_demo_vehicles_stay_on_the_road() {
    for seed in [1, 2, 5] {
        let mut world = SimWorld::with_demo_layout(SimConfig {
            seed: Some(seed),
            ..config(16)
        })
        .expect("world");
        world.start();

        for tick in 0..5000 {
            world.tick();
            for vehicle in &world.vehicles {
                assert!(
                    world.road_network.segment_containing(vehicle.position).is_some(),
                    "seed {} tick {}: {:?} left the road at {:?}",
                    seed,
                    tick,
                    vehicle.id,
                    vehicle.position
                );
            }
        }
    }
}

#[test]
fn test_demo_traffic_keeps_exiting() {
    let mut world = SimWorld::with_demo_layout(SimConfig {
        seed: Some(5),
        ..config(16)
    })
    .expect("world");
    world.start();

    for _ in 0..10_000 {
        world.tick();
    }
    let exited = world.stats().vehicles_exited;
    let spawned = world.stats().total_spawned();

    for _ in 0..10_000 {
        world.tick();
    }
    assert!(
        world.stats().vehicles_exited > exited,
        "no vehicle left the city after tick 10000"
    );
    assert!(world.stats().total_spawned() > spawned, "spawning stalled");
}

#[test]
fn test_stop_then_start_leaks_no_vehicles() {
    let mut world = SimWorld::with_demo_layout(config(8)).expect("world");
    world.start();
    for _ in 0..500 {
        world.tick();
    }

    world.stop();
    assert!(!world.is_simulating());
    assert!(world.vehicles.is_empty());
    assert!(world.cameras.is_empty());
    assert!(world.road_network.is_empty());
    assert!(world.exit_zone().is_none());
    assert!(world.snapshot().is_empty());

    // Ticks while stopped change nothing
    world.tick();
    assert!(world.vehicles.is_empty());

    world.start();
    assert!(world.is_simulating());
    assert!(world.vehicles.is_empty());
    assert!(!world.road_network.is_empty());
    assert_eq!(world.cameras.len(), 3);
    assert_eq!(world.stats().ticks, 0);
}

#[test]
fn test_start_is_idempotent() {
    let mut world = SimWorld::with_demo_layout(config(8)).expect("world");
    world.start();
    let id = world.add_vehicle(VehicleKind::Car, GridCoord::new(1, 2), Direction::East);

    world.start();
    assert!(world.vehicle(id).is_some(), "second start must not rebuild");
}

#[test]
fn test_demo_layout_is_connected() {
    let mut world = SimWorld::with_demo_layout(config(16)).expect("world");
    world.start();
    assert!(world.road_network.entry_connected());
    assert_eq!(world.cameras.len(), 3);
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let mut world = SimWorld::with_demo_layout(config(8)).expect("world");
        world.start();
        for _ in 0..400 {
            world.tick();
        }
        world.snapshot()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_snapshot_matches_vehicles() {
    let mut world = exit_world();
    world.add_vehicle(VehicleKind::Truck, GridCoord::new(0, 4), Direction::South);

    let snapshot = world.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].kind, VehicleKind::Truck);
    assert_eq!(snapshot[0].footprint, world.vehicles[0].footprint());
}

/// The binary runs headless and logs its summary
#[test]
fn test_headless_simulation_runs() {
    let output = Command::new(env!("CARGO_BIN_EXE_traffic_cams"))
        .args(["--ticks", "300", "--grid-size", "12", "--seed", "7"])
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute simulation");

    assert!(
        output.status.success(),
        "Simulation failed to run in headless mode. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {}",
        stderr
    );
    assert!(stderr.contains("Total vehicles spawned:"));
    assert!(stderr.contains("Exit rate:"));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== World Map ==="));
}

#[test]
fn test_invalid_grid_size_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_traffic_cams"))
        .args(["--ticks", "10", "--grid-size", "2"])
        .output()
        .expect("Failed to execute simulation");

    assert!(!output.status.success());
}
