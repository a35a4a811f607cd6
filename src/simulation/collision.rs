//! Vehicle-to-vehicle collision pass
//!
//! Each vehicle looks at its own collision box (body plus a short gap ahead)
//! and counts how many other bodies it overlaps. The decision is local: a
//! vehicle with any overlap stops, one without overlap is released.

use log::trace;

use super::vehicle::Vehicle;

/// Outcome of one collision pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollisionReport {
    /// Vehicles that ended the pass stopped
    pub stopped: usize,
    /// Vehicles that were stopped before the pass and are free now
    pub released: usize,
}

/// Number of other vehicles whose body overlaps `vehicles[index]`'s collision box.
/// An index past the end has no partners.
pub fn overlap_count(vehicles: &[Vehicle], index: usize) -> usize {
    let Some(reach) = vehicles.get(index).map(Vehicle::collision_box) else {
        return 0;
    };
    vehicles
        .iter()
        .enumerate()
        .filter(|(other, vehicle)| *other != index && reach.intersects(&vehicle.footprint()))
        .count()
}

/// Stops every vehicle with at least one overlapping partner and releases the rest
pub fn update(vehicles: &mut [Vehicle]) -> CollisionReport {
    // Decide from the positions at the start of the pass, then apply
    let counts: Vec<usize> = (0..vehicles.len())
        .map(|index| overlap_count(vehicles, index))
        .collect();

    let mut report = CollisionReport::default();
    for (vehicle, count) in vehicles.iter_mut().zip(counts) {
        if count > 0 {
            vehicle.stop();
            report.stopped += 1;
        } else {
            if vehicle.is_stopped() {
                report.released += 1;
            }
            vehicle.release();
        }
    }

    if report.stopped > 0 || report.released > 0 {
        trace!(
            "Collision pass: {} stopped, {} released",
            report.stopped,
            report.released
        );
    }
    report
}
