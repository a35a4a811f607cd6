//! Traffic cameras and the vision pass
//!
//! A camera watches the footprint of the road segment it was placed on.
//! Counting is edge-triggered: every vehicle remembers which cameras already
//! see it, so a vehicle standing in view is counted once, not once per tick.

use log::{debug, warn};

use super::road_network::{RoadNetwork, SegmentHandle};
use super::types::{CameraIndex, Cell, CellSource, Rect, VehicleKind, CAMERA_CAPACITY};
use super::vehicle::Vehicle;

/// A camera bound to one road segment
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub index: CameraIndex,
    pub segment: SegmentHandle,
    /// Detection rectangle, the segment's footprint
    pub zone: Rect,
}

/// One edge-triggered sighting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub camera: CameraIndex,
    pub kind: VehicleKind,
}

/// Per-camera car and truck totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CameraCounts {
    pub cars: [u32; CAMERA_CAPACITY],
    pub trucks: [u32; CAMERA_CAPACITY],
}

impl CameraCounts {
    pub fn cars(&self, camera: CameraIndex) -> u32 {
        self.cars[camera.slot()]
    }

    pub fn trucks(&self, camera: CameraIndex) -> u32 {
        self.trucks[camera.slot()]
    }

    fn record(&mut self, detection: &Detection) {
        let slot = detection.camera.slot();
        match detection.kind {
            VehicleKind::Car => self.cars[slot] += 1,
            VehicleKind::Truck => self.trucks[slot] += 1,
        }
    }
}

/// Tells cars from trucks the way the counters always have: by the footprint's shape
pub fn classify_footprint(footprint: &Rect) -> VehicleKind {
    if footprint.is_square() {
        VehicleKind::Car
    } else {
        VehicleKind::Truck
    }
}

#[derive(Debug, Clone, Default)]
pub struct CameraVisionTracker {
    cameras: [Option<Camera>; CAMERA_CAPACITY],
    counts: CameraCounts,
}

impl CameraVisionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds cameras from a grid snapshot to the segments of `network`.
    ///
    /// A later cell reusing an index replaces the earlier camera.
    pub fn from_cells(cells: &[Cell], network: &RoadNetwork) -> Self {
        let mut tracker = Self::new();
        let geometry = *network.geometry();

        for cell in cells.iter().filter(|cell| cell.contains_camera) {
            let Some(index) = CameraIndex::new(cell.camera_index) else {
                warn!(
                    "Ignoring camera with index {} at ({}, {})",
                    cell.camera_index, cell.row, cell.col
                );
                continue;
            };

            let coord = geometry.world_coord(cell, CellSource::Grid);
            let Some(segment) = network.segment_at(coord) else {
                debug!("Camera {} at {:?} is not on a road, ignored", index.get(), coord);
                continue;
            };

            tracker.place(index, segment, network);
        }

        tracker
    }

    /// Puts camera `index` on a segment, replacing whatever was in that slot
    pub fn place(&mut self, index: CameraIndex, segment: SegmentHandle, network: &RoadNetwork) -> bool {
        let Some(road) = network.get(segment) else {
            return false;
        };
        if self.cameras[index.slot()].is_some() {
            debug!("Camera {} reused, replacing previous placement", index.get());
        }
        self.cameras[index.slot()] = Some(Camera {
            index,
            segment,
            zone: road.footprint,
        });
        true
    }

    pub fn remove(&mut self, index: CameraIndex) -> Option<Camera> {
        self.cameras[index.slot()].take()
    }

    pub fn cameras(&self) -> impl Iterator<Item = &Camera> {
        self.cameras.iter().flatten()
    }

    pub fn camera(&self, index: CameraIndex) -> Option<&Camera> {
        self.cameras[index.slot()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.cameras().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> &CameraCounts {
        &self.counts
    }

    pub fn reset_counter(&mut self, index: CameraIndex) {
        self.counts.cars[index.slot()] = 0;
        self.counts.trucks[index.slot()] = 0;
    }

    pub fn reset_counters(&mut self) {
        self.counts = CameraCounts::default();
    }

    /// Removes every camera and zeroes the counters
    pub fn clear(&mut self) {
        self.cameras = Default::default();
        self.reset_counters();
    }

    /// Runs the vision pass and returns the detections that fired this time
    pub fn update(&mut self, vehicles: &mut [Vehicle]) -> Vec<Detection> {
        let mut detections = Vec::new();

        for camera in self.cameras.iter().flatten() {
            let slot = camera.index.slot();
            for vehicle in vehicles.iter_mut() {
                let footprint = vehicle.footprint();
                let in_view = camera.zone.intersects(&footprint);
                let seen = &mut vehicle.seen_by_camera[slot];

                if in_view && !*seen {
                    let detection = Detection {
                        camera: camera.index,
                        kind: classify_footprint(&footprint),
                    };
                    debug!(
                        "Camera {} detected {:?} (vehicle {:?})",
                        camera.index.get(),
                        detection.kind,
                        vehicle.id
                    );
                    detections.push(detection);
                }
                *seen = in_view;
            }
        }

        for detection in &detections {
            self.counts.record(detection);
        }
        detections
    }
}
