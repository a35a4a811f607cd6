//! Typed notification channels
//!
//! One channel per kind of notification. State that observers only need the
//! latest value of (the vehicle list, the simulating flag) goes through
//! `watch`; detections are events and go through unbounded `mpsc` so none are
//! coalesced.

use log::trace;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

use super::camera::Detection;
use super::types::{CameraIndex, VehicleKind};
use super::vehicle::VehicleSnapshot;

/// Sending half, owned by the scheduler
#[derive(Debug)]
pub struct Notifier {
    vehicles: watch::Sender<Arc<Vec<VehicleSnapshot>>>,
    simulating: watch::Sender<bool>,
    cars_detected: mpsc::UnboundedSender<CameraIndex>,
    trucks_detected: mpsc::UnboundedSender<CameraIndex>,
}

/// Receiving half, handed to whoever renders or records the simulation
#[derive(Debug)]
pub struct SimulationObservers {
    pub vehicles: watch::Receiver<Arc<Vec<VehicleSnapshot>>>,
    pub simulating: watch::Receiver<bool>,
    pub cars_detected: mpsc::UnboundedReceiver<CameraIndex>,
    pub trucks_detected: mpsc::UnboundedReceiver<CameraIndex>,
}

/// Creates a connected notifier and observer set
pub fn channels() -> (Notifier, SimulationObservers) {
    let (vehicles_tx, vehicles_rx) = watch::channel(Arc::new(Vec::new()));
    let (simulating_tx, simulating_rx) = watch::channel(false);
    let (cars_tx, cars_rx) = mpsc::unbounded_channel();
    let (trucks_tx, trucks_rx) = mpsc::unbounded_channel();

    let notifier = Notifier {
        vehicles: vehicles_tx,
        simulating: simulating_tx,
        cars_detected: cars_tx,
        trucks_detected: trucks_tx,
    };
    let observers = SimulationObservers {
        vehicles: vehicles_rx,
        simulating: simulating_rx,
        cars_detected: cars_rx,
        trucks_detected: trucks_rx,
    };
    (notifier, observers)
}

impl Notifier {
    /// Publishes the latest vehicle list
    pub fn vehicles(&self, snapshot: Vec<VehicleSnapshot>) {
        self.vehicles.send_replace(Arc::new(snapshot));
    }

    /// Publishes the simulating flag, waking observers only on change
    pub fn simulating(&self, simulating: bool) {
        self.simulating.send_if_modified(|current| {
            let changed = *current != simulating;
            *current = simulating;
            changed
        });
    }

    pub fn detection(&self, detection: &Detection) {
        let channel = match detection.kind {
            VehicleKind::Car => &self.cars_detected,
            VehicleKind::Truck => &self.trucks_detected,
        };
        if channel.send(detection.camera).is_err() {
            trace!("No listener for {:?} detections", detection.kind);
        }
    }

    /// Forwards every detection of one tick
    pub fn detections(&self, detections: &[Detection]) {
        for detection in detections {
            self.detection(detection);
        }
    }
}
