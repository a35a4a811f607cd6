//! Vehicle movement logic for the traffic simulation
//!
//! A vehicle drives on the right-hand lane of whatever segment it is on.
//! Each tick it locates itself in the road network, picks a new heading when
//! it has just entered a segment, and advances by its speed unless the
//! collision pass has stopped it. A turn never lands the vehicle on top of
//! another body; it holds short until the target lane is clear.

use log::{debug, trace};
use rand::Rng;

use super::config::TurnPolicy;
use super::road_network::{RoadNetwork, RoadSegment, SegmentHandle};
use super::types::{Direction, Position, Rect, VehicleId, VehicleKind, CAMERA_CAPACITY};

/// Motion state driven by the collision pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleState {
    Moving,
    /// Blocked by another vehicle; `stop_counter` counts the ticks
    Stopped,
    /// Collision just cleared; becomes `Moving` on the next step
    Unblocking,
}

/// What happened to a vehicle during one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved,
    /// Reached its turn point and now heads the given way
    Turned(Direction),
    /// Stopped by the collision pass, did not move
    Blocked,
    /// Waited too long and reversed onto the opposite lane
    TurnedBack,
    /// At its turn point, waiting for the target lane to clear
    Yielded,
}

/// Rules every vehicle follows, taken from the run configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrivingRules {
    pub turn_policy: TurnPolicy,
    pub max_stop_ticks: u32,
}

impl Default for DrivingRules {
    fn default() -> Self {
        Self {
            turn_policy: TurnPolicy::Random,
            max_stop_ticks: 120,
        }
    }
}

/// Extra ticks of patience spread over vehicle ids, so a jammed group does not
/// turn back all at once
const PATIENCE_SPREAD: usize = 8;

/// Bodies of the vehicles around the one being stepped
#[derive(Debug, Clone, Copy, Default)]
pub struct Traffic<'a> {
    bodies: &'a [Rect],
    own_index: Option<usize>,
}

impl<'a> Traffic<'a> {
    /// `bodies[own_index]` belongs to the vehicle being stepped and is ignored
    pub fn new(bodies: &'a [Rect], own_index: usize) -> Self {
        Self {
            bodies,
            own_index: Some(own_index),
        }
    }

    /// True when no other body overlaps `area`
    pub fn is_clear(&self, area: &Rect) -> bool {
        self.bodies
            .iter()
            .enumerate()
            .all(|(index, body)| Some(index) == self.own_index || !area.intersects(body))
    }
}

/// A heading change decided on entering a segment, applied at the turn point
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingTurn {
    heading: Direction,
    center: Position,
}

/// A car or truck in the traffic simulation
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub kind: VehicleKind,
    /// Center of the body
    pub position: Position,
    /// World units per tick
    pub speed: f32,
    pub heading: Direction,
    pub previous_heading: Direction,
    pub state: VehicleState,
    pub stop_counter: u32,
    pub seen_by_camera: [bool; CAMERA_CAPACITY],
    pub current_segment: Option<SegmentHandle>,
    pub previous_segment: Option<SegmentHandle>,
    cell_size: f32,
    pending_turn: Option<PendingTurn>,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        kind: VehicleKind,
        position: Position,
        heading: Direction,
        speed: f32,
        cell_size: f32,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            speed,
            heading,
            previous_heading: heading,
            state: VehicleState::Moving,
            stop_counter: 0,
            seen_by_camera: [false; CAMERA_CAPACITY],
            current_segment: None,
            previous_segment: None,
            cell_size,
            pending_turn: None,
        }
    }

    /// Places a vehicle on the right-hand lane of a cell, at the cell's middle
    pub fn on_lane(
        id: VehicleId,
        kind: VehicleKind,
        cell_center: Position,
        heading: Direction,
        speed: f32,
        cell_size: f32,
    ) -> Self {
        let position = cell_center.offset(heading.right(), cell_size / 4.0);
        Self::new(id, kind, position, heading, speed, cell_size)
    }

    /// Body length and width
    pub fn dimensions(&self) -> (f32, f32) {
        let width = self.cell_size / 4.0;
        match self.kind {
            VehicleKind::Car => (width, width),
            VehicleKind::Truck => (self.cell_size / 2.0, width),
        }
    }

    /// The body rectangle, long side along the heading
    pub fn footprint(&self) -> Rect {
        let (length, width) = self.dimensions();
        match self.heading {
            Direction::East | Direction::West => Rect::centered(self.position, length, width),
            Direction::North | Direction::South => Rect::centered(self.position, width, length),
        }
    }

    /// The body plus the gap the vehicle keeps to whatever is in front of it
    pub fn collision_box(&self) -> Rect {
        self.footprint().extended(self.heading, self.cell_size / 8.0)
    }

    pub fn is_stopped(&self) -> bool {
        self.state == VehicleState::Stopped
    }

    pub fn is_moving(&self) -> bool {
        !self.is_stopped()
    }

    /// Something is in the way
    pub fn stop(&mut self) {
        if self.state != VehicleState::Stopped {
            trace!("Vehicle {:?} stopped", self.id);
        }
        self.state = VehicleState::Stopped;
        self.stop_counter += 1;
    }

    /// Nothing is in the way
    pub fn release(&mut self) {
        self.stop_counter = 0;
        self.state = match self.state {
            VehicleState::Stopped => {
                trace!("Vehicle {:?} unblocked", self.id);
                VehicleState::Unblocking
            }
            _ => VehicleState::Moving,
        };
    }

    /// Updates the current/previous segment. Returns true when a new segment was entered.
    pub fn locate(&mut self, network: &RoadNetwork) -> bool {
        let found = network.segment_containing(self.position);
        if found == self.current_segment {
            return false;
        }

        self.previous_segment = self.current_segment;
        self.current_segment = found;
        self.pending_turn = None;

        if found.is_none() {
            debug!(
                "Vehicle {:?} left the road network at ({:.1}, {:.1})",
                self.id, self.position.x, self.position.y
            );
        }
        found.is_some()
    }

    /// Picks the heading to take on `segment`.
    ///
    /// Exits are tried in the order straight, right, left. Turning around is
    /// only chosen when there is no exit at all.
    pub fn choose_heading<R: Rng + ?Sized>(
        &self,
        segment: &RoadSegment,
        policy: TurnPolicy,
        rng: &mut R,
    ) -> Direction {
        let candidates: Vec<Direction> = [self.heading, self.heading.right(), self.heading.left()]
            .into_iter()
            .filter(|direction| segment.adjacency.contains(*direction))
            .collect();

        match (candidates.len(), policy) {
            (0, _) => self.heading.opposite(),
            (1, _) | (_, TurnPolicy::StraightFirst) => candidates[0],
            (n, TurnPolicy::Random) => candidates[rng.random_range(0..n)],
        }
    }

    /// Runs one tick of locate, turn selection and movement on an empty road
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        network: &RoadNetwork,
        rules: &DrivingRules,
        rng: &mut R,
    ) -> StepOutcome {
        self.step_in_traffic(network, rules, &Traffic::default(), rng)
    }

    /// Runs one tick, keeping turns off the bodies in `traffic`
    pub fn step_in_traffic<R: Rng + ?Sized>(
        &mut self,
        network: &RoadNetwork,
        rules: &DrivingRules,
        traffic: &Traffic,
        rng: &mut R,
    ) -> StepOutcome {
        if self.locate(network) {
            self.select_turn(network, rules.turn_policy, rng);
        }

        if self.is_stopped() {
            if self.stop_counter < self.patience(rules) || !self.turn_back(network, traffic) {
                return StepOutcome::Blocked;
            }
            // The reversed heading may have no road ahead in this segment
            self.select_turn(network, rules.turn_policy, rng);
            return StepOutcome::TurnedBack;
        }

        if self.state == VehicleState::Unblocking {
            self.state = VehicleState::Moving;
        }

        self.drive(traffic)
    }

    /// Ticks this vehicle waits while stopped before it turns back
    pub fn patience(&self, rules: &DrivingRules) -> u32 {
        rules
            .max_stop_ticks
            .saturating_add((self.id.0 % PATIENCE_SPREAD) as u32)
    }

    fn select_turn<R: Rng + ?Sized>(&mut self, network: &RoadNetwork, policy: TurnPolicy, rng: &mut R) {
        let Some(segment) = self.current_segment.and_then(|handle| network.get(handle)) else {
            return;
        };

        let chosen = self.choose_heading(segment, policy, rng);
        if chosen != self.heading {
            debug!(
                "Vehicle {:?} will turn {:?} -> {:?} at {:?} ({:?})",
                self.id, self.heading, chosen, segment.coord, segment.kind
            );
            self.pending_turn = Some(PendingTurn {
                heading: chosen,
                center: segment.center,
            });
        }
    }

    /// Distance along the current heading until the pending turn applies
    fn distance_to_turn(&self, turn: &PendingTurn) -> f32 {
        let target = if turn.heading == self.heading.opposite() {
            turn.center.along(self.heading)
        } else {
            self.lane_point(turn.heading, turn.center).along(self.heading)
        };
        let (dx, dy) = self.heading.unit();
        let sign = dx + dy;
        ((target - self.position.along(self.heading)) * sign).max(0.0)
    }

    /// Where the right-hand lane for `heading` runs through a cell with the given center
    fn lane_point(&self, heading: Direction, center: Position) -> Position {
        center.offset(heading.right(), self.cell_size / 4.0)
    }

    fn drive(&mut self, traffic: &Traffic) -> StepOutcome {
        if let Some(turn) = self.pending_turn {
            let remaining = self.distance_to_turn(&turn);
            if remaining <= self.speed {
                let mut turned = self.clone();
                turned.advance(remaining);
                turned.apply_turn(turn.heading, turn.center);
                if !traffic.is_clear(&turned.footprint()) {
                    trace!("Vehicle {:?} yields before turning {:?}", self.id, turn.heading);
                    return StepOutcome::Yielded;
                }

                self.advance(remaining);
                self.apply_turn(turn.heading, turn.center);
                self.pending_turn = None;
                self.advance(self.speed - remaining);
                return StepOutcome::Turned(self.heading);
            }
        }

        self.advance(self.speed);
        StepOutcome::Moved
    }

    fn advance(&mut self, distance: f32) {
        self.position = self.position.offset(self.heading, distance);
        trace!(
            "Vehicle {:?} at ({:.1}, {:.1}) heading {:?}",
            self.id,
            self.position.x,
            self.position.y,
            self.heading
        );
    }

    fn apply_turn(&mut self, heading: Direction, center: Position) {
        self.previous_heading = self.heading;
        self.heading = heading;

        // Snap sideways onto the lane of the new heading
        let lane = self.lane_point(heading, center);
        match heading {
            Direction::East | Direction::West => self.position.y = lane.y,
            Direction::North | Direction::South => self.position.x = lane.x,
        }
    }

    /// Reverses onto the opposite lane after being blocked for too long.
    ///
    /// Returns false and stays put while the opposite lane is taken.
    fn turn_back(&mut self, network: &RoadNetwork, traffic: &Traffic) -> bool {
        let center = self
            .current_segment
            .and_then(|handle| network.get(handle))
            .map(|segment| segment.center)
            .unwrap_or_else(|| self.position.offset(self.heading.left(), self.cell_size / 4.0));

        let mut reversed = self.clone();
        reversed.apply_turn(self.heading.opposite(), center);
        if !traffic.is_clear(&reversed.collision_box()) {
            trace!("Vehicle {:?} cannot turn back, opposite lane taken", self.id);
            return false;
        }

        debug!(
            "Vehicle {:?} blocked for {} ticks, turning back",
            self.id, self.stop_counter
        );

        self.apply_turn(self.heading.opposite(), center);
        self.pending_turn = None;
        self.stop_counter = 0;
        self.state = VehicleState::Unblocking;
        true
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position,
            heading: self.heading,
            state: self.state,
            footprint: self.footprint(),
            seen_by_camera: self.seen_by_camera,
        }
    }
}

/// Read-only copy of a vehicle handed to observers
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub kind: VehicleKind,
    pub position: Position,
    pub heading: Direction,
    pub state: VehicleState,
    pub footprint: Rect,
    pub seen_by_camera: [bool; CAMERA_CAPACITY],
}
