//! Road network derived from the editor's cell grid
//!
//! Every road cell becomes a `RoadSegment` whose kind (straight, turn,
//! T-junction, ...) follows from which of its four neighbours are also road.
//! Segments are never edited in place: a new snapshot produces a new table and
//! bumps the generation so that handles held by vehicles go stale instead of
//! pointing at the wrong piece of road.

use log::{debug, trace};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};
use std::collections::HashMap;

use super::types::{
    Axis, Cell, CellSource, Corner, Direction, GridCoord, GridGeometry, Position, Rect,
};

/// Which of the four neighbouring cells are road as well
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Adjacency {
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
}

impl Adjacency {
    pub fn contains(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::East => self.east,
            Direction::West => self.west,
        }
    }

    pub fn set(&mut self, direction: Direction) {
        match direction {
            Direction::North => self.north = true,
            Direction::South => self.south = true,
            Direction::East => self.east = true,
            Direction::West => self.west = true,
        }
    }

    pub fn count(&self) -> usize {
        Direction::ALL.iter().filter(|d| self.contains(**d)).count()
    }

    pub fn directions(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.contains(*d))
    }
}

/// Shape of a road piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// No road around it
    Isolated,
    /// One neighbour, in the given direction
    DeadEnd(Direction),
    Straight(Axis),
    Turn(Corner),
    /// Three neighbours; holds the direction that is missing
    TJunction(Direction),
    Intersection,
}

impl SegmentKind {
    pub fn classify(adjacency: &Adjacency) -> SegmentKind {
        let Adjacency {
            north,
            south,
            east,
            west,
        } = *adjacency;

        match adjacency.count() {
            0 => SegmentKind::Isolated,
            1 => {
                let direction = adjacency
                    .directions()
                    .next()
                    .unwrap_or(Direction::East);
                SegmentKind::DeadEnd(direction)
            }
            2 => {
                if north && east {
                    SegmentKind::Turn(Corner::NorthEast)
                } else if north && west {
                    SegmentKind::Turn(Corner::NorthWest)
                } else if south && east {
                    SegmentKind::Turn(Corner::SouthEast)
                } else if south && west {
                    SegmentKind::Turn(Corner::SouthWest)
                } else if north && south {
                    SegmentKind::Straight(Axis::Vertical)
                } else {
                    SegmentKind::Straight(Axis::Horizontal)
                }
            }
            3 => {
                let missing = Direction::ALL
                    .into_iter()
                    .find(|d| !adjacency.contains(*d))
                    .unwrap_or(Direction::South);
                SegmentKind::TJunction(missing)
            }
            _ => SegmentKind::Intersection,
        }
    }

    /// Display rotation in degrees; it also tells which way the piece opens
    pub fn rotation(&self) -> u16 {
        match self {
            SegmentKind::Isolated | SegmentKind::Intersection => 0,
            SegmentKind::DeadEnd(Direction::North | Direction::South) => 90,
            SegmentKind::DeadEnd(_) => 0,
            SegmentKind::Straight(Axis::Horizontal) => 0,
            SegmentKind::Straight(Axis::Vertical) => 90,
            SegmentKind::Turn(Corner::NorthEast) => 0,
            SegmentKind::Turn(Corner::SouthEast) => 90,
            SegmentKind::Turn(Corner::SouthWest) => 180,
            SegmentKind::Turn(Corner::NorthWest) => 270,
            SegmentKind::TJunction(Direction::South) => 0,
            SegmentKind::TJunction(Direction::East) => 90,
            SegmentKind::TJunction(Direction::North) => 180,
            SegmentKind::TJunction(Direction::West) => 270,
        }
    }
}

/// A piece of road occupying exactly one cell
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub coord: GridCoord,
    pub source: CellSource,
    pub center: Position,
    pub footprint: Rect,
    pub adjacency: Adjacency,
    pub kind: SegmentKind,
}

impl RoadSegment {
    fn place(cell: &Cell, geometry: &GridGeometry, source: CellSource) -> Self {
        let coord = geometry.world_coord(cell, source);
        Self {
            coord,
            source,
            center: geometry.cell_center(coord),
            footprint: geometry.cell_rect(coord),
            adjacency: Adjacency::default(),
            kind: SegmentKind::Isolated,
        }
    }

    pub fn rotation(&self) -> u16 {
        self.kind.rotation()
    }
}

/// Weak reference into the segment table of one particular rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SegmentHandle {
    index: usize,
    generation: u32,
}

impl SegmentHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Builds classified segments for a single cell snapshot.
///
/// Pure: the same cells always yield the same segments in the same order.
pub fn rebuild(cells: &[Cell], geometry: &GridGeometry, source: CellSource) -> Vec<RoadSegment> {
    let mut segments = place_segments(cells, geometry, source);
    classify_segments(&mut segments);
    segments
}

fn place_segments(cells: &[Cell], geometry: &GridGeometry, source: CellSource) -> Vec<RoadSegment> {
    cells
        .iter()
        .filter(|cell| cell.contains_road)
        .map(|cell| RoadSegment::place(cell, geometry, source))
        .collect()
}

/// Recomputes adjacency and kind of every segment against every other one
pub fn classify_segments(segments: &mut [RoadSegment]) {
    let coords: Vec<GridCoord> = segments.iter().map(|s| s.coord).collect();

    for segment in segments.iter_mut() {
        let mut adjacency = Adjacency::default();
        for direction in Direction::ALL {
            let wanted = segment.coord.step(direction);
            if coords.iter().any(|other| *other == wanted) {
                adjacency.set(direction);
            }
        }
        segment.adjacency = adjacency;
        segment.kind = SegmentKind::classify(&adjacency);
    }
}

/// The active set of road segments plus the adjacency graph between them
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    geometry: GridGeometry,
    segments: Vec<RoadSegment>,
    /// Node `i` is segment `i`; edge weights name the direction of travel
    graph: DiGraph<GridCoord, Direction>,
    by_coord: HashMap<GridCoord, usize>,
    generation: u32,
}

impl RoadNetwork {
    pub fn new(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            segments: Vec::new(),
            graph: DiGraph::new(),
            by_coord: HashMap::new(),
            generation: 0,
        }
    }

    /// Builds the network from the user grid and the entry board.
    ///
    /// Both snapshots are placed with their own origin and classified together,
    /// so the connector cell of the entry board links up with row 0 of the grid.
    pub fn build(grid_cells: &[Cell], entry_cells: &[Cell], geometry: GridGeometry) -> Self {
        let mut network = Self::new(geometry);
        network.replace(grid_cells, entry_cells);
        network
    }

    /// Replaces every segment; previously issued handles become invalid.
    pub fn replace(&mut self, grid_cells: &[Cell], entry_cells: &[Cell]) {
        let mut segments = place_segments(grid_cells, &self.geometry, CellSource::Grid);
        segments.extend(place_segments(entry_cells, &self.geometry, CellSource::Entry));

        // A cell drawn twice must not produce two overlapping segments
        let mut seen = HashMap::new();
        segments.retain(|segment| seen.insert(segment.coord, ()).is_none());

        classify_segments(&mut segments);
        self.install(segments);
    }

    fn install(&mut self, segments: Vec<RoadSegment>) {
        self.generation = self.generation.wrapping_add(1);
        self.by_coord = segments
            .iter()
            .enumerate()
            .map(|(index, segment)| (segment.coord, index))
            .collect();

        let mut graph = DiGraph::with_capacity(segments.len(), segments.len() * 2);
        for segment in &segments {
            graph.add_node(segment.coord);
        }
        for (index, segment) in segments.iter().enumerate() {
            for direction in segment.adjacency.directions() {
                if let Some(&target) = self.by_coord.get(&segment.coord.step(direction)) {
                    graph.add_edge(NodeIndex::new(index), NodeIndex::new(target), direction);
                }
            }
        }

        debug!(
            "Road network rebuilt: {} segments, {} links (generation {})",
            segments.len(),
            graph.edge_count(),
            self.generation
        );

        self.graph = graph;
        self.segments = segments;
    }

    /// Drops every segment
    pub fn clear(&mut self) {
        self.install(Vec::new());
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    fn handle(&self, index: usize) -> SegmentHandle {
        SegmentHandle {
            index,
            generation: self.generation,
        }
    }

    /// Resolves a handle, or `None` when it belongs to an older rebuild
    pub fn get(&self, handle: SegmentHandle) -> Option<&RoadSegment> {
        if handle.generation != self.generation {
            return None;
        }
        self.segments.get(handle.index)
    }

    pub fn segment_at(&self, coord: GridCoord) -> Option<SegmentHandle> {
        self.by_coord.get(&coord).map(|&index| self.handle(index))
    }

    /// The segment whose footprint contains `position`
    pub fn segment_containing(&self, position: Position) -> Option<SegmentHandle> {
        let size = self.geometry.cell_size;
        let coord = GridCoord::new(
            (position.y / size).floor() as i32,
            (position.x / size).floor() as i32,
        );
        let found = self
            .segment_at(coord)
            .filter(|handle| self.segments[handle.index].footprint.contains(position));
        trace!("Locate ({:.1}, {:.1}) -> {:?}", position.x, position.y, found);
        found
    }

    /// The adjacent segment in `direction`, following the graph edges
    pub fn neighbor(&self, handle: SegmentHandle, direction: Direction) -> Option<SegmentHandle> {
        self.get(handle)?;
        self.graph
            .edges(NodeIndex::new(handle.index))
            .find(|edge| *edge.weight() == direction)
            .map(|edge| self.handle(edge.target().index()))
    }

    /// Whether a vehicle could drive from one segment to the other
    pub fn is_reachable(&self, from: SegmentHandle, to: SegmentHandle) -> bool {
        if self.get(from).is_none() || self.get(to).is_none() {
            return false;
        }
        has_path_connecting(
            &self.graph,
            NodeIndex::new(from.index),
            NodeIndex::new(to.index),
            None,
        )
    }

    /// Whether the entry board leads into at least one cell of the user grid
    pub fn entry_connected(&self) -> bool {
        let Some(start) = self
            .segments
            .iter()
            .position(|segment| segment.source == CellSource::Entry)
        else {
            return false;
        };

        let mut bfs = Bfs::new(&self.graph, NodeIndex::new(start));
        while let Some(node) = bfs.next(&self.graph) {
            if self.segments[node.index()].source == CellSource::Grid {
                return true;
            }
        }
        false
    }
}
