//! Core types for the traffic simulation
//!
//! Plain value types shared by every part of the engine. Nothing in here
//! knows about rendering: positions are continuous world units with `y`
//! growing towards the south.

/// Number of cameras the editor can place
pub const CAMERA_CAPACITY: usize = 3;

/// Rows of the entry board above the user grid (garage lane + connector)
pub const ENTRY_ROWS: i32 = 2;

/// Preferred column of the connector cell that joins the entry board to the grid
pub const ENTRY_CONNECTOR_COL: i32 = 4;

/// Smallest grid the entry board fits on (two garages, two start cells)
pub const MIN_GRID_SIZE: usize = 4;

/// Largest grid the editor offers
pub const MAX_GRID_SIZE: usize = 64;

/// A unique identifier for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(pub usize);

/// Camera slot number, always within `1..=CAMERA_CAPACITY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraIndex(u8);

impl CameraIndex {
    /// Returns `None` for indices outside the fixed capacity.
    pub fn new(index: u8) -> Option<Self> {
        if (1..=CAMERA_CAPACITY as u8).contains(&index) {
            Some(Self(index))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based slot for per-camera arrays
    pub fn slot(self) -> usize {
        (self.0 - 1) as usize
    }

    pub fn all() -> impl Iterator<Item = CameraIndex> {
        (1..=CAMERA_CAPACITY as u8).map(CameraIndex)
    }
}

/// Type of vehicle in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleKind {
    /// Square footprint
    Car,
    /// Twice as long as a car
    Truck,
}

/// Compass heading on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// The direction after a right turn
    pub fn right(self) -> Direction {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// The direction after a left turn
    pub fn left(self) -> Direction {
        self.right().opposite()
    }

    pub fn axis(self) -> Axis {
        match self {
            Direction::North | Direction::South => Axis::Vertical,
            Direction::East | Direction::West => Axis::Horizontal,
        }
    }

    /// Unit step in world coordinates (north is -y)
    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::East => (1.0, 0.0),
            Direction::West => (-1.0, 0.0),
        }
    }

    /// Unit step in grid coordinates as (row, col)
    pub fn grid_offset(self) -> (i32, i32) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}

/// Orientation of a straight piece of road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Which two neighbours a turn connects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

/// Integer grid coordinate. Rows above the user grid are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn step(self, direction: Direction) -> GridCoord {
        let (dr, dc) = direction.grid_offset();
        GridCoord::new(self.row + dr, self.col + dc)
    }
}

/// Where a cell snapshot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellSource {
    /// The user-drawn grid, origin at row 0
    Grid,
    /// The fixed entry board, local rows `0..ENTRY_ROWS` sit above the grid
    Entry,
}

impl CellSource {
    /// Row offset from snapshot-local rows to world rows
    pub fn row_origin(self) -> i32 {
        match self {
            CellSource::Grid => 0,
            CellSource::Entry => -ENTRY_ROWS,
        }
    }
}

/// One grid unit as authored by the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub row: i32,
    pub col: i32,
    pub contains_road: bool,
    pub contains_camera: bool,
    /// Camera slot (1..=3) when `contains_camera` is set
    pub camera_index: u8,
    // Editor bookkeeping, not read by the engine
    pub road_drawn: bool,
    pub camera_drawn: bool,
    pub to_delete: bool,
}

impl Cell {
    pub fn new(row: i32, col: i32) -> Self {
        Self {
            row,
            col,
            ..Default::default()
        }
    }

    pub fn road(row: i32, col: i32) -> Self {
        Self {
            contains_road: true,
            ..Self::new(row, col)
        }
    }

    pub fn road_with_camera(row: i32, col: i32, camera_index: u8) -> Self {
        Self {
            contains_camera: true,
            camera_index,
            ..Self::road(row, col)
        }
    }
}

/// Size of the grid and of one cell in world units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub grid_size: usize,
    pub cell_size: f32,
}

impl GridGeometry {
    pub fn new(grid_size: usize, cell_size: f32) -> Self {
        Self {
            grid_size,
            cell_size,
        }
    }

    /// World coordinate of a snapshot cell
    pub fn world_coord(&self, cell: &Cell, source: CellSource) -> GridCoord {
        GridCoord::new(cell.row + source.row_origin(), cell.col)
    }

    pub fn cell_center(&self, coord: GridCoord) -> Position {
        Position::new(
            (coord.col as f32 + 0.5) * self.cell_size,
            (coord.row as f32 + 0.5) * self.cell_size,
        )
    }

    pub fn cell_rect(&self, coord: GridCoord) -> Rect {
        Rect::new(
            coord.col as f32 * self.cell_size,
            coord.row as f32 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// Distance of each lane from the middle of its cell
    pub fn lane_offset(&self) -> f32 {
        self.cell_size / 4.0
    }

    /// Column of the connector between the entry board and the grid
    pub fn connector_col(&self) -> i32 {
        ENTRY_CONNECTOR_COL.clamp(1, self.grid_size as i32 - 2)
    }
}

/// A 2D position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, direction: Direction, amount: f32) -> Position {
        let (dx, dy) = direction.unit();
        Position::new(self.x + dx * amount, self.y + dy * amount)
    }

    /// Coordinate along the axis of `direction`
    pub fn along(&self, direction: Direction) -> f32 {
        match direction.axis() {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }
}

/// Axis-aligned rectangle, `left/top` is the north-west corner
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn centered(center: Position, width: f32, height: f32) -> Self {
        Self::new(
            center.x - width / 2.0,
            center.y - height / 2.0,
            width,
            height,
        )
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn center(&self) -> Position {
        Position::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }

    /// Half-open containment: the west and north edges belong to the rectangle
    pub fn contains(&self, point: Position) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }

    /// True when the two rectangles share a non-empty area. Touching edges do not count.
    pub fn intersects(&self, other: &Rect) -> bool {
        let left = self.left.max(other.left);
        let right = self.right().min(other.right());
        let top = self.top.max(other.top);
        let bottom = self.bottom().min(other.bottom());
        left < right && top < bottom
    }

    pub fn is_square(&self) -> bool {
        (self.width - self.height).abs() <= f32::EPSILON * self.width.abs().max(self.height.abs())
    }

    /// Grows the rectangle on the side facing `direction`
    pub fn extended(&self, direction: Direction, amount: f32) -> Rect {
        match direction {
            Direction::North => Rect::new(self.left, self.top - amount, self.width, self.height + amount),
            Direction::South => Rect::new(self.left, self.top, self.width, self.height + amount),
            Direction::East => Rect::new(self.left, self.top, self.width + amount, self.height),
            Direction::West => Rect::new(self.left - amount, self.top, self.width + amount, self.height),
        }
    }
}
