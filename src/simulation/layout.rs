//! Fixed entry board and a ready-made demo grid
//!
//! The entry board sits in the two rows above the user grid: a garage in
//! each top corner, the lane between them, and one connector cell leading
//! down into row 0 of the grid. Vehicles leave the city through the
//! northbound half of that connector.

use super::types::{Cell, Direction, GridCoord, GridGeometry, Rect, ENTRY_ROWS};

/// The two spawn sites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Garage {
    /// Top-left corner
    West,
    /// Top-right corner
    East,
}

impl Garage {
    pub fn coord(self, geometry: &GridGeometry) -> GridCoord {
        let col = match self {
            Garage::West => 0,
            Garage::East => geometry.grid_size as i32 - 1,
        };
        GridCoord::new(-ENTRY_ROWS, col)
    }

    /// The lane cell next to the garage where new vehicles appear
    pub fn start_coord(self, geometry: &GridGeometry) -> GridCoord {
        let col = match self {
            Garage::West => 1,
            Garage::East => geometry.grid_size as i32 - 2,
        };
        GridCoord::new(-ENTRY_ROWS, col)
    }

    /// Heading of a vehicle leaving this garage
    pub fn heading(self) -> Direction {
        match self {
            Garage::West => Direction::East,
            Garage::East => Direction::West,
        }
    }
}

/// The connector cell between the entry board and the grid
pub fn connector_coord(geometry: &GridGeometry) -> GridCoord {
    GridCoord::new(-1, geometry.connector_col())
}

/// Where vehicles are removed: the northbound (east) half of the connector
pub fn exit_zone(geometry: &GridGeometry) -> Rect {
    let cell = geometry.cell_rect(connector_coord(geometry));
    Rect::new(
        cell.left + cell.width / 2.0,
        cell.top,
        cell.width / 2.0,
        cell.height,
    )
}

/// Entry board cells in board-local rows (0 = garage lane, 1 = connector row)
pub fn entry_cells(grid_size: usize) -> Vec<Cell> {
    let geometry = GridGeometry::new(grid_size, 1.0);
    let connector = geometry.connector_col();

    let mut cells = Vec::with_capacity(grid_size * ENTRY_ROWS as usize);
    for row in 0..ENTRY_ROWS {
        for col in 0..grid_size as i32 {
            let mut cell = Cell::new(row, col);
            cell.contains_road = row == 0 || col == connector;
            cells.push(cell);
        }
    }
    cells
}

/// A full grid snapshot with no roads
pub fn empty_grid(grid_size: usize) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(grid_size * grid_size);
    for row in 0..grid_size as i32 {
        for col in 0..grid_size as i32 {
            cells.push(Cell::new(row, col));
        }
    }
    cells
}

/// A ring road with a cross street, fed from the connector, with three cameras
pub fn demo_grid(grid_size: usize) -> Vec<Cell> {
    let geometry = GridGeometry::new(grid_size, 1.0);
    let n = grid_size as i32;
    let connector = geometry.connector_col();
    let (top, bottom) = (1, n - 2);
    let (left, right) = (1, n - 2);
    let middle = n / 2;

    let mut cells = empty_grid(grid_size);
    for cell in cells.iter_mut() {
        let (row, col) = (cell.row, cell.col);
        let on_ring = (row == top || row == bottom) && (left..=right).contains(&col)
            || (col == left || col == right) && (top..=bottom).contains(&row);
        let on_cross = row == middle && (left..=right).contains(&col);
        let on_feeder = col == connector && row < top;
        cell.contains_road = on_ring || on_cross || on_feeder;
    }

    let cameras = [(1, top, middle), (2, bottom, middle), (3, middle, right)];
    for (index, row, col) in cameras {
        if let Some(cell) = cells.iter_mut().find(|c| c.row == row && c.col == col) {
            if cell.contains_road {
                cell.contains_camera = true;
                cell.camera_index = index;
            }
        }
    }

    cells
}
