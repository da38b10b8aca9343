//! Occupancy grid for the cube being packed.
//!
//! The grid is a flat array of `size^3` cells. Each cell holds the id of the
//! piece occupying it, or 0 when empty. Cells are stored z-major, so the
//! layout matches a `grid[z][y][x]` nesting.

use std::fmt;

use crate::error::{Error, Result};
use crate::pieces::{Coord, Piece, PieceId};

/// Cell value marking an unoccupied position.
pub const EMPTY: PieceId = 0;

/// Largest supported cube side length.
pub const MAX_CUBE_SIZE: usize = 64;

/// Rejects cube sizes outside `1..=MAX_CUBE_SIZE`.
pub fn check_cube_size(size: usize) -> Result<()> {
    if size == 0 || size > MAX_CUBE_SIZE {
        return Err(Error::InvalidCubeSize(size));
    }
    Ok(())
}

/// Converts (x, y, z) coordinates to a linear cell index.
///
/// Index order is z-major: `idx = (z * size + y) * size + x`.
#[inline(always)]
pub const fn coord_to_idx(size: usize, (x, y, z): Coord) -> usize {
    ((z as usize) * size + (y as usize)) * size + (x as usize)
}

/// Converts a linear cell index to (x, y, z) coordinates.
#[inline(always)]
pub const fn idx_to_coord(size: usize, cell_index: usize) -> Coord {
    (
        (cell_index % size) as i32,
        ((cell_index / size) % size) as i32,
        (cell_index / (size * size)) as i32,
    )
}

/// Tracks which piece, if any, occupies each cell of the cube.
///
/// The default grid has no cells at all.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OccupancyGrid {
    size: usize,
    cells: Vec<PieceId>,
}

impl OccupancyGrid {
    /// Creates an empty grid with `size` cells per side.
    pub fn new(size: usize) -> Result<Self> {
        check_cube_size(size)?;
        Ok(Self {
            size,
            cells: vec![EMPTY; size.pow(3)],
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells in z-major order.
    pub fn cells(&self) -> &[PieceId] {
        &self.cells
    }

    /// Returns the occupant of `coord`, or `None` if it lies outside the cube.
    pub fn get(&self, coord: Coord) -> Option<PieceId> {
        self.index(coord).map(|idx| self.cells[idx])
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        let (x, y, z) = coord;
        let bound = 0..self.size as i32;
        (bound.contains(&x) && bound.contains(&y) && bound.contains(&z))
            .then(|| coord_to_idx(self.size, coord))
    }

    /// Claims every cell of `piece` for its id.
    ///
    /// Returns `false` without touching the grid if any cell is occupied or
    /// outside the cube.
    pub fn try_stamp(&mut self, piece: &Piece) -> bool {
        let free = piece
            .elements()
            .iter()
            .all(|&coord| self.get(coord) == Some(EMPTY));
        if !free {
            return false;
        }

        for &coord in piece.elements() {
            if let Some(idx) = self.index(coord) {
                self.cells[idx] = piece.id();
            }
        }
        true
    }

    /// Clears every cell currently labeled with `id`.
    pub fn unstamp(&mut self, id: PieceId) {
        for cell in self.cells.iter_mut().filter(|cell| **cell == id) {
            *cell = EMPTY;
        }
    }

    /// Empties the whole grid.
    pub fn clear(&mut self) {
        self.cells.fill(EMPTY);
    }

    pub fn empty_cells(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell == EMPTY).count()
    }

    pub fn is_full(&self) -> bool {
        self.empty_cells() == 0
    }

    /// Coordinates occupied by `id`, in index order.
    pub fn cells_of(&self, id: PieceId) -> Vec<Coord> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &cell)| cell == id)
            .map(|(idx, _)| idx_to_coord(self.size, idx))
            .collect()
    }
}

impl fmt::Display for OccupancyGrid {
    /// One line per y row. The z planes sit side by side, separated by two
    /// spaces, with x running left to right inside each plane.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.size;
        for y in 0..size {
            for z in 0..size {
                if z > 0 {
                    f.write_str("  ")?;
                }
                for x in 0..size {
                    if x > 0 {
                        f.write_str(" ")?;
                    }
                    let coord = (x as i32, y as i32, z as i32);
                    write!(f, "{}", self.cells[coord_to_idx(size, coord)])?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
