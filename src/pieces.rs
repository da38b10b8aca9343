//! Puzzle piece definitions and coordinate types.
//!
//! A piece is a polycube: an id plus the unit cells it occupies. Pieces are
//! immutable values; every transformation returns a new piece.

use std::fmt;

use crate::error::{Error, Result};
use crate::geometry::{rotate_coordinate, translate_coordinate, Axis, RotationMatrix};

/// A 3D coordinate representing a unit cube position.
pub type Coord = (i32, i32, i32);

/// Identifies a piece inside the occupancy grid. Zero marks an empty cell.
pub type PieceId = u32;

/// Largest absolute coordinate accepted for a piece element.
///
/// Keeps rotation, anchoring and translation well inside `i32`.
pub const MAX_COORDINATE: i32 = 1 << 20;

/// A polycube with a stable identifier.
///
/// Element order is insertion order. It carries no meaning for the shape but
/// is preserved by every transformation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
    id: PieceId,
    elements: Vec<Coord>,
}

impl Piece {
    /// Creates a piece, rejecting the reserved id 0, empty shapes and
    /// elements beyond [`MAX_COORDINATE`] on any axis.
    pub fn new(id: PieceId, elements: Vec<Coord>) -> Result<Self> {
        if id == 0 {
            return Err(Error::ReservedPieceId);
        }
        if elements.is_empty() {
            return Err(Error::EmptyPiece { id });
        }
        let in_range = |coord: Coord| {
            Axis::ALL
                .iter()
                .all(|axis| axis.component(coord).unsigned_abs() <= MAX_COORDINATE as u32)
        };
        if let Some(&coord) = elements.iter().find(|&&coord| !in_range(coord)) {
            return Err(Error::CoordinateOutOfRange { id, coord });
        }
        Ok(Self { id, elements })
    }

    pub fn id(&self) -> PieceId {
        self.id
    }

    /// The unit cells of this piece, in insertion order.
    pub fn elements(&self) -> &[Coord] {
        &self.elements
    }

    /// Number of unit cells in this piece.
    pub fn volume(&self) -> usize {
        self.elements.len()
    }

    /// Returns a copy shifted by `delta` along `axis`.
    pub fn translate(&self, axis: Axis, delta: i32) -> Self {
        if delta == 0 {
            return self.clone();
        }
        self.map_elements(|coord| translate_coordinate(coord, axis, delta))
    }

    /// Returns a copy shifted by `offset` along all three axes.
    pub fn translated_by(&self, (dx, dy, dz): Coord) -> Self {
        self.translate(Axis::X, dx)
            .translate(Axis::Y, dy)
            .translate(Axis::Z, dz)
    }

    /// Returns a copy with every element multiplied by `matrix`.
    pub fn rotate(&self, matrix: &RotationMatrix) -> Self {
        self.map_elements(|coord| rotate_coordinate(matrix, coord))
    }

    /// Lowest occupied position along `axis`.
    pub fn min_position(&self, axis: Axis) -> i32 {
        self.elements
            .iter()
            .map(|&coord| axis.component(coord))
            .fold(i32::MAX, i32::min)
    }

    /// Highest occupied position along `axis`.
    pub fn max_position(&self, axis: Axis) -> i32 {
        self.elements
            .iter()
            .map(|&coord| axis.component(coord))
            .fold(i32::MIN, i32::max)
    }

    /// Translates the piece so its minimum position on every axis is zero.
    pub fn start_at_origin(&self) -> Self {
        Axis::ALL.iter().fold(self.clone(), |piece, &axis| {
            let adjustment = -piece.min_position(axis);
            piece.translate(axis, adjustment)
        })
    }

    fn map_elements(&self, transform: impl Fn(Coord) -> Coord) -> Self {
        Self {
            id: self.id,
            elements: self.elements.iter().map(|&coord| transform(coord)).collect(),
        }
    }
}

impl fmt::Display for Piece {
    /// One row per axis listing that component of every element.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Piece: {}", self.id)?;
        for (label, axis) in ["x", "y", "z"].into_iter().zip(Axis::ALL) {
            write!(f, "{label}:")?;
            for &coord in &self.elements {
                write!(f, " {}", axis.component(coord))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Side length of the wooden cube puzzle.
pub const WOODEN_CUBE_SIZE: usize = 3;

/// The six pieces of the wooden 3x3x3 cube puzzle, in search order.
///
/// Three tetracubes and three pentacubes, 27 cells in total.
pub const WOODEN_CUBE_PIECES: &[&[Coord]] = &[
    // 3d tetracube (4 cubes)
    &[(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 1, 1)],
    // 3d tetracube (4 cubes)
    &[(0, 0, 0), (0, 0, 1), (0, 1, 0), (1, 1, 0)],
    // flat L (4 cubes)
    &[(0, 0, 0), (0, 1, 0), (1, 1, 0), (2, 1, 0)],
    // 3d pentacube (5 cubes)
    &[(0, 1, 0), (0, 0, 1), (1, 0, 1), (0, 1, 1), (0, 2, 1)],
    // 3d pentacube (5 cubes)
    &[(0, 0, 1), (1, 0, 1), (1, 0, 0), (1, 1, 0), (2, 1, 0)],
    // 3d pentacube (5 cubes)
    &[(0, 0, 0), (0, 1, 0), (0, 0, 1), (1, 0, 1), (2, 0, 1)],
];

/// Builds the wooden cube pieces with ids `1..=6`.
pub fn wooden_cube_pieces() -> Vec<Piece> {
    WOODEN_CUBE_PIECES
        .iter()
        .zip(1..)
        .map(|(&elements, id)| Piece {
            id,
            elements: elements.to_vec(),
        })
        .collect()
}
