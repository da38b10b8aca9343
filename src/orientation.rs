//! Orientation engine for a single piece.
//!
//! A cube has 24 orientations: 6 directions the piece's x-axis can point in,
//! times 4 quarter turns around that direction. Each direction is reached by a
//! fixed setup rotation, then swept with the generator whose axis it lies on.
//!
//! Orientation index `i` decomposes as direction `i / 4` and `i % 4` turns:
//! - 0-3: x-axis stays at +X, turn about X
//! - 4-7: one Y turn sends it to -Z, turn about Z
//! - 8-11: two Y turns send it to -X, turn about X
//! - 12-15: three Y turns send it to +Z, turn about Z
//! - 16-19: one Z turn sends it to +Y, turn about Y
//! - 20-23: three Z turns send it to -Y, turn about Y

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::geometry::{Axis, RotationMatrix, ROTATE_X, ROTATE_Y, ROTATE_Z};
use crate::grid::check_cube_size;
use crate::pieces::{Coord, Piece, PieceId};

/// Number of distinct cube orientations.
pub const NUM_ORIENTATIONS: usize = 24;

/// Quarter turns available around a single axis.
const TURNS_PER_DIRECTION: usize = 4;

/// Setup rotation pointing the piece at one face, plus the in-plane spin.
struct Direction {
    setup: &'static RotationMatrix,
    setup_turns: usize,
    spin: &'static RotationMatrix,
}

const DIRECTIONS: [Direction; NUM_ORIENTATIONS / TURNS_PER_DIRECTION] = [
    Direction { setup: &ROTATE_Y, setup_turns: 0, spin: &ROTATE_X },
    Direction { setup: &ROTATE_Y, setup_turns: 1, spin: &ROTATE_Z },
    Direction { setup: &ROTATE_Y, setup_turns: 2, spin: &ROTATE_X },
    Direction { setup: &ROTATE_Y, setup_turns: 3, spin: &ROTATE_Z },
    Direction { setup: &ROTATE_Z, setup_turns: 1, spin: &ROTATE_Y },
    Direction { setup: &ROTATE_Z, setup_turns: 3, spin: &ROTATE_Y },
];

/// Applies `matrix` to `piece` the given number of times.
fn rotate_times(piece: Piece, matrix: &RotationMatrix, turns: usize) -> Piece {
    (0..turns).fold(piece, |piece, _| piece.rotate(matrix))
}

/// Rotates `piece` into `orientation` without re-anchoring it.
///
/// Callers must check `orientation < NUM_ORIENTATIONS`.
fn rotate_to(piece: &Piece, orientation: usize) -> Piece {
    let direction = &DIRECTIONS[orientation / TURNS_PER_DIRECTION];
    let turns = orientation % TURNS_PER_DIRECTION;

    let pointed = rotate_times(piece.clone(), direction.setup, direction.setup_turns);
    rotate_times(pointed, direction.spin, turns)
}

/// Every offset that keeps an origin-anchored `piece` inside the cube.
///
/// Ordered x outermost, z innermost. Empty when the piece does not fit.
fn available_locations(piece: &Piece, cube_size: usize) -> Vec<Coord> {
    let last_cell = cube_size as i32 - 1;
    let [max_x, max_y, max_z] = Axis::ALL.map(|axis| last_cell - piece.max_position(axis));

    let mut locations = Vec::new();
    for i in 0..=max_x {
        for j in 0..=max_y {
            for k in 0..=max_z {
                locations.push((i, j, k));
            }
        }
    }
    locations
}

/// Wraps a piece and derives its oriented and located forms on demand.
///
/// Intended call order: [`orientate`](Self::orientate) to pick one of the 24
/// orientations, then [`relocate`](Self::relocate) to pick one of that
/// orientation's offsets. The original piece is never modified; each call
/// replaces the derived snapshot it produces.
#[derive(Clone, Debug)]
pub struct OrientedPiece {
    original: Piece,
    oriented: Piece,
    located: Piece,
    locations: Vec<Coord>,
    cube_size: usize,
}

impl OrientedPiece {
    /// Wraps `piece` for a cube with `cube_size` cells per side.
    ///
    /// Until the first `orientate` call the oriented form is the original
    /// shape anchored at the origin and no offsets are available.
    pub fn new(piece: Piece, cube_size: usize) -> Self {
        let oriented = piece.start_at_origin();
        Self {
            original: piece,
            located: oriented.clone(),
            oriented,
            locations: Vec::new(),
            cube_size,
        }
    }

    pub fn id(&self) -> PieceId {
        self.original.id()
    }

    pub fn original(&self) -> &Piece {
        &self.original
    }

    /// The most recent result of [`orientate`](Self::orientate).
    pub fn oriented(&self) -> &Piece {
        &self.oriented
    }

    /// The most recent result of [`relocate`](Self::relocate).
    pub fn located(&self) -> &Piece {
        &self.located
    }

    /// Valid offsets for the current orientation.
    pub fn locations(&self) -> &[Coord] {
        &self.locations
    }

    pub fn number_of_locations(&self) -> usize {
        self.locations.len()
    }

    /// Rotates the original piece into `orientation` (0..24), anchors it at
    /// the origin and recomputes the valid offsets.
    pub fn orientate(&mut self, orientation: usize) -> Result<&Piece> {
        if orientation >= NUM_ORIENTATIONS {
            return Err(Error::OrientationOutOfRange(orientation));
        }
        check_cube_size(self.cube_size)?;
        self.oriented = rotate_to(&self.original, orientation).start_at_origin();
        self.locations = available_locations(&self.oriented, self.cube_size);
        Ok(&self.oriented)
    }

    /// Shifts the oriented piece by the offset at `location`.
    pub fn relocate(&mut self, location: usize) -> Result<&Piece> {
        let &offset = self
            .locations
            .get(location)
            .ok_or(Error::LocationOutOfRange {
                index: location,
                count: self.locations.len(),
            })?;
        self.located = self.oriented.translated_by(offset);
        Ok(&self.located)
    }

    /// Counts the geometrically distinct shapes among the 24 orientations.
    ///
    /// Pieces with rotational symmetry produce fewer than 24.
    pub fn distinct_orientations(&self) -> usize {
        let shapes: FxHashSet<Vec<Coord>> = (0..NUM_ORIENTATIONS)
            .map(|orientation| {
                let mut cells = rotate_to(&self.original, orientation)
                    .start_at_origin()
                    .elements()
                    .to_vec();
                cells.sort_unstable();
                cells
            })
            .collect();
        shapes.len()
    }
}
