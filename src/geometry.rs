//! 3D rotation and translation primitives.
//!
//! Only three rotation matrices are needed: a quarter turn about each of the
//! X, Y and Z axes. Composing them generates all 24 rotations of a cube (see
//! [`crate::orientation`] for the sequence used to enumerate them).

use crate::pieces::Coord;

/// One of the three major axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// All axes in x, y, z order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Returns the component of `coord` along this axis.
    #[inline]
    pub const fn component(self, (x, y, z): Coord) -> i32 {
        match self {
            Axis::X => x,
            Axis::Y => y,
            Axis::Z => z,
        }
    }
}

/// A 3x3 integer rotation matrix, stored row-major.
///
/// Every matrix used here is a signed permutation matrix, so applying it never
/// leaves the integer lattice.
pub type RotationMatrix = [[i32; 3]; 3];

/// Quarter turn about the X axis: `(x, y, z) -> (x, -z, y)`.
pub const ROTATE_X: RotationMatrix = [[1, 0, 0], [0, 0, -1], [0, 1, 0]];

/// Quarter turn about the Y axis: `(x, y, z) -> (z, y, -x)`.
pub const ROTATE_Y: RotationMatrix = [[0, 0, 1], [0, 1, 0], [-1, 0, 0]];

/// Quarter turn about the Z axis: `(x, y, z) -> (-y, x, z)`.
pub const ROTATE_Z: RotationMatrix = [[0, -1, 0], [1, 0, 0], [0, 0, 1]];

/// Multiplies `matrix` by the column vector `coord`.
#[inline]
pub fn rotate_coordinate(matrix: &RotationMatrix, (x, y, z): Coord) -> Coord {
    let [r0, r1, r2] = matrix.map(|[a, b, c]| a * x + b * y + c * z);
    (r0, r1, r2)
}

/// Moves `coord` by `delta` along `axis`.
#[inline]
pub const fn translate_coordinate((x, y, z): Coord, axis: Axis, delta: i32) -> Coord {
    match axis {
        Axis::X => (x + delta, y, z),
        Axis::Y => (x, y + delta, z),
        Axis::Z => (x, y, z + delta),
    }
}
