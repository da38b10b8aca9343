//! Error types for the cube packer.

use thiserror::Error;

use crate::pieces::{Coord, PieceId};

/// Result type alias for cube packer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building pieces or running a search.
///
/// Running out of placements is not an error: the search reports it as
/// [`Outcome::Exhausted`](crate::solver::Outcome::Exhausted).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A piece was defined without any unit cells.
    #[error("piece {id} has no elements")]
    EmptyPiece { id: PieceId },

    /// A piece cell lies too far from the origin to rotate and translate
    /// safely.
    #[error("piece {id} has element {coord:?} outside the supported coordinate range")]
    CoordinateOutOfRange { id: PieceId, coord: Coord },

    /// Piece id 0 marks empty grid cells and cannot name a piece.
    #[error("piece id 0 is reserved for empty cells")]
    ReservedPieceId,

    /// Two pieces share the same id.
    #[error("duplicate piece id {0}")]
    DuplicatePieceId(PieceId),

    /// A search was requested without any pieces.
    #[error("no pieces to place")]
    NoPieces,

    /// The cube side length must be in `1..=`[`MAX_CUBE_SIZE`](crate::grid::MAX_CUBE_SIZE).
    #[error("invalid cube size {0}")]
    InvalidCubeSize(usize),

    /// The pieces hold more unit cells than the cube.
    #[error("pieces occupy {pieces} cells but the cube only has {cube}")]
    VolumeExceeded { pieces: usize, cube: usize },

    /// Orientation index outside `0..24`.
    #[error("orientation {0} out of range (expected 0..24)")]
    OrientationOutOfRange(usize),

    /// Location index outside the current orientation's offsets.
    #[error("location {index} out of range (expected 0..{count})")]
    LocationOutOfRange { index: usize, count: usize },

    /// A cancellation flag was raised while searching.
    #[error("search cancelled")]
    Cancelled,
}
