//! Cube Packing Solver Library
//!
//! Packs a list of polycube pieces into an N x N x N cube by exhaustive
//! backtracking over every orientation and translation of every piece.

pub mod error;
pub mod geometry;
pub mod grid;
pub mod orientation;
pub mod pieces;
pub mod solver;

pub use error::{Error, Result};
pub use grid::OccupancyGrid;
pub use orientation::OrientedPiece;
pub use pieces::{Coord, Piece, PieceId};
pub use solver::{CubeSolver, Outcome, SolverConfig};
