//! Geometry primitives: oriented positions and the baffle rectangle.

mod baffle;
mod position;

pub use baffle::{Baffle, EdgePoint, EDGE_POINTS};
pub use position::Position;
