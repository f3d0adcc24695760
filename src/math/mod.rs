//! Numeric kernel shared by every simulation layer.
//!
//! - [`complex`] - complex value type and polar helpers
//! - [`fnc`] - interpolation, decibels, impedance combinators, formatting
//! - [`bessel`] - Bessel J0/J1 and Struve H1 approximations, piston directivity
//! - [`hilbert`] - minimum-phase reconstruction (Hilbert-Bode kernel)
//! - [`poly`] - real polynomial products used by filter synthesis
//! - [`sweep`] - frequency grids

pub mod bessel;
pub mod complex;
pub mod fnc;
pub mod hilbert;
pub mod poly;
pub mod sweep;

pub use complex::{Complex, ComplexExt};

/// Generic guard for divisions by quantities that should never be zero.
pub const EPSILON: f64 = 1e-12;

/// Smallest impedance magnitude used in divider and parallel formulas (ohms).
pub const MIN_IMPEDANCE: f64 = 1e-9;

/// Smallest propagation distance (meters).
pub const MIN_DISTANCE: f64 = 1e-3;

/// Smallest accepted quality factor.
pub const MIN_Q: f64 = 1e-3;
