//! Loads without an acoustic network: open baffle and free air.

use std::f64::consts::PI;

use super::AcousticLoad;
use crate::math::complex::J;
use crate::math::{Complex, ComplexExt};

/// Driver on an unenclosed baffle.
///
/// The rear wave reaches the listener over the extra path
/// `D = r + sqrt(r² + d²) − d` with inverted polarity, giving the dipole
/// factor `1 − e^(−jkD)`.
#[derive(Debug, Clone)]
pub struct OpenBaffleLoad {
    path_difference: f64,
    speed_of_sound: f64,
}

impl OpenBaffleLoad {
    /// `edge_distance` is the mean driver-to-edge distance `r`,
    /// `listening_distance` the distance `d` to the listener.
    pub fn new(edge_distance: f64, listening_distance: f64, speed_of_sound: f64) -> Self {
        let r = edge_distance.max(0.0);
        let d = listening_distance.max(0.0);
        Self {
            path_difference: r + (r * r + d * d).sqrt() - d,
            speed_of_sound,
        }
    }

    pub fn path_difference(&self) -> f64 {
        self.path_difference
    }

    fn dipole_factor(&self, f: f64) -> Complex {
        let k = 2.0 * PI * f / self.speed_of_sound;
        Complex::real(1.0) - (-J * (k * self.path_difference)).exp()
    }
}

impl AcousticLoad for OpenBaffleLoad {
    fn name(&self) -> &'static str {
        "open baffle"
    }

    fn box_impedance(&self, _f: f64) -> Complex {
        Complex::real(0.0)
    }

    fn output(&self, f: f64, cone: Complex) -> Complex {
        cone * self.dipole_factor(f)
    }
}

/// Free air: no load on the rear of the cone.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoad;

impl AcousticLoad for NullLoad {
    fn name(&self) -> &'static str {
        "null"
    }

    fn box_impedance(&self, _f: f64) -> Complex {
        Complex::real(0.0)
    }
}
