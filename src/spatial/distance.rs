//! Spherical spreading and propagation delay.

use std::f64::consts::PI;

use crate::math::{Complex, MIN_DISTANCE};

/// Free-field propagation over a distance.
#[derive(Debug, Clone, Copy)]
pub struct DistanceSimulation {
    speed_of_sound: f64,
}

impl DistanceSimulation {
    pub fn new(speed_of_sound: f64) -> Self {
        Self { speed_of_sound }
    }

    /// `(1/d)·e^(−j2πfd/c)`, relative to the pressure at 1 m.
    pub fn factor(&self, f: f64, distance: f64) -> Complex {
        let d = distance.max(MIN_DISTANCE);
        Complex::from_polar(1.0 / d, -2.0 * PI * f * d / self.speed_of_sound)
    }

    /// Propagation delay in seconds.
    pub fn delay(&self, distance: f64) -> f64 {
        distance.max(MIN_DISTANCE) / self.speed_of_sound
    }
}
