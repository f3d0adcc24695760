//! Baffle edge diffraction.
//!
//! Each of the 36 edge points re-radiates the wave that reached it with
//! inverted polarity and half strength. Averaged over the edge, the
//! secondary sources cancel half of the direct sound at low frequency (full
//! space radiation) and fall out of step at high frequency (half space).

use std::f64::consts::PI;

use crate::error::Result;
use crate::geometry::{Baffle, EdgePoint};
use crate::math::complex::J;
use crate::math::{Complex, ComplexExt};

/// Level of a dipole's rear lobe relative to its front (-1 dB).
pub const DIPOLE_REAR_LEVEL: f64 = 0.891;

/// Diffraction model for one driver on one baffle.
#[derive(Debug, Clone)]
pub struct BaffleSimulation {
    edges: Vec<EdgePoint>,
    edge_radius: f64,
    dipole: bool,
    speed_of_sound: f64,
}

impl BaffleSimulation {
    pub fn new(baffle: &Baffle, dipole: bool, speed_of_sound: f64) -> Result<Self> {
        baffle.validate()?;
        Ok(Self {
            edges: baffle.edge_points(),
            edge_radius: baffle.edge_radius,
            dipole,
            speed_of_sound,
        })
    }

    pub fn is_dipole(&self) -> bool {
        self.dipole
    }

    /// Low-pass of a rounded edge, `1/(1 + jf/fe)` with `fe = c/(2π·radius)`.
    fn edge_rolloff(&self, f: f64) -> Complex {
        if self.edge_radius <= 0.0 {
            return Complex::real(1.0);
        }
        let fe = self.speed_of_sound / (2.0 * PI * self.edge_radius);
        (Complex::real(1.0) + J * (f / fe)).reciprocal()
    }

    /// Mean of `e^(−jkΔi)` over the edge points for an observer at `local`
    /// (driver frame: x right, y up, z forward).
    fn edge_average(&self, f: f64, local: (f64, f64, f64)) -> Complex {
        let k = 2.0 * PI * f / self.speed_of_sound;
        let (ox, oy, oz) = local;
        let direct = (ox * ox + oy * oy + oz * oz).sqrt();
        let sum: Complex = self
            .edges
            .iter()
            .map(|edge| {
                let (ex, ey) = (ox - edge.dx, oy - edge.dy);
                let path = edge.distance + (ex * ex + ey * ey + oz * oz).sqrt() - direct;
                Complex::from_polar(1.0, -k * path)
            })
            .sum();
        sum / self.edges.len() as f64
    }

    /// Diffraction factor relative to half-space radiation.
    ///
    /// `toward_baffle` is the driver's own attenuation along the baffle plane.
    /// Observers behind a dipole's baffle get the mirrored front value,
    /// inverted and reduced by [`DIPOLE_REAR_LEVEL`].
    pub fn factor(&self, f: f64, local: (f64, f64, f64), toward_baffle: f64) -> Complex {
        let (x, y, z) = local;
        if self.dipole && z < 0.0 {
            return -self.front_factor(f, (x, y, -z), toward_baffle) * DIPOLE_REAR_LEVEL;
        }
        self.front_factor(f, (x, y, z.max(0.0)), toward_baffle)
    }

    fn front_factor(&self, f: f64, local: (f64, f64, f64), toward_baffle: f64) -> Complex {
        let diffracted = self.edge_average(f, local) * self.edge_rolloff(f) * toward_baffle;
        Complex::real(1.0) - diffracted * 0.5
    }

    /// Fraction of full-space radiation seen on axis: 1 at low frequency,
    /// 0.5 once the baffle acts as an infinite wall.
    pub fn solid_angle_fraction(&self, f: f64, toward_baffle: f64) -> f64 {
        let diffracted = self.edge_average(f, (0.0, 0.0, 1.0)) * self.edge_rolloff(f) * toward_baffle;
        0.5 + 0.5 * diffracted.amplitude()
    }
}
