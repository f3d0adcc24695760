//! Off-axis attenuation of a driver.
//!
//! The analytic model is a rigid piston in an infinite baffle. Measured polar
//! curves, when present, take precedence inside their angular and frequency
//! coverage. Outside the measured angles the attenuation is the smaller of
//! the analytic value and the value at the outermost measured angle.

use serde::{Deserialize, Serialize};

use super::params::PolarCurve;
use crate::error::{Result, SpeakerSimError};
use crate::math::bessel::piston_directivity;
use crate::math::fnc::{from_db, interpolate, sinc};

/// Radiating surface shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PistonShape {
    Circular { diameter: f64 },
    Rectangular { width: f64, height: f64 },
}

/// Measured off-axis curves along one axis, stored relative to on-axis.
#[derive(Debug, Clone)]
struct PolarSet {
    /// Sorted angles (degrees)
    angles: Vec<f64>,
    curves: Vec<PolarCurve>,
    /// Index of the 0° curve
    reference: usize,
    /// All angles are non-negative: the pattern is mirrored for negative angles
    symmetric: bool,
}

impl PolarSet {
    fn build(axis: &str, mut curves: Vec<PolarCurve>, on_axis: Option<&crate::measurement::ResponseData>) -> Result<Option<Self>> {
        if curves.is_empty() {
            return Ok(None);
        }
        if !curves.iter().any(|c| c.angle == 0.0) {
            match on_axis {
                Some(data) => curves.push(PolarCurve {
                    angle: 0.0,
                    data: data.clone(),
                }),
                None => {
                    return Err(SpeakerSimError::invalid_parameter(
                        "driver",
                        axis,
                        "polar curves need a 0° entry or an on-axis measurement",
                    ))
                }
            }
        }
        curves.sort_by(|a, b| a.angle.total_cmp(&b.angle));
        curves.dedup_by(|a, b| a.angle == b.angle);
        let angles: Vec<f64> = curves.iter().map(|c| c.angle).collect();
        let reference = angles.iter().position(|&a| a == 0.0).unwrap_or(0);
        let symmetric = angles[0] >= 0.0;
        Ok(Some(Self {
            angles,
            curves,
            reference,
            symmetric,
        }))
    }

    /// Relative level (dB) of the curve at `idx` against 0°, if `f` is
    /// measured by both.
    fn relative_db(&self, idx: usize, f: f64) -> Option<f64> {
        let curve = &self.curves[idx].data;
        let reference = &self.curves[self.reference].data;
        if !curve.covers(f) || !reference.covers(f) {
            return None;
        }
        Some(curve.value_at(f).amplitude - reference.value_at(f).amplitude)
    }

    /// Measured attenuation at `angle`, or the bound at the outermost angle
    /// when `angle` lies outside the coverage. `None` when `f` is not measured.
    fn attenuation(&self, f: f64, angle: f64) -> Option<Coverage> {
        let a = if self.symmetric { angle.abs() } else { angle };
        let last = self.angles.len() - 1;
        if a < self.angles[0] {
            return self.relative_db(0, f).map(|db| Coverage::Outside(from_db(db)));
        }
        if a > self.angles[last] {
            return self.relative_db(last, f).map(|db| Coverage::Outside(from_db(db)));
        }
        let hi = self.angles.partition_point(|&x| x < a).min(last);
        if self.angles[hi] == a || hi == 0 {
            return self.relative_db(hi, f).map(|db| Coverage::Inside(from_db(db)));
        }
        let lo = hi - 1;
        let db_lo = self.relative_db(lo, f)?;
        let db_hi = self.relative_db(hi, f)?;
        let db = interpolate(self.angles[lo], db_lo, self.angles[hi], db_hi, a);
        Some(Coverage::Inside(from_db(db)))
    }
}

enum Coverage {
    Inside(f64),
    Outside(f64),
}

/// Compiled directivity model of one driver.
#[derive(Debug, Clone)]
pub struct Directivity {
    shape: PistonShape,
    dipole: bool,
    speed_of_sound: f64,
    horizontal: Option<PolarSet>,
    vertical: Option<PolarSet>,
}

impl Directivity {
    /// Analytic model only.
    pub fn analytic(shape: PistonShape, dipole: bool, speed_of_sound: f64) -> Self {
        Self {
            shape,
            dipole,
            speed_of_sound,
            horizontal: None,
            vertical: None,
        }
    }

    /// Analytic model refined by measured polar curves.
    pub fn with_measurements(
        shape: PistonShape,
        dipole: bool,
        speed_of_sound: f64,
        horizontal: Vec<PolarCurve>,
        vertical: Vec<PolarCurve>,
        on_axis: Option<&crate::measurement::ResponseData>,
    ) -> Result<Self> {
        Ok(Self {
            shape,
            dipole,
            speed_of_sound,
            horizontal: PolarSet::build("horizontal", horizontal, on_axis)?,
            vertical: PolarSet::build("vertical", vertical, on_axis)?,
        })
    }

    pub fn shape(&self) -> PistonShape {
        self.shape
    }

    pub fn is_dipole(&self) -> bool {
        self.dipole
    }

    /// Fold a horizontal angle beyond 90°. Monopoles hold the 90° value,
    /// dipoles mirror to `180° − θ` with inverted polarity.
    fn fold(&self, horizontal: f64) -> (f64, f64) {
        if horizontal.abs() <= 90.0 {
            return (horizontal, 1.0);
        }
        if self.dipole {
            (horizontal.signum() * (180.0 - horizontal.abs()), -1.0)
        } else {
            (horizontal.signum() * 90.0, 1.0)
        }
    }

    /// Piston attenuation for angles already folded into ±90°.
    fn piston(&self, f: f64, horizontal: f64, vertical: f64) -> f64 {
        let c = self.speed_of_sound;
        match self.shape {
            PistonShape::Circular { diameter } => {
                let cos_theta = horizontal.to_radians().cos() * vertical.to_radians().cos();
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                piston_directivity(std::f64::consts::PI * f / c * diameter * sin_theta)
            }
            PistonShape::Rectangular { width, height } => {
                let kh = std::f64::consts::PI * f * width * horizontal.to_radians().sin() / c;
                let kv = std::f64::consts::PI * f * height * vertical.to_radians().sin() / c;
                (sinc(kh) * sinc(kv)).abs()
            }
        }
    }

    /// Analytic off-axis factor, signed (negative for a dipole's rear lobe).
    pub fn analytic_factor(&self, f: f64, horizontal: f64, vertical: f64) -> f64 {
        let (h, sign) = self.fold(horizontal);
        sign * self.piston(f, h, vertical.clamp(-90.0, 90.0))
    }

    /// Off-axis factor at horizontal and vertical angles (degrees).
    pub fn factor(&self, f: f64, horizontal: f64, vertical: f64) -> f64 {
        if self.horizontal.is_none() && self.vertical.is_none() {
            return self.analytic_factor(f, horizontal, vertical);
        }
        let (_, sign) = self.fold(horizontal);
        let h_part = self.axis_factor(self.horizontal.as_ref(), f, horizontal, true);
        let v_part = self.axis_factor(self.vertical.as_ref(), f, vertical, false);
        sign * h_part * v_part
    }

    fn axis_factor(&self, set: Option<&PolarSet>, f: f64, angle: f64, horizontal: bool) -> f64 {
        let analytic = if horizontal {
            let (h, _) = self.fold(angle);
            self.piston(f, h, 0.0)
        } else {
            self.piston(f, 0.0, angle.clamp(-90.0, 90.0))
        };
        match set.and_then(|s| s.attenuation(f, angle)) {
            Some(Coverage::Inside(value)) => value,
            Some(Coverage::Outside(bound)) => analytic.min(bound),
            None => analytic,
        }
    }

    /// Attenuation toward the baffle plane, used by the diffraction model.
    pub fn toward_baffle(&self, f: f64) -> f64 {
        self.piston(f, 90.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{MeasurementKind, ResponseData, ResponseEntry};
    use approx::assert_abs_diff_eq;

    fn flat(level: f64) -> ResponseData {
        ResponseData::new(
            MeasurementKind::Response,
            vec![
                ResponseEntry::new(100.0, level, 0.0),
                ResponseEntry::new(10_000.0, level, 0.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_on_axis_is_unity() {
        let d = Directivity::analytic(PistonShape::Circular { diameter: 0.2 }, false, 343.0);
        assert_abs_diff_eq!(d.factor(5000.0, 0.0, 0.0), 1.0);
        assert!(d.factor(5000.0, 60.0, 0.0) < 0.5);
    }

    #[test]
    fn test_monopole_holds_ninety_degrees() {
        let d = Directivity::analytic(PistonShape::Circular { diameter: 0.1 }, false, 343.0);
        assert_abs_diff_eq!(d.factor(2000.0, 150.0, 0.0), d.factor(2000.0, 90.0, 0.0));
    }

    #[test]
    fn test_dipole_rear_is_inverted_mirror() {
        let d = Directivity::analytic(PistonShape::Circular { diameter: 0.1 }, true, 343.0);
        assert_abs_diff_eq!(d.factor(2000.0, 150.0, 0.0), -d.factor(2000.0, 30.0, 0.0));
        assert_abs_diff_eq!(d.factor(100.0, 180.0, 0.0), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rectangular_piston() {
        let d = Directivity::analytic(
            PistonShape::Rectangular {
                width: 0.02,
                height: 0.2,
            },
            false,
            343.0,
        );
        // Narrow horizontally, so wide dispersion in that plane
        assert!(d.factor(4000.0, 45.0, 0.0) > d.factor(4000.0, 0.0, 45.0));
    }

    #[test]
    fn test_measured_polar_and_outside_bound() {
        let d = Directivity::with_measurements(
            PistonShape::Circular { diameter: 0.025 },
            false,
            343.0,
            vec![
                PolarCurve { angle: 30.0, data: flat(84.0) },
                PolarCurve { angle: 0.0, data: flat(90.0) },
            ],
            vec![],
            None,
        )
        .unwrap();
        // Halfway to 30°: -3 dB
        assert_abs_diff_eq!(d.factor(1000.0, 15.0, 0.0), from_db(-3.0), epsilon = 1e-9);
        assert_abs_diff_eq!(d.factor(1000.0, -30.0, 0.0), from_db(-6.0), epsilon = 1e-9);
        // Beyond the coverage the tweeter piston is wider than -6 dB, so the
        // outermost measurement bounds it
        assert_abs_diff_eq!(d.factor(1000.0, 60.0, 0.0), from_db(-6.0), epsilon = 1e-9);
        // Outside the measured band: analytic
        assert_abs_diff_eq!(d.factor(20_000.0, 15.0, 0.0), d.analytic_factor(20_000.0, 15.0, 0.0));
    }

    #[test]
    fn test_polar_needs_reference() {
        let err = Directivity::with_measurements(
            PistonShape::Circular { diameter: 0.1 },
            false,
            343.0,
            vec![PolarCurve { angle: 30.0, data: flat(84.0) }],
            vec![],
            None,
        );
        assert!(err.is_err());
    }
}
