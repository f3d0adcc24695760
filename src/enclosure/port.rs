//! Vent geometry and duct transmission.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::bessel::piston_radiation;
use crate::math::complex::J;
use crate::math::{Complex, ComplexExt};

/// Cross-section of one port.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortShape {
    Round { diameter: f64 },
    Rect { width: f64, height: f64 },
}

impl PortShape {
    /// Cross-section area (m²).
    pub fn area(&self) -> f64 {
        match *self {
            PortShape::Round { diameter } => PI * (diameter / 2.0).powi(2),
            PortShape::Rect { width, height } => width * height,
        }
    }

    /// Radius of the round port with the same area (m).
    pub fn equivalent_radius(&self) -> f64 {
        (self.area() / PI).sqrt()
    }
}

/// End condition of the duct, selecting the end-correction constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortEnds {
    #[default]
    BothFlanged,
    FlangedFree,
    BothFree,
}

impl PortEnds {
    /// End correction per end, in units of the equivalent radius.
    pub fn correction(&self) -> f64 {
        match self {
            PortEnds::BothFlanged => 0.850,
            PortEnds::FlangedFree => 0.732,
            PortEnds::BothFree => 0.614,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "flanged" | "both_flanged" => Some(Self::BothFlanged),
            "flanged_free" | "mixed" => Some(Self::FlangedFree),
            "free" | "both_free" => Some(Self::BothFree),
            _ => None,
        }
    }
}

/// Port description supplied with a vented box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortParams {
    pub shape: PortShape,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub ends: PortEnds,
}

fn default_count() -> u32 {
    1
}

impl PortParams {
    pub fn round(diameter: f64) -> Self {
        Self {
            shape: PortShape::Round { diameter },
            count: 1,
            ends: PortEnds::default(),
        }
    }
}

/// Apply a `port_*` project-file parameter. Returns `false` when `name` is
/// not a port parameter.
pub fn set_port_param(port: &mut Option<PortParams>, name: &str, value: f64) -> Result<bool> {
    let key = name.to_ascii_lowercase();
    if !key.starts_with("port_") {
        return Ok(false);
    }
    let entry = port.get_or_insert(PortParams::round(0.0));
    match key.as_str() {
        "port_diameter" => entry.shape = PortShape::Round { diameter: value },
        "port_width" | "port_height" => {
            let (mut width, mut height) = match entry.shape {
                PortShape::Rect { width, height } => (width, height),
                PortShape::Round { .. } => (0.0, 0.0),
            };
            if key == "port_width" {
                width = value;
            } else {
                height = value;
            }
            entry.shape = PortShape::Rect { width, height };
        }
        "port_count" => {
            if value < 1.0 || value.fract() != 0.0 {
                return Err(SpeakerSimError::invalid_parameter("port", "count", "must be a positive integer"));
            }
            entry.count = value as u32;
        }
        other => {
            return Err(SpeakerSimError::invalid_parameter("port", other, "unknown port parameter"));
        }
    }
    Ok(true)
}

/// A port sized for a given box and tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Port {
    pub area: f64,
    pub radius: f64,
    pub count: u32,
    /// Physical duct length (m)
    pub length: f64,
}

impl Port {
    /// Duct length `Lv = N·Sp·c²/(ωb²·Vb) − 2k·r` for tuning `fb` in a box of
    /// volume `vb`.
    pub fn design(params: &PortParams, vb: f64, fb: f64, speed_of_sound: f64) -> Result<Self> {
        let area = require_positive("port", "area", params.shape.area())?;
        if params.count == 0 {
            return Err(SpeakerSimError::invalid_parameter("port", "count", "must be at least 1"));
        }
        let radius = params.shape.equivalent_radius();
        let wb = 2.0 * PI * fb;
        let acoustic = params.count as f64 * area * speed_of_sound.powi(2) / (wb * wb * vb);
        let length = acoustic - 2.0 * params.ends.correction() * radius;
        if length <= 0.0 {
            return Err(SpeakerSimError::invalid_parameter(
                "port",
                "length",
                format!("port too small for {:.1} Hz tuning (length {:.4} m)", fb, length),
            ));
        }
        Ok(Self {
            area,
            radius,
            count: params.count,
            length,
        })
    }

    /// Duct transmission `1/(cos kL + j·(Zrad·S/ρc)·sin kL)`.
    pub fn transmission(&self, f: f64, speed_of_sound: f64) -> Complex {
        let k = 2.0 * PI * f / speed_of_sound;
        let (r1, x1) = piston_radiation(k * self.radius);
        let z_rad = Complex::new(r1, x1);
        let kl = k * self.length;
        (Complex::real(kl.cos()) + J * z_rad * kl.sin()).reciprocal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_end_corrections() {
        assert_abs_diff_eq!(PortEnds::BothFlanged.correction(), 0.850);
        assert_abs_diff_eq!(PortEnds::FlangedFree.correction(), 0.732);
        assert_abs_diff_eq!(PortEnds::BothFree.correction(), 0.614);
    }

    #[test]
    fn test_duct_length() {
        let params = PortParams::round(0.05);
        let port = Port::design(&params, 0.05, 30.0, 343.0).unwrap();
        let area = PI * 0.025 * 0.025;
        let expected = area * 343.0 * 343.0 / ((2.0 * PI * 30.0).powi(2) * 0.05) - 1.7 * 0.025;
        assert_abs_diff_eq!(port.length, expected, epsilon = 1e-12);
        // A free end needs a longer duct
        let free = Port::design(
            &PortParams {
                ends: PortEnds::BothFree,
                ..params
            },
            0.05,
            30.0,
            343.0,
        )
        .unwrap();
        assert!(free.length > port.length);
    }

    #[test]
    fn test_port_too_short() {
        let params = PortParams::round(0.01);
        assert!(Port::design(&params, 0.2, 200.0, 343.0).is_err());
    }

    #[test]
    fn test_set_port_param() {
        let mut port = None;
        assert!(!set_port_param(&mut port, "vb", 1.0).unwrap());
        assert!(set_port_param(&mut port, "port_width", 0.1).unwrap());
        assert!(set_port_param(&mut port, "port_height", 0.02).unwrap());
        assert!(set_port_param(&mut port, "port_count", 2.0).unwrap());
        let port = port.unwrap();
        assert_eq!(port.shape, PortShape::Rect { width: 0.1, height: 0.02 });
        assert_eq!(port.count, 2);
        assert!(set_port_param(&mut Some(port), "port_count", 1.5).is_err());
    }

    #[test]
    fn test_transmission_at_low_frequency() {
        let port = Port::design(&PortParams::round(0.05), 0.05, 30.0, 343.0).unwrap();
        assert_abs_diff_eq!(port.transmission(1.0, 343.0).amplitude(), 1.0, epsilon = 1e-4);
        let rect = PortShape::Rect { width: 0.1, height: 0.02 };
        assert_abs_diff_eq!(rect.area(), 0.002, epsilon = 1e-15);
    }
}
