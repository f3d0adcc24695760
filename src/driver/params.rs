//! Driver configuration as supplied by the user.

use serde::{Deserialize, Serialize};

use super::power_filter::PowerFilter;
use crate::error::{Result, SpeakerSimError};
use crate::math::fnc::log_fraction;
use crate::measurement::ResponseData;

/// Frequency band over which measured data fades in over the simulation.
///
/// Below `start` the simulated curve is used, above `end` the measured one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWindow {
    pub start: f64,
    pub end: f64,
}

impl BlendWindow {
    /// Weight of the measured curve at `f`, linear in log-frequency.
    pub fn measured_weight(&self, f: f64) -> f64 {
        log_fraction(f, self.start, self.end)
    }
}

/// A measured response at a fixed off-axis angle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolarCurve {
    /// Angle in degrees
    pub angle: f64,
    pub data: ResponseData,
}

/// Measured data attached to a driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverMeasurements {
    pub on_axis: Option<ResponseData>,
    pub horizontal: Vec<PolarCurve>,
    pub vertical: Vec<PolarCurve>,
    pub impedance: Option<ResponseData>,
}

/// Thiele-Small parameters and optional measurements.
///
/// SI units throughout except `xmax` (mm) and `sensitivity` (dB SPL at
/// 2.83 V / 1 m). Unset values are derived when the driver is compiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverParams {
    /// Resonance frequency (Hz)
    pub fs: Option<f64>,
    /// Equivalent compliance volume (m³)
    pub vas: Option<f64>,
    pub qes: Option<f64>,
    pub qms: Option<f64>,
    pub qts: Option<f64>,
    /// Voice coil resistance (Ω)
    pub re: Option<f64>,
    /// Force factor (T·m)
    pub bl: Option<f64>,
    /// Voice coil inductance (H)
    pub le: Option<f64>,
    /// Linear excursion, one way (mm)
    pub xmax: Option<f64>,
    /// Effective piston area (m²)
    pub sd: Option<f64>,
    /// Effective piston diameter (m)
    pub dia: Option<f64>,
    /// Rectangular piston width (m)
    pub width: Option<f64>,
    /// Rectangular piston height (m)
    pub height: Option<f64>,
    /// Suspension compliance (m/N)
    pub cms: Option<f64>,
    /// Moving mass (kg)
    pub mms: Option<f64>,
    /// Mechanical resistance (N·s/m)
    pub rms: Option<f64>,
    /// Sensitivity (dB SPL, 2.83 V / 1 m)
    pub sensitivity: Option<f64>,
    /// Rated power (W)
    pub pe: Option<f64>,
    /// Radiates equally to the rear with inverted polarity
    pub dipole: bool,
    /// Sealed back: enclosure simulation is skipped
    pub closed: bool,
    pub power_filter: PowerFilter,
    pub blend: Option<BlendWindow>,
    pub measurements: DriverMeasurements,
}

impl DriverParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a numeric parameter by its project-file name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        let slot = match name.to_ascii_lowercase().as_str() {
            "fs" => &mut self.fs,
            "vas" => &mut self.vas,
            "qes" => &mut self.qes,
            "qms" => &mut self.qms,
            "qts" => &mut self.qts,
            "re" => &mut self.re,
            "bl" => &mut self.bl,
            "le" => &mut self.le,
            "xmax" => &mut self.xmax,
            "sd" => &mut self.sd,
            "dia" | "diameter" => &mut self.dia,
            "width" => &mut self.width,
            "height" => &mut self.height,
            "cms" => &mut self.cms,
            "mms" => &mut self.mms,
            "rms" => &mut self.rms,
            "spl" | "sensitivity" => &mut self.sensitivity,
            "pe" | "power" => &mut self.pe,
            "dipole" => {
                self.dipole = value != 0.0;
                return Ok(());
            }
            "closed" => {
                self.closed = value != 0.0;
                return Ok(());
            }
            "blend_start" | "blend_end" => {
                let window = self.blend.get_or_insert(BlendWindow {
                    start: value,
                    end: value,
                });
                if name.eq_ignore_ascii_case("blend_start") {
                    window.start = value;
                } else {
                    window.end = value;
                }
                return Ok(());
            }
            other => {
                return Err(SpeakerSimError::invalid_parameter(
                    "driver",
                    other,
                    "unknown driver parameter",
                ))
            }
        };
        *slot = Some(value);
        Ok(())
    }

    /// Attach a measured on-axis response.
    pub fn with_on_axis(mut self, data: ResponseData) -> Self {
        self.measurements.on_axis = Some(data);
        self
    }

    /// Attach a measured impedance curve.
    pub fn with_impedance(mut self, data: ResponseData) -> Self {
        self.measurements.impedance = Some(data);
        self
    }

    /// Add a measured horizontal off-axis curve.
    pub fn with_horizontal(mut self, angle: f64, data: ResponseData) -> Self {
        self.measurements.horizontal.push(PolarCurve { angle, data });
        self
    }

    /// Add a measured vertical off-axis curve.
    pub fn with_vertical(mut self, angle: f64, data: ResponseData) -> Self {
        self.measurements.vertical.push(PolarCurve { angle, data });
        self
    }

    /// Set the measured/simulated blend window.
    pub fn with_blend(mut self, start: f64, end: f64) -> Self {
        self.blend = Some(BlendWindow { start, end });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_set_by_name() {
        let mut params = DriverParams::new();
        params.set("Fs", 40.0).unwrap();
        params.set("qts", 0.35).unwrap();
        params.set("closed", 1.0).unwrap();
        params.set("blend_end", 400.0).unwrap();
        params.set("blend_start", 200.0).unwrap();
        assert_eq!(params.fs, Some(40.0));
        assert!(params.closed);
        assert_eq!(params.blend, Some(BlendWindow { start: 200.0, end: 400.0 }));
        assert!(params.set("foo", 1.0).is_err());
    }

    #[test]
    fn test_blend_weight() {
        let window = BlendWindow {
            start: 100.0,
            end: 1000.0,
        };
        assert_abs_diff_eq!(window.measured_weight(50.0), 0.0);
        assert_abs_diff_eq!(window.measured_weight(316.227766), 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(window.measured_weight(2000.0), 1.0);
    }
}
