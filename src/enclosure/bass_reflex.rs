//! Vented enclosure.
//!
//! Box compliance (with absorption `Rab` in series), port mass (with loss
//! `Rap`) and leakage `Ral` form three parallel branches behind the cone.
//! The port radiates the volume velocity of its branch with inverted sign.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::alignment::{self, Alignment};
use super::port::{set_port_param, Port, PortParams};
use super::AcousticLoad;
use crate::driver::Driver;
use crate::environment::Environment;
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::complex::J;
use crate::math::fnc::parallel_all;
use crate::math::{Complex, ComplexExt, MIN_Q};

/// Bass-reflex parameters. Missing `vb`/`fb` come from the alignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BassReflexParams {
    /// Net internal volume (m³)
    pub vb: Option<f64>,
    /// Tuning frequency (Hz)
    pub fb: Option<f64>,
    pub alignment: Alignment,
    /// Absorption Q
    pub qa: f64,
    /// Leakage Q
    pub ql: f64,
    /// Port loss Q
    pub qp: f64,
    pub port: Option<PortParams>,
}

impl Default for BassReflexParams {
    fn default() -> Self {
        Self {
            vb: None,
            fb: None,
            alignment: Alignment::Auto,
            qa: 50.0,
            ql: 7.0,
            qp: 100.0,
            port: None,
        }
    }
}

impl BassReflexParams {
    pub fn tuned(vb: f64, fb: f64) -> Self {
        Self {
            vb: Some(vb),
            fb: Some(fb),
            ..Self::default()
        }
    }

    /// Set a numeric parameter by its project-file name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        if set_port_param(&mut self.port, name, value)? {
            return Ok(());
        }
        match name.to_ascii_lowercase().as_str() {
            "vb" => self.vb = Some(value),
            "fb" => self.fb = Some(value),
            "qa" => self.qa = value,
            "ql" => self.ql = value,
            "qp" => self.qp = value,
            other => {
                return Err(SpeakerSimError::invalid_parameter(
                    "bass reflex",
                    other,
                    "unknown parameter",
                ))
            }
        }
        Ok(())
    }
}

/// Resolved vented box: volume, tuning and losses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VentedDesign {
    pub vb: f64,
    pub fb: f64,
    pub qa: f64,
    pub ql: f64,
    pub qp: f64,
}

/// Acoustic network of a vented box.
#[derive(Debug, Clone)]
pub struct VentedLoad {
    design: VentedDesign,
    cab: f64,
    rab: f64,
    map: f64,
    rap: f64,
    ral: f64,
    port: Option<Port>,
    speed_of_sound: f64,
}

impl VentedLoad {
    pub fn new(design: VentedDesign, port: Option<&PortParams>, env: &Environment) -> Result<Self> {
        let vb = require_positive("vented box", "vb", design.vb)?;
        let fb = require_positive("vented box", "fb", design.fb)?;
        let cab = vb / env.rho_c2();
        let wb = 2.0 * PI * fb;
        let port = match port {
            Some(params) => Some(Port::design(params, vb, fb, env.speed_of_sound)?),
            None => None,
        };
        Ok(Self {
            design,
            cab,
            rab: 1.0 / (wb * cab * design.qa.max(MIN_Q)),
            map: 1.0 / (wb * wb * cab),
            rap: 1.0 / (wb * cab * design.qp.max(MIN_Q)),
            ral: design.ql.max(MIN_Q) / (wb * cab),
            port,
            speed_of_sound: env.speed_of_sound,
        })
    }

    pub fn design(&self) -> &VentedDesign {
        &self.design
    }

    pub fn port(&self) -> Option<&Port> {
        self.port.as_ref()
    }

    fn port_branch(&self, f: f64) -> Complex {
        Complex::real(self.rap) + J * (2.0 * PI * f * self.map)
    }

    fn compliance_branch(&self, f: f64) -> Complex {
        Complex::real(self.rab) + (J * (2.0 * PI * f * self.cab)).reciprocal()
    }

    fn transmission(&self, f: f64) -> Complex {
        match &self.port {
            Some(port) => port.transmission(f, self.speed_of_sound),
            None => Complex::real(1.0),
        }
    }

    /// Port output for a given cone output, `Hc·Zbox/Zport·Tpipe`.
    pub fn port_response(&self, f: f64, cone: Complex) -> Complex {
        cone * self.box_impedance(f) / self.port_branch(f) * self.transmission(f)
    }
}

impl AcousticLoad for VentedLoad {
    fn name(&self) -> &'static str {
        "vented"
    }

    fn box_impedance(&self, f: f64) -> Complex {
        parallel_all([
            self.compliance_branch(f),
            self.port_branch(f),
            Complex::real(self.ral),
        ])
    }

    fn output(&self, f: f64, cone: Complex) -> Complex {
        cone - self.port_response(f, cone)
    }

    fn port_output(&self, f: f64, cone: Complex) -> Option<Complex> {
        Some(self.port_response(f, cone))
    }
}

/// Resolve volume and tuning of a bass-reflex box for `driver`.
pub fn design(driver: &Driver, params: &BassReflexParams) -> Result<VentedDesign> {
    let (vb, fb) = match (params.vb, params.fb) {
        (Some(vb), Some(fb)) => (vb, fb),
        (vb, fb) => {
            let point = alignment::resolve(params.alignment, driver.qts)?;
            debug!(
                alignment = ?point.alignment,
                alpha = point.alpha,
                h = point.h,
                "vented alignment"
            );
            (
                vb.unwrap_or(driver.vas / point.alpha),
                fb.unwrap_or(driver.fs * point.h),
            )
        }
    };
    Ok(VentedDesign {
        vb,
        fb,
        qa: params.qa,
        ql: params.ql,
        qp: params.qp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverParams;
    use approx::assert_abs_diff_eq;

    fn woofer() -> Driver {
        let params = DriverParams {
            fs: Some(28.0),
            qts: Some(0.383),
            qms: Some(5.0),
            vas: Some(0.07),
            re: Some(6.0),
            sd: Some(0.035),
            ..DriverParams::default()
        };
        Driver::compile("W", &params, &Environment::default()).unwrap()
    }

    #[test]
    fn test_design_from_alignment() {
        let d = woofer();
        let design = design(&d, &BassReflexParams::default()).unwrap();
        assert_abs_diff_eq!(design.fb, 28.0, epsilon = 0.5);
        assert!(design.vb > 0.03 && design.vb < 0.07);
        let fixed = super::design(&d, &BassReflexParams::tuned(0.05, 30.0)).unwrap();
        assert_abs_diff_eq!(fixed.vb, 0.05);
        assert_abs_diff_eq!(fixed.fb, 30.0);
    }

    #[test]
    fn test_helmholtz_resonance() {
        let d = woofer();
        let design = design(&d, &BassReflexParams::tuned(0.05, 30.0)).unwrap();
        let load = VentedLoad::new(design, None, &Environment::default()).unwrap();
        // Port mass and box compliance resonate at Fb
        let z_fb = load.box_impedance(30.0).amplitude();
        assert!(z_fb > load.box_impedance(20.0).amplitude());
        assert!(z_fb > load.box_impedance(45.0).amplitude());
    }

    #[test]
    fn test_port_cancels_at_dc() {
        let d = woofer();
        let design = design(&d, &BassReflexParams::tuned(0.05, 30.0)).unwrap();
        let load = VentedLoad::new(design, None, &Environment::default()).unwrap();
        let cone = Complex::real(1.0);
        assert!(load.output(2.0, cone).amplitude() < 0.05);
        assert!(load.output(30.0, cone).amplitude() > 1.0);
    }
}
