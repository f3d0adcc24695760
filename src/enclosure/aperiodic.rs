//! Aperiodic (resistively vented) enclosure.
//!
//! Modeled as a vented box whose lossy vent is a pseudo-port tuned to the
//! closed-box resonance, with fixed absorption and leakage.

use serde::{Deserialize, Serialize};

use super::bass_reflex::{VentedDesign, VentedLoad};
use super::closed_box::{calc_box, fc};
use super::port::{set_port_param, PortParams};
use crate::driver::Driver;
use crate::environment::Environment;
use crate::error::{require_positive, Result, SpeakerSimError};

/// Absorption Q of an aperiodic box.
pub const APERIODIC_QA: f64 = 10.0;

/// Leakage Q of an aperiodic box.
pub const APERIODIC_QL: f64 = 7.0;

/// Aperiodic box parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AperiodicParams {
    /// Net internal volume (m³), closed-box alignment when unset
    pub vb: Option<f64>,
    /// Vent loss Q
    pub qp: f64,
    pub port: Option<PortParams>,
}

impl Default for AperiodicParams {
    fn default() -> Self {
        Self {
            vb: None,
            qp: 2.0,
            port: None,
        }
    }
}

impl AperiodicParams {
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        if set_port_param(&mut self.port, name, value)? {
            return Ok(());
        }
        match name.to_ascii_lowercase().as_str() {
            "vb" => self.vb = Some(value),
            "qp" => self.qp = value,
            other => {
                return Err(SpeakerSimError::invalid_parameter(
                    "aperiodic",
                    other,
                    "unknown parameter",
                ))
            }
        }
        Ok(())
    }
}

/// Build the vented network of an aperiodic box.
pub fn load(driver: &Driver, params: &AperiodicParams, env: &Environment) -> Result<VentedLoad> {
    let vb = match params.vb {
        Some(vb) => require_positive("aperiodic", "vb", vb)?,
        None => calc_box(driver, APERIODIC_QA)?,
    };
    let design = VentedDesign {
        vb,
        fb: fc(driver, vb),
        qa: APERIODIC_QA,
        ql: APERIODIC_QL,
        qp: params.qp,
    };
    VentedLoad::new(design, params.port.as_ref(), env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverParams;
    use crate::enclosure::AcousticLoad;
    use crate::math::ComplexExt;
    use approx::assert_abs_diff_eq;

    fn woofer() -> Driver {
        let params = DriverParams {
            fs: Some(35.0),
            qts: Some(0.4),
            qms: Some(4.0),
            vas: Some(0.05),
            re: Some(6.0),
            sd: Some(0.03),
            ..DriverParams::default()
        };
        Driver::compile("W", &params, &Environment::default()).unwrap()
    }

    #[test]
    fn test_tuned_to_closed_box_resonance() {
        let d = woofer();
        let params = AperiodicParams {
            vb: Some(0.05),
            ..AperiodicParams::default()
        };
        let load = load(&d, &params, &Environment::default()).unwrap();
        assert_abs_diff_eq!(load.design().fb, 35.0 * 2f64.sqrt(), epsilon = 1e-9);
        assert_abs_diff_eq!(load.design().qa, 10.0);
        assert_abs_diff_eq!(load.design().ql, 7.0);
    }

    #[test]
    fn test_lossy_vent_is_damped() {
        let d = woofer();
        let lossy = load(&d, &AperiodicParams::default(), &Environment::default()).unwrap();
        let fb = lossy.design().fb;
        let params = crate::enclosure::BassReflexParams::tuned(lossy.design().vb, fb);
        let vented = VentedLoad::new(
            crate::enclosure::bass_reflex::design(&d, &params).unwrap(),
            None,
            &Environment::default(),
        )
        .unwrap();
        assert!(lossy.box_impedance(fb).amplitude() < vented.box_impedance(fb).amplitude());
    }
}
