//! Sealed enclosure.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::AcousticLoad;
use crate::driver::Driver;
use crate::environment::Environment;
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::complex::J;
use crate::math::{Complex, ComplexExt, MIN_Q};

/// Butterworth total Q, the target of [`calc_box`] before absorption.
const BUTTERWORTH_Q: f64 = 0.707;

/// Closed-box parameters. `vb` is derived with [`calc_box`] when unset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosedBoxParams {
    /// Net internal volume (m³)
    pub vb: Option<f64>,
    /// Absorption Q
    pub qa: f64,
    /// Leakage Q
    pub ql: f64,
}

impl Default for ClosedBoxParams {
    fn default() -> Self {
        Self {
            vb: None,
            qa: 10.0,
            ql: 7.0,
        }
    }
}

impl ClosedBoxParams {
    pub fn with_volume(vb: f64) -> Self {
        Self {
            vb: Some(vb),
            ..Self::default()
        }
    }

    /// Set a parameter by its project-file name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        match name.to_ascii_lowercase().as_str() {
            "vb" => self.vb = Some(value),
            "qa" => self.qa = value,
            "ql" => self.ql = value,
            other => {
                return Err(SpeakerSimError::invalid_parameter(
                    "closed box",
                    other,
                    "unknown parameter",
                ))
            }
        }
        Ok(())
    }
}

/// Volume giving `Qtc = 0.707 + 1/qa`: `Vb = Vas/((Qtc/Qts)² − 1)`.
pub fn calc_box(driver: &Driver, qa: f64) -> Result<f64> {
    let qa = require_positive("closed box", "qa", qa)?;
    let target = BUTTERWORTH_Q + 1.0 / qa;
    if driver.qts >= target {
        return Err(SpeakerSimError::alignment_out_of_range(
            format!("closed box (Qtc {:.3})", target),
            driver.qts,
            0.0,
            target,
        ));
    }
    Ok(driver.vas / ((target / driver.qts).powi(2) - 1.0))
}

/// Total Q of the driver in a box of volume `vb`.
pub fn qtc(driver: &Driver, vb: f64) -> f64 {
    driver.qts * (1.0 + driver.vas / vb).sqrt()
}

/// Resonance of the driver in a box of volume `vb`.
pub fn fc(driver: &Driver, vb: f64) -> f64 {
    driver.fs * (1.0 + driver.vas / vb).sqrt()
}

/// Box compliance with leakage and absorption losses in parallel.
#[derive(Debug, Clone)]
pub struct ClosedBoxLoad {
    vb: f64,
    cab: f64,
    ral: f64,
    rab: f64,
}

impl ClosedBoxLoad {
    pub fn new(driver: &Driver, params: &ClosedBoxParams, env: &Environment) -> Result<Self> {
        let qa = params.qa.max(MIN_Q);
        let ql = params.ql.max(MIN_Q);
        let vb = match params.vb {
            Some(vb) => require_positive("closed box", "vb", vb)?,
            None => calc_box(driver, qa)?,
        };
        let cab = vb / env.rho_c2();
        let wc = 2.0 * PI * fc(driver, vb);
        debug!(vb, qtc = qtc(driver, vb), fc = fc(driver, vb), "closed box");
        Ok(Self {
            vb,
            cab,
            ral: ql / (wc * cab),
            rab: qa / (wc * cab),
        })
    }

    pub fn volume(&self) -> f64 {
        self.vb
    }
}

impl AcousticLoad for ClosedBoxLoad {
    fn name(&self) -> &'static str {
        "closed"
    }

    fn box_impedance(&self, f: f64) -> Complex {
        let w = 2.0 * PI * f;
        let admittance = J * (w * self.cab) + 1.0 / self.ral + 1.0 / self.rab;
        admittance.reciprocal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverParams;
    use approx::assert_abs_diff_eq;

    fn driver(qts: f64) -> Driver {
        let params = DriverParams {
            fs: Some(30.0),
            qts: Some(qts),
            qms: Some(4.0),
            vas: Some(0.08),
            re: Some(6.0),
            sd: Some(0.035),
            ..DriverParams::default()
        };
        Driver::compile("W", &params, &Environment::default()).unwrap()
    }

    #[test]
    fn test_calc_box_reaches_target_q() {
        let d = driver(0.383);
        for qa in [5.0, 10.0, 50.0] {
            let vb = calc_box(&d, qa).unwrap();
            assert_abs_diff_eq!(qtc(&d, vb), 0.707 + 1.0 / qa, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_calc_box_rejects_high_q() {
        let d = driver(0.8);
        assert!(matches!(
            calc_box(&d, 10.0),
            Err(SpeakerSimError::AlignmentOutOfRange { .. })
        ));
    }

    #[test]
    fn test_box_raises_resonance() {
        let d = driver(0.383);
        assert_abs_diff_eq!(fc(&d, 0.08), 30.0 * 2f64.sqrt(), epsilon = 1e-12);
        let load = ClosedBoxLoad::new(&d, &ClosedBoxParams::with_volume(0.08), &Environment::default()).unwrap();
        // Compliance dominates at low frequency
        let z = load.box_impedance(5.0);
        assert!(z.im < 0.0);
        assert!(z.amplitude() > load.box_impedance(50.0).amplitude());
    }
}
