//! Compiled driver: completed Thiele-Small set and its acoustic analogy.

use std::f64::consts::PI;

use tracing::debug;

use super::directivity::{Directivity, PistonShape};
use super::params::{BlendWindow, DriverParams};
use super::power_filter::PowerFilter;
use crate::environment::{Environment, REFERENCE_VOLTAGE};
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::complex::J;
use crate::math::fnc::{from_db, to_db};
use crate::math::{Complex, ComplexExt, MIN_IMPEDANCE};
use crate::measurement::{MeasurementKind, ResponseData};

/// Exponent of the semi-inductance model `(12π·Le·f)^0.56`.
const SEMI_INDUCTANCE_EXPONENT: f64 = 0.56;

/// Tolerance when Qes, Qms and Qts are all given.
const Q_CONSISTENCY: f64 = 0.05;

/// A driver ready for evaluation. Immutable after [`Driver::compile`].
#[derive(Debug, Clone)]
pub struct Driver {
    pub fs: f64,
    pub re: f64,
    pub le: f64,
    pub bl: f64,
    pub sd: f64,
    pub qes: f64,
    pub qms: f64,
    pub qts: f64,
    pub vas: f64,
    pub cms: f64,
    pub mms: f64,
    pub rms: f64,
    pub xmax: Option<f64>,
    pub pe: Option<f64>,
    /// Sensitivity, dB SPL at 2.83 V / 1 m
    pub sensitivity: f64,
    pub closed: bool,
    pub power_filter: PowerFilter,
    cas: f64,
    mas: f64,
    ras: f64,
    rae: f64,
    reference: f64,
    blend: Option<BlendWindow>,
    on_axis: Option<ResponseData>,
    measured_impedance: Option<ResponseData>,
    directivity: Directivity,
}

/// Mass and compliance from whichever of Vas, Cms or Mms was given.
fn resolve_mass_compliance(params: &DriverParams, fs: f64, sd: f64, rho_c2: f64) -> Result<(f64, f64, f64)> {
    let ws2 = (2.0 * PI * fs).powi(2);
    let cms = match (params.cms, params.vas, params.mms) {
        (Some(cms), _, _) => require_positive("driver", "cms", cms)?,
        (None, Some(vas), _) => require_positive("driver", "vas", vas)? / (rho_c2 * sd * sd),
        (None, None, Some(mms)) => 1.0 / (ws2 * require_positive("driver", "mms", mms)?),
        (None, None, None) => {
            return Err(SpeakerSimError::invalid_parameter(
                "driver",
                "vas",
                "one of vas, cms or mms is required",
            ))
        }
    };
    let mms = match params.mms {
        Some(mms) => require_positive("driver", "mms", mms)?,
        None => 1.0 / (ws2 * cms),
    };
    let vas = params.vas.unwrap_or(cms * rho_c2 * sd * sd);
    Ok((cms, mms, vas))
}

/// Complete the Q factors from the given ones or from Bl / Rms.
fn resolve_q(params: &DriverParams, ws: f64, mms: f64, re: f64) -> Result<(f64, f64, f64)> {
    let mut qes = params.qes;
    let mut qms = params.qms;
    let mut qts = params.qts;

    if qes.is_none() {
        if let Some(bl) = params.bl {
            qes = Some(ws * mms * re / (bl * bl));
        }
    }
    if qms.is_none() {
        if let Some(rms) = params.rms {
            qms = Some(ws * mms / rms);
        }
    }

    // Two passes fill any one missing value from the other two
    for _ in 0..2 {
        match (qes, qms, qts) {
            (Some(e), Some(m), None) => qts = Some(e * m / (e + m)),
            (Some(e), None, Some(t)) => {
                if e <= t {
                    return Err(SpeakerSimError::invalid_parameter(
                        "driver",
                        "qes",
                        format!("Qes ({:.3}) must exceed Qts ({:.3})", e, t),
                    ));
                }
                qms = Some(e * t / (e - t));
            }
            (None, Some(m), Some(t)) => {
                if m <= t {
                    return Err(SpeakerSimError::invalid_parameter(
                        "driver",
                        "qms",
                        format!("Qms ({:.3}) must exceed Qts ({:.3})", m, t),
                    ));
                }
                qes = Some(m * t / (m - t));
            }
            _ => {}
        }
    }

    match (qes, qms, qts) {
        (Some(e), Some(m), Some(t)) => {
            let expected = e * m / (e + m);
            if (expected - t).abs() > Q_CONSISTENCY * t {
                return Err(SpeakerSimError::invalid_parameter(
                    "driver",
                    "qts",
                    format!("contradicts Qes/Qms (expected {:.3}, got {:.3})", expected, t),
                ));
            }
            Ok((
                require_positive("driver", "qes", e)?,
                require_positive("driver", "qms", m)?,
                require_positive("driver", "qts", t)?,
            ))
        }
        _ => Err(SpeakerSimError::invalid_parameter(
            "driver",
            "qts",
            "two of qes, qms, qts (or bl / rms) are required",
        )),
    }
}

impl Driver {
    /// Complete the parameter set and derive the acoustic analogy.
    pub fn compile(name: &str, params: &DriverParams, env: &Environment) -> Result<Self> {
        let owner = format!("driver {}", name);
        let fs = require_positive(&owner, "fs", params.fs.unwrap_or(f64::NAN))?;
        let re = require_positive(&owner, "re", params.re.unwrap_or(f64::NAN))?;
        let rho_c2 = env.rho_c2();

        let (sd, shape) = match (params.sd, params.dia, params.width, params.height) {
            (_, _, Some(w), Some(h)) => {
                let w = require_positive(&owner, "width", w)?;
                let h = require_positive(&owner, "height", h)?;
                (params.sd.unwrap_or(w * h), PistonShape::Rectangular { width: w, height: h })
            }
            (Some(sd), dia, _, _) => {
                let sd = require_positive(&owner, "sd", sd)?;
                let diameter = dia.unwrap_or(2.0 * (sd / PI).sqrt());
                (sd, PistonShape::Circular { diameter })
            }
            (None, Some(dia), _, _) => {
                let dia = require_positive(&owner, "dia", dia)?;
                (PI * (dia / 2.0).powi(2), PistonShape::Circular { diameter: dia })
            }
            _ => {
                return Err(SpeakerSimError::invalid_parameter(
                    owner,
                    "sd",
                    "one of sd, dia or width/height is required",
                ))
            }
        };
        let sd = require_positive(&owner, "sd", sd)?;

        let (cms, mms, vas) = resolve_mass_compliance(params, fs, sd, rho_c2)?;
        let ws = 2.0 * PI * fs;
        let (qes, qms, qts) = resolve_q(params, ws, mms, re)?;
        let bl = match params.bl {
            Some(bl) => require_positive(&owner, "bl", bl)?,
            None => (ws * mms * re / qes).sqrt(),
        };
        let rms = params.rms.unwrap_or(ws * mms / qms);
        let le = params.le.unwrap_or(0.0).max(0.0);

        let cas = vas / rho_c2;
        let mas = mms / (sd * sd);
        let ras = rms / (sd * sd);
        let rae = bl * bl / (re * sd * sd);

        let c = env.speed_of_sound;
        let sensitivity = match params.sensitivity {
            Some(spl) => spl,
            None => {
                let eta0 = 4.0 * PI * PI * fs.powi(3) * vas / (c.powi(3) * qes);
                112.0 + 10.0 * eta0.log10() + 10.0 * (REFERENCE_VOLTAGE * REFERENCE_VOLTAGE / re).log10()
            }
        };

        let measurements = &params.measurements;
        let polar = measurements.horizontal.iter().chain(&measurements.vertical).map(|p| &p.data);
        for data in measurements.on_axis.iter().chain(&measurements.impedance).chain(polar) {
            data.validate(&owner)?;
        }
        if let Some(z) = &measurements.impedance {
            if z.kind() != MeasurementKind::Impedance {
                return Err(SpeakerSimError::invalid_parameter(owner, "impedance", "expected an impedance curve"));
            }
        }
        if let Some(window) = &params.blend {
            if !(window.start > 0.0 && window.end >= window.start) {
                return Err(SpeakerSimError::invalid_parameter(
                    owner,
                    "blend",
                    "window must satisfy 0 < start <= end",
                ));
            }
        }
        let directivity = Directivity::with_measurements(
            shape,
            params.dipole,
            c,
            measurements.horizontal.clone(),
            measurements.vertical.clone(),
            measurements.on_axis.as_ref(),
        )?;

        debug!(
            driver = name,
            fs, qes, qms, qts, vas, bl, sd, sensitivity,
            "compiled driver"
        );

        Ok(Self {
            fs,
            re,
            le,
            bl,
            sd,
            qes,
            qms,
            qts,
            vas,
            cms,
            mms,
            rms,
            xmax: params.xmax,
            pe: params.pe,
            sensitivity,
            closed: params.closed,
            power_filter: params.power_filter,
            cas,
            mas,
            ras,
            rae,
            reference: from_db(sensitivity),
            blend: params.blend,
            on_axis: measurements.on_axis.clone(),
            measured_impedance: measurements.impedance.clone(),
            directivity,
        })
    }

    /// Acoustic compliance `Vas/(ρc²)`.
    pub fn cas(&self) -> f64 {
        self.cas
    }

    /// Acoustic mass `Mms/Sd²`.
    pub fn mas(&self) -> f64 {
        self.mas
    }

    /// Acoustic resistance `Rms/Sd²`.
    pub fn ras(&self) -> f64 {
        self.ras
    }

    /// Electrical damping seen on the acoustic side, `Bl²/(Re·Sd²)`.
    pub fn rae(&self) -> f64 {
        self.rae
    }

    pub fn directivity(&self) -> &Directivity {
        &self.directivity
    }

    pub fn has_measured_response(&self) -> bool {
        self.on_axis.is_some()
    }

    /// Acoustic impedance of the suspension and moving mass.
    pub fn zas(&self, f: f64) -> Complex {
        let w = 2.0 * PI * f;
        Complex::real(self.ras) + J * (w * self.mas) + (J * (w * self.cas)).reciprocal()
    }

    /// Voice-coil semi-inductance `(12π·Le·f)^0.56 ∠ 0.56·90°`.
    pub fn zle(&self, f: f64) -> Complex {
        if self.le <= 0.0 {
            return Complex::real(0.0);
        }
        let magnitude = (12.0 * PI * self.le * f).powf(SEMI_INDUCTANCE_EXPONENT);
        Complex::from_polar_deg(magnitude, SEMI_INDUCTANCE_EXPONENT * 90.0)
    }

    /// Lumped-model impedance with the box load `zab` on the cone.
    pub fn simulated_impedance(&self, f: f64, zab: Complex) -> Complex {
        let zat = self.zas(f) + zab;
        let motional = (self.bl / self.sd).powi(2) * zat.reciprocal();
        Complex::real(self.re) + self.zle(f) + motional
    }

    /// Free-air impedance: measured when available, else the lumped model.
    pub fn impedance(&self, f: f64) -> Complex {
        self.loaded_impedance(f, Complex::real(0.0))
    }

    /// Impedance with a box load. A measured curve is corrected by the
    /// difference between loaded and free-air simulations.
    pub fn loaded_impedance(&self, f: f64, zab: Complex) -> Complex {
        let simulated = self.simulated_impedance(f, zab);
        match &self.measured_impedance {
            Some(data) => {
                let correction = simulated - self.simulated_impedance(f, Complex::real(0.0));
                let z = data.complex_at(f) + correction;
                if z.re < MIN_IMPEDANCE {
                    Complex::new(MIN_IMPEDANCE, z.im)
                } else {
                    z
                }
            }
            None => simulated,
        }
    }

    /// Simulated cone response `ref·jωMas/(Zas + Zab + Rae)`, linear
    /// pressure re 20 µPa at 1 m and 2.83 V.
    pub fn simulated_response(&self, f: f64, zab: Complex) -> Complex {
        let w = 2.0 * PI * f;
        let num = J * (w * self.mas);
        let den = self.zas(f) + zab + self.rae;
        num * den.reciprocal() * self.reference
    }

    /// Free-air response (measured or simulated).
    pub fn response(&self, f: f64) -> Complex {
        self.blend(f, self.simulated_response(f, Complex::real(0.0)))
    }

    /// Combine a simulated value with the measured on-axis curve.
    ///
    /// Without a blend window measured data is used wherever it exists. With
    /// one, dB amplitude and phase cross-fade linearly in log-frequency.
    pub fn blend(&self, f: f64, simulated: Complex) -> Complex {
        let data = match &self.on_axis {
            Some(data) => data,
            None => return simulated,
        };
        if !data.covers(f) {
            return simulated;
        }
        let weight = self.blend.map_or(1.0, |window| window.measured_weight(f));
        if weight <= 0.0 {
            return simulated;
        }
        let measured = data.complex_at(f);
        if weight >= 1.0 {
            return measured;
        }
        let db = to_db(simulated.amplitude()) * (1.0 - weight) + to_db(measured.amplitude()) * weight;
        let sim_phase = simulated.phase_deg();
        let mut delta = measured.phase_deg() - sim_phase;
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta < -180.0 {
            delta += 360.0;
        }
        Complex::from_polar_deg(from_db(db), sim_phase + weight * delta)
    }

    /// Off-axis factor (see [`Directivity::factor`]).
    pub fn off_axis(&self, f: f64, horizontal: f64, vertical: f64) -> f64 {
        self.directivity.factor(f, horizontal, vertical)
    }

    /// Peak excursion in mm at electrical `power` (W) with box load `zab`.
    pub fn excursion(&self, f: f64, power: f64, zab: Complex) -> f64 {
        let z = self.loaded_impedance(f, zab);
        let volts = (power.max(0.0) * z.amplitude()).sqrt();
        let source = volts * self.bl / (self.sd * self.re);
        let velocity = source / (self.zas(f) + zab + self.rae).amplitude().max(MIN_IMPEDANCE);
        velocity / (2.0 * PI * f * self.sd) * 1000.0
    }

    /// Largest safe electrical power (W): thermal rating shaped by the power
    /// filter, and the power that drives the cone to Xmax.
    ///
    /// Returns `f64::INFINITY` when neither Pe nor Xmax is known.
    pub fn max_power(&self, f: f64, zab: Complex) -> f64 {
        let thermal = self
            .pe
            .map(|pe| pe * self.power_filter.weight(f, self.fs))
            .unwrap_or(f64::INFINITY);
        let excursion_limit = match self.xmax {
            Some(xmax) => {
                let x1 = self.excursion(f, 1.0, zab);
                if x1 > 0.0 {
                    (xmax / x1).powi(2)
                } else {
                    f64::INFINITY
                }
            }
            None => f64::INFINITY,
        };
        thermal.min(excursion_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn woofer() -> DriverParams {
        DriverParams {
            fs: Some(40.0),
            qts: Some(0.35),
            vas: Some(0.040),
            re: Some(6.0),
            bl: Some(8.0),
            sd: Some(0.02),
            ..DriverParams::default()
        }
    }

    #[test]
    fn test_completes_thiele_small() {
        let d = Driver::compile("W1", &woofer(), &Environment::default()).unwrap();
        assert_relative_eq!(d.qes * d.qms / (d.qes + d.qms), 0.35, epsilon = 1e-9);
        assert_relative_eq!(d.cms, 0.04 / (1.18 * 343.0 * 343.0 * 0.0004), epsilon = 1e-12);
        assert_relative_eq!(d.mms, 1.0 / ((2.0 * PI * 40.0).powi(2) * d.cms), epsilon = 1e-12);
        assert!(d.qes > 0.4 && d.qes < 0.7);
        assert!(d.sensitivity > 80.0 && d.sensitivity < 100.0);
    }

    #[test]
    fn test_missing_parameters() {
        let mut p = woofer();
        p.sd = None;
        assert!(Driver::compile("W", &p, &Environment::default()).is_err());
        let mut p = woofer();
        p.bl = None;
        assert!(Driver::compile("W", &p, &Environment::default()).is_err());
        let mut p = woofer();
        p.qes = Some(0.3);
        p.bl = None;
        assert!(Driver::compile("W", &p, &Environment::default()).is_err());
    }

    #[test]
    fn test_measurement_level_reference() {
        let flat = ResponseData::from_amplitudes(MeasurementKind::Response, &[(100.0, 90.0), (10_000.0, 90.0)]).unwrap();
        let env = Environment::default();
        for volts in [0.0, -2.83, f64::NAN] {
            let p = woofer().with_on_axis(flat.clone().with_reference_voltage(volts));
            assert!(Driver::compile("W", &p, &env).is_err(), "voltage {}", volts);
        }
        let p = woofer().with_horizontal(30.0, flat.clone().with_distance(0.0));
        assert!(Driver::compile("W", &p, &env).is_err());

        let p = woofer().with_on_axis(flat.with_reference_voltage(1.0).with_distance(0.5));
        let d = Driver::compile("W", &p, &env).unwrap();
        let h = d.response(1000.0);
        assert!(h.re.is_finite() && h.im.is_finite());
    }

    #[test]
    fn test_contradictory_q() {
        let mut p = woofer();
        p.bl = None;
        p.qes = Some(0.5);
        p.qms = Some(3.0);
        assert!(Driver::compile("W", &p, &Environment::default()).is_err());
    }

    #[test]
    fn test_impedance_peak_at_fs() {
        let d = Driver::compile("W1", &woofer(), &Environment::default()).unwrap();
        let z_fs = d.impedance(40.0).amplitude();
        assert!(z_fs > d.impedance(20.0).amplitude());
        assert!(z_fs > d.impedance(80.0).amplitude());
        // Re * (1 + Qms/Qes) at resonance
        assert_relative_eq!(z_fs, 6.0 * (1.0 + d.qms / d.qes), epsilon = 1e-6);
    }

    #[test]
    fn test_response_reaches_sensitivity() {
        let d = Driver::compile("W1", &woofer(), &Environment::default()).unwrap();
        assert_abs_diff_eq!(d.response(2000.0).db(), d.sensitivity, epsilon = 0.05);
        assert!(d.response(20.0).db() < d.sensitivity - 6.0);
    }

    #[test]
    fn test_semi_inductance_raises_impedance() {
        let mut p = woofer();
        p.le = Some(1e-3);
        let d = Driver::compile("W1", &p, &Environment::default()).unwrap();
        let z = d.impedance(10_000.0);
        assert!(z.amplitude() > 10.0);
        assert!(z.phase_deg() > 0.0);
    }

    #[test]
    fn test_excursion_and_max_power() {
        let mut p = woofer();
        p.xmax = Some(5.0);
        p.pe = Some(100.0);
        let d = Driver::compile("W1", &p, &Environment::default()).unwrap();
        let zero = Complex::real(0.0);
        // Excursion scales with the square root of power
        assert_relative_eq!(d.excursion(30.0, 4.0, zero), 2.0 * d.excursion(30.0, 1.0, zero), epsilon = 1e-9);
        assert!(d.excursion(20.0, 1.0, zero) > d.excursion(200.0, 1.0, zero));
        // Thermal limit at high frequency, excursion limit at low frequency
        assert_relative_eq!(d.max_power(2000.0, zero), 100.0);
        assert!(d.max_power(15.0, zero) < 100.0);
        let x = d.excursion(15.0, d.max_power(15.0, zero), zero);
        assert_relative_eq!(x, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_blend_window() {
        let flat = ResponseData::new(
            MeasurementKind::Response,
            vec![
                crate::measurement::ResponseEntry::new(10.0, 100.0, 0.0),
                crate::measurement::ResponseEntry::new(20_000.0, 100.0, 0.0),
            ],
        )
        .unwrap();
        let p = woofer().with_on_axis(flat).with_blend(200.0, 800.0);
        let d = Driver::compile("W1", &p, &Environment::default()).unwrap();
        assert_abs_diff_eq!(d.response(1000.0).db(), 100.0, epsilon = 1e-9);
        let sim = d.simulated_response(100.0, Complex::real(0.0));
        assert_abs_diff_eq!(d.response(100.0).db(), sim.db(), epsilon = 1e-9);
        let mid = d.response(400.0).db();
        let sim_mid = d.simulated_response(400.0, Complex::real(0.0)).db();
        assert_abs_diff_eq!(mid, 0.5 * (100.0 + sim_mid), epsilon = 1e-6);
    }
}
