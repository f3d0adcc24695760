//! Compensation networks whose values follow from the load: L-pad, Zobel,
//! and notch filters.
//!
//! Unset values are derived when the tree is compiled, from the impedance
//! the children present.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::passive::Branch;
use crate::circuit::HasImpedance;
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::fnc::from_db;
use crate::math::sweep::log_space;
use crate::math::{ComplexExt, MIN_IMPEDANCE};
use crate::solver::{Ladder, Section};

/// Frequency at which an L-pad reads the load impedance by default (Hz).
pub const LPAD_REFERENCE_FREQUENCY: f64 = 1000.0;

/// Frequency at which a Zobel estimates the voice-coil inductance (Hz).
const ZOBEL_INDUCTANCE_FREQUENCY: f64 = 10_000.0;

/// Constant-impedance attenuator: series resistor, then shunt resistor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LPad {
    /// Attenuation (dB, positive)
    pub attenuation: f64,
    /// Design impedance, `|Zload|` at `frequency` when unset
    #[serde(default)]
    pub impedance: Option<f64>,
    #[serde(default = "default_lpad_frequency")]
    pub frequency: f64,
}

fn default_lpad_frequency() -> f64 {
    LPAD_REFERENCE_FREQUENCY
}

impl LPad {
    pub fn new(attenuation: f64) -> Self {
        Self {
            attenuation,
            impedance: None,
            frequency: LPAD_REFERENCE_FREQUENCY,
        }
    }

    /// Series and shunt resistances for design impedance `z`.
    pub fn resistances(&self, z: f64) -> (f64, f64) {
        let a = from_db(-self.attenuation.max(0.0));
        let series = z * (1.0 - a);
        let shunt = if a >= 1.0 { f64::INFINITY } else { z * a / (1.0 - a) };
        (series, shunt)
    }

    pub fn ladder(&self, name: &str, load: &dyn HasImpedance) -> Result<Ladder> {
        if !(self.attenuation.is_finite() && self.attenuation >= 0.0) {
            return Err(SpeakerSimError::invalid_parameter(name, "attenuation", "must be zero or positive"));
        }
        let z = match self.impedance {
            Some(z) => require_positive(name, "impedance", z)?,
            None => load.impedance(self.frequency).amplitude().max(MIN_IMPEDANCE),
        };
        let (series, shunt) = self.resistances(z);
        debug!(element = name, z, series, shunt, "l-pad");
        let mut sections = vec![Section::Series(Branch::R(series))];
        if shunt.is_finite() {
            sections.push(Section::Shunt(Branch::R(shunt)));
        }
        Ok(Ladder::new(sections))
    }
}

/// Series R-C shunted across the load to cancel voice-coil inductance.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Zobel {
    pub resistance: Option<f64>,
    pub capacitance: Option<f64>,
}

impl Zobel {
    /// Estimate `Re` as the smallest real part of the load over the audio
    /// band and `Le` from its reactance at 10 kHz.
    pub fn estimate(load: &dyn HasImpedance) -> (f64, f64) {
        let re = log_space(20.0, 20_000.0, 100)
            .into_iter()
            .map(|f| load.impedance(f).re)
            .fold(f64::INFINITY, f64::min)
            .max(MIN_IMPEDANCE);
        let w = 2.0 * PI * ZOBEL_INDUCTANCE_FREQUENCY;
        let le = (load.impedance(ZOBEL_INDUCTANCE_FREQUENCY).im / w).max(0.0);
        (re, le)
    }

    pub fn ladder(&self, name: &str, load: &dyn HasImpedance) -> Result<Ladder> {
        let (r, c) = match (self.resistance, self.capacitance) {
            (Some(r), Some(c)) => (r, c),
            (r, c) => {
                let (re, le) = Self::estimate(load);
                let r = r.unwrap_or(re);
                (r, c.unwrap_or(le / (r * r)))
            }
        };
        let r = require_positive(name, "resistance", r)?;
        let c = require_positive(name, "capacitance", c)?;
        debug!(element = name, r, c, "zobel");
        Ok(Ladder::new(vec![Section::Shunt(Branch::Series(vec![
            Branch::R(r),
            Branch::C(c),
        ]))]))
    }
}

/// Series R-L-C resonator shunted across the load.
///
/// `L = Q·|Z0|/ω0` and `C = 1/(ω0²·L)` with `Z0` the load impedance at the
/// notch frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SerialNotch {
    pub frequency: f64,
    #[serde(default = "default_notch_q")]
    pub q: f64,
    /// Series damping resistance
    #[serde(default)]
    pub resistance: f64,
}

/// Parallel R-L-C tank in series with the load.
///
/// The tank resistance sets the depth at resonance,
/// `|Z0|/(|Z0| + R) = 10^(−depth/20)`; `L = |Z0|/(Q·ω0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallelNotch {
    pub frequency: f64,
    #[serde(default = "default_notch_q")]
    pub q: f64,
    /// Notch depth (dB)
    #[serde(default = "default_notch_depth")]
    pub depth: f64,
}

fn default_notch_q() -> f64 {
    1.0
}

fn default_notch_depth() -> f64 {
    6.0
}

fn load_at_resonance(name: &str, frequency: f64, q: f64, load: &dyn HasImpedance) -> Result<(f64, f64)> {
    let f0 = require_positive(name, "frequency", frequency)?;
    require_positive(name, "q", q)?;
    Ok((2.0 * PI * f0, load.impedance(f0).amplitude().max(MIN_IMPEDANCE)))
}

impl SerialNotch {
    pub fn new(frequency: f64, q: f64) -> Self {
        Self {
            frequency,
            q,
            resistance: 0.0,
        }
    }

    pub fn ladder(&self, name: &str, load: &dyn HasImpedance) -> Result<Ladder> {
        let (w0, z0) = load_at_resonance(name, self.frequency, self.q, load)?;
        let inductance = self.q * z0 / w0;
        let capacitance = 1.0 / (w0 * w0 * inductance);
        debug!(element = name, inductance, capacitance, "serial notch");
        Ok(Ladder::new(vec![Section::Shunt(Branch::Series(vec![
            Branch::R(self.resistance.max(0.0)),
            Branch::L {
                inductance,
                resistance: 0.0,
            },
            Branch::C(capacitance),
        ]))]))
    }
}

impl ParallelNotch {
    pub fn new(frequency: f64, q: f64, depth: f64) -> Self {
        Self { frequency, q, depth }
    }

    pub fn ladder(&self, name: &str, load: &dyn HasImpedance) -> Result<Ladder> {
        let (w0, z0) = load_at_resonance(name, self.frequency, self.q, load)?;
        let depth = require_positive(name, "depth", self.depth)?;
        let resistance = z0 * (1.0 / from_db(-depth) - 1.0);
        let inductance = z0 / (self.q * w0);
        let capacitance = 1.0 / (w0 * w0 * inductance);
        debug!(element = name, resistance, inductance, capacitance, "parallel notch");
        Ok(Ladder::new(vec![Section::Series(Branch::Parallel(vec![
            Branch::R(resistance),
            Branch::L {
                inductance,
                resistance: 0.0,
            },
            Branch::C(capacitance),
        ]))]))
    }
}
