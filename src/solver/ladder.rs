//! Two-port evaluation of passive ladders.
//!
//! A ladder is a list of series and shunt branches between the element's
//! input and its load. It is evaluated from the load outward:
//!
//! - series branch: `Zin = Zb + Z`, `T ← T·Z/(Zb + Z)`
//! - shunt branch: `Zin = Zb ∥ Z`, `T` unchanged
//!
//! where `T` is the voltage ratio from the ladder input to the load.

use crate::components::Branch;
use crate::math::fnc::parallel;
use crate::math::{Complex, ComplexExt, EPSILON, MIN_IMPEDANCE};

/// One rung of a ladder.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Branch in the signal path
    Series(Branch),
    /// Branch across the signal path
    Shunt(Branch),
}

/// Input impedance and voltage transfer of a two-port with a given load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoPort {
    pub input_impedance: Complex,
    pub transfer: Complex,
}

impl TwoPort {
    /// A two-port that changes nothing.
    pub fn transparent(load: Complex) -> Self {
        Self {
            input_impedance: load,
            transfer: Complex::real(1.0),
        }
    }

    /// Input power for `child_power` watts delivered to `load`.
    pub fn input_power(&self, child_power: f64, load: Complex) -> f64 {
        reflect_power(child_power, load, self.transfer, self.input_impedance)
    }

    /// Power delivered to `load` for `input_power` watts at the input.
    pub fn load_power(&self, input_power: f64, load: Complex) -> f64 {
        forward_power(input_power, load, self.transfer, self.input_impedance)
    }
}

/// Series and shunt sections, listed from the input toward the load.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ladder {
    sections: Vec<Section>,
}

impl Ladder {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Evaluate with load impedance `load` at `f`.
    pub fn evaluate(&self, f: f64, load: Complex) -> TwoPort {
        self.sections.iter().rev().fold(TwoPort::transparent(load), |acc, section| match section {
            Section::Series(branch) => {
                let z = acc.input_impedance;
                let total = branch.impedance(f) + z;
                let ratio = if total.norm() < MIN_IMPEDANCE {
                    Complex::real(1.0)
                } else {
                    z / total
                };
                TwoPort {
                    input_impedance: total,
                    transfer: acc.transfer * ratio,
                }
            }
            Section::Shunt(branch) => TwoPort {
                input_impedance: parallel(branch.impedance(f), acc.input_impedance),
                transfer: acc.transfer,
            },
        })
    }
}

/// `P_in = P_child·|Zc|/(|T|²·|Zin|)`.
pub(crate) fn reflect_power(child_power: f64, load: Complex, transfer: Complex, input: Complex) -> f64 {
    let zc = load.amplitude().max(MIN_IMPEDANCE);
    let denominator = (transfer.norm_sqr() * input.amplitude()).max(EPSILON);
    child_power * zc / denominator
}

/// Inverse of [`reflect_power`].
pub(crate) fn forward_power(input_power: f64, load: Complex, transfer: Complex, input: Complex) -> f64 {
    let zc = load.amplitude().max(MIN_IMPEDANCE);
    input_power * transfer.norm_sqr() * input.amplitude() / zc
}
