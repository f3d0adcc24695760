//! Power amplifier.

use serde::{Deserialize, Serialize};

use super::active::{ActiveFilter, FilterResponse};
use crate::error::{Result, SpeakerSimError};
use crate::math::fnc::from_db;
use crate::math::{Complex, MIN_IMPEDANCE};
use crate::solver::TwoPort;

/// Amplifier with built-in filters, gain, a source impedance and a power
/// rating.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Amplifier {
    /// Voltage gain (dB)
    pub gain: f64,
    /// Source impedance (Ω)
    pub output_impedance: f64,
    /// Rated output power (W)
    pub max_power: Option<f64>,
    /// Filters applied before the output stage
    pub filters: Vec<ActiveFilter>,
}

impl Amplifier {
    pub fn new(gain: f64) -> Self {
        Self {
            gain,
            ..Self::default()
        }
    }

    pub fn with_output_impedance(mut self, ohms: f64) -> Self {
        self.output_impedance = ohms;
        self
    }

    pub fn with_max_power(mut self, watts: f64) -> Self {
        self.max_power = Some(watts);
        self
    }

    pub fn with_filter(mut self, filter: ActiveFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn compile(&self, name: &str) -> Result<AmplifierStage> {
        if !(self.output_impedance.is_finite() && self.output_impedance >= 0.0) {
            return Err(SpeakerSimError::invalid_parameter(
                name,
                "output_impedance",
                "must be zero or positive",
            ));
        }
        let max_power = match self.max_power {
            Some(p) if p > 0.0 => p,
            Some(p) => {
                return Err(SpeakerSimError::invalid_parameter(
                    name,
                    "max_power",
                    format!("must be positive, got {}", p),
                ))
            }
            None => f64::INFINITY,
        };
        let filters = self
            .filters
            .iter()
            .map(|f| f.compile(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(AmplifierStage {
            gain: from_db(self.gain),
            output_impedance: self.output_impedance,
            max_power,
            filters,
        })
    }
}

/// A compiled amplifier.
#[derive(Debug, Clone, PartialEq)]
pub struct AmplifierStage {
    gain: f64,
    output_impedance: f64,
    max_power: f64,
    filters: Vec<FilterResponse>,
}

impl AmplifierStage {
    /// Gain, filters and the source-impedance divider into `load`.
    pub fn two_port(&self, f: f64, load: Complex) -> TwoPort {
        let filtered = self
            .filters
            .iter()
            .fold(Complex::new(self.gain, 0.0), |acc, filter| acc * filter.at(f));
        let total = load + self.output_impedance;
        let divider = if total.norm() < MIN_IMPEDANCE {
            Complex::new(1.0, 0.0)
        } else {
            load / total
        };
        TwoPort {
            input_impedance: load,
            transfer: filtered * divider,
        }
    }

    /// Rated output power (W), infinite when unrated.
    pub fn max_power(&self) -> f64 {
        self.max_power
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{FilterFamily, PassKind};
    use crate::math::ComplexExt;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_gain_and_damping() {
        let amp = Amplifier::new(6.0).with_output_impedance(0.5).compile("A").unwrap();
        let port = amp.two_port(1000.0, Complex::real(7.5));
        assert_abs_diff_eq!(port.transfer.amplitude(), from_db(6.0) * 7.5 / 8.0, epsilon = 1e-12);
        assert_eq!(port.input_impedance, Complex::real(7.5));
        assert!(amp.max_power().is_infinite());
    }

    #[test]
    fn test_built_in_filter() {
        let amp = Amplifier::new(0.0)
            .with_filter(ActiveFilter::new(PassKind::HighPass, FilterFamily::Butterworth, 2, 40.0))
            .compile("A")
            .unwrap();
        assert_abs_diff_eq!(amp.two_port(40.0, Complex::real(8.0)).transfer.db(), -3.01, epsilon = 0.02);
        assert_abs_diff_eq!(amp.two_port(4000.0, Complex::real(8.0)).transfer.db(), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn test_invalid_rating() {
        assert!(Amplifier::new(0.0).with_max_power(0.0).compile("A").is_err());
        assert!(Amplifier::new(0.0).with_output_impedance(-1.0).compile("A").is_err());
    }
}
