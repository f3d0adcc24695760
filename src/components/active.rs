//! Active (line-level) elements: filters, gain, delay and equalizers.
//!
//! Active elements have no effect on impedance. They multiply the response
//! of their children by a transfer function.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::family::{FilterFamily, PassKind, MAX_ORDER};
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::complex::J;
use crate::math::fnc::from_db;
use crate::math::poly::Poly;
use crate::math::{Complex, ComplexExt, MIN_Q};
use crate::measurement::ResponseData;

/// Highest active filter order.
pub const MAX_ACTIVE_ORDER: usize = MAX_ORDER;

/// High- or low-pass active filter of order 1 to 8.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveFilter {
    pub pass: PassKind,
    #[serde(default)]
    pub family: FilterFamily,
    pub order: usize,
    pub frequency: f64,
    /// Q of the custom family (orders 1 and 2)
    #[serde(default)]
    pub q: Option<f64>,
    /// Keep the magnitude and drop the phase
    #[serde(default)]
    pub linear_phase: bool,
}

impl ActiveFilter {
    pub fn new(pass: PassKind, family: FilterFamily, order: usize, frequency: f64) -> Self {
        Self {
            pass,
            family,
            order,
            frequency,
            q: None,
            linear_phase: false,
        }
    }

    pub fn with_q(mut self, q: f64) -> Self {
        self.q = Some(q);
        self
    }

    pub fn with_linear_phase(mut self, linear_phase: bool) -> Self {
        self.linear_phase = linear_phase;
        self
    }

    pub fn compile(&self, name: &str) -> Result<FilterResponse> {
        let frequency = require_positive(name, "frequency", self.frequency)?;
        let denominator = match self.family {
            FilterFamily::Custom => match self.order {
                1 => Poly::new(vec![1.0, 1.0]),
                2 => {
                    let q = require_positive(name, "q", self.q.unwrap_or(std::f64::consts::FRAC_1_SQRT_2))?;
                    Poly::new(vec![1.0, 1.0 / q.max(MIN_Q), 1.0])
                }
                _ => {
                    return Err(SpeakerSimError::invalid_parameter(
                        name,
                        "order",
                        "custom active filters are first or second order",
                    ))
                }
            },
            family => family.denominator(self.order)?,
        };
        Ok(FilterResponse {
            pass: self.pass,
            frequency,
            denominator,
            linear_phase: self.linear_phase,
        })
    }
}

/// A compiled high/low-pass transfer function.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterResponse {
    pass: PassKind,
    frequency: f64,
    denominator: Poly,
    linear_phase: bool,
}

impl FilterResponse {
    pub fn at(&self, f: f64) -> Complex {
        let s = J * (f / self.frequency);
        let h = match self.pass {
            PassKind::LowPass => self.denominator.eval(s).reciprocal(),
            PassKind::HighPass => {
                if f <= 0.0 {
                    return Complex::real(0.0);
                }
                self.denominator.eval(s.inv()).reciprocal()
            }
        };
        if self.linear_phase {
            Complex::real(h.amplitude())
        } else {
            h
        }
    }
}

/// Fixed gain with optional polarity inversion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Gain {
    /// Gain (dB)
    pub gain: f64,
    pub inverted: bool,
}

/// Pure time delay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Delay {
    /// Delay (ms)
    pub delay: f64,
}

/// Equalizer filter shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EqShape {
    #[default]
    Peaking,
    LowShelf,
    HighShelf,
}

impl EqShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "peaking" | "peak" | "bell" => Some(Self::Peaking),
            "lowshelf" | "low_shelf" => Some(Self::LowShelf),
            "highshelf" | "high_shelf" => Some(Self::HighShelf),
            _ => None,
        }
    }
}

/// Parametric equalizer section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Equalizer {
    #[serde(default)]
    pub shape: EqShape,
    pub frequency: f64,
    /// Boost or cut (dB)
    pub gain: f64,
    pub q: f64,
}

impl Equalizer {
    pub fn new(shape: EqShape, frequency: f64, gain: f64, q: f64) -> Self {
        Self {
            shape,
            frequency,
            gain,
            q,
        }
    }

    /// Q of a bandwidth given in octaves, `sqrt(2^bw)/(2^bw − 1)`.
    pub fn q_from_bandwidth(octaves: f64) -> f64 {
        let n = 2f64.powf(octaves);
        n.sqrt() / (n - 1.0)
    }

    fn at(&self, f: f64) -> Complex {
        let s = J * (f / self.frequency);
        let s2 = s * s;
        let a = 10f64.powf(self.gain / 40.0);
        let q = self.q.max(MIN_Q);
        let one = Complex::real(1.0);
        match self.shape {
            EqShape::Peaking => (s2 + s * (a / q) + one) / (s2 + s / (a * q) + one),
            EqShape::LowShelf => {
                let k = a.sqrt() / q;
                (s2 + s * k + a) / (s2 * a + s * k + one) * a
            }
            EqShape::HighShelf => {
                let k = a.sqrt() / q;
                (s2 * a + s * k + one) / (s2 + s * k + a) * a
            }
        }
    }
}

/// A compiled transfer function applied to the children's response.
#[derive(Debug, Clone, PartialEq)]
pub enum Transfer {
    Filter(FilterResponse),
    Gain(f64),
    /// Delay (s)
    Delay(f64),
    Equalizer(Equalizer),
    /// Measured transfer curve (dB gain and phase)
    Measured(ResponseData),
}

impl Transfer {
    pub fn at(&self, f: f64) -> Complex {
        match self {
            Transfer::Filter(filter) => filter.at(f),
            Transfer::Gain(g) => Complex::real(*g),
            Transfer::Delay(seconds) => (-J * (2.0 * PI * f * seconds)).exp(),
            Transfer::Equalizer(eq) => eq.at(f),
            Transfer::Measured(data) => data.transfer_at(f),
        }
    }
}

impl Gain {
    pub fn compile(&self) -> Transfer {
        let sign = if self.inverted { -1.0 } else { 1.0 };
        Transfer::Gain(sign * from_db(self.gain))
    }
}

impl Delay {
    pub fn compile(&self, name: &str) -> Result<Transfer> {
        if !(self.delay.is_finite() && self.delay >= 0.0) {
            return Err(SpeakerSimError::invalid_parameter(name, "delay", "must be zero or positive"));
        }
        Ok(Transfer::Delay(self.delay / 1000.0))
    }
}

impl Equalizer {
    pub fn compile(&self, name: &str) -> Result<Transfer> {
        require_positive(name, "frequency", self.frequency)?;
        require_positive(name, "q", self.q)?;
        Ok(Transfer::Equalizer(*self))
    }
}
