//! Passive high- and low-pass crossover filters.
//!
//! Values come from singly-terminated ladder synthesis of the family's
//! normalized denominator `D(s) = 1 + b1·s + … + bn·sⁿ`, for a 1 Ω load and
//! ωc = 1. Splitting `D` into its even part `m` and odd part `n`, the
//! admittance seen from the load with the source shorted is `m/n`; its
//! continued-fraction expansion about infinity yields one element per step,
//! starting next to the load. For low orders this reduces to:
//!
//! | order | values |
//! |-------|--------|
//! | 1 | `L1 = b1` |
//! | 2 | `L1 = b1`, `C1 = b2/b1` |
//! | 3 | `L2 = b3/b2`, `L1 = b1 − L2`, `C1 = b2/L1` |
//!
//! The ladder runs L1 (series), C1 (shunt), L2 (series), C2 (shunt), … toward
//! the load. High-pass filters swap each inductor for a capacitor and vice
//! versa.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::family::{FilterFamily, PassKind, MAX_ORDER};
use super::passive::Branch;
use crate::circuit::HasImpedance;
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::poly::Poly;
use crate::math::{ComplexExt, MIN_IMPEDANCE};
use crate::solver::{Ladder, Section};

/// Highest order built as a passive ladder.
pub const MAX_PASSIVE_ORDER: usize = MAX_ORDER;

/// Passive crossover filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassFilter {
    pub pass: PassKind,
    #[serde(default)]
    pub family: FilterFamily,
    pub order: usize,
    /// Crossover frequency (Hz)
    pub frequency: f64,
    /// Design impedance, `|Zload|` at the crossover frequency when unset
    #[serde(default)]
    pub impedance: Option<f64>,
    /// Component values for the custom family, in ladder order
    /// (henry for series low-pass and shunt high-pass parts, farad otherwise)
    #[serde(default)]
    pub custom: Vec<f64>,
}

impl PassFilter {
    pub fn new(pass: PassKind, family: FilterFamily, order: usize, frequency: f64) -> Self {
        Self {
            pass,
            family,
            order,
            frequency,
            impedance: None,
            custom: Vec::new(),
        }
    }

    pub fn with_impedance(mut self, impedance: f64) -> Self {
        self.impedance = Some(impedance);
        self
    }

    pub fn with_custom(mut self, values: Vec<f64>) -> Self {
        self.family = FilterFamily::Custom;
        self.order = values.len();
        self.custom = values;
        self
    }

    /// Normalized ladder values (1 Ω, 1 rad/s) in ladder order.
    pub fn normalized_values(&self) -> Result<Vec<f64>> {
        if self.order == 0 || self.order > MAX_PASSIVE_ORDER {
            return Err(SpeakerSimError::invalid_parameter(
                self.family.name(),
                "order",
                format!("passive filters support orders 1..={}", MAX_PASSIVE_ORDER),
            ));
        }
        let values = cauer_values(&self.family.denominator(self.order)?, self.order);
        if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(SpeakerSimError::invalid_parameter(
                self.family.name(),
                "order",
                format!("ladder synthesis gives a non-physical value {:.4}", bad),
            ));
        }
        Ok(values)
    }

    /// Component values for design impedance `r`, in ladder order.
    pub fn component_values(&self, r: f64) -> Result<Vec<f64>> {
        if self.family == FilterFamily::Custom {
            if self.custom.is_empty() || self.custom.len() > MAX_PASSIVE_ORDER {
                return Err(SpeakerSimError::invalid_parameter(
                    "custom",
                    "values",
                    format!("expected 1..={} component values", MAX_PASSIVE_ORDER),
                ));
            }
            return Ok(self.custom.clone());
        }
        let wc = 2.0 * PI * self.frequency;
        let values = self
            .normalized_values()?
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                let series = i % 2 == 0;
                match (self.pass, series) {
                    (PassKind::LowPass, true) => v * r / wc,
                    (PassKind::LowPass, false) => v / (r * wc),
                    (PassKind::HighPass, true) => 1.0 / (v * r * wc),
                    (PassKind::HighPass, false) => r / (v * wc),
                }
            })
            .collect();
        Ok(values)
    }

    pub fn ladder(&self, name: &str, load: &dyn HasImpedance) -> Result<Ladder> {
        let frequency = require_positive(name, "frequency", self.frequency)?;
        let r = match self.impedance {
            Some(z) => require_positive(name, "impedance", z)?,
            None => load.impedance(frequency).amplitude().max(MIN_IMPEDANCE),
        };
        let values = self.component_values(r)?;
        debug!(element = name, family = self.family.name(), r, ?values, "pass filter");
        let sections = values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let series = i % 2 == 0;
                let inductor = (self.pass == PassKind::LowPass) == series;
                let branch = if inductor {
                    Branch::L {
                        inductance: v,
                        resistance: 0.0,
                    }
                } else {
                    Branch::C(v)
                };
                if series {
                    Section::Series(branch)
                } else {
                    Section::Shunt(branch)
                }
            })
            .collect();
        Ok(Ladder::new(sections))
    }
}

/// Ladder values of `1/D(s)` in source-to-load order.
///
/// Expands `m/n` (or `n/m`, whichever has the higher degree) as a continued
/// fraction. Each step removes the pole at infinity `v·s` and inverts the
/// remainder. Degrees are tracked from the order, so rounding in the
/// tables never changes the number of elements.
fn cauer_values(d: &Poly, order: usize) -> Vec<f64> {
    let scale = d.coeff(0);
    let part = |parity: usize| -> Vec<f64> {
        (0..=order)
            .map(|k| if k % 2 == parity { d.coeff(k) / scale } else { 0.0 })
            .collect()
    };
    let (even, odd) = (part(0), part(1));
    let (mut num, mut den) = if order % 2 == 0 { (even, odd) } else { (odd, even) };

    let mut values = Vec::with_capacity(order);
    for degree in (1..=order).rev() {
        let v = num[degree] / den[degree - 1];
        values.push(v);
        let mut rem = vec![0.0; degree - 1];
        for (k, r) in rem.iter_mut().enumerate() {
            let shifted = if k >= 1 { den[k - 1] } else { 0.0 };
            *r = num[k] - v * shifted;
        }
        num = std::mem::replace(&mut den, rem);
    }
    values.reverse();
    values
}
