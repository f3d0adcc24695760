//! Two-terminal passive parts: Resistor, Capacitor, Inductor, measured impedance.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::circuit::Connection;
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::complex::J;
use crate::math::fnc::parallel_all;
use crate::math::{Complex, ComplexExt};
use crate::measurement::ResponseData;
use crate::solver::{Ladder, Section};

/// Impedance law of a branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    R(f64),
    /// Inductor with its DC resistance
    L { inductance: f64, resistance: f64 },
    C(f64),
    Series(Vec<Branch>),
    Parallel(Vec<Branch>),
    /// Interpolated impedance curve
    Measured(ResponseData),
}

impl Branch {
    pub fn impedance(&self, f: f64) -> Complex {
        let w = 2.0 * PI * f;
        match self {
            Branch::R(r) => Complex::real(*r),
            Branch::L { inductance, resistance } => Complex::new(*resistance, w * inductance),
            Branch::C(c) => (J * (w * c)).reciprocal(),
            Branch::Series(parts) => parts.iter().map(|b| b.impedance(f)).sum(),
            Branch::Parallel(parts) => parallel_all(parts.iter().map(|b| b.impedance(f))),
            Branch::Measured(data) => data.complex_at(f),
        }
    }
}

/// Place a single branch according to its connection.
pub(crate) fn connect(branch: Branch, connection: Connection) -> Ladder {
    let section = match connection {
        Connection::Series => Section::Series(branch),
        Connection::Parallel => Section::Shunt(branch),
    };
    Ladder::new(vec![section])
}

/// A resistor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resistor {
    pub resistance: f64,
    #[serde(default)]
    pub connection: Connection,
}

impl Resistor {
    pub fn new(resistance: f64, connection: Connection) -> Self {
        Self { resistance, connection }
    }

    pub fn ladder(&self, name: &str) -> Result<Ladder> {
        if !(self.resistance.is_finite() && self.resistance >= 0.0) {
            return Err(SpeakerSimError::invalid_parameter(
                name,
                "resistance",
                "must be zero or positive",
            ));
        }
        Ok(connect(Branch::R(self.resistance), self.connection))
    }
}

/// A capacitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capacitor {
    pub capacitance: f64,
    #[serde(default)]
    pub connection: Connection,
}

impl Capacitor {
    pub fn new(capacitance: f64, connection: Connection) -> Self {
        Self {
            capacitance,
            connection,
        }
    }

    pub fn ladder(&self, name: &str) -> Result<Ladder> {
        let c = require_positive(name, "capacitance", self.capacitance)?;
        Ok(connect(Branch::C(c), self.connection))
    }
}

/// An inductor with optional DC resistance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inductor {
    pub inductance: f64,
    #[serde(default)]
    pub resistance: f64,
    #[serde(default)]
    pub connection: Connection,
}

impl Inductor {
    pub fn new(inductance: f64, connection: Connection) -> Self {
        Self {
            inductance,
            resistance: 0.0,
            connection,
        }
    }

    pub fn with_resistance(mut self, resistance: f64) -> Self {
        self.resistance = resistance;
        self
    }

    pub fn ladder(&self, name: &str) -> Result<Ladder> {
        let inductance = require_positive(name, "inductance", self.inductance)?;
        Ok(connect(
            Branch::L {
                inductance,
                resistance: self.resistance.max(0.0),
            },
            self.connection,
        ))
    }
}

/// A part described by a measured impedance curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomImpedance {
    pub data: ResponseData,
    #[serde(default)]
    pub connection: Connection,
}

impl CustomImpedance {
    pub fn new(data: ResponseData, connection: Connection) -> Self {
        Self { data, connection }
    }

    pub fn ladder(&self) -> Ladder {
        connect(Branch::Measured(self.data.clone()), self.connection)
    }
}
