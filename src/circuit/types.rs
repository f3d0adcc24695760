//! Core types and capabilities of the element tree.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Element;
use crate::environment::SimContext;
use crate::error::Result;
use crate::math::Complex;

/// Flavor of acoustic response requested from a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// On axis at 1 m and the reference voltage
    #[default]
    Response,
    /// On axis at 1 m for 1 W into the nominal impedance
    Response1W,
    /// At the listening position, with baffle diffraction
    WithBaffle,
    /// At the listening position, with baffle diffraction and room gain
    WithRoom,
    /// RMS over the listening window
    ListeningWindow,
    /// RMS over the full sphere
    Power,
}

impl Curve {
    /// Every curve, in display order.
    pub const ALL: [Curve; 6] = [
        Curve::Response,
        Curve::Response1W,
        Curve::WithBaffle,
        Curve::WithRoom,
        Curve::ListeningWindow,
        Curve::Power,
    ];

    /// Parse a curve name as used on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace('-', "_").as_str() {
            "response" | "spl" => Some(Self::Response),
            "response_1w" | "1w" => Some(Self::Response1W),
            "with_baffle" | "baffle" => Some(Self::WithBaffle),
            "with_room" | "room" => Some(Self::WithRoom),
            "listening_window" | "window" => Some(Self::ListeningWindow),
            "power" => Some(Self::Power),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Curve::Response => "response",
            Curve::Response1W => "response_1w",
            Curve::WithBaffle => "with_baffle",
            Curve::WithRoom => "with_room",
            Curve::ListeningWindow => "listening_window",
            Curve::Power => "power",
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a two-terminal part sits relative to the load below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connection {
    /// In the signal path, feeding the load
    #[default]
    Series,
    /// Shunted across the load
    Parallel,
}

impl Connection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "series" | "serial" => Some(Self::Series),
            "parallel" | "shunt" => Some(Self::Parallel),
            _ => None,
        }
    }
}

/// Something that radiates sound when driven at its input.
pub trait Responds {
    /// Complex pressure response at `f` for the requested curve.
    fn response(&self, f: f64, curve: Curve) -> Complex;

    /// Largest input power (W) before any driver below exceeds its
    /// thermal or excursion limit.
    fn max_power(&self, f: f64) -> f64;

    /// Largest peak cone excursion (mm) of any driver below for `power`
    /// watts at the input.
    fn excursion(&self, f: f64, power: f64) -> f64;
}

/// Something with an electrical input impedance.
pub trait HasImpedance {
    fn impedance(&self, f: f64) -> Complex;
}

/// A node of the configuration tree.
pub trait HasChildren {
    fn children(&self) -> &[Element];

    fn children_mut(&mut self) -> &mut Vec<Element>;

    fn add_child(&mut self, child: Element) {
        self.children_mut().push(child);
    }

    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }
}

/// Configuration that compiles into an immutable simulation object.
pub trait Tunable {
    type Compiled;

    /// Resolve derived parameters against `ctx` and compile.
    fn refresh(&self, ctx: &SimContext) -> Result<Self::Compiled>;
}
