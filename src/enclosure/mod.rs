//! Enclosure simulations.
//!
//! Every enclosure is an [`AcousticLoad`]: the acoustic impedance it presents
//! to the rear of the cone, and how the cone's output combines with whatever
//! else the enclosure radiates. [`EnclosureSimulation`] wraps one load with
//! its driver, the baffle and the room, and implements the common contract.
//!
//! - [`closed_box`] - sealed box and its closed-form alignment
//! - [`bass_reflex`] - vented box with tabulated alignments
//! - [`aperiodic`] - lossy vent tuned by closed-box theory
//! - [`open_baffle`] - dipole on an open baffle, and the free-air load
//! - [`port`] - vent geometry
//! - [`alignment`] - QB3 / BB4 / C4 tables

pub mod alignment;
pub mod aperiodic;
pub mod bass_reflex;
pub mod closed_box;
pub mod open_baffle;
pub mod port;

pub use alignment::{Alignment, AlignmentPoint};
pub use aperiodic::AperiodicParams;
pub use bass_reflex::{BassReflexParams, VentedDesign, VentedLoad};
pub use closed_box::{calc_box, ClosedBoxLoad, ClosedBoxParams};
pub use open_baffle::{NullLoad, OpenBaffleLoad};
pub use port::{Port, PortEnds, PortParams, PortShape};

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::{Curve, HasImpedance, Responds};
use crate::driver::Driver;
use crate::environment::{SimContext, REFERENCE_VOLTAGE};
use crate::error::{Result, SpeakerSimError};
use crate::geometry::{Baffle, Position};
use crate::math::{Complex, ComplexExt};
use crate::spatial::{
    listening_window_points, point_at, power_points, rms_average, BaffleSimulation,
    DistanceSimulation, RoomSimulation,
};

/// Acoustic load behind a driver.
pub trait AcousticLoad: Send + Sync + fmt::Debug {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Acoustic impedance `Zab` seen by the rear of the cone.
    fn box_impedance(&self, f: f64) -> Complex;

    /// Total radiated output given the cone's output.
    fn output(&self, _f: f64, cone: Complex) -> Complex {
        cone
    }

    /// Output of a port, for loads that have one.
    fn port_output(&self, _f: f64, _cone: Complex) -> Option<Complex> {
        None
    }
}

/// Enclosure configuration, tagged by type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnclosureParams {
    /// Free air (sealed-back drivers, or no box at all)
    #[default]
    Null,
    Closed(ClosedBoxParams),
    BassReflex(BassReflexParams),
    Aperiodic(AperiodicParams),
    OpenBaffle,
}

impl EnclosureParams {
    /// Default parameters for an enclosure type name.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind.to_ascii_lowercase().as_str() {
            "null" | "none" | "free" => Some(Self::Null),
            "closed" | "sealed" => Some(Self::Closed(ClosedBoxParams::default())),
            "reflex" | "bass_reflex" | "vented" => Some(Self::BassReflex(BassReflexParams::default())),
            "aperiodic" => Some(Self::Aperiodic(AperiodicParams::default())),
            "open" | "open_baffle" => Some(Self::OpenBaffle),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EnclosureParams::Null => "null",
            EnclosureParams::Closed(_) => "closed",
            EnclosureParams::BassReflex(_) => "reflex",
            EnclosureParams::Aperiodic(_) => "aperiodic",
            EnclosureParams::OpenBaffle => "open",
        }
    }

    /// Set a numeric parameter by its project-file name.
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        match self {
            EnclosureParams::Closed(p) => p.set(name, value),
            EnclosureParams::BassReflex(p) => p.set(name, value),
            EnclosureParams::Aperiodic(p) => p.set(name, value),
            EnclosureParams::Null | EnclosureParams::OpenBaffle => Err(SpeakerSimError::invalid_parameter(
                self.kind(),
                name,
                "enclosure takes no parameters",
            )),
        }
    }

    /// Set a named option (`alignment`, `port_ends`).
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        let invalid = |message: String| SpeakerSimError::invalid_parameter("enclosure", name, message);
        match (name.to_ascii_lowercase().as_str(), self) {
            ("alignment", EnclosureParams::BassReflex(p)) => {
                p.alignment = Alignment::from_name(value).ok_or_else(|| invalid(format!("unknown alignment '{}'", value)))?;
            }
            ("port_ends", EnclosureParams::BassReflex(BassReflexParams { port, .. }))
            | ("port_ends", EnclosureParams::Aperiodic(AperiodicParams { port, .. })) => {
                let ends = PortEnds::from_name(value).ok_or_else(|| invalid(format!("unknown port ends '{}'", value)))?;
                match port {
                    Some(port) => port.ends = ends,
                    None => return Err(invalid("set the port size first".to_string())),
                }
            }
            _ => return Err(invalid("not an option of this enclosure".to_string())),
        }
        Ok(())
    }

    /// Build the acoustic load for `driver`.
    ///
    /// Drivers flagged `closed` always get the free-air load.
    pub fn build_load(
        &self,
        driver: &Driver,
        baffle: &Baffle,
        listening_distance: f64,
        ctx: &SimContext,
    ) -> Result<Box<dyn AcousticLoad>> {
        let env = &ctx.environment;
        if driver.closed {
            return Ok(Box::new(NullLoad));
        }
        let load: Box<dyn AcousticLoad> = match self {
            EnclosureParams::Null => Box::new(NullLoad),
            EnclosureParams::Closed(p) => Box::new(ClosedBoxLoad::new(driver, p, env)?),
            EnclosureParams::BassReflex(p) => {
                let design = bass_reflex::design(driver, p)?;
                Box::new(VentedLoad::new(design, p.port.as_ref(), env)?)
            }
            EnclosureParams::Aperiodic(p) => Box::new(aperiodic::load(driver, p, env)?),
            EnclosureParams::OpenBaffle => Box::new(OpenBaffleLoad::new(
                baffle.mean_edge_distance(),
                listening_distance,
                env.speed_of_sound,
            )),
        };
        Ok(load)
    }
}

/// A driver in its enclosure, placed in the room.
#[derive(Debug)]
pub struct EnclosureSimulation {
    driver: Driver,
    load: Box<dyn AcousticLoad>,
    baffle: BaffleSimulation,
    room: RoomSimulation,
    distance: DistanceSimulation,
    position: Position,
    center: Position,
    listening: Position,
    /// Center-to-listener distance used for the angular grids
    grid_distance: f64,
    reference_voltage: f64,
}

impl EnclosureSimulation {
    /// Compile a driver, an enclosure and a placement.
    pub fn new(
        driver: Driver,
        params: &EnclosureParams,
        baffle: &Baffle,
        position: Position,
        ctx: &SimContext,
    ) -> Result<Self> {
        let env = &ctx.environment;
        let listening_distance = position.distance(&ctx.listening_position);
        let load = params.build_load(&driver, baffle, listening_distance, ctx)?;
        let dipole = driver.directivity().is_dipole() || matches!(params, EnclosureParams::OpenBaffle);
        let baffle_sim = BaffleSimulation::new(baffle, dipole, env.speed_of_sound)?;
        debug!(load = load.name(), dipole, listening_distance, "enclosure simulation");
        Ok(Self {
            room: RoomSimulation::new(env, &position, &ctx.listening_position),
            distance: DistanceSimulation::new(env.speed_of_sound),
            baffle: baffle_sim,
            load,
            driver,
            position,
            center: ctx.center_position,
            listening: ctx.listening_position,
            grid_distance: ctx.listening_distance(),
            reference_voltage: ctx.settings.reference_voltage,
        })
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn load(&self) -> &dyn AcousticLoad {
        self.load.as_ref()
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    fn voltage_scale(&self) -> f64 {
        self.reference_voltage / REFERENCE_VOLTAGE
    }

    /// Cone output with the box load, blended with measurements.
    pub fn cone_response(&self, f: f64) -> Complex {
        let zab = self.load.box_impedance(f);
        let simulated = self.driver.simulated_response(f, zab);
        self.driver.blend(f, simulated) * self.voltage_scale()
    }

    /// Port output for vented loads.
    pub fn port_response(&self, f: f64) -> Option<Complex> {
        self.load.port_output(f, self.cone_response(f))
    }

    /// On-axis output at 1 m and the reference voltage.
    pub fn response(&self, f: f64) -> Complex {
        self.load.output(f, self.cone_response(f))
    }

    /// On-axis output at 1 m for 1 W into the driver's impedance.
    pub fn response_1w(&self, f: f64) -> Complex {
        let volts = self.impedance(f).amplitude().sqrt();
        self.response(f) * (volts / self.reference_voltage)
    }

    /// Output at an observation point, including off-axis attenuation,
    /// baffle diffraction and distance.
    pub fn response_at(&self, f: f64, observer: &Position) -> Complex {
        let local = self.position.local_vector(observer);
        let (x, y, z) = local;
        let distance = (x * x + y * y + z * z).sqrt();
        let horizontal = if x == 0.0 && z == 0.0 { 0.0 } else { x.atan2(z).to_degrees() };
        let vertical = if distance == 0.0 { 0.0 } else { y.atan2(x.hypot(z)).to_degrees() };

        let directivity = self.driver.directivity();
        let off_axis = self.driver.off_axis(f, horizontal, vertical).abs();
        let diffraction = self.baffle.factor(f, local, directivity.toward_baffle(f));
        self.response(f) * off_axis * diffraction * self.distance.factor(f, distance)
    }

    /// Output at the listening position.
    pub fn response_with_baffle(&self, f: f64) -> Complex {
        self.response_at(f, &self.listening)
    }

    /// Output at the listening position including room gain.
    pub fn response_with_room(&self, f: f64) -> Complex {
        self.response_with_baffle(f) * self.room.gain(f)
    }

    fn on_axis_reference(&self, f: f64) -> Complex {
        self.response_at(f, &point_at(&self.center, self.grid_distance, 0.0, 0.0))
    }

    /// RMS output over the nine listening-window points.
    pub fn listening_window_response(&self, f: f64) -> Complex {
        let points = listening_window_points(&self.center, self.grid_distance);
        rms_average(points.iter().map(|p| self.response_at(f, p)), self.on_axis_reference(f))
    }

    /// RMS output over the 70-point sphere grid.
    pub fn power_response(&self, f: f64) -> Complex {
        let points = power_points(&self.center, self.grid_distance);
        rms_average(points.iter().map(|p| self.response_at(f, p)), self.on_axis_reference(f))
    }

    /// Fraction of full-space radiation on axis (see [`BaffleSimulation::solid_angle_fraction`]).
    pub fn solid_angle_fraction(&self, f: f64) -> f64 {
        let toward = self.driver.directivity().toward_baffle(f);
        self.baffle.solid_angle_fraction(f, toward)
    }

    /// Electrical impedance with the box load.
    pub fn impedance(&self, f: f64) -> Complex {
        self.driver.loaded_impedance(f, self.load.box_impedance(f))
    }

    /// Largest safe input power (W).
    pub fn max_power(&self, f: f64) -> f64 {
        self.driver.max_power(f, self.load.box_impedance(f))
    }

    /// Peak cone excursion (mm) at `power` watts.
    pub fn excursion(&self, f: f64, power: f64) -> f64 {
        self.driver.excursion(f, power, self.load.box_impedance(f))
    }

    /// Response flavor selected by `curve`.
    pub fn curve(&self, f: f64, curve: Curve) -> Complex {
        match curve {
            Curve::Response => self.response(f),
            Curve::Response1W => self.response_1w(f),
            Curve::WithBaffle => self.response_with_baffle(f),
            Curve::WithRoom => self.response_with_room(f),
            Curve::ListeningWindow => self.listening_window_response(f),
            Curve::Power => self.power_response(f),
        }
    }
}

impl Responds for EnclosureSimulation {
    fn response(&self, f: f64, curve: Curve) -> Complex {
        self.curve(f, curve)
    }

    fn max_power(&self, f: f64) -> f64 {
        EnclosureSimulation::max_power(self, f)
    }

    fn excursion(&self, f: f64, power: f64) -> f64 {
        EnclosureSimulation::excursion(self, f, power)
    }
}

impl HasImpedance for EnclosureSimulation {
    fn impedance(&self, f: f64) -> Complex {
        EnclosureSimulation::impedance(self, f)
    }
}
