//! A driver in its enclosure at a position on a baffle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::circuit::{Curve, HasImpedance, Responds};
use crate::driver::{Driver, DriverParams};
use crate::enclosure::{EnclosureParams, EnclosureSimulation};
use crate::environment::SimContext;
use crate::error::{Result, SpeakerSimError};
use crate::geometry::{Baffle, Position};
use crate::math::{Complex, ComplexExt, MIN_IMPEDANCE};
use crate::solver::TwoPort;

/// Speaker configuration: which driver, which box, where, and how it is
/// wired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    /// Name of the driver, used in logs and errors
    pub driver_name: String,
    pub driver: DriverParams,
    #[serde(default)]
    pub enclosure: EnclosureParams,
    /// Placement, the system center when unset
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub baffle: Baffle,
    /// Reverse the polarity of the connection
    #[serde(default)]
    pub inverted: bool,
    /// Resistance of the cable and connections (Ω)
    #[serde(default)]
    pub wiring_resistance: f64,
}

impl Speaker {
    pub fn new(driver_name: impl Into<String>, driver: DriverParams) -> Self {
        Self {
            driver_name: driver_name.into(),
            driver,
            enclosure: EnclosureParams::default(),
            position: None,
            baffle: Baffle::default(),
            inverted: false,
            wiring_resistance: 0.0,
        }
    }

    pub fn with_enclosure(mut self, enclosure: EnclosureParams) -> Self {
        self.enclosure = enclosure;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_baffle(mut self, baffle: Baffle) -> Self {
        self.baffle = baffle;
        self
    }

    pub fn with_inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn with_wiring_resistance(mut self, ohms: f64) -> Self {
        self.wiring_resistance = ohms;
        self
    }

    pub fn compile(&self, name: &str, ctx: &SimContext) -> Result<SpeakerStage> {
        if !(self.wiring_resistance.is_finite() && self.wiring_resistance >= 0.0) {
            return Err(SpeakerSimError::invalid_parameter(
                name,
                "wiring_resistance",
                "must be zero or positive",
            ));
        }
        let driver = Driver::compile(&self.driver_name, &self.driver, &ctx.environment)?;
        let position = self.position.unwrap_or(ctx.center_position);
        let simulation = EnclosureSimulation::new(driver, &self.enclosure, &self.baffle, position, ctx)?;
        debug!(
            element = name,
            driver = %self.driver_name,
            enclosure = self.enclosure.kind(),
            inverted = self.inverted,
            "speaker"
        );
        Ok(SpeakerStage {
            simulation,
            polarity: if self.inverted { -1.0 } else { 1.0 },
            wiring_resistance: self.wiring_resistance,
        })
    }
}

/// A compiled speaker.
#[derive(Debug)]
pub struct SpeakerStage {
    simulation: EnclosureSimulation,
    polarity: f64,
    wiring_resistance: f64,
}

impl SpeakerStage {
    pub fn simulation(&self) -> &EnclosureSimulation {
        &self.simulation
    }

    /// Wiring divider `Zs/(Zs + Rw)` with the driver impedance `Zs`.
    fn wiring(&self, f: f64) -> (TwoPort, Complex) {
        let zs = self.simulation.impedance(f);
        let total = zs + self.wiring_resistance;
        let transfer = if total.norm() < MIN_IMPEDANCE {
            Complex::real(1.0)
        } else {
            zs / total
        };
        (
            TwoPort {
                input_impedance: total,
                transfer,
            },
            zs,
        )
    }
}

impl Responds for SpeakerStage {
    fn response(&self, f: f64, curve: Curve) -> Complex {
        let (port, _) = self.wiring(f);
        self.simulation.curve(f, curve) * port.transfer * self.polarity
    }

    fn max_power(&self, f: f64) -> f64 {
        let (port, zs) = self.wiring(f);
        port.input_power(self.simulation.max_power(f), zs)
    }

    fn excursion(&self, f: f64, power: f64) -> f64 {
        let (port, zs) = self.wiring(f);
        self.simulation.excursion(f, port.load_power(power, zs))
    }
}

impl HasImpedance for SpeakerStage {
    fn impedance(&self, f: f64) -> Complex {
        self.simulation.impedance(f) + self.wiring_resistance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn driver() -> DriverParams {
        DriverParams {
            fs: Some(40.0),
            qts: Some(0.35),
            vas: Some(0.04),
            re: Some(6.0),
            bl: Some(8.0),
            sd: Some(0.02),
            pe: Some(50.0),
            xmax: Some(5.0),
            ..DriverParams::default()
        }
    }

    #[test]
    fn test_polarity_and_wiring() {
        let ctx = SimContext::default();
        let plain = Speaker::new("W1", driver()).compile("S1", &ctx).unwrap();
        let wired = Speaker::new("W1", driver())
            .with_inverted(true)
            .with_wiring_resistance(1.0)
            .compile("S2", &ctx)
            .unwrap();
        let f = 1000.0;
        let zs = plain.impedance(f);
        assert_abs_diff_eq!((wired.impedance(f) - zs).re, 1.0, epsilon = 1e-12);
        let ratio = wired.response(f, Curve::Response) / plain.response(f, Curve::Response);
        let expected = -(zs / (zs + 1.0));
        assert_abs_diff_eq!(ratio.re, expected.re, epsilon = 1e-9);
        assert_abs_diff_eq!(ratio.im, expected.im, epsilon = 1e-9);
    }

    #[test]
    fn test_wiring_loss_raises_power_limit() {
        let ctx = SimContext::default();
        let plain = Speaker::new("W1", driver()).compile("S1", &ctx).unwrap();
        let wired = Speaker::new("W1", driver())
            .with_wiring_resistance(2.0)
            .compile("S2", &ctx)
            .unwrap();
        assert!(wired.max_power(1000.0) > plain.max_power(1000.0));
        assert!(wired.excursion(50.0, 10.0) < plain.excursion(50.0, 10.0));
    }

    #[test]
    fn test_default_position_is_center() {
        let ctx = SimContext::default();
        let stage = Speaker::new("W1", driver()).compile("S1", &ctx).unwrap();
        assert_eq!(*stage.simulation().position(), ctx.center_position);
    }

    #[test]
    fn test_negative_wiring_rejected() {
        let ctx = SimContext::default();
        assert!(Speaker::new("W1", driver())
            .with_wiring_resistance(-0.1)
            .compile("S1", &ctx)
            .is_err());
    }
}
