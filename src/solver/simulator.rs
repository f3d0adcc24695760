//! Main simulator interface.

use serde::Serialize;
use tracing::{debug, info};

use super::node::Node;
use crate::circuit::{validate_circuit, Circuit, Curve, HasImpedance, Responds};
use crate::environment::SimContext;
use crate::error::Result;
use crate::math::sweep::smooth_octave;
use crate::math::{Complex, ComplexExt};

/// One row of a frequency sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Frequency (Hz)
    pub frequency: f64,
    /// Level of the selected curve (dB SPL)
    pub spl_db: f64,
    /// Phase of the selected curve (degrees)
    pub phase_deg: f64,
    /// Impedance magnitude (Ω)
    pub impedance_ohm: f64,
    /// Impedance phase (degrees)
    pub impedance_phase_deg: f64,
    /// Largest safe input power (W), `None` when no element sets a limit
    pub max_power_w: Option<f64>,
    /// Peak cone excursion at 1 W input (mm)
    pub excursion_1w_mm: f64,
}

/// The compiled loudspeaker system.
///
/// Built once from a [`Circuit`] and a [`SimContext`]; afterwards every
/// query is a pure function of frequency.
#[derive(Debug)]
pub struct Simulator {
    root: Node,
    context: SimContext,
}

impl Simulator {
    /// Validate and compile a circuit.
    pub fn new(circuit: &Circuit, ctx: &SimContext) -> Result<Self> {
        ctx.validate()?;
        validate_circuit(circuit)?;
        let root = Node::compile(&circuit.root, ctx)?;
        info!(
            root = root.name(),
            nodes = root.count(),
            speakers = root.speaker_count(),
            "compiled loudspeaker tree"
        );
        Ok(Self {
            root,
            context: ctx.clone(),
        })
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn context(&self) -> &SimContext {
        &self.context
    }

    /// A compiled subtree by element name.
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.root.find(name)
    }

    /// Complex pressure response of the selected curve.
    pub fn response(&self, f: f64, curve: Curve) -> Complex {
        self.root.response(f, curve)
    }

    /// Input impedance (Ω).
    pub fn impedance(&self, f: f64) -> Complex {
        self.root.impedance(f)
    }

    /// Largest safe input power (W).
    pub fn max_power(&self, f: f64) -> f64 {
        self.root.max_power(f)
    }

    /// Peak excursion (mm) of the worst driver at `power` watts input.
    pub fn excursion(&self, f: f64, power: f64) -> f64 {
        self.root.excursion(f, power)
    }

    /// All quantities at one frequency.
    pub fn evaluate(&self, f: f64, curve: Curve) -> SweepPoint {
        let response = self.response(f, curve);
        let impedance = self.impedance(f);
        SweepPoint {
            frequency: f,
            spl_db: response.db(),
            phase_deg: response.phase_deg(),
            impedance_ohm: impedance.amplitude(),
            impedance_phase_deg: impedance.phase_deg(),
            max_power_w: Some(self.max_power(f)).filter(|p| p.is_finite()),
            excursion_1w_mm: self.excursion(f, 1.0),
        }
    }

    /// Sweep over the context's frequency grid, smoothing levels when the
    /// settings ask for it.
    pub fn sweep(&self, curve: Curve) -> Vec<SweepPoint> {
        let settings = &self.context.settings;
        let mut points = self.sweep_frequencies(&settings.sweep.frequencies(), curve);
        if settings.smoothing > 0.0 {
            let freqs: Vec<f64> = points.iter().map(|p| p.frequency).collect();
            let levels: Vec<f64> = points.iter().map(|p| p.spl_db).collect();
            for (point, level) in points.iter_mut().zip(smooth_octave(&freqs, &levels, settings.smoothing)) {
                point.spl_db = level;
            }
        }
        points
    }

    /// Sweep over explicit frequencies.
    pub fn sweep_frequencies(&self, frequencies: &[f64], curve: Curve) -> Vec<SweepPoint> {
        debug!(points = frequencies.len(), curve = curve.name(), "sweep");
        frequencies.iter().map(|&f| self.evaluate(f, curve)).collect()
    }
}

impl Responds for Simulator {
    fn response(&self, f: f64, curve: Curve) -> Complex {
        Simulator::response(self, f, curve)
    }

    fn max_power(&self, f: f64) -> f64 {
        Simulator::max_power(self, f)
    }

    fn excursion(&self, f: f64, power: f64) -> f64 {
        Simulator::excursion(self, f, power)
    }
}

impl HasImpedance for Simulator {
    fn impedance(&self, f: f64) -> Complex {
        Simulator::impedance(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Element, ElementKind};
    use crate::components::Speaker;
    use crate::driver::DriverParams;
    use crate::environment::SweepSettings;
    use crate::error::SpeakerSimError;
    use crate::math::sweep::SweepScale;

    fn circuit() -> Circuit {
        rated_circuit(None)
    }

    fn rated_circuit(pe: Option<f64>) -> Circuit {
        let params = DriverParams {
            pe,
            fs: Some(40.0),
            qts: Some(0.35),
            vas: Some(0.04),
            re: Some(6.0),
            bl: Some(8.0),
            sd: Some(0.02),
            ..DriverParams::default()
        };
        Circuit::new(Element::new(
            "S1",
            ElementKind::Speaker(Box::new(Speaker::new("W", params))),
        ))
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_simulator_is_shareable() {
        assert_send_sync::<Simulator>();
    }

    #[test]
    fn test_sweep_uses_settings() {
        let mut ctx = SimContext::default();
        ctx.settings.sweep = SweepSettings {
            f_min: 20.0,
            f_max: 20_000.0,
            points: 31,
            scale: SweepScale::Log,
        };
        let sim = Simulator::new(&circuit(), &ctx).unwrap();
        let sweep = sim.sweep(Curve::Response);
        assert_eq!(sweep.len(), 31);
        assert_eq!(sweep[0].frequency, 20.0);
        assert!(sweep.iter().all(|p| p.impedance_ohm.is_finite() && p.impedance_ohm > 0.0));
        assert!(sweep.iter().all(|p| p.spl_db.is_finite()));
    }

    #[test]
    fn test_smoothing_flattens_the_peak() {
        let mut ctx = SimContext::default();
        let raw = Simulator::new(&circuit(), &ctx).unwrap().sweep(Curve::Response);
        ctx.settings.smoothing = 1.0;
        let smooth = Simulator::new(&circuit(), &ctx).unwrap().sweep(Curve::Response);
        let spread = |s: &[SweepPoint]| {
            let max = s.iter().map(|p| p.spl_db).fold(f64::MIN, f64::max);
            let min = s.iter().map(|p| p.spl_db).fold(f64::MAX, f64::min);
            max - min
        };
        assert!(spread(&smooth) <= spread(&raw));
        assert_eq!(raw[5].impedance_ohm, smooth[5].impedance_ohm);
    }

    #[test]
    fn test_unrated_power_is_none() {
        let ctx = SimContext::default();
        let unrated = Simulator::new(&circuit(), &ctx).unwrap().evaluate(1000.0, Curve::Response);
        assert_eq!(unrated.max_power_w, None);
        let rated = Simulator::new(&rated_circuit(Some(40.0)), &ctx)
            .unwrap()
            .evaluate(1000.0, Curve::Response);
        assert!(rated.max_power_w.is_some_and(|w| w > 0.0 && w <= 40.0));
    }

    #[test]
    fn test_rejects_invalid_context() {
        let mut ctx = SimContext::default();
        ctx.settings.reference_voltage = 0.0;
        assert!(matches!(
            Simulator::new(&circuit(), &ctx),
            Err(SpeakerSimError::InvalidParameter { .. })
        ));
    }
}
