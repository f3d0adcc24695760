//! Compiled element tree.
//!
//! Compilation runs bottom-up: every child is compiled first so that
//! elements whose values depend on their load (L-pad, Zobel, notches,
//! crossover filters without an explicit impedance) can read the load's
//! impedance. Once built a [`Node`] is immutable and evaluation is total.

use tracing::debug;

use super::ladder::{Ladder, TwoPort};
use crate::circuit::{Curve, Element, ElementKind, HasImpedance, Responds};
use crate::components::{AmplifierStage, SpeakerStage, Transfer};
use crate::environment::SimContext;
use crate::error::{Result, SpeakerSimError};
use crate::math::fnc::parallel_all;
use crate::math::{Complex, ComplexExt};

/// A compiled element.
#[derive(Debug)]
pub enum Node {
    /// Children in parallel, sharing the input
    Group { name: String, children: Vec<Node> },
    /// Passive network between the input and the child
    Ladder {
        name: String,
        ladder: Ladder,
        child: Box<Node>,
    },
    /// Line-level transfer function, transparent to impedance
    Transfer {
        name: String,
        transfer: Transfer,
        child: Box<Node>,
    },
    Amplifier {
        name: String,
        stage: AmplifierStage,
        child: Box<Node>,
    },
    Speaker { name: String, stage: Box<SpeakerStage> },
}

/// What a two-port element compiles to before its child is attached.
enum Stage {
    Ladder(Ladder),
    Transfer(Transfer),
    Amplifier(AmplifierStage),
}

impl Node {
    /// Compile an element and its subtree.
    pub fn compile(element: &Element, ctx: &SimContext) -> Result<Node> {
        let name = element.name.clone();
        if let ElementKind::Speaker(speaker) = &element.kind {
            if !element.children.is_empty() {
                return Err(SpeakerSimError::InvalidTopology {
                    message: format!("speaker '{}' cannot have children", name),
                });
            }
            let stage = speaker.compile(&name, ctx)?;
            return Ok(Node::Speaker {
                name,
                stage: Box::new(stage),
            });
        }

        let mut children = element
            .children
            .iter()
            .map(|c| Node::compile(c, ctx))
            .collect::<Result<Vec<_>>>()?;
        if children.is_empty() {
            return Err(SpeakerSimError::InvalidTopology {
                message: format!("'{}' has no load", name),
            });
        }
        let child = match (&element.kind, children.len()) {
            (ElementKind::Item, _) => return Ok(Node::Group { name, children }),
            (_, 1) => children.remove(0),
            _ => Node::Group {
                name: name.clone(),
                children,
            },
        };

        let load: &dyn HasImpedance = &child;
        let stage = match &element.kind {
            ElementKind::Resistor(r) => Stage::Ladder(r.ladder(&name)?),
            ElementKind::Capacitor(c) => Stage::Ladder(c.ladder(&name)?),
            ElementKind::Inductor(l) => Stage::Ladder(l.ladder(&name)?),
            ElementKind::CustomImpedance(z) => Stage::Ladder(z.ladder()),
            ElementKind::LPad(p) => Stage::Ladder(p.ladder(&name, load)?),
            ElementKind::Zobel(z) => Stage::Ladder(z.ladder(&name, load)?),
            ElementKind::SerialNotch(n) => Stage::Ladder(n.ladder(&name, load)?),
            ElementKind::ParallelNotch(n) => Stage::Ladder(n.ladder(&name, load)?),
            ElementKind::PassFilter(p) => Stage::Ladder(p.ladder(&name, load)?),
            ElementKind::ActiveFilter(a) => Stage::Transfer(Transfer::Filter(a.compile(&name)?)),
            ElementKind::Gain(g) => Stage::Transfer(g.compile()),
            ElementKind::Delay(d) => Stage::Transfer(d.compile(&name)?),
            ElementKind::Equalizer(e) => Stage::Transfer(e.compile(&name)?),
            ElementKind::CustomResponse(r) => Stage::Transfer(r.compile()),
            ElementKind::Amplifier(a) => Stage::Amplifier(a.compile(&name)?),
            ElementKind::Item | ElementKind::Speaker(_) => {
                return Err(SpeakerSimError::Unsupported {
                    operation: "two-port compilation",
                    kind: element.tag().to_string(),
                })
            }
        };
        debug!(element = %name, kind = element.tag(), "compiled");

        let child = Box::new(child);
        Ok(match stage {
            Stage::Ladder(ladder) => Node::Ladder { name, ladder, child },
            Stage::Transfer(transfer) => Node::Transfer { name, transfer, child },
            Stage::Amplifier(stage) => Node::Amplifier { name, stage, child },
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Group { name, .. }
            | Node::Ladder { name, .. }
            | Node::Transfer { name, .. }
            | Node::Amplifier { name, .. }
            | Node::Speaker { name, .. } => name,
        }
    }

    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Group { children, .. } => children.iter().collect(),
            Node::Ladder { child, .. } | Node::Transfer { child, .. } | Node::Amplifier { child, .. } => {
                vec![child.as_ref()]
            }
            Node::Speaker { .. } => Vec::new(),
        }
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name() == name {
            return Some(self);
        }
        self.children().into_iter().find_map(|c| c.find(name))
    }

    /// Number of compiled nodes in this subtree.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(|c| c.count()).sum::<usize>()
    }

    /// Number of speakers in this subtree.
    pub fn speaker_count(&self) -> usize {
        match self {
            Node::Speaker { .. } => 1,
            _ => self.children().iter().map(|c| c.speaker_count()).sum(),
        }
    }

    /// Two-port view of this node at `f`: the port, the child's impedance
    /// and the child. `None` for groups and speakers.
    fn two_port(&self, f: f64) -> Option<(TwoPort, Complex, &Node)> {
        match self {
            Node::Ladder { ladder, child, .. } => {
                let zc = child.impedance(f);
                Some((ladder.evaluate(f, zc), zc, child.as_ref()))
            }
            Node::Transfer { transfer, child, .. } => {
                let zc = child.impedance(f);
                let port = TwoPort {
                    input_impedance: zc,
                    transfer: transfer.at(f),
                };
                Some((port, zc, child.as_ref()))
            }
            Node::Amplifier { stage, child, .. } => {
                let zc = child.impedance(f);
                Some((stage.two_port(f, zc), zc, child.as_ref()))
            }
            Node::Group { .. } | Node::Speaker { .. } => None,
        }
    }
}

impl Responds for Node {
    fn response(&self, f: f64, curve: Curve) -> Complex {
        match self {
            Node::Group { children, .. } => children.iter().map(|c| c.response(f, curve)).sum(),
            Node::Speaker { stage, .. } => stage.response(f, curve),
            _ => match self.two_port(f) {
                Some((port, _, child)) => child.response(f, curve) * port.transfer,
                None => Complex::real(0.0),
            },
        }
    }

    fn max_power(&self, f: f64) -> f64 {
        match self {
            Node::Group { children, .. } => children.iter().map(|c| c.max_power(f)).fold(f64::INFINITY, f64::min),
            Node::Speaker { stage, .. } => stage.max_power(f),
            Node::Amplifier { stage, .. } => match self.two_port(f) {
                Some((port, zc, child)) => port.input_power(child.max_power(f).min(stage.max_power()), zc),
                None => f64::INFINITY,
            },
            _ => match self.two_port(f) {
                Some((port, zc, child)) => port.input_power(child.max_power(f), zc),
                None => f64::INFINITY,
            },
        }
    }

    fn excursion(&self, f: f64, power: f64) -> f64 {
        match self {
            Node::Group { children, .. } => children.iter().map(|c| c.excursion(f, power)).fold(0.0, f64::max),
            Node::Speaker { stage, .. } => stage.excursion(f, power),
            _ => match self.two_port(f) {
                Some((port, zc, child)) => child.excursion(f, port.load_power(power, zc)),
                None => 0.0,
            },
        }
    }
}

impl HasImpedance for Node {
    fn impedance(&self, f: f64) -> Complex {
        match self {
            Node::Group { children, .. } => match children.as_slice() {
                [only] => only.impedance(f),
                _ => parallel_all(children.iter().map(|c| c.impedance(f))),
            },
            Node::Speaker { stage, .. } => stage.impedance(f),
            _ => match self.two_port(f) {
                Some((port, _, _)) => port.input_impedance,
                None => Complex::real(0.0),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Connection;
    use crate::components::{Gain, Resistor, Speaker};
    use crate::driver::DriverParams;
    use approx::assert_abs_diff_eq;

    fn speaker(name: &str) -> Element {
        let params = DriverParams {
            fs: Some(40.0),
            qts: Some(0.35),
            vas: Some(0.04),
            re: Some(6.0),
            bl: Some(8.0),
            sd: Some(0.02),
            pe: Some(40.0),
            xmax: Some(4.0),
            ..DriverParams::default()
        };
        Element::new(name, ElementKind::Speaker(Box::new(Speaker::new("W", params))))
    }

    #[test]
    fn test_single_child_group_is_identity() {
        let ctx = SimContext::default();
        let bare = Node::compile(&speaker("S1"), &ctx).unwrap();
        let grouped = Node::compile(&Element::item("G").with_child(speaker("S1")), &ctx).unwrap();
        for f in [20.0, 40.0, 500.0, 5000.0] {
            assert_eq!(grouped.response(f, Curve::Response), bare.response(f, Curve::Response));
            assert_eq!(grouped.impedance(f), bare.impedance(f));
            assert_abs_diff_eq!(grouped.max_power(f), bare.max_power(f), epsilon = 1e-9);
            assert_abs_diff_eq!(grouped.excursion(f, 1.0), bare.excursion(f, 1.0), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parallel_speakers() {
        let ctx = SimContext::default();
        let one = Node::compile(&speaker("S1"), &ctx).unwrap();
        let pair = Node::compile(&Element::item("G").with_child(speaker("S1")).with_child(speaker("S2")), &ctx).unwrap();
        let f = 1000.0;
        assert_abs_diff_eq!((pair.impedance(f) * 2.0 - one.impedance(f)).norm(), 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            (pair.response(f, Curve::Response) - one.response(f, Curve::Response) * 2.0).norm(),
            0.0,
            epsilon = 1e-9
        );
        // Weakest branch limits power, largest excursion wins
        for f in [30.0, 1000.0] {
            assert_abs_diff_eq!(pair.max_power(f), one.max_power(f), epsilon = 1e-9);
            assert_abs_diff_eq!(pair.excursion(f, 1.0), one.excursion(f, 1.0), epsilon = 1e-12);
        }
        assert_eq!(pair.speaker_count(), 2);
        assert_eq!(pair.count(), 3);
    }

    #[test]
    fn test_series_resistor_and_gain() {
        let ctx = SimContext::default();
        let tree = Element::new("G1", ElementKind::Gain(Gain { gain: 6.0, inverted: false })).with_child(
            Element::new("R1", ElementKind::Resistor(Resistor::new(2.0, Connection::Series))).with_child(speaker("S1")),
        );
        let node = Node::compile(&tree, &ctx).unwrap();
        let bare = Node::compile(&speaker("S1"), &ctx).unwrap();
        let f = 2000.0;
        let zs = bare.impedance(f);
        assert_abs_diff_eq!((node.impedance(f) - zs - 2.0).norm(), 0.0, epsilon = 1e-9);
        let expected = bare.response(f, Curve::Response) * (zs / (zs + 2.0)) * 10f64.powf(6.0 / 20.0);
        assert_abs_diff_eq!((node.response(f, Curve::Response) - expected).norm(), 0.0, epsilon = 1e-9);
        assert!(node.find("R1").is_some());
        assert!(node.find("R2").is_none());
    }

    #[test]
    fn test_multiple_children_of_a_filter() {
        let ctx = SimContext::default();
        let tree = Element::new("R1", ElementKind::Resistor(Resistor::new(1.0, Connection::Series)))
            .with_child(speaker("S1"))
            .with_child(speaker("S2"));
        let node = Node::compile(&tree, &ctx).unwrap();
        let one = Node::compile(&speaker("S1"), &ctx).unwrap();
        let f = 300.0;
        assert_abs_diff_eq!((node.impedance(f) - (one.impedance(f) / 2.0 + 1.0)).norm(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_load() {
        let ctx = SimContext::default();
        let lonely = Element::new("R1", ElementKind::Resistor(Resistor::new(1.0, Connection::Series)));
        assert!(matches!(
            Node::compile(&lonely, &ctx),
            Err(SpeakerSimError::InvalidTopology { .. })
        ));
    }
}
