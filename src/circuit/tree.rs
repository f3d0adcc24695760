//! The configuration tree.

use serde::{Deserialize, Serialize};

use super::record::{ElementRecord, Library};
use super::types::{HasChildren, Tunable};
use crate::components::{
    self, ActiveFilter, Amplifier, Capacitor, CustomImpedance, CustomResponse, Delay, Equalizer, Gain, Inductor,
    LPad, ParallelNotch, PassFilter, Resistor, SerialNotch, Speaker, Zobel,
};
use crate::environment::SimContext;
use crate::error::{Result, SpeakerSimError};
use crate::solver::{Node, Simulator};

/// What an element does to the signal and the load below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElementKind {
    /// Parallel group: children share the input
    Item,
    Resistor(Resistor),
    Capacitor(Capacitor),
    Inductor(Inductor),
    CustomImpedance(CustomImpedance),
    LPad(LPad),
    Zobel(Zobel),
    SerialNotch(SerialNotch),
    ParallelNotch(ParallelNotch),
    PassFilter(PassFilter),
    ActiveFilter(ActiveFilter),
    Gain(Gain),
    Delay(Delay),
    Equalizer(Equalizer),
    Amplifier(Amplifier),
    Speaker(Box<Speaker>),
    CustomResponse(CustomResponse),
}

impl ElementKind {
    /// Registry tag of this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            ElementKind::Item => "item",
            ElementKind::Resistor(_) => "resistor",
            ElementKind::Capacitor(_) => "capacitor",
            ElementKind::Inductor(_) => "inductor",
            ElementKind::CustomImpedance(_) => "impedance",
            ElementKind::LPad(_) => "lpad",
            ElementKind::Zobel(_) => "zobel",
            ElementKind::SerialNotch(_) => "serial_notch",
            ElementKind::ParallelNotch(_) => "parallel_notch",
            ElementKind::PassFilter(p) => p.pass.passive_tag(),
            ElementKind::ActiveFilter(a) => a.pass.active_tag(),
            ElementKind::Gain(_) => "gain",
            ElementKind::Delay(_) => "delay",
            ElementKind::Equalizer(_) => "equalizer",
            ElementKind::Amplifier(_) => "amplifier",
            ElementKind::Speaker(_) => "speaker",
            ElementKind::CustomResponse(_) => "response",
        }
    }

    /// Speakers terminate the tree; every other kind needs a load.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ElementKind::Speaker(_))
    }
}

/// A named node of the configuration tree with its owned children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
    #[serde(default)]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            name: name.into(),
            kind,
            children: Vec::new(),
        }
    }

    /// A parallel group.
    pub fn item(name: impl Into<String>) -> Self {
        Self::new(name, ElementKind::Item)
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Build an element and its subtree from a record.
    pub fn from_record(record: &ElementRecord, library: &Library) -> Result<Self> {
        let mut element = components::build_element(record, library)?;
        for child in &record.children {
            element.children.push(Element::from_record(child, library)?);
        }
        Ok(element)
    }

    /// Depth-first search by name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(name))
    }

    /// Visit every element depth-first with its depth.
    pub fn walk<F: FnMut(&Element, usize)>(&self, visit: &mut F) {
        self.walk_at(0, visit);
    }

    fn walk_at<F: FnMut(&Element, usize)>(&self, depth: usize, visit: &mut F) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Number of elements in the subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Element::count).sum::<usize>()
    }
}

impl HasChildren for Element {
    fn children(&self) -> &[Element] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Element> {
        &mut self.children
    }
}

impl Tunable for Element {
    type Compiled = Node;

    fn refresh(&self, ctx: &SimContext) -> Result<Node> {
        Node::compile(self, ctx)
    }
}

/// A complete loudspeaker system ready for compilation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub root: Element,
}

impl Circuit {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Build from top-level records. Several records are grouped under a
    /// parallel `root` item.
    pub fn from_records(records: &[ElementRecord], library: &Library) -> Result<Self> {
        let mut elements = records
            .iter()
            .map(|r| Element::from_record(r, library))
            .collect::<Result<Vec<_>>>()?;
        let root = match elements.len() {
            0 => {
                return Err(SpeakerSimError::InvalidTopology {
                    message: "project has no elements".to_string(),
                })
            }
            1 => elements.remove(0),
            _ => Element::item("root").with_children(elements),
        };
        Ok(Self { root })
    }

    pub fn find(&self, name: &str) -> Option<&Element> {
        self.root.find(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.root.find_mut(name)
    }

    /// Validate and compile into a [`Simulator`].
    pub fn refresh(&self, ctx: &SimContext) -> Result<Simulator> {
        Simulator::new(self, ctx)
    }
}

impl Tunable for Circuit {
    type Compiled = Simulator;

    fn refresh(&self, ctx: &SimContext) -> Result<Simulator> {
        Circuit::refresh(self, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Connection;

    fn resistor(name: &str, ohms: f64) -> Element {
        Element::new(name, ElementKind::Resistor(Resistor::new(ohms, Connection::Series)))
    }

    #[test]
    fn test_tree_navigation() {
        let mut root = Element::item("root")
            .with_child(resistor("R1", 2.0).with_child(resistor("R2", 3.0)))
            .with_child(resistor("R3", 4.0));
        assert_eq!(root.count(), 4);
        assert_eq!(root.find("R2").map(Element::tag), Some("resistor"));
        assert!(root.find("R9").is_none());

        root.find_mut("R3").unwrap().add_child(resistor("R4", 1.0));
        let mut seen = Vec::new();
        root.walk(&mut |e, depth| seen.push((e.name.clone(), depth)));
        assert_eq!(seen[1], ("R1".to_string(), 1));
        assert_eq!(seen[4], ("R4".to_string(), 2));
    }

    #[test]
    fn test_from_records_groups_roots() {
        let library = Library::new();
        let records = vec![
            ElementRecord::new("resistor", "R1").with_value(1.0),
            ElementRecord::new("resistor", "R2").with_value(2.0),
        ];
        let circuit = Circuit::from_records(&records, &library).unwrap();
        assert_eq!(circuit.root.tag(), "item");
        assert_eq!(circuit.root.children.len(), 2);
        assert!(Circuit::from_records(&[], &library).is_err());
    }
}
