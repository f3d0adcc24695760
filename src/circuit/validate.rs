//! Tree validation.

use std::collections::HashSet;

use crate::error::{Result, SpeakerSimError};

use super::{Circuit, Element};

/// Validate a tree for compilation.
///
/// Checks:
/// - Element names are unique
/// - Speakers are leaves
/// - Every other element has at least one child to act as its load
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    let mut names = HashSet::new();
    check_element(&circuit.root, &mut names)
}

fn check_element<'a>(element: &'a Element, names: &mut HashSet<&'a str>) -> Result<()> {
    if !names.insert(element.name.as_str()) {
        return Err(SpeakerSimError::DuplicateName {
            name: element.name.clone(),
        });
    }

    if element.kind.is_terminal() && !element.children.is_empty() {
        return Err(SpeakerSimError::InvalidTopology {
            message: format!("{} '{}' cannot have children", element.tag(), element.name),
        });
    }

    if !element.kind.is_terminal() && element.children.is_empty() {
        return Err(SpeakerSimError::InvalidTopology {
            message: format!("{} '{}' has no load", element.tag(), element.name),
        });
    }

    element
        .children
        .iter()
        .try_for_each(|child| check_element(child, names))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Connection, ElementKind};
    use crate::components::{Resistor, Speaker};

    fn speaker(name: &str) -> Element {
        Element::new(name, ElementKind::Speaker(Box::new(Speaker::new("W1", Default::default()))))
    }

    fn resistor(name: &str) -> Element {
        Element::new(name, ElementKind::Resistor(Resistor::new(1.0, Connection::Series)))
    }

    #[test]
    fn test_valid_tree() {
        let circuit = Circuit::new(resistor("R1").with_child(speaker("S1")));
        assert!(validate_circuit(&circuit).is_ok());
    }

    #[test]
    fn test_duplicate_names() {
        let circuit = Circuit::new(Element::item("X").with_child(speaker("X")));
        assert!(matches!(
            validate_circuit(&circuit),
            Err(SpeakerSimError::DuplicateName { .. })
        ));
    }

    #[test]
    fn test_missing_load() {
        let circuit = Circuit::new(Element::item("root").with_child(resistor("R1")));
        assert!(matches!(
            validate_circuit(&circuit),
            Err(SpeakerSimError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn test_speaker_with_children() {
        let circuit = Circuit::new(speaker("S1").with_child(speaker("S2")));
        assert!(validate_circuit(&circuit).is_err());
    }
}
