//! Abstract Syntax Tree types for the project description language.

use std::collections::HashMap;

use crate::circuit::ElementRecord;
use crate::measurement::MeasurementKind;

/// Complete AST representation of a parsed project.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectAst {
    /// `.env`, `.listen`, `.center` and `.sweep` lines in order
    pub settings: Vec<SettingsDef>,
    /// `.driver` definitions
    pub drivers: Vec<DriverDef>,
    /// `.box` definitions
    pub enclosures: Vec<EnclosureDef>,
    /// Top-level elements with their nested children
    pub elements: Vec<ElementRecord>,
}

impl ProjectAst {
    /// Create a new empty project AST.
    pub fn new() -> Self {
        Self::default()
    }

    /// Measurement files the project refers to, with the kind of data each
    /// holds, in order of first use.
    pub fn measurement_files(&self) -> Vec<(String, MeasurementKind)> {
        let mut files: Vec<(String, MeasurementKind)> = Vec::new();
        let mut push = |name: &str, kind: MeasurementKind| {
            if !files.iter().any(|(f, _)| f == name) {
                files.push((name.to_string(), kind));
            }
        };
        for driver in &self.drivers {
            for (key, file) in driver.sorted_options() {
                match DriverDef::measurement_slot(key) {
                    Some(MeasurementSlot::Impedance) => push(file, MeasurementKind::Impedance),
                    Some(_) => push(file, MeasurementKind::Response),
                    None => {}
                }
            }
        }
        fn walk(record: &ElementRecord, push: &mut dyn FnMut(&str, MeasurementKind)) {
            if let Some(file) = record.option("data") {
                let kind = if record.kind.eq_ignore_ascii_case("impedance") {
                    MeasurementKind::Impedance
                } else {
                    MeasurementKind::Response
                };
                push(file, kind);
            }
            for child in &record.children {
                walk(child, push);
            }
        }
        for record in &self.elements {
            walk(record, &mut push);
        }
        files
    }
}

/// Which part of the context a settings directive configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsDirective {
    /// `.env`: air constants and room
    Environment,
    /// `.listen`: listener position
    Listen,
    /// `.center`: reference point of the system
    Center,
    /// `.sweep`: frequency grid, smoothing and drive voltage
    Sweep,
}

impl SettingsDirective {
    /// Parse from a directive token such as `.env`.
    pub fn from_directive(directive: &str) -> Option<Self> {
        match directive {
            ".env" | ".environment" => Some(Self::Environment),
            ".listen" | ".listener" => Some(Self::Listen),
            ".center" => Some(Self::Center),
            ".sweep" => Some(Self::Sweep),
            _ => None,
        }
    }
}

/// One settings line.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsDef {
    pub directive: SettingsDirective,
    pub params: HashMap<String, f64>,
    pub options: HashMap<String, String>,
    /// Source line number
    pub line: usize,
}

/// A driver definition: Thiele-Small parameters and measurement files.
#[derive(Debug, Clone, PartialEq)]
pub struct DriverDef {
    pub name: String,
    pub params: HashMap<String, f64>,
    /// `response`, `impedance`, `hNN`/`vNN` polar files, `power_filter`
    pub options: HashMap<String, String>,
    /// Source line number
    pub line: usize,
}

/// Role of a measurement file attached to a driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasurementSlot {
    OnAxis,
    Impedance,
    /// Horizontal polar curve at an angle (degrees)
    Horizontal(f64),
    /// Vertical polar curve at an angle (degrees)
    Vertical(f64),
}

impl DriverDef {
    /// Classify an option key: `response`, `impedance`, `h30`, `vm15`.
    pub fn measurement_slot(key: &str) -> Option<MeasurementSlot> {
        match key {
            "response" | "frd" => Some(MeasurementSlot::OnAxis),
            "impedance" | "zma" => Some(MeasurementSlot::Impedance),
            _ => {
                let mut chars = key.chars();
                let prefix = chars.next()?;
                // `m` marks a negative angle (`vm15`)
                let angle = chars.as_str().replace('m', "-").parse::<f64>().ok()?;
                match prefix {
                    'h' => Some(MeasurementSlot::Horizontal(angle)),
                    'v' => Some(MeasurementSlot::Vertical(angle)),
                    _ => None,
                }
            }
        }
    }

    /// Options sorted by key, for reproducible processing.
    pub fn sorted_options(&self) -> Vec<(&str, &str)> {
        let mut options: Vec<(&str, &str)> = self.options.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        options.sort_unstable();
        options
    }
}

/// An enclosure definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EnclosureDef {
    pub name: String,
    /// Enclosure kind (`closed`, `reflex`, `aperiodic`, `open`, `null`)
    pub kind: String,
    pub params: HashMap<String, f64>,
    pub options: HashMap<String, String>,
    /// Source line number
    pub line: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measurement_slots() {
        assert_eq!(DriverDef::measurement_slot("response"), Some(MeasurementSlot::OnAxis));
        assert_eq!(DriverDef::measurement_slot("h30"), Some(MeasurementSlot::Horizontal(30.0)));
        assert_eq!(DriverDef::measurement_slot("vm15"), Some(MeasurementSlot::Vertical(-15.0)));
        assert_eq!(DriverDef::measurement_slot("power_filter"), None);
        assert_eq!(DriverDef::measurement_slot("h"), None);
    }

    #[test]
    fn test_measurement_files_deduplicated() {
        let mut options = HashMap::new();
        options.insert("response".to_string(), "w.frd".to_string());
        options.insert("impedance".to_string(), "w.zma".to_string());
        options.insert("power_filter".to_string(), "iec".to_string());
        let ast = ProjectAst {
            drivers: vec![DriverDef {
                name: "W".to_string(),
                params: HashMap::new(),
                options,
                line: 1,
            }],
            elements: vec![ElementRecord::new("item", "I")
                .with_child(ElementRecord::new("response", "EQ").with_option("data", "w.frd"))
                .with_child(ElementRecord::new("impedance", "Z").with_option("data", "load.zma"))],
            ..ProjectAst::default()
        };
        assert_eq!(
            ast.measurement_files(),
            vec![
                ("w.zma".to_string(), MeasurementKind::Impedance),
                ("w.frd".to_string(), MeasurementKind::Response),
                ("load.zma".to_string(), MeasurementKind::Impedance),
            ]
        );
    }
}
