//! Untyped element records and the shared definitions they refer to.
//!
//! A record is what a project file says about one element: its kind tag,
//! name, an optional positional value, numeric parameters, text options and
//! nested records. The registry turns records into typed [`Element`]s.
//!
//! [`Element`]: super::Element

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::driver::DriverParams;
use crate::enclosure::EnclosureParams;
use crate::error::{Result, SpeakerSimError};
use crate::measurement::ResponseData;

/// One element as written in a project description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementRecord {
    /// Kind tag (`"resistor"`, `"lowpass"`, `"speaker"`, ...)
    pub kind: String,
    pub name: String,
    /// Positional value (ohms, farads, hertz, dB depending on the kind)
    pub value: Option<f64>,
    /// Numeric parameters, lower-case keys
    pub params: HashMap<String, f64>,
    /// Text options and flags, lower-case keys
    pub options: HashMap<String, String>,
    pub children: Vec<ElementRecord>,
    /// Source line number for error reporting (0 when built in code)
    pub line: usize,
}

impl ElementRecord {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_param(mut self, key: &str, value: f64) -> Self {
        self.params.insert(key.to_ascii_lowercase(), value);
        self
    }

    pub fn with_option(mut self, key: &str, value: impl Into<String>) -> Self {
        self.options.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_child(mut self, child: ElementRecord) -> Self {
        self.children.push(child);
        self
    }

    pub fn param(&self, key: &str) -> Option<f64> {
        self.params.get(key).copied()
    }

    pub fn param_or(&self, key: &str, default: f64) -> f64 {
        self.param(key).unwrap_or(default)
    }

    /// The positional value, or the parameter `key`.
    pub fn value_or_param(&self, key: &str) -> Option<f64> {
        self.value.or_else(|| self.param(key))
    }

    /// Like [`value_or_param`](Self::value_or_param) but required.
    pub fn require(&self, key: &str) -> Result<f64> {
        self.value_or_param(key).ok_or_else(|| {
            SpeakerSimError::invalid_parameter(&self.name, key, format!("{} requires a value", self.kind))
        })
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// A flag given either as a bare word or as a non-zero parameter.
    pub fn flag(&self, key: &str) -> bool {
        if let Some(v) = self.param(key) {
            return v != 0.0;
        }
        matches!(self.option(key), Some("true" | "yes" | "on" | "1"))
    }

    /// Parse an option with `parse`, or `default` when it is absent.
    pub fn parse_option<T>(&self, key: &str, default: T, parse: impl Fn(&str) -> Option<T>) -> Result<T> {
        match self.option(key) {
            None => Ok(default),
            Some(text) => parse(text).ok_or_else(|| {
                SpeakerSimError::invalid_parameter(&self.name, key, format!("unrecognized value '{}'", text))
            }),
        }
    }

    /// Reject parameters and options outside `known`.
    pub fn check_known(&self, known: &[&str]) -> Result<()> {
        let unknown = self
            .params
            .keys()
            .chain(self.options.keys())
            .find(|key| !known.contains(&key.as_str()));
        match unknown {
            Some(key) => Err(SpeakerSimError::invalid_parameter(
                &self.name,
                key.as_str(),
                format!("unknown parameter for {}", self.kind),
            )),
            None => Ok(()),
        }
    }
}

/// Named drivers, enclosures and measurements that records refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Library {
    pub drivers: HashMap<String, DriverParams>,
    pub enclosures: HashMap<String, EnclosureParams>,
    pub measurements: HashMap<String, ResponseData>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_driver(&mut self, name: impl Into<String>, params: DriverParams) -> Result<()> {
        insert_unique(&mut self.drivers, name.into(), params)
    }

    pub fn add_enclosure(&mut self, name: impl Into<String>, params: EnclosureParams) -> Result<()> {
        insert_unique(&mut self.enclosures, name.into(), params)
    }

    pub fn add_measurement(&mut self, name: impl Into<String>, data: ResponseData) -> Result<()> {
        insert_unique(&mut self.measurements, name.into(), data)
    }

    /// Builder form of [`add_driver`](Self::add_driver).
    pub fn with_driver(mut self, name: impl Into<String>, params: DriverParams) -> Result<Self> {
        self.add_driver(name, params)?;
        Ok(self)
    }

    /// Builder form of [`add_enclosure`](Self::add_enclosure).
    pub fn with_enclosure(mut self, name: impl Into<String>, params: EnclosureParams) -> Result<Self> {
        self.add_enclosure(name, params)?;
        Ok(self)
    }

    pub fn driver(&self, element: &str, name: &str) -> Result<&DriverParams> {
        self.drivers.get(name).ok_or_else(|| undefined(element, "driver", name))
    }

    pub fn enclosure(&self, element: &str, name: &str) -> Result<&EnclosureParams> {
        self.enclosures.get(name).ok_or_else(|| undefined(element, "enclosure", name))
    }

    pub fn measurement(&self, element: &str, name: &str) -> Result<&ResponseData> {
        self.measurements.get(name).ok_or_else(|| undefined(element, "measurement", name))
    }
}

fn insert_unique<T>(map: &mut HashMap<String, T>, name: String, value: T) -> Result<()> {
    if map.contains_key(&name) {
        return Err(SpeakerSimError::DuplicateName { name });
    }
    map.insert(name, value);
    Ok(())
}

fn undefined(element: &str, what: &'static str, name: &str) -> SpeakerSimError {
    SpeakerSimError::UndefinedReference {
        element: element.to_string(),
        what,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_accessors() {
        let record = ElementRecord::new("lowpass", "LP1")
            .with_value(2000.0)
            .with_param("Order", 3.0)
            .with_option("family", "bessel")
            .with_option("linear_phase", "true");
        assert_eq!(record.require("f").unwrap(), 2000.0);
        assert_eq!(record.param("order"), Some(3.0));
        assert_eq!(record.option("family"), Some("bessel"));
        assert!(record.flag("linear_phase"));
        assert!(!record.flag("inverted"));
        assert!(record.check_known(&["order", "family", "linear_phase"]).is_ok());
        assert!(record.check_known(&["order"]).is_err());
    }

    #[test]
    fn test_require_missing() {
        let record = ElementRecord::new("resistor", "R1");
        assert!(matches!(
            record.require("r"),
            Err(SpeakerSimError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_library_references() {
        let mut library = Library::new();
        library.add_driver("W1", DriverParams::default()).unwrap();
        assert!(matches!(
            library.add_driver("W1", DriverParams::default()),
            Err(SpeakerSimError::DuplicateName { .. })
        ));
        assert!(library.driver("S1", "W1").is_ok());
        assert!(matches!(
            library.enclosure("S1", "B9"),
            Err(SpeakerSimError::UndefinedReference { what: "enclosure", .. })
        ));
    }
}
