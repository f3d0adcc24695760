//! Turning a parsed project into a context, a library and a circuit.

use std::collections::HashMap;

use tracing::{debug, info};

use super::ast::{DriverDef, EnclosureDef, MeasurementSlot, ProjectAst, SettingsDef, SettingsDirective};
use crate::circuit::{Circuit, Library};
use crate::driver::{DriverParams, PowerFilter};
use crate::enclosure::EnclosureParams;
use crate::environment::{Environment, SimContext};
use crate::error::{Result, SpeakerSimError};
use crate::geometry::Position;
use crate::math::sweep::SweepScale;
use crate::measurement::ResponseData;
use crate::solver::Simulator;

/// A complete loudspeaker project.
#[derive(Debug, Clone)]
pub struct Project {
    pub context: SimContext,
    pub library: Library,
    pub circuit: Circuit,
}

impl Project {
    /// Parse a project description. `measurements` maps the file names the
    /// description mentions to their parsed contents.
    pub fn parse(input: &str, measurements: &HashMap<String, ResponseData>) -> Result<Self> {
        let ast = super::parse(input)?;
        Self::from_ast(&ast, measurements)
    }

    /// Build a project from its AST.
    pub fn from_ast(ast: &ProjectAst, measurements: &HashMap<String, ResponseData>) -> Result<Self> {
        let mut context = SimContext::default();
        for def in &ast.settings {
            apply_settings(&mut context, def)?;
        }

        let mut library = Library::new();
        for (name, data) in measurements {
            library.add_measurement(name.clone(), data.clone())?;
        }
        for def in &ast.drivers {
            library.add_driver(def.name.clone(), build_driver(def, measurements)?)?;
        }
        for def in &ast.enclosures {
            library.add_enclosure(def.name.clone(), build_enclosure(def)?)?;
        }

        let circuit = Circuit::from_records(&ast.elements, &library)?;
        info!(
            drivers = library.drivers.len(),
            enclosures = library.enclosures.len(),
            measurements = library.measurements.len(),
            "project loaded"
        );
        Ok(Self {
            context,
            library,
            circuit,
        })
    }

    /// Compile the circuit with the project's context.
    pub fn simulator(&self) -> Result<Simulator> {
        self.circuit.refresh(&self.context)
    }
}

fn sorted<V>(map: &HashMap<String, V>) -> Vec<(&str, &V)> {
    let mut entries: Vec<(&str, &V)> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
    entries
}

fn unknown(line: usize, directive: &str, key: &str) -> SpeakerSimError {
    SpeakerSimError::parse(line, format!("unknown parameter '{}' for {}", key, directive))
}

fn apply_settings(ctx: &mut SimContext, def: &SettingsDef) -> Result<()> {
    match def.directive {
        SettingsDirective::Environment => apply_environment(&mut ctx.environment, def),
        SettingsDirective::Listen => apply_position(&mut ctx.listening_position, def, ".listen"),
        SettingsDirective::Center => apply_position(&mut ctx.center_position, def, ".center"),
        SettingsDirective::Sweep => apply_sweep(ctx, def),
    }
}

fn apply_environment(env: &mut Environment, def: &SettingsDef) -> Result<()> {
    if let Some(key) = def.options.keys().next() {
        return Err(unknown(def.line, ".env", key));
    }
    let conditions = ["temperature", "pressure", "humidity"];
    if conditions.iter().any(|k| def.params.contains_key(*k)) {
        let get = |k: &str, default: f64| def.params.get(k).copied().unwrap_or(default);
        *env = Environment::from_conditions(
            get("temperature", env.temperature),
            get("pressure", env.pressure),
            get("humidity", env.humidity),
        )
        .with_room(env.room.width, env.room.depth, env.room.height)
        .with_reflection(env.reflection);
    }
    for (key, &value) in sorted(&def.params) {
        match key {
            "temperature" | "pressure" | "humidity" => {}
            "c" | "speed_of_sound" => env.speed_of_sound = value,
            "rho" | "air_density" => env.air_density = value,
            "room_width" => env.room.width = value,
            "room_depth" => env.room.depth = value,
            "room_height" => env.room.height = value,
            "reflection" => env.reflection = value,
            other => return Err(unknown(def.line, ".env", other)),
        }
    }
    debug!(c = env.speed_of_sound, rho = env.air_density, "environment");
    Ok(())
}

fn apply_position(position: &mut Position, def: &SettingsDef, directive: &str) -> Result<()> {
    if let Some(key) = def.options.keys().next() {
        return Err(unknown(def.line, directive, key));
    }
    for (key, &value) in sorted(&def.params) {
        match key {
            "x" => position.x = value,
            "y" => position.y = value,
            "z" => position.z = value,
            "h" => position.horizontal_angle = value,
            "v" => position.vertical_angle = value,
            other => return Err(unknown(def.line, directive, other)),
        }
    }
    Ok(())
}

fn apply_sweep(ctx: &mut SimContext, def: &SettingsDef) -> Result<()> {
    let settings = &mut ctx.settings;
    for (key, &value) in sorted(&def.params) {
        match key {
            "f_min" | "fmin" => settings.sweep.f_min = value,
            "f_max" | "fmax" => settings.sweep.f_max = value,
            "points" => {
                if value.fract() != 0.0 || value < 1.0 {
                    return Err(SpeakerSimError::parse(
                        def.line,
                        format!("points must be a positive whole number, got {}", value),
                    ));
                }
                settings.sweep.points = value as usize;
            }
            "smoothing" => settings.smoothing = value,
            "voltage" => settings.reference_voltage = value,
            other => return Err(unknown(def.line, ".sweep", other)),
        }
    }
    for (key, value) in sorted(&def.options) {
        match (key, value.to_ascii_lowercase().as_str()) {
            ("scale", "log" | "logarithmic") => settings.sweep.scale = SweepScale::Log,
            ("scale", "lin" | "linear") => settings.sweep.scale = SweepScale::Linear,
            ("scale", other) => {
                return Err(SpeakerSimError::parse(def.line, format!("unknown sweep scale '{}'", other)))
            }
            (other, _) => return Err(unknown(def.line, ".sweep", other)),
        }
    }
    Ok(())
}

fn build_driver(def: &DriverDef, measurements: &HashMap<String, ResponseData>) -> Result<DriverParams> {
    let mut params = DriverParams::new();
    let mut distance = None;
    let mut voltage = None;
    for (key, &value) in sorted(&def.params) {
        match key {
            "distance" => distance = Some(value),
            "voltage" => voltage = Some(value),
            _ => params.set(key, value).map_err(|_| {
                SpeakerSimError::invalid_parameter(&def.name, key, "unknown driver parameter")
            })?,
        }
    }

    let lookup = |file: &str| -> Result<ResponseData> {
        measurements
            .get(file)
            .cloned()
            .ok_or_else(|| SpeakerSimError::UndefinedReference {
                element: def.name.clone(),
                what: "measurement",
                name: file.to_string(),
            })
    };
    // Measured pressure curves share the driver's distance and drive voltage
    let acoustic = |data: ResponseData| {
        let data = match distance {
            Some(d) => data.with_distance(d),
            None => data,
        };
        match voltage {
            Some(v) => data.with_reference_voltage(v),
            None => data,
        }
    };

    for (key, value) in def.sorted_options() {
        if matches!(key, "dipole" | "closed") {
            let on = !matches!(value.to_ascii_lowercase().as_str(), "false" | "no" | "0");
            params.set(key, if on { 1.0 } else { 0.0 })?;
            continue;
        }
        if key == "power_filter" {
            params.power_filter = PowerFilter::from_name(value).ok_or_else(|| {
                SpeakerSimError::invalid_parameter(&def.name, key, format!("unknown power filter '{}'", value))
            })?;
            continue;
        }
        params = match DriverDef::measurement_slot(key) {
            Some(MeasurementSlot::OnAxis) => params.with_on_axis(acoustic(lookup(value)?)),
            Some(MeasurementSlot::Impedance) => params.with_impedance(lookup(value)?),
            Some(MeasurementSlot::Horizontal(angle)) => params.with_horizontal(angle, acoustic(lookup(value)?)),
            Some(MeasurementSlot::Vertical(angle)) => params.with_vertical(angle, acoustic(lookup(value)?)),
            None => {
                return Err(SpeakerSimError::invalid_parameter(
                    &def.name,
                    key,
                    "unknown driver option",
                ))
            }
        };
    }
    debug!(driver = %def.name, line = def.line, "driver defined");
    Ok(params)
}

fn build_enclosure(def: &EnclosureDef) -> Result<EnclosureParams> {
    let mut params = EnclosureParams::from_kind(&def.kind)
        .ok_or_else(|| SpeakerSimError::parse(def.line, format!("unknown enclosure kind '{}'", def.kind)))?;
    for (key, &value) in sorted(&def.params) {
        params.set(key, value)?;
    }
    for (key, value) in sorted(&def.options) {
        params.set_option(key, value)?;
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{MeasurementKind, ResponseEntry};
    use approx::assert_relative_eq;

    const TWO_WAY: &str = "\
.env room_width=6 reflection=0.3
.listen z=2.5
.sweep f_min=20 f_max=20k points=50 smoothing=6
.driver W fs=40 qts=0.35 vas=40m re=6 bl=8 sd=0.02 power_filter=iec
.driver T fs=900 qes=1.2 qms=2 vas=0.05m re=5 sd=0.0005 closed response=\"t.frd\"
.box B closed vb=20m qa=8 ql=7
item SYSTEM {
  lowpass LP 2k order=2 {
    speaker WOOF driver=W box=B y=0.8
  }
  highpass HP 2k order=2 {
    speaker TWEET driver=T y=1.0 inverted
  }
}
";

    fn measurements() -> HashMap<String, ResponseData> {
        let frd = ResponseData::new(
            MeasurementKind::Response,
            vec![
                ResponseEntry::new(500.0, 88.0, 0.0),
                ResponseEntry::new(20_000.0, 88.0, 0.0),
            ],
        )
        .unwrap();
        HashMap::from([("t.frd".to_string(), frd)])
    }

    #[test]
    fn test_zero_measurement_voltage_rejected() {
        let text = TWO_WAY.replace("closed response=", "closed voltage=0 response=");
        let result = Project::parse(&text, &measurements()).and_then(|p| p.simulator().map(|_| ()));
        assert!(matches!(
            result,
            Err(SpeakerSimError::InvalidParameter { ref param, .. }) if param == "voltage"
        ));
    }

    #[test]
    fn test_two_way_project() {
        let project = Project::parse(TWO_WAY, &measurements()).unwrap();
        assert_relative_eq!(project.context.environment.room.width, 6.0);
        assert_relative_eq!(project.context.listening_position.z, 2.5);
        assert_eq!(project.context.settings.sweep.points, 50);
        assert_eq!(project.library.drivers["W"].power_filter, PowerFilter::Iec268_5);
        assert!(project.library.drivers["T"].measurements.on_axis.is_some());
        assert!(project.library.drivers["T"].closed);
        assert_eq!(project.library.enclosures["B"].kind(), "closed");
        assert_eq!(project.circuit.root.children.len(), 2);

        let sim = project.simulator().unwrap();
        assert_eq!(sim.root().speaker_count(), 2);
        assert_eq!(sim.sweep(crate::circuit::Curve::Response).len(), 50);
    }

    #[test]
    fn test_missing_measurement() {
        let err = Project::parse(TWO_WAY, &HashMap::new()).unwrap_err();
        assert!(matches!(err, SpeakerSimError::UndefinedReference { what: "measurement", .. }));
    }

    #[test]
    fn test_conditions_derive_air_constants() {
        let project = Project::parse(".env temperature=30 reflection=0.2\nitem I { speaker S driver=W }\n.driver W fs=40 qts=0.35 vas=40m re=6 bl=8 sd=0.02\n", &HashMap::new()).unwrap();
        let env = &project.context.environment;
        assert!(env.speed_of_sound > 343.0);
        assert_relative_eq!(env.reflection, 0.2);
    }

    #[test]
    fn test_unknown_settings_key() {
        assert!(matches!(
            Project::parse(".sweep bogus=1\nitem I\n", &HashMap::new()),
            Err(SpeakerSimError::ParseError { line: 1, .. })
        ));
        assert!(matches!(
            Project::parse(".box B horn\n", &HashMap::new()),
            Err(SpeakerSimError::ParseError { .. })
        ));
    }
}
