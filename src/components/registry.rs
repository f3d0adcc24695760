//! Kind tags to element constructors.
//!
//! Every element kind a project description can name has one entry here.
//! A constructor reads the record's value, parameters and options, resolves
//! references against the [`Library`] and returns the typed [`Element`]
//! without children; [`Element::from_record`] attaches those.

use crate::circuit::{Connection, Element, ElementKind, ElementRecord, Library};
use crate::enclosure::EnclosureParams;
use crate::error::{Result, SpeakerSimError};
use crate::geometry::{Baffle, Position};

use super::active::{ActiveFilter, Delay, EqShape, Equalizer, Gain};
use super::amplifier::Amplifier;
use super::family::{FilterFamily, PassKind, MAX_ORDER};
use super::network::{LPad, ParallelNotch, SerialNotch, Zobel};
use super::pass_filter::{PassFilter, MAX_PASSIVE_ORDER};
use super::passive::{Capacitor, CustomImpedance, Inductor, Resistor};
use super::response::CustomResponse;
use super::speaker::Speaker;

/// Builds an element from its record.
pub type Constructor = fn(&ElementRecord, &Library) -> Result<Element>;

/// One registered element kind.
#[derive(Debug, Clone, Copy)]
pub struct RegistryEntry {
    pub kind: &'static str,
    pub build: Constructor,
}

const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry { kind: "item", build: build_item },
    RegistryEntry { kind: "resistor", build: build_resistor },
    RegistryEntry { kind: "capacitor", build: build_capacitor },
    RegistryEntry { kind: "inductor", build: build_inductor },
    RegistryEntry { kind: "impedance", build: build_impedance },
    RegistryEntry { kind: "lpad", build: build_lpad },
    RegistryEntry { kind: "zobel", build: build_zobel },
    RegistryEntry { kind: "serial_notch", build: build_serial_notch },
    RegistryEntry { kind: "parallel_notch", build: build_parallel_notch },
    RegistryEntry { kind: "highpass", build: build_highpass },
    RegistryEntry { kind: "lowpass", build: build_lowpass },
    RegistryEntry { kind: "active_highpass", build: build_active_highpass },
    RegistryEntry { kind: "active_lowpass", build: build_active_lowpass },
    RegistryEntry { kind: "gain", build: build_gain },
    RegistryEntry { kind: "delay", build: build_delay },
    RegistryEntry { kind: "equalizer", build: build_equalizer },
    RegistryEntry { kind: "amplifier", build: build_amplifier },
    RegistryEntry { kind: "speaker", build: build_speaker },
    RegistryEntry { kind: "response", build: build_response },
];

/// All registered element kinds.
pub fn registry() -> &'static [RegistryEntry] {
    REGISTRY
}

/// Find the entry for a kind tag (case-insensitive).
pub fn lookup(kind: &str) -> Option<&'static RegistryEntry> {
    REGISTRY.iter().find(|e| e.kind.eq_ignore_ascii_case(kind))
}

/// Build the element a record describes, without its children.
pub fn build_element(record: &ElementRecord, library: &Library) -> Result<Element> {
    let entry = lookup(&record.kind).ok_or_else(|| SpeakerSimError::UnknownElementKind {
        kind: record.kind.clone(),
        line: record.line,
    })?;
    (entry.build)(record, library)
}

fn element(record: &ElementRecord, kind: ElementKind) -> Element {
    Element::new(record.name.clone(), kind)
}

fn connection(record: &ElementRecord) -> Result<Connection> {
    record.parse_option("connection", Connection::Series, Connection::from_name)
}

fn order(record: &ElementRecord, key: &str, max: usize) -> Result<usize> {
    let value = record.param_or(key, 2.0);
    if value.fract() != 0.0 || value < 1.0 || value > max as f64 {
        return Err(SpeakerSimError::invalid_parameter(
            &record.name,
            key,
            format!("order must be a whole number in 1..={}, got {}", max, value),
        ));
    }
    Ok(value as usize)
}

fn family(record: &ElementRecord, key: &str) -> Result<FilterFamily> {
    record.parse_option(key, FilterFamily::Butterworth, FilterFamily::from_name)
}

fn build_item(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&[])?;
    Ok(element(record, ElementKind::Item))
}

fn build_resistor(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["r", "connection"])?;
    let resistor = Resistor::new(record.require("r")?, connection(record)?);
    Ok(element(record, ElementKind::Resistor(resistor)))
}

fn build_capacitor(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["c", "connection"])?;
    let capacitor = Capacitor::new(record.require("c")?, connection(record)?);
    Ok(element(record, ElementKind::Capacitor(capacitor)))
}

fn build_inductor(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["l", "r", "connection"])?;
    let inductor = Inductor::new(record.require("l")?, connection(record)?).with_resistance(record.param_or("r", 0.0));
    Ok(element(record, ElementKind::Inductor(inductor)))
}

fn build_impedance(record: &ElementRecord, library: &Library) -> Result<Element> {
    record.check_known(&["data", "connection"])?;
    let name = record
        .option("data")
        .ok_or_else(|| SpeakerSimError::invalid_parameter(&record.name, "data", "impedance requires a data curve"))?;
    let data = library.measurement(&record.name, name)?.clone();
    let custom = CustomImpedance::new(data, connection(record)?);
    Ok(element(record, ElementKind::CustomImpedance(custom)))
}

fn build_lpad(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["attenuation", "impedance", "frequency"])?;
    let mut lpad = LPad::new(record.require("attenuation")?);
    lpad.impedance = record.param("impedance");
    if let Some(f) = record.param("frequency") {
        lpad.frequency = f;
    }
    Ok(element(record, ElementKind::LPad(lpad)))
}

fn build_zobel(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["r", "c"])?;
    let zobel = Zobel {
        resistance: record.param("r"),
        capacitance: record.param("c"),
    };
    Ok(element(record, ElementKind::Zobel(zobel)))
}

fn build_serial_notch(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["f", "q", "r"])?;
    let mut notch = SerialNotch::new(record.require("f")?, record.param_or("q", 1.0));
    notch.resistance = record.param_or("r", 0.0);
    Ok(element(record, ElementKind::SerialNotch(notch)))
}

fn build_parallel_notch(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["f", "q", "depth"])?;
    let notch = ParallelNotch::new(
        record.require("f")?,
        record.param_or("q", 1.0),
        record.param_or("depth", 6.0),
    );
    Ok(element(record, ElementKind::ParallelNotch(notch)))
}

fn build_pass_filter(record: &ElementRecord, pass: PassKind) -> Result<Element> {
    let custom_keys: &[&str] = match pass {
        PassKind::LowPass => &["l1", "c1", "l2", "c2", "l3", "c3", "l4", "c4"],
        PassKind::HighPass => &["c1", "l1", "c2", "l2", "c3", "l3", "c4", "l4"],
    };
    let mut known = vec!["f", "order", "family", "impedance"];
    known.extend_from_slice(custom_keys);
    record.check_known(&known)?;

    let mut filter = PassFilter::new(
        pass,
        family(record, "family")?,
        order(record, "order", MAX_PASSIVE_ORDER)?,
        record.require("f")?,
    );
    if let Some(z) = record.param("impedance") {
        filter = filter.with_impedance(z);
    }
    let custom: Vec<f64> = custom_keys.iter().map_while(|k| record.param(k)).collect();
    if !custom.is_empty() {
        filter = filter.with_custom(custom);
    }
    Ok(element(record, ElementKind::PassFilter(filter)))
}

fn build_highpass(record: &ElementRecord, _library: &Library) -> Result<Element> {
    build_pass_filter(record, PassKind::HighPass)
}

fn build_lowpass(record: &ElementRecord, _library: &Library) -> Result<Element> {
    build_pass_filter(record, PassKind::LowPass)
}

fn active_filter(record: &ElementRecord, pass: PassKind) -> Result<ActiveFilter> {
    let mut filter = ActiveFilter::new(
        pass,
        family(record, "family")?,
        order(record, "order", MAX_ORDER)?,
        record.require("f")?,
    )
    .with_linear_phase(record.flag("linear_phase"));
    if let Some(q) = record.param("q") {
        filter = filter.with_q(q);
    }
    Ok(filter)
}

fn build_active_highpass(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["f", "order", "family", "q", "linear_phase"])?;
    let filter = active_filter(record, PassKind::HighPass)?;
    Ok(element(record, ElementKind::ActiveFilter(filter)))
}

fn build_active_lowpass(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["f", "order", "family", "q", "linear_phase"])?;
    let filter = active_filter(record, PassKind::LowPass)?;
    Ok(element(record, ElementKind::ActiveFilter(filter)))
}

fn build_gain(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["gain", "inverted"])?;
    let gain = Gain {
        gain: record.value_or_param("gain").unwrap_or(0.0),
        inverted: record.flag("inverted"),
    };
    Ok(element(record, ElementKind::Gain(gain)))
}

fn build_delay(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["ms"])?;
    let delay = Delay {
        delay: record.require("ms")?,
    };
    Ok(element(record, ElementKind::Delay(delay)))
}

fn build_equalizer(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&["shape", "f", "gain", "q", "bw"])?;
    let q = match (record.param("q"), record.param("bw")) {
        (Some(_), Some(_)) => {
            return Err(SpeakerSimError::invalid_parameter(
                &record.name,
                "bw",
                "give either q or bw, not both",
            ))
        }
        (Some(q), None) => q,
        (None, Some(bw)) if bw > 0.0 => Equalizer::q_from_bandwidth(bw),
        (None, Some(bw)) => {
            return Err(SpeakerSimError::invalid_parameter(
                &record.name,
                "bw",
                format!("bandwidth must be positive, got {}", bw),
            ))
        }
        (None, None) => std::f64::consts::FRAC_1_SQRT_2,
    };
    let eq = Equalizer::new(
        record.parse_option("shape", EqShape::Peaking, EqShape::from_name)?,
        record.require("f")?,
        record.param_or("gain", 0.0),
        q,
    );
    Ok(element(record, ElementKind::Equalizer(eq)))
}

fn build_amplifier(record: &ElementRecord, _library: &Library) -> Result<Element> {
    record.check_known(&[
        "gain", "zout", "power", "hp_f", "hp_order", "hp_family", "lp_f", "lp_order", "lp_family",
    ])?;
    let mut amp = Amplifier::new(record.value_or_param("gain").unwrap_or(0.0))
        .with_output_impedance(record.param_or("zout", 0.0));
    if let Some(p) = record.param("power") {
        amp = amp.with_max_power(p);
    }
    for (pass, prefix) in [(PassKind::HighPass, "hp"), (PassKind::LowPass, "lp")] {
        if let Some(f) = record.param(&format!("{}_f", prefix)) {
            let filter = ActiveFilter::new(
                pass,
                family(record, &format!("{}_family", prefix))?,
                order(record, &format!("{}_order", prefix), MAX_ORDER)?,
                f,
            );
            amp = amp.with_filter(filter);
        }
    }
    Ok(element(record, ElementKind::Amplifier(amp)))
}

fn build_speaker(record: &ElementRecord, library: &Library) -> Result<Element> {
    record.check_known(&[
        "driver",
        "box",
        "x",
        "y",
        "z",
        "h",
        "v",
        "baffle_width",
        "baffle_height",
        "baffle_x",
        "baffle_y",
        "edge_radius",
        "inverted",
        "wiring",
    ])?;
    let driver_name = record
        .option("driver")
        .ok_or_else(|| SpeakerSimError::invalid_parameter(&record.name, "driver", "speaker requires a driver"))?;
    let driver = library.driver(&record.name, driver_name)?.clone();
    let enclosure = match record.option("box") {
        None | Some("null") | Some("none") => EnclosureParams::Null,
        Some(name) => library.enclosure(&record.name, name)?.clone(),
    };

    let mut speaker = Speaker::new(driver_name, driver)
        .with_enclosure(enclosure)
        .with_inverted(record.flag("inverted"))
        .with_wiring_resistance(record.param_or("wiring", 0.0));

    if ["x", "y", "z", "h", "v"].iter().any(|k| record.param(k).is_some()) {
        let position = Position::new(record.param_or("x", 0.0), record.param_or("y", 0.0), record.param_or("z", 0.0))
            .with_angles(record.param_or("h", 0.0), record.param_or("v", 0.0));
        speaker = speaker.with_position(position);
    }

    let defaults = Baffle::default();
    speaker = speaker.with_baffle(Baffle {
        width: record.param_or("baffle_width", defaults.width),
        height: record.param_or("baffle_height", defaults.height),
        driver_x: record.param_or("baffle_x", defaults.driver_x),
        driver_y: record.param_or("baffle_y", defaults.driver_y),
        edge_radius: record.param_or("edge_radius", defaults.edge_radius),
    });
    Ok(element(record, ElementKind::Speaker(Box::new(speaker))))
}

fn build_response(record: &ElementRecord, library: &Library) -> Result<Element> {
    record.check_known(&["data"])?;
    let name = record
        .option("data")
        .ok_or_else(|| SpeakerSimError::invalid_parameter(&record.name, "data", "response requires a data curve"))?;
    let data = library.measurement(&record.name, name)?.clone();
    Ok(element(record, ElementKind::CustomResponse(CustomResponse::new(data))))
}
