//! End-to-end checks of drivers, enclosures and the compiled tree.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use speakersim_core::circuit::{Circuit, Element, ElementKind};
use speakersim_core::components::Speaker;
use speakersim_core::driver::{Driver, DriverParams};
use speakersim_core::enclosure::{calc_box, closed_box, BassReflexParams, ClosedBoxParams, EnclosureParams, EnclosureSimulation};
use speakersim_core::environment::{Environment, SimContext};
use speakersim_core::geometry::{Baffle, Position};
use speakersim_core::math::sweep::log_space;
use speakersim_core::math::ComplexExt;
use speakersim_core::{Curve, Simulator};

fn woofer(qts: f64) -> DriverParams {
    let mut params = DriverParams::new();
    for (key, value) in [
        ("fs", 40.0),
        ("qts", qts),
        ("vas", 0.04),
        ("re", 6.0),
        ("bl", 8.0),
        ("sd", 0.02),
        ("xmax", 5.0),
        ("pe", 50.0),
    ] {
        params.set(key, value).unwrap();
    }
    params
}

fn sealed() -> EnclosureParams {
    EnclosureParams::Closed(ClosedBoxParams {
        vb: Some(0.02),
        qa: 8.0,
        ql: 7.0,
    })
}

fn simulator(root: Element) -> Simulator {
    Simulator::new(&Circuit::new(root), &SimContext::default()).unwrap()
}

fn speaker(name: &str, enclosure: EnclosureParams) -> Element {
    let speaker = Speaker::new("W", woofer(0.35)).with_enclosure(enclosure);
    Element::new(name, ElementKind::Speaker(Box::new(speaker)))
}

fn enclosure_simulation(params: &EnclosureParams) -> EnclosureSimulation {
    let env = Environment::default();
    let driver = Driver::compile("W", &woofer(0.35), &env).unwrap();
    EnclosureSimulation::new(driver, params, &Baffle::default(), Position::default(), &SimContext::default()).unwrap()
}

/// Frequency of the largest impedance magnitude between `lo` and `hi`.
fn impedance_peak(sim: &Simulator, lo: f64, hi: f64) -> (f64, f64) {
    log_space(lo, hi, 400)
        .into_iter()
        .map(|f| (f, sim.impedance(f).amplitude()))
        .fold((lo, 0.0), |best, (f, z)| if z > best.1 { (f, z) } else { best })
}

#[test]
fn test_closed_box_rolloff_and_resonance() {
    let sim = simulator(speaker("W", sealed()));
    let driver = Driver::compile("W", &woofer(0.35), &Environment::default()).unwrap();
    let fc = closed_box::fc(&driver, 0.02);

    // Second-order high-pass below the box resonance
    let passband = sim.response(300.0, Curve::Response).db();
    assert!(sim.response(20.0, Curve::Response).db() < passband - 12.0);
    assert!(sim.response(10.0, Curve::Response).db() < sim.response(20.0, Curve::Response).db() - 9.0);
    assert_abs_diff_eq!(sim.response(600.0, Curve::Response).db(), passband, epsilon = 2.0);

    let (f_peak, z_peak) = impedance_peak(&sim, 15.0, 300.0);
    assert!(f_peak > 0.85 * fc && f_peak < 1.15 * fc, "peak at {} Hz, fc {} Hz", f_peak, fc);
    assert!(z_peak > 1.8 * driver.re);
}

#[test]
fn test_free_air_impedance_peak_at_fs() {
    let sim = simulator(speaker("W", EnclosureParams::Null));
    let (f_peak, _) = impedance_peak(&sim, 15.0, 300.0);
    assert_abs_diff_eq!(f_peak, 40.0, epsilon = 5.0);
    // Voice coil resistance dominates well above resonance
    assert_abs_diff_eq!(sim.impedance(1_000.0).amplitude(), 6.0, epsilon = 0.5);
}

#[test]
fn test_impedance_finite_for_every_enclosure() {
    let enclosures = [
        EnclosureParams::Null,
        sealed(),
        EnclosureParams::BassReflex(BassReflexParams::tuned(0.05, 30.0)),
        EnclosureParams::from_kind("aperiodic").unwrap(),
        EnclosureParams::OpenBaffle,
    ];
    for enclosure in enclosures {
        let kind = enclosure.kind();
        let sim = simulator(speaker("W", enclosure));
        for f in log_space(5.0, 40_000.0, 60) {
            let z = sim.impedance(f).amplitude();
            assert!(z.is_finite() && z >= 0.0, "{}: |Z({})| = {}", kind, f, z);
            assert!(sim.response(f, Curve::Power).amplitude().is_finite());
        }
    }
}

#[test]
fn test_bass_reflex_at_tuning() {
    let sim = enclosure_simulation(&EnclosureParams::BassReflex(BassReflexParams::tuned(0.05, 30.0)));
    let fb = 30.0;

    let cone = sim.cone_response(fb);
    let port = sim.port_response(fb).unwrap();
    let total = sim.response(fb);
    assert!(port.amplitude() > cone.amplitude());

    // Total is `cone − port`, so the port contributes with inverted sign
    let mut difference = (total.phase_deg() - (-port).phase_deg()).abs() % 360.0;
    if difference > 180.0 {
        difference = 360.0 - difference;
    }
    assert!(difference < 45.0, "port and total differ by {}°", difference);

    // The cone is held still near Fb
    let x_fb = sim.excursion(fb, 1.0);
    assert!(x_fb < sim.excursion(0.6 * fb, 1.0));
    assert!(x_fb < sim.excursion(1.7 * fb, 1.0));
}

#[test]
fn test_baffle_solid_angle_limits() {
    for radius in [0.0, 0.02] {
        let baffle = Baffle {
            edge_radius: radius,
            ..Baffle::default()
        };
        let env = Environment::default();
        let driver = Driver::compile("W", &woofer(0.35), &env).unwrap();
        let sim = EnclosureSimulation::new(driver, &sealed(), &baffle, Position::default(), &SimContext::default())
            .unwrap();
        assert_abs_diff_eq!(sim.solid_angle_fraction(5.0), 1.0, epsilon = 0.01);
        assert!(sim.solid_angle_fraction(20_000.0) < 0.55);
    }
}

#[test]
fn test_single_child_item_is_identity() {
    let alone = simulator(speaker("W", sealed()));
    let grouped = simulator(Element::item("I").with_child(speaker("W", sealed())));
    for f in [20.0, 63.0, 400.0, 5_000.0] {
        for curve in [Curve::Response, Curve::WithRoom] {
            let a = alone.response(f, curve);
            let b = grouped.response(f, curve);
            assert_relative_eq!(a.re, b.re, max_relative = 1e-12);
            assert_relative_eq!(a.im, b.im, max_relative = 1e-12);
        }
        assert_relative_eq!(alone.impedance(f).re, grouped.impedance(f).re, max_relative = 1e-12);
        assert_relative_eq!(alone.max_power(f), grouped.max_power(f), max_relative = 1e-12);
        assert_relative_eq!(alone.excursion(f, 1.0), grouped.excursion(f, 1.0), max_relative = 1e-12);
    }
}

#[test]
fn test_calc_box_reaches_target_q() {
    let env = Environment::default();
    let driver = Driver::compile("W", &woofer(0.383), &env).unwrap();
    assert_relative_eq!(driver.qts, 0.383, max_relative = 1e-12);
    for qa in [5.0, 10.0, 20.0] {
        let vb = calc_box(&driver, qa).unwrap();
        assert!(vb > 0.0);
        assert_relative_eq!(closed_box::qtc(&driver, vb), 0.707 + 1.0 / qa, max_relative = 1e-9);
    }
    // Drivers with too high a Q cannot reach the target
    let mut params = DriverParams::new();
    for (key, value) in [("fs", 40.0), ("qes", 1.2), ("qms", 3.6), ("vas", 0.04), ("re", 6.0), ("sd", 0.02)] {
        params.set(key, value).unwrap();
    }
    let high_q = Driver::compile("H", &params, &env).unwrap();
    assert_relative_eq!(high_q.qts, 0.9, max_relative = 1e-9);
    assert!(calc_box(&high_q, 10.0).is_err());
}
