//! Project descriptions from text to sweep.

use std::collections::HashMap;

use speakersim_core::circuit::Responds;
use speakersim_core::dsl;
use speakersim_core::measurement::{parse_frd, MeasurementKind, ResponseData};
use speakersim_core::math::ComplexExt;
use speakersim_core::{Curve, Project, SpeakerSimError};

const TWO_WAY: &str = r#"
* Two-way bookshelf
.env temperature=20 room_width=5 room_depth=4 room_height=2.5 reflection=0.4
.listen y=1 z=2
.center y=1
.sweep f_min=20 f_max=20k points=60 scale=log

.driver W fs=40 qts=0.35 vas=40m re=6 bl=8 sd=0.02 xmax=5 pe=50 power_filter=iec
.driver T fs=900 qes=1.2 qms=2 vas=0.05m re=5 sd=0.0005 pe=20 closed response="tweeter.frd"
.box B reflex vb=50m fb=30

amplifier AMP 0 zout=0.05 {
  lowpass LP 2.5k order=2 family=lr {
    speaker WOOF driver=W box=B y=0.9
  }
  highpass HP 2.5k order=2 family=lr {
    lpad PAD attenuation=6 {
      speaker TWEET driver=T y=1.1 inverted
    }
  }
}
"#;

const TWEETER_FRD: &str = "\
* tweeter on axis, 2.83 V / 1 m
Freq SPL Phase
500 80.0 60
1000 86.0 30
2000 88.0 10
5000 88.0 0
20000 87.0 -20
";

fn load(text: &str) -> Result<Project, SpeakerSimError> {
    let ast = dsl::parse(text)?;
    let mut measurements: HashMap<String, ResponseData> = HashMap::new();
    for (file, kind) in ast.measurement_files() {
        assert_eq!(file, "tweeter.frd");
        measurements.insert(file, parse_frd(TWEETER_FRD, kind)?);
    }
    Project::from_ast(&ast, &measurements)
}

#[test]
fn test_two_way_crossover() {
    let project = load(TWO_WAY).unwrap();
    let sim = project.simulator().unwrap();
    assert_eq!(sim.root().speaker_count(), 2);

    let woofer = sim.node("LP").unwrap();
    let tweeter = sim.node("HP").unwrap();
    let level = |node: &dyn Responds, f: f64| node.response(f, Curve::Response).db();

    assert!(level(woofer, 100.0) > level(tweeter, 100.0) + 20.0);
    assert!(level(tweeter, 10_000.0) > level(woofer, 10_000.0) + 10.0);

    for point in sim.sweep(Curve::WithRoom) {
        assert!(point.impedance_ohm.is_finite() && point.impedance_ohm > 1.0, "{:?}", point);
        assert!(point.spl_db.is_finite());
        assert!(point.max_power_w.is_some_and(|w| w > 0.0));
    }
}

#[test]
fn test_sweep_follows_settings() {
    let project = load(TWO_WAY).unwrap();
    assert_eq!(project.context.settings.sweep.points, 60);
    let sim = project.simulator().unwrap();
    let points = sim.sweep(Curve::Response);
    assert_eq!(points.len(), 60);
    assert!((points[0].frequency - 20.0).abs() < 1e-9);
    assert!((points[59].frequency - 20_000.0).abs() < 1e-6);
    assert!(points.windows(2).all(|w| w[1].frequency > w[0].frequency));
}

#[test]
fn test_measurement_kinds() {
    let ast = dsl::parse(
        ".driver W fs=40 qts=0.35 vas=40m re=6 sd=0.02 impedance=\"w.zma\" h30=\"w30.frd\"\n\
         impedance Z data=\"load.zma\" connection=parallel { speaker S driver=W }\n",
    )
    .unwrap();
    let files = ast.measurement_files();
    assert!(files.contains(&("w.zma".to_string(), MeasurementKind::Impedance)));
    assert!(files.contains(&("w30.frd".to_string(), MeasurementKind::Response)));
    assert!(files.contains(&("load.zma".to_string(), MeasurementKind::Impedance)));
}

#[test]
fn test_reference_errors() {
    let undefined = "item I { speaker S driver=NOPE }\n";
    match Project::parse(undefined, &HashMap::new()) {
        Err(SpeakerSimError::UndefinedReference { element, what, name }) => {
            assert_eq!(element, "S");
            assert_eq!(what, "driver");
            assert_eq!(name, "NOPE");
        }
        other => panic!("unexpected {:?}", other),
    }

    let unknown = ".driver W fs=40 qts=0.35 vas=40m re=6 sd=0.02\n\nitem I {\n  tube V1 { speaker S driver=W }\n}\n";
    assert!(matches!(
        Project::parse(unknown, &HashMap::new()),
        Err(SpeakerSimError::UnknownElementKind { line: 4, .. })
    ));

    let duplicate = ".driver W fs=40 qts=0.35 vas=40m re=6 sd=0.02\n.driver W fs=30 qts=0.4 vas=60m re=6 sd=0.03\n";
    assert!(matches!(
        Project::parse(duplicate, &HashMap::new()),
        Err(SpeakerSimError::DuplicateName { .. })
    ));
}
