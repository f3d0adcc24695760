//! Speakersim - Loudspeaker System Simulator
//!
//! Simulates a loudspeaker project and prints a frequency sweep.
//!
//! # Usage
//!
//! ```bash
//! speakersim two_way.spk --curve with_room --points 300 > two_way.txt
//! RUST_LOG=debug speakersim two_way.spk --json
//! ```

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use speakersim_core::{
    dsl,
    error::{Result, SpeakerSimError},
    measurement::{parse_frd, ResponseData},
    solver::SweepPoint,
    Curve, Project,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Loudspeaker system simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the project description file
    #[arg(value_name = "PROJECT_FILE")]
    project_file: PathBuf,

    /// Acoustic curve to report
    #[arg(short, long, default_value = "response", value_parser = parse_curve)]
    curve: Curve,

    /// Print the sweep as JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Lowest frequency in Hz (overrides `.sweep`)
    #[arg(long)]
    fmin: Option<f64>,

    /// Highest frequency in Hz (overrides `.sweep`)
    #[arg(long)]
    fmax: Option<f64>,

    /// Number of sweep points (overrides `.sweep`)
    #[arg(short, long)]
    points: Option<usize>,

    /// Fractional-octave smoothing, 0 for none (overrides `.sweep`)
    #[arg(long)]
    smoothing: Option<f64>,
}

fn parse_curve(name: &str) -> std::result::Result<Curve, String> {
    Curve::from_name(name).ok_or_else(|| {
        let names: Vec<&str> = Curve::ALL.iter().map(Curve::name).collect();
        format!("unknown curve '{}', expected one of: {}", name, names.join(", "))
    })
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| SpeakerSimError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load the project and every measurement file it names. Measurement paths
/// are relative to the project file.
fn load_project(path: &Path) -> Result<Project> {
    let ast = dsl::parse(&read_file(path)?)?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut measurements: HashMap<String, ResponseData> = HashMap::new();
    for (file, kind) in ast.measurement_files() {
        let data = parse_frd(&read_file(&dir.join(&file))?, kind)?;
        info!(file = %file, samples = data.len(), "loaded measurement");
        measurements.insert(file, data);
    }

    Project::from_ast(&ast, &measurements)
}

fn write_table(out: &mut impl Write, curve: Curve, points: &[SweepPoint]) -> std::io::Result<()> {
    writeln!(out, "# curve: {}", curve)?;
    writeln!(
        out,
        "{:>12} {:>10} {:>10} {:>10} {:>10} {:>12} {:>10}",
        "freq_hz", "spl_db", "phase", "z_ohm", "z_phase", "max_power_w", "xmax_1w_mm"
    )?;
    for p in points {
        let max_power = match p.max_power_w {
            Some(w) => format!("{:.1}", w),
            None => "-".to_string(),
        };
        writeln!(
            out,
            "{:>12.2} {:>10.2} {:>10.1} {:>10.3} {:>10.1} {:>12} {:>10.4}",
            p.frequency,
            p.spl_db,
            p.phase_deg,
            p.impedance_ohm,
            p.impedance_phase_deg,
            max_power,
            p.excursion_1w_mm
        )?;
    }
    Ok(())
}

fn run(args: Args) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut project = load_project(&args.project_file)?;

    let settings = &mut project.context.settings;
    if let Some(f) = args.fmin {
        settings.sweep.f_min = f;
    }
    if let Some(f) = args.fmax {
        settings.sweep.f_max = f;
    }
    if let Some(n) = args.points {
        settings.sweep.points = n;
    }
    if let Some(s) = args.smoothing {
        settings.smoothing = s;
    }

    let simulator = project.simulator()?;
    let points = simulator.sweep(args.curve);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &points)?;
        writeln!(out)?;
    } else {
        write_table(&mut out, args.curve, &points)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
