//! # Speakersim Core
//!
//! A frequency-domain loudspeaker system simulator.
//!
//! This library provides:
//! - Thiele-Small driver models completed from any consistent parameter subset
//! - Closed, vented, aperiodic and open-baffle enclosure simulations
//! - Passive and active crossover elements evaluated as a two-port cascade
//! - Placement effects: distance, baffle diffraction, room reflections and
//!   driver directivity
//! - A text project language tying drivers, boxes and crossovers together
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`math`] - complex helpers, interpolation, Bessel functions, sweeps
//! - [`environment`] - air constants, room and simulation settings
//! - [`geometry`] - oriented positions and baffles
//! - [`measurement`] - measured response and impedance curves
//! - [`driver`] - Thiele-Small parameter completion and driver evaluation
//! - [`enclosure`] - acoustic loads behind the cone
//! - [`spatial`] - propagation, diffraction, room gain, angular averages
//! - [`circuit`] - element tree representation and validation
//! - [`components`] - crossover, amplifier and speaker element models
//! - [`solver`] - compiled tree evaluation
//! - [`dsl`] - parser for the project description language
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! speakersim two_way.spk --curve with_room --points 200
//! ```
//!
//! ### Library
//!
//! ```text
//! let project = Project::parse(&text, &measurements)?;
//! let simulator = project.simulator()?;
//! for point in simulator.sweep(Curve::Response) { ... }
//! ```
//!
//! ## Simulation Method
//!
//! Each element between the amplifier input and a speaker is reduced to a
//! two-port (input impedance and voltage transfer) computed from the load
//! its children present. For each frequency:
//!
//! 1. Evaluate speaker impedances and pressures at the listening position
//! 2. Walk back toward the input, folding loads into two-ports
//! 3. Multiply transfers along each path and sum the paths at the listener
//!
//! Nothing is integrated in time; every curve is exact at the frequencies
//! asked for.

pub mod circuit;
pub mod components;
pub mod driver;
pub mod dsl;
pub mod enclosure;
pub mod environment;
pub mod error;
pub mod geometry;
pub mod math;
pub mod measurement;
pub mod solver;
pub mod spatial;

// Re-export main types for convenience
pub use circuit::{Circuit, Curve};
pub use dsl::Project;
pub use environment::{Environment, SimContext};
pub use error::{Result, SpeakerSimError};
pub use solver::Simulator;
