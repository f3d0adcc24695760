//! Element models for the filter/network tree.
//!
//! This module provides the laws of every element kind a tree can hold:
//! - Passive: Resistor, Capacitor, Inductor, custom impedance curve
//! - Networks: L-pad, Zobel, serial and parallel notch
//! - Crossover: passive high/low-pass ladders in eight filter families
//! - Active: high/low-pass, gain, delay, equalizer, custom response curve
//! - Amplifier with built-in filters and a power rating
//! - Speaker: a driver in an enclosure on a baffle
//!
//! Passive parts compile to a [`Ladder`](crate::solver::Ladder) of series
//! and shunt sections, active parts to a [`Transfer`]. The [`registry`]
//! maps project-file kind tags to constructors.

mod active;
mod amplifier;
mod family;
mod network;
mod pass_filter;
mod passive;
mod registry;
mod response;
mod speaker;

pub use active::{ActiveFilter, Delay, EqShape, Equalizer, FilterResponse, Gain, Transfer, MAX_ACTIVE_ORDER};
pub use amplifier::{Amplifier, AmplifierStage};
pub use family::{FilterFamily, PassKind, MAX_ORDER};
pub use network::{LPad, ParallelNotch, SerialNotch, Zobel, LPAD_REFERENCE_FREQUENCY};
pub use pass_filter::{PassFilter, MAX_PASSIVE_ORDER};
pub use passive::{Branch, Capacitor, CustomImpedance, Inductor, Resistor};
pub use registry::{build_element, lookup, registry, Constructor, RegistryEntry};
pub use response::CustomResponse;
pub use speaker::{Speaker, SpeakerStage};
