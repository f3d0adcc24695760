//! Loudspeaker drivers.
//!
//! [`DriverParams`] is what the user writes down: any consistent subset of the
//! Thiele-Small parameters plus optional measurements. [`Driver::compile`]
//! completes the set and yields an immutable [`Driver`] that evaluates
//! impedance, cone response, excursion and power limits.

mod compiled;
mod directivity;
mod params;
mod power_filter;

pub use compiled::Driver;
pub use directivity::{Directivity, PistonShape};
pub use params::{BlendWindow, DriverMeasurements, DriverParams, PolarCurve};
pub use power_filter::PowerFilter;
