//! Spatial layer: propagation, baffle diffraction, room gain and angular
//! averages.

mod angular;
mod baffle;
mod distance;
mod room;

pub use angular::{
    listening_window_points, point_at, power_points, rms_average, LISTENING_WINDOW, POWER_POINTS,
};
pub use baffle::{BaffleSimulation, DIPOLE_REAR_LEVEL};
pub use distance::DistanceSimulation;
pub use room::{ImagePath, RoomSimulation};
