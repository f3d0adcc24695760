//! Acoustic environment and simulation context.
//!
//! [`SimContext`] is the explicit "current project": every compilation step
//! receives it by reference and nothing in the crate reads global state.

use serde::{Deserialize, Serialize};

use crate::error::{require_positive, Result, SpeakerSimError};
use crate::geometry::Position;
use crate::math::sweep::{self, SweepScale};

/// Reference drive voltage for sensitivity figures (V).
pub const REFERENCE_VOLTAGE: f64 = 2.83;

/// Specific gas constant of dry air (J/(kg·K)).
const R_DRY_AIR: f64 = 287.058;

/// Specific gas constant of water vapor (J/(kg·K)).
const R_WATER_VAPOR: f64 = 461.495;

/// Room box dimensions in meters.
///
/// The room spans `x ∈ [−width/2, width/2]`, `y ∈ [0, height]` and
/// `z ∈ [0, depth]` (front wall at `z = 0`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomSize {
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Default for RoomSize {
    fn default() -> Self {
        Self {
            width: 5.0,
            depth: 4.0,
            height: 2.5,
        }
    }
}

/// Ambient constants and room geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environment {
    /// Speed of sound (m/s)
    pub speed_of_sound: f64,
    /// Air density (kg/m³)
    pub air_density: f64,
    /// Static pressure (Pa)
    pub pressure: f64,
    /// Relative humidity (%)
    pub humidity: f64,
    /// Temperature (°C)
    pub temperature: f64,
    /// Room dimensions
    pub room: RoomSize,
    /// Wall reflection factor, 0 (anechoic) to 1 (rigid)
    pub reflection: f64,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            speed_of_sound: 343.0,
            air_density: 1.18,
            pressure: 101_325.0,
            humidity: 50.0,
            temperature: 20.0,
            room: RoomSize::default(),
            reflection: 0.5,
        }
    }
}

impl Environment {
    /// Derive speed of sound and density from temperature (°C), static
    /// pressure (Pa) and relative humidity (%).
    pub fn from_conditions(temperature: f64, pressure: f64, humidity: f64) -> Self {
        let kelvin = temperature + 273.15;
        let speed_of_sound = 331.3 * (1.0 + temperature / 273.15).sqrt();
        // Magnus formula for the saturation vapor pressure
        let saturation = 610.78 * 10f64.powf(7.5 * temperature / (temperature + 237.3));
        let vapor = (humidity.clamp(0.0, 100.0) / 100.0) * saturation;
        let air_density = (pressure - vapor) / (R_DRY_AIR * kelvin) + vapor / (R_WATER_VAPOR * kelvin);
        Self {
            speed_of_sound,
            air_density,
            pressure,
            humidity,
            temperature,
            ..Self::default()
        }
    }

    /// `ρ·c²`, the bulk modulus of air (Pa).
    pub fn rho_c2(&self) -> f64 {
        self.air_density * self.speed_of_sound * self.speed_of_sound
    }

    /// Wavenumber `2πf/c`.
    pub fn wavenumber(&self, f: f64) -> f64 {
        2.0 * std::f64::consts::PI * f / self.speed_of_sound
    }

    /// Set the room dimensions.
    pub fn with_room(mut self, width: f64, depth: f64, height: f64) -> Self {
        self.room = RoomSize {
            width,
            depth,
            height,
        };
        self
    }

    /// Set the wall reflection factor.
    pub fn with_reflection(mut self, reflection: f64) -> Self {
        self.reflection = reflection;
        self
    }

    /// Check that every constant is physically meaningful.
    pub fn validate(&self) -> Result<()> {
        require_positive("environment", "speed_of_sound", self.speed_of_sound)?;
        require_positive("environment", "air_density", self.air_density)?;
        require_positive("environment", "room.width", self.room.width)?;
        require_positive("environment", "room.depth", self.room.depth)?;
        require_positive("environment", "room.height", self.room.height)?;
        if !(0.0..=1.0).contains(&self.reflection) {
            return Err(SpeakerSimError::invalid_parameter(
                "environment",
                "reflection",
                format!("must be within 0..1, got {}", self.reflection),
            ));
        }
        Ok(())
    }
}

/// Frequency sweep bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub f_min: f64,
    pub f_max: f64,
    pub points: usize,
    pub scale: SweepScale,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            f_min: 20.0,
            f_max: 20_000.0,
            points: 200,
            scale: SweepScale::Log,
        }
    }
}

impl SweepSettings {
    /// Frequencies of this sweep.
    pub fn frequencies(&self) -> Vec<f64> {
        sweep::frequencies(self.f_min, self.f_max, self.points, self.scale)
    }
}

/// Global simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Frequency sweep
    pub sweep: SweepSettings,
    /// Drive voltage the responses are referenced to (V)
    pub reference_voltage: f64,
    /// Fractional-octave smoothing of swept amplitudes (e.g. 6 for 1/6 octave, 0 = off)
    pub smoothing: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sweep: SweepSettings::default(),
            reference_voltage: REFERENCE_VOLTAGE,
            smoothing: 0.0,
        }
    }
}

/// Everything a compilation needs besides the element tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimContext {
    pub environment: Environment,
    /// Listener position
    pub listening_position: Position,
    /// Reference point of the loudspeaker system (center of the angular grids)
    pub center_position: Position,
    pub settings: Settings,
}

impl Default for SimContext {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            listening_position: Position::new(0.0, 1.0, 3.0),
            center_position: Position::new(0.0, 1.0, 1.0),
            settings: Settings::default(),
        }
    }
}

impl SimContext {
    /// Create a context with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the listener position.
    pub fn with_listening_position(mut self, position: Position) -> Self {
        self.listening_position = position;
        self
    }

    /// Set the system reference position.
    pub fn with_center_position(mut self, position: Position) -> Self {
        self.center_position = position;
        self
    }

    /// Set the sweep bounds.
    pub fn with_sweep(mut self, sweep: SweepSettings) -> Self {
        self.settings.sweep = sweep;
        self
    }

    /// Set the reference drive voltage.
    pub fn with_reference_voltage(mut self, volts: f64) -> Self {
        self.settings.reference_voltage = volts;
        self
    }

    /// Set fractional-octave smoothing (0 disables it).
    pub fn with_smoothing(mut self, fraction: f64) -> Self {
        self.settings.smoothing = fraction;
        self
    }

    /// Distance from the system center to the listener.
    pub fn listening_distance(&self) -> f64 {
        self.center_position.distance(&self.listening_position)
    }

    /// Validate environment and settings.
    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        require_positive("settings", "reference_voltage", self.settings.reference_voltage)?;
        let sweep = &self.settings.sweep;
        require_positive("settings", "sweep.f_min", sweep.f_min)?;
        if sweep.f_max < sweep.f_min {
            return Err(SpeakerSimError::invalid_parameter(
                "settings",
                "sweep.f_max",
                "must not be below f_min",
            ));
        }
        if sweep.points == 0 {
            return Err(SpeakerSimError::invalid_parameter(
                "settings",
                "sweep.points",
                "must be at least 1",
            ));
        }
        if self.settings.smoothing < 0.0 {
            return Err(SpeakerSimError::invalid_parameter(
                "settings",
                "smoothing",
                "must not be negative",
            ));
        }
        Ok(())
    }
}
