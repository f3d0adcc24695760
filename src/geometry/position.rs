//! Positions with orientation.

use serde::{Deserialize, Serialize};

/// A point in space with an orientation.
///
/// Axes: `x` to the right, `y` up, `z` toward the listener. A position with
/// zero angles faces +z. `horizontal_angle` turns toward +x, `vertical_angle`
/// tilts toward +y (both in degrees).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub horizontal_angle: f64,
    pub vertical_angle: f64,
}

impl Position {
    /// Position at `(x, y, z)` facing +z.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            horizontal_angle: 0.0,
            vertical_angle: 0.0,
        }
    }

    /// Same point with another orientation.
    pub fn with_angles(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_angle = horizontal;
        self.vertical_angle = vertical;
        self
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Position) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Vector to `other` expressed in this position's rotated frame.
    pub(crate) fn local_vector(&self, other: &Position) -> (f64, f64, f64) {
        let (dx, dy, dz) = (other.x - self.x, other.y - self.y, other.z - self.z);
        let (sh, ch) = self.horizontal_angle.to_radians().sin_cos();
        let x1 = dx * ch - dz * sh;
        let z1 = dx * sh + dz * ch;
        let (sv, cv) = self.vertical_angle.to_radians().sin_cos();
        let y2 = dy * cv - z1 * sv;
        let z2 = dy * sv + z1 * cv;
        (x1, y2, z2)
    }

    /// Horizontal (azimuth) angle of `other` seen from this position, in
    /// degrees within (-180, 180]. Positive to the right.
    pub fn horizontal_angle_to(&self, other: &Position) -> f64 {
        let (x, _, z) = self.local_vector(other);
        if x == 0.0 && z == 0.0 {
            return 0.0;
        }
        x.atan2(z).to_degrees()
    }

    /// Vertical (elevation) angle of `other` seen from this position, in
    /// degrees within [-90, 90]. Positive upward.
    pub fn vertical_angle_to(&self, other: &Position) -> f64 {
        let (x, y, z) = self.local_vector(other);
        let horizontal = x.hypot(z);
        if y == 0.0 && horizontal == 0.0 {
            return 0.0;
        }
        y.atan2(horizontal).to_degrees()
    }

    /// Copy moved by `distance` in the horizontal plane at `angle` degrees
    /// from +z toward +x.
    pub fn moved_horizontally(&self, distance: f64, angle: f64) -> Position {
        let (s, c) = angle.to_radians().sin_cos();
        Position {
            x: self.x + distance * s,
            z: self.z + distance * c,
            ..*self
        }
    }

    /// Copy moved by `distance` in the vertical plane at `angle` degrees from
    /// +z toward +y.
    pub fn moved_vertically(&self, distance: f64, angle: f64) -> Position {
        let (s, c) = angle.to_radians().sin_cos();
        Position {
            y: self.y + distance * s,
            z: self.z + distance * c,
            ..*self
        }
    }
}
