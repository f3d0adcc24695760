//! Baffle rectangle and the driver's location on it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeakerSimError};

/// Number of discretized edge points around the driver.
pub const EDGE_POINTS: usize = 36;

/// Minimum driver-to-edge distance (m).
const MIN_EDGE_DISTANCE: f64 = 0.001;

/// Baffle dimensions and driver position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baffle {
    /// Baffle width in meters (horizontal)
    pub width: f64,
    /// Baffle height in meters (vertical)
    pub height: f64,
    /// Distance from the left edge to the driver center (m)
    pub driver_x: f64,
    /// Distance from the top edge to the driver center (m)
    pub driver_y: f64,
    /// Radius of the rounded edges (m), 0 for sharp edges
    #[serde(default)]
    pub edge_radius: f64,
}

impl Default for Baffle {
    fn default() -> Self {
        Self {
            width: 0.25,
            height: 0.40,
            driver_x: 0.125,
            driver_y: 0.15,
            edge_radius: 0.0,
        }
    }
}

/// A point on the baffle edge, relative to the driver center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgePoint {
    /// Horizontal offset (m), positive to the right
    pub dx: f64,
    /// Vertical offset (m), positive upward
    pub dy: f64,
    /// Distance from the driver center (m)
    pub distance: f64,
}

impl Baffle {
    /// Check dimensions and driver placement.
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(SpeakerSimError::invalid_parameter(
                "baffle",
                "width/height",
                "baffle dimensions must be positive",
            ));
        }
        if self.driver_x < MIN_EDGE_DISTANCE || self.driver_x > self.width - MIN_EDGE_DISTANCE {
            return Err(SpeakerSimError::invalid_parameter(
                "baffle",
                "driver_x",
                format!(
                    "must be between {:.3} and {:.3} m",
                    MIN_EDGE_DISTANCE,
                    self.width - MIN_EDGE_DISTANCE
                ),
            ));
        }
        if self.driver_y < MIN_EDGE_DISTANCE || self.driver_y > self.height - MIN_EDGE_DISTANCE {
            return Err(SpeakerSimError::invalid_parameter(
                "baffle",
                "driver_y",
                format!(
                    "must be between {:.3} and {:.3} m",
                    MIN_EDGE_DISTANCE,
                    self.height - MIN_EDGE_DISTANCE
                ),
            ));
        }
        if self.edge_radius < 0.0 {
            return Err(SpeakerSimError::invalid_parameter(
                "baffle",
                "edge_radius",
                "must not be negative",
            ));
        }
        Ok(())
    }

    /// Edge points hit by rays from the driver at 10° steps, starting to the
    /// right and turning counter-clockwise.
    pub fn edge_points(&self) -> Vec<EdgePoint> {
        // Driver in baffle coordinates with the origin at the lower left corner
        let sx = self.driver_x;
        let sy = self.height - self.driver_y;
        (0..EDGE_POINTS)
            .map(|k| {
                let angle = (k as f64 * 360.0 / EDGE_POINTS as f64).to_radians();
                let (s, c) = angle.sin_cos();
                let tx = if c > 1e-12 {
                    (self.width - sx) / c
                } else if c < -1e-12 {
                    -sx / c
                } else {
                    f64::INFINITY
                };
                let ty = if s > 1e-12 {
                    (self.height - sy) / s
                } else if s < -1e-12 {
                    -sy / s
                } else {
                    f64::INFINITY
                };
                let t = tx.min(ty);
                EdgePoint {
                    dx: t * c,
                    dy: t * s,
                    distance: t,
                }
            })
            .collect()
    }

    /// Mean distance from the driver to the edge.
    pub fn mean_edge_distance(&self) -> f64 {
        let points = self.edge_points();
        points.iter().map(|p| p.distance).sum::<f64>() / points.len() as f64
    }

    /// Distances to the left, right, top and bottom edges.
    pub fn edge_distances(&self) -> [f64; 4] {
        [
            self.driver_x,
            self.width - self.driver_x,
            self.driver_y,
            self.height - self.driver_y,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_edge_points_on_square_baffle() {
        let baffle = Baffle {
            width: 0.4,
            height: 0.4,
            driver_x: 0.2,
            driver_y: 0.2,
            edge_radius: 0.0,
        };
        let points = baffle.edge_points();
        assert_eq!(points.len(), EDGE_POINTS);
        assert_abs_diff_eq!(points[0].distance, 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(points[9].dy, 0.2, epsilon = 1e-12);
        // Corner direction
        assert_abs_diff_eq!(points[5].distance, 0.2 / 50f64.to_radians().sin(), epsilon = 1e-12);
        for p in &points {
            assert!(p.distance >= 0.2 - 1e-12);
            assert!(p.distance <= 0.2 * std::f64::consts::SQRT_2 + 1e-12);
        }
    }

    #[test]
    fn test_validate_rejects_driver_off_baffle() {
        let baffle = Baffle {
            driver_x: 0.3,
            ..Baffle::default()
        };
        assert!(baffle.validate().is_err());
        assert!(Baffle::default().validate().is_ok());
    }
}
