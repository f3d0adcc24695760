//! Angular sampling grids for power and listening-window averages.

use crate::geometry::Position;
use crate::math::{Complex, ComplexExt};

/// Angular step of the power-response circles (degrees).
const POWER_STEP: f64 = 10.0;

/// (horizontal, vertical) angles of the listening window.
pub const LISTENING_WINDOW: [(f64, f64); 9] = [
    (0.0, 0.0),
    (0.0, 10.0),
    (0.0, -10.0),
    (10.0, 0.0),
    (-10.0, 0.0),
    (20.0, 0.0),
    (-20.0, 0.0),
    (30.0, 0.0),
    (-30.0, 0.0),
];

/// Number of points of the power-response grid.
pub const POWER_POINTS: usize = 70;

/// Point at `distance` from `center` in the direction `(horizontal, vertical)`.
pub fn point_at(center: &Position, distance: f64, horizontal: f64, vertical: f64) -> Position {
    let (sh, ch) = horizontal.to_radians().sin_cos();
    let (sv, cv) = vertical.to_radians().sin_cos();
    Position::new(
        center.x + distance * cv * sh,
        center.y + distance * sv,
        center.z + distance * cv * ch,
    )
}

/// The nine listening-window points.
pub fn listening_window_points(center: &Position, distance: f64) -> Vec<Position> {
    LISTENING_WINDOW
        .iter()
        .map(|&(h, v)| point_at(center, distance, h, v))
        .collect()
}

/// A horizontal and a vertical circle at 10° steps sharing 0° and 180°.
pub fn power_points(center: &Position, distance: f64) -> Vec<Position> {
    let steps = (360.0 / POWER_STEP) as usize;
    let mut points = Vec::with_capacity(POWER_POINTS);
    for i in 0..steps {
        points.push(center.moved_horizontally(distance, i as f64 * POWER_STEP));
    }
    for i in 0..steps {
        let angle = i as f64 * POWER_STEP;
        if angle == 0.0 || angle == 180.0 {
            continue;
        }
        points.push(center.moved_vertically(distance, angle));
    }
    points
}

/// RMS magnitude of `samples`, carrying the phase of `reference`.
pub fn rms_average<I>(samples: I, reference: Complex) -> Complex
where
    I: IntoIterator<Item = Complex>,
{
    let (sum, count) = samples
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), z| (sum + z.norm_sqr(), n + 1));
    if count == 0 {
        return Complex::real(0.0);
    }
    let magnitude = (sum / count as f64).sqrt();
    Complex::from_polar(magnitude, reference.arg())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_grid_sizes() {
        let center = Position::new(0.0, 1.0, 0.0);
        assert_eq!(power_points(&center, 2.0).len(), POWER_POINTS);
        assert_eq!(listening_window_points(&center, 2.0).len(), 9);
        for p in power_points(&center, 2.0) {
            assert_abs_diff_eq!(center.distance(&p), 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_listening_window_directions() {
        let center = Position::default();
        let points = listening_window_points(&center, 3.0);
        assert_abs_diff_eq!(points[0].z, 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(center.horizontal_angle_to(&points[7]), 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(center.vertical_angle_to(&points[1]), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rms_average() {
        let z = rms_average(
            vec![Complex::real(3.0), Complex::new(0.0, 4.0)],
            Complex::new(0.0, -1.0),
        );
        assert_abs_diff_eq!(z.amplitude(), (12.5f64).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(z.phase_deg(), -90.0, epsilon = 1e-9);
    }
}
