//! Frequency grids for sweeps.

use serde::{Deserialize, Serialize};

/// Spacing of a frequency sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SweepScale {
    /// Linear frequency spacing.
    Linear,
    /// Logarithmic spacing.
    #[default]
    Log,
}

/// `points` frequencies from `f_min` to `f_max` inclusive.
pub fn frequencies(f_min: f64, f_max: f64, points: usize, scale: SweepScale) -> Vec<f64> {
    match scale {
        SweepScale::Linear => lin_space(f_min, f_max, points),
        SweepScale::Log => log_space(f_min, f_max, points),
    }
}

/// Linearly spaced frequencies.
pub fn lin_space(f_min: f64, f_max: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![f_min];
    }
    let step = (f_max - f_min) / (points as f64 - 1.0);
    (0..points).map(|i| f_min + step * i as f64).collect()
}

/// Logarithmically spaced frequencies. `f_min` must be positive.
pub fn log_space(f_min: f64, f_max: f64, points: usize) -> Vec<f64> {
    if points <= 1 {
        return vec![f_min];
    }
    let ratio = (f_max / f_min).ln() / (points as f64 - 1.0);
    (0..points)
        .map(|i| f_min * (ratio * i as f64).exp())
        .collect()
}

/// Logarithmic grid with a fixed count of points per octave.
pub fn per_octave(f_min: f64, f_max: f64, points_per_octave: usize) -> Vec<f64> {
    let n = points_per_octave.max(1) as f64;
    let octaves = (f_max / f_min).log2();
    let total = (n * octaves).ceil() as usize + 1;
    (0..total)
        .map(|i| f_min * 2f64.powf(i as f64 / n))
        .filter(|&f| f <= f_max * 1.001)
        .collect()
}

/// Fractional-octave smoothing of levels in dB.
///
/// Each output value is the power average of the inputs within
/// `±1/(2·fraction)` octave of its frequency. `fraction <= 0` returns the
/// levels unchanged.
pub fn smooth_octave(frequencies: &[f64], levels_db: &[f64], fraction: f64) -> Vec<f64> {
    if fraction <= 0.0 || frequencies.len() != levels_db.len() {
        return levels_db.to_vec();
    }
    let half_band = 2f64.powf(0.5 / fraction);
    frequencies
        .iter()
        .zip(levels_db)
        .map(|(&f, &own)| {
            let (lo, hi) = (f / half_band, f * half_band);
            let (sum, count) = frequencies
                .iter()
                .zip(levels_db)
                .filter(|(&g, _)| g >= lo && g <= hi)
                .fold((0.0, 0usize), |(sum, count), (_, &db)| (sum + 10f64.powf(db / 10.0), count + 1));
            if count == 0 {
                own
            } else {
                10.0 * (sum / count as f64).max(1e-30).log10()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_space_endpoints() {
        let f = log_space(20.0, 20_000.0, 301);
        assert_eq!(f.len(), 301);
        assert_relative_eq!(f[0], 20.0);
        assert_relative_eq!(f[300], 20_000.0, epsilon = 1e-9);
        assert_relative_eq!(f[150], 632.455532, epsilon = 1e-5);
    }

    #[test]
    fn test_lin_space_and_octaves() {
        assert_eq!(lin_space(0.0, 10.0, 11)[3], 3.0);
        let f = per_octave(100.0, 800.0, 1);
        assert_eq!(f.len(), 4);
        assert_eq!(frequencies(10.0, 10.0, 1, SweepScale::Log), vec![10.0]);
    }

    #[test]
    fn test_smoothing() {
        let f = per_octave(100.0, 1600.0, 1);
        let flat = vec![3.0; f.len()];
        for v in smooth_octave(&f, &flat, 3.0) {
            assert_relative_eq!(v, 3.0, epsilon = 1e-9);
        }
        // 2.5 octave bands reach the direct neighbours only
        let spike = vec![0.0, 0.0, 10.0, 0.0, 0.0];
        let smoothed = smooth_octave(&f, &spike, 0.4);
        assert!(smoothed[2] < 10.0 && smoothed[1] > 0.0);
        assert_relative_eq!(smoothed[0], 0.0, epsilon = 1e-9);
        assert_eq!(smooth_octave(&f, &spike, 0.0), spike);
    }
}
