//! Minimum-phase reconstruction from amplitude data (Bode's gain-phase
//! relation).
//!
//! With `u = ln(f/f0)` and the amplitude `A(u)` in nepers, the minimum phase
//! at `f0` is
//!
//! ```text
//! φ(f0) = 1/π · ∫ dA/du · ln coth(|u|/2) du
//! ```
//!
//! Between two samples the amplitude is linear in `u`, so each segment
//! contributes `slope · (W(u1) − W(u0))` with `W(u) = ∫0^u ln coth(|t|/2) dt`.
//! `W` is odd, saturates at `π²/4` and is tabulated once on first use.
//! Outside the sampled band the amplitude is treated as flat.

use std::f64::consts::PI;
use std::sync::OnceLock;

use super::fnc::interp_clamped;

/// Table step on the `u` axis.
const STEP: f64 = 1e-3;

/// Table upper end; beyond it `W(u) = π²/4 − 2·e^(−u)` to within 1e-9.
const U_MAX: f64 = 16.0;

const NEPER_PER_DB: f64 = std::f64::consts::LN_10 / 20.0;

/// Smooth part of the kernel integral, sampled at `k·STEP`.
///
/// `ln coth(t/2) = ln(2/t) + ln((t/2)/tanh(t/2))`. The first term integrates in
/// closed form, the second is smooth and vanishes at 0.
struct KernelTable {
    smooth: Vec<f64>,
}

impl KernelTable {
    fn build() -> Self {
        let n = (U_MAX / STEP).round() as usize;
        let mut smooth = Vec::with_capacity(n + 1);
        smooth.push(0.0);
        let mut acc = 0.0;
        for k in 0..n {
            // Midpoint rule on the smooth integrand
            let t = (k as f64 + 0.5) * STEP;
            let half = 0.5 * t;
            acc += (half / half.tanh()).ln() * STEP;
            smooth.push(acc);
        }
        Self { smooth }
    }

    fn smooth_at(&self, u: f64) -> f64 {
        let pos = u / STEP;
        let idx = pos.floor() as usize;
        if idx + 1 >= self.smooth.len() {
            return self.smooth[self.smooth.len() - 1];
        }
        let frac = pos - idx as f64;
        self.smooth[idx] + frac * (self.smooth[idx + 1] - self.smooth[idx])
    }
}

fn table() -> &'static KernelTable {
    static TABLE: OnceLock<KernelTable> = OnceLock::new();
    TABLE.get_or_init(KernelTable::build)
}

/// Kernel integral `W(u) = ∫0^u ln coth(|t|/2) dt`.
pub fn kernel_integral(u: f64) -> f64 {
    let a = u.abs();
    let w = if a < 1e-12 {
        0.0
    } else if a >= U_MAX {
        PI * PI / 4.0 - 2.0 * (-a).exp()
    } else {
        a * ((2.0 / a).ln() + 1.0) + table().smooth_at(a)
    };
    w.copysign(u)
}

/// Minimum phase in degrees for an amplitude curve given in dB.
///
/// `freqs` must be strictly increasing and positive. Returns one phase value
/// per sample.
pub fn min_phase(freqs: &[f64], amps_db: &[f64]) -> Vec<f64> {
    let n = freqs.len().min(amps_db.len());
    if n < 2 {
        return vec![0.0; n];
    }
    let log_f: Vec<f64> = freqs[..n].iter().map(|f| f.ln()).collect();
    let slopes: Vec<f64> = (0..n - 1)
        .map(|i| {
            let du = log_f[i + 1] - log_f[i];
            if du <= 0.0 {
                0.0
            } else {
                (amps_db[i + 1] - amps_db[i]) * NEPER_PER_DB / du
            }
        })
        .collect();

    (0..n)
        .map(|i| {
            let origin = log_f[i];
            let mut phase = 0.0;
            let mut w0 = kernel_integral(log_f[0] - origin);
            for (j, slope) in slopes.iter().enumerate() {
                let w1 = kernel_integral(log_f[j + 1] - origin);
                phase += slope * (w1 - w0);
                w0 = w1;
            }
            (phase / PI).to_degrees()
        })
        .collect()
}

/// Minimum phase at an arbitrary frequency of an amplitude curve.
pub fn min_phase_at(freqs: &[f64], amps_db: &[f64], f: f64) -> f64 {
    let phases = min_phase(freqs, amps_db);
    interp_clamped(freqs, &phases, f)
}

/// Phase in degrees implied by a constant amplitude slope in dB/octave
/// (6 dB/octave is 90°).
pub fn slope_to_phase(db_per_octave: f64) -> f64 {
    db_per_octave / (20.0 * 2f64.log10()) * 90.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn log_grid(f_min: f64, f_max: f64, n: usize) -> Vec<f64> {
        let ratio = (f_max / f_min).ln() / (n - 1) as f64;
        (0..n).map(|i| f_min * (ratio * i as f64).exp()).collect()
    }

    #[test]
    fn test_kernel_integral_is_odd_and_saturates() {
        assert_abs_diff_eq!(kernel_integral(0.0), 0.0);
        assert_abs_diff_eq!(kernel_integral(-2.0), -kernel_integral(2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(kernel_integral(40.0), PI * PI / 4.0, epsilon = 1e-9);
        // Continuity across the table boundary
        let below = kernel_integral(U_MAX - 1e-6);
        let above = kernel_integral(U_MAX + 1e-6);
        assert_abs_diff_eq!(below, above, epsilon = 1e-5);
    }

    #[test]
    fn test_rising_slope_gives_ninety_degrees() {
        // |H| = f/1kHz over six decades: a first-order differentiator
        let freqs = log_grid(1.0, 1e6, 600);
        let amps: Vec<f64> = freqs.iter().map(|f| 20.0 * (f / 1e3).log10()).collect();
        let phase = min_phase(&freqs, &amps);
        assert_abs_diff_eq!(phase[300], 90.0, epsilon = 0.5);
    }

    #[test]
    fn test_flat_amplitude_has_zero_phase() {
        let freqs = log_grid(10.0, 20_000.0, 100);
        let amps = vec![85.0; freqs.len()];
        for p in min_phase(&freqs, &amps) {
            assert_abs_diff_eq!(p, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_first_order_lowpass_phase() {
        // 1/(1 + jf/fc) has -45° at fc
        let fc = 1000.0;
        let freqs = log_grid(1.0, 1e6, 800);
        let amps: Vec<f64> = freqs
            .iter()
            .map(|f| -10.0 * (1.0 + (f / fc).powi(2)).log10())
            .collect();
        assert_abs_diff_eq!(min_phase_at(&freqs, &amps, fc), -45.0, epsilon = 1.0);
    }

    #[test]
    fn test_slope_to_phase() {
        assert_abs_diff_eq!(slope_to_phase(6.0206), 90.0, epsilon = 1e-3);
        assert_abs_diff_eq!(slope_to_phase(-12.0412), -180.0, epsilon = 1e-3);
    }
}
