//! Small numeric helpers: interpolation, decibels, impedance combinators and
//! engineering-notation formatting.

use super::complex::{Complex, ComplexExt};
use super::{EPSILON, MIN_IMPEDANCE};

/// Linear interpolation of `y` at `x` between `(x0, y0)` and `(x1, y1)`.
pub fn interpolate(x0: f64, y0: f64, x1: f64, y1: f64, x: f64) -> f64 {
    if (x1 - x0).abs() < EPSILON {
        return y0;
    }
    y0 + (x - x0) * (y1 - y0) / (x1 - x0)
}

/// Interpolate a sampled curve at `xq`. Clamps to the boundary values
/// outside the sampled range; `xs` must be ascending.
pub fn interp_clamped(xs: &[f64], ys: &[f64], xq: f64) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    if xq <= xs[0] {
        return ys[0];
    }
    let last = xs.len() - 1;
    if xq >= xs[last] {
        return ys[last];
    }
    let idx = xs.partition_point(|&x| x < xq);
    if xs[idx] == xq {
        return ys[idx];
    }
    interpolate(xs[idx - 1], ys[idx - 1], xs[idx], ys[idx], xq)
}

/// Fraction of `x` between `lo` and `hi` on a logarithmic axis, clamped to [0, 1].
pub fn log_fraction(x: f64, lo: f64, hi: f64) -> f64 {
    if hi <= lo || lo <= 0.0 {
        return if x >= hi { 1.0 } else { 0.0 };
    }
    ((x.max(EPSILON) / lo).ln() / (hi / lo).ln()).clamp(0.0, 1.0)
}

/// Amplitude to decibels (20·log10), floored to avoid `-inf`.
pub fn to_db(amplitude: f64) -> f64 {
    20.0 * amplitude.abs().max(1e-30).log10()
}

/// Decibels to amplitude.
pub fn from_db(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// Power ratio to decibels (10·log10).
pub fn power_to_db(ratio: f64) -> f64 {
    10.0 * ratio.abs().max(1e-30).log10()
}

/// Two impedances in parallel.
pub fn parallel(a: Complex, b: Complex) -> Complex {
    let sum = a + b;
    if sum.norm() < MIN_IMPEDANCE {
        return Complex::real(0.0);
    }
    a * b / sum
}

/// Two impedances in series.
pub fn serial(a: Complex, b: Complex) -> Complex {
    a + b
}

/// Parallel combination of any number of impedances (admittance sum).
pub fn parallel_all<I>(impedances: I) -> Complex
where
    I: IntoIterator<Item = Complex>,
{
    let admittance: Complex = impedances.into_iter().map(|z| z.reciprocal()).sum();
    admittance.reciprocal()
}

/// Unnormalized sinc, `sin(x)/x` with the removable singularity filled in.
pub fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-8 {
        1.0
    } else {
        x.sin() / x
    }
}

/// Wrap an angle in degrees into (-180, 180].
pub fn wrap_degrees(angle: f64) -> f64 {
    let mut a = angle % 360.0;
    if a <= -180.0 {
        a += 360.0;
    } else if a > 180.0 {
        a -= 360.0;
    }
    a
}

/// Format a value with an engineering prefix, e.g. `4.7µF`.
pub fn format_si(value: f64, unit: &str) -> String {
    const PREFIXES: [(f64, &str); 8] = [
        (1e9, "G"),
        (1e6, "M"),
        (1e3, "k"),
        (1.0, ""),
        (1e-3, "m"),
        (1e-6, "µ"),
        (1e-9, "n"),
        (1e-12, "p"),
    ];
    if value == 0.0 || !value.is_finite() {
        return format!("{}{}", value, unit);
    }
    let magnitude = value.abs();
    let (scale, prefix) = PREFIXES
        .iter()
        .copied()
        .find(|(scale, _)| magnitude >= *scale)
        .unwrap_or((1e-12, "p"));
    format!("{}{}{}", format_significant(value / scale, 3), prefix, unit)
}

/// Format a number with a fixed count of significant digits, trimming zeros.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{}", value);
    }
    let order = value.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - order).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    #[test]
    fn test_interp_clamped() {
        let x = [1.0, 2.0, 3.0];
        let y = [10.0, 20.0, 30.0];
        assert_relative_eq!(interp_clamped(&x, &y, 2.0), 20.0);
        assert_relative_eq!(interp_clamped(&x, &y, 1.5), 15.0);
        assert_relative_eq!(interp_clamped(&x, &y, 0.0), 10.0);
        assert_relative_eq!(interp_clamped(&x, &y, 5.0), 30.0);
    }

    #[test]
    fn test_db_conversions() {
        assert_relative_eq!(to_db(1.0), 0.0);
        assert_relative_eq!(from_db(-6.0206), 0.5, epsilon = 1e-4);
        assert_relative_eq!(power_to_db(2.0), 3.0103, epsilon = 1e-4);
    }

    #[test]
    fn test_parallel_of_equal_resistors() {
        let z = parallel(Complex::real(8.0), Complex::real(8.0));
        assert_relative_eq!(z.re, 4.0, epsilon = 1e-12);
        let all = parallel_all([Complex::real(6.0), Complex::real(3.0), Complex::real(2.0)]);
        assert_relative_eq!(all.re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_log_fraction() {
        assert_abs_diff_eq!(log_fraction(100.0, 10.0, 1000.0), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(log_fraction(1.0, 10.0, 1000.0), 0.0);
        assert_abs_diff_eq!(log_fraction(1e4, 10.0, 1000.0), 1.0);
    }

    #[test]
    fn test_wrap_degrees() {
        assert_relative_eq!(wrap_degrees(190.0), -170.0);
        assert_relative_eq!(wrap_degrees(-540.0), 180.0);
    }

    #[test]
    fn test_format_si() {
        assert_eq!(format_si(4.7e-6, "F"), "4.7µF");
        assert_eq!(format_si(2200.0, "Ω"), "2.2kΩ");
        assert_eq!(format_si(0.56e-3, "H"), "560µH");
    }
}
