//! Bessel function approximations and the rigid piston functions built on
//! them.
//!
//! J0 and J1 use the classic rational/asymptotic fits (Abramowitz & Stegun
//! 9.4), accurate to about 1e-8 which is far below anything audible. Struve
//! H1 uses the Aarts-Janssen approximation.

use std::f64::consts::PI;

/// Bessel function of the first kind, order 0.
pub fn bessel_j0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = 57568490574.0
            + y * (-13362590354.0
                + y * (651619640.7 + y * (-11214424.18 + y * (77392.33017 + y * (-184.9052456)))));
        let den = 57568490411.0
            + y * (1029532985.0 + y * (9494680.718 + y * (59272.64853 + y * (267.8532712 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 0.785398164;
        let p = 1.0
            + y * (-0.1098628627e-2
                + y * (0.2734510407e-4 + y * (-0.2073370639e-5 + y * 0.2093887211e-6)));
        let q = -0.1562499995e-1
            + y * (0.1430488765e-3
                + y * (-0.6911147651e-5 + y * (0.7621095161e-6 - y * 0.934935152e-7)));
        (0.636619772 / ax).sqrt() * (xx.cos() * p - z * xx.sin() * q)
    }
}

/// Bessel function of the first kind, order 1.
pub fn bessel_j1(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 8.0 {
        let y = x * x;
        let num = x
            * (72362614232.0
                + y * (-7895059235.0
                    + y * (242396853.1 + y * (-2972611.439 + y * (15704.48260 + y * (-30.16036606))))));
        let den = 144725228442.0
            + y * (2300535178.0 + y * (18583304.74 + y * (99447.43394 + y * (376.9991397 + y))));
        num / den
    } else {
        let z = 8.0 / ax;
        let y = z * z;
        let xx = ax - 2.356194491;
        let p = 1.0
            + y * (0.183105e-2
                + y * (-0.3516396496e-4 + y * (0.2457520174e-5 + y * (-0.240337019e-6))));
        let q = 0.04687499995
            + y * (-0.2002690873e-3
                + y * (0.8449199096e-5 + y * (-0.88228987e-6 + y * 0.105787412e-6)));
        let ans = (0.636619772 / ax).sqrt() * (xx.cos() * p - z * xx.sin() * q);
        if x < 0.0 {
            -ans
        } else {
            ans
        }
    }
}

/// Struve function H1 (Aarts & Janssen, 2003).
pub fn struve_h1(x: f64) -> f64 {
    if x.abs() < 1e-6 {
        // H1(x) ~ 2x²/(3π)
        return 2.0 * x * x / (3.0 * PI);
    }
    2.0 / PI - bessel_j0(x)
        + (16.0 / PI - 5.0) * x.sin() / x
        + (12.0 - 36.0 / PI) * (1.0 - x.cos()) / (x * x)
}

/// Far-field directivity of a rigid circular piston, `|2·J1(x)/x|`.
///
/// `x = k·a·sin θ`. The x → 0 limit is 1.
pub fn piston_directivity(x: f64) -> f64 {
    if x.abs() < 1e-6 {
        return 1.0;
    }
    (2.0 * bessel_j1(x) / x).abs()
}

/// Normalized radiation impedance of a baffled circular piston,
/// `(R1(2ka), X1(2ka))`. Multiply by `ρc/S` for the acoustic impedance.
pub fn piston_radiation(ka: f64) -> (f64, f64) {
    let x = 2.0 * ka;
    if x.abs() < 1e-6 {
        return (0.0, 0.0);
    }
    let resistance = 1.0 - 2.0 * bessel_j1(x) / x;
    let reactance = 2.0 * struve_h1(x) / x;
    (resistance, reactance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_known_values() {
        assert_abs_diff_eq!(bessel_j0(0.0), 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(bessel_j0(2.404825557695773), 0.0, epsilon = 1e-7);
        assert_abs_diff_eq!(bessel_j1(1.0), 0.4400505857, epsilon = 1e-7);
        assert_abs_diff_eq!(bessel_j1(10.0), 0.0434727462, epsilon = 1e-6);
        assert_abs_diff_eq!(bessel_j1(-1.0), -0.4400505857, epsilon = 1e-7);
    }

    #[test]
    fn test_piston_directivity_limit() {
        assert_abs_diff_eq!(piston_directivity(0.0), 1.0);
        assert_abs_diff_eq!(piston_directivity(1e-9), 1.0);
        assert!(piston_directivity(3.0) < 0.5);
        // First null of J1
        assert_abs_diff_eq!(piston_directivity(3.8317), 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_radiation_impedance_limits() {
        // Low ka: R1 ~ (ka)²/2, high ka: R1 -> 1
        let (r, x) = piston_radiation(0.05);
        assert_abs_diff_eq!(r, 0.05f64.powi(2) / 2.0, epsilon = 1e-5);
        assert!(x > 0.0);
        let (r, _) = piston_radiation(20.0);
        assert_abs_diff_eq!(r, 1.0, epsilon = 0.05);
    }

    #[test]
    fn test_struve_h1() {
        assert_abs_diff_eq!(struve_h1(1.0), 0.1984573, epsilon = 5e-3);
        assert_abs_diff_eq!(struve_h1(5.0), 0.8078119, epsilon = 5e-3);
    }
}
