//! Complex values.
//!
//! The arithmetic itself is `num_complex::Complex64`; this module adds the
//! polar conventions used throughout the simulator (phase in degrees,
//! amplitude in dB).

use num_complex::Complex64;

use super::MIN_IMPEDANCE;

/// Complex value type used for responses and impedances.
pub type Complex = Complex64;

/// Polar and convenience operations on [`Complex`].
pub trait ComplexExt: Sized {
    /// Build from amplitude and phase in degrees.
    fn from_polar_deg(amplitude: f64, phase_deg: f64) -> Self;
    /// Purely real value.
    fn real(re: f64) -> Self;
    /// Purely imaginary value.
    fn imag(im: f64) -> Self;
    /// Magnitude (`hypot(re, im)`).
    fn amplitude(&self) -> f64;
    /// Phase in degrees (`atan2(im, re)`).
    fn phase_deg(&self) -> f64;
    /// Amplitude in dB (20·log10).
    fn db(&self) -> f64;
    /// `1 / self`, with zero clamped to a tiny magnitude.
    fn reciprocal(&self) -> Self;
}

impl ComplexExt for Complex {
    fn from_polar_deg(amplitude: f64, phase_deg: f64) -> Self {
        Complex::from_polar(amplitude, phase_deg.to_radians())
    }

    fn real(re: f64) -> Self {
        Complex::new(re, 0.0)
    }

    fn imag(im: f64) -> Self {
        Complex::new(0.0, im)
    }

    fn amplitude(&self) -> f64 {
        self.re.hypot(self.im)
    }

    fn phase_deg(&self) -> f64 {
        self.im.atan2(self.re).to_degrees()
    }

    fn db(&self) -> f64 {
        super::fnc::to_db(self.amplitude())
    }

    fn reciprocal(&self) -> Self {
        if self.norm() < MIN_IMPEDANCE {
            return Complex::real(1.0 / MIN_IMPEDANCE);
        }
        self.inv()
    }
}

/// `j` (the imaginary unit).
pub const J: Complex = Complex::new(0.0, 1.0);
