//! Real polynomials in ascending-power form, used for filter denominators.

use super::complex::Complex;

/// Polynomial `c0 + c1·s + c2·s² + …`.
#[derive(Debug, Clone, PartialEq)]
pub struct Poly {
    coeffs: Vec<f64>,
}

impl Poly {
    /// Build from ascending coefficients.
    pub fn new(coeffs: Vec<f64>) -> Self {
        Self { coeffs }
    }

    /// The constant polynomial 1.
    pub fn one() -> Self {
        Self { coeffs: vec![1.0] }
    }

    /// Product of `1 + a·s + b·s²` sections. `b = 0` gives a first-order
    /// section.
    pub fn from_sections(sections: &[(f64, f64)]) -> Self {
        sections.iter().fold(Self::one(), |acc, &(a, b)| {
            let section = if b == 0.0 {
                Self::new(vec![1.0, a])
            } else {
                Self::new(vec![1.0, a, b])
            };
            acc.mul(&section)
        })
    }

    /// Polynomial product.
    pub fn mul(&self, other: &Poly) -> Poly {
        let mut out = vec![0.0; self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Poly::new(out)
    }

    /// Square of the polynomial.
    pub fn squared(&self) -> Poly {
        self.mul(self)
    }

    /// Degree (index of the highest stored coefficient).
    pub fn degree(&self) -> usize {
        self.coeffs.len().saturating_sub(1)
    }

    /// Coefficient of `s^k`, zero beyond the degree.
    pub fn coeff(&self, k: usize) -> f64 {
        self.coeffs.get(k).copied().unwrap_or(0.0)
    }

    /// Ascending coefficients.
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Evaluate at a complex point (Horner).
    pub fn eval(&self, s: Complex) -> Complex {
        self.coeffs
            .iter()
            .rev()
            .fold(Complex::new(0.0, 0.0), |acc, &c| acc * s + c)
    }
}
