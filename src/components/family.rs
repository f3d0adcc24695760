//! Filter families and their normalized denominators.
//!
//! Each table lists, per order, the sections `(a, b)` of `1 + a·s + b·s²`
//! whose product is the normalized low-pass denominator. `b = 0` marks a
//! first-order section.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeakerSimError};
use crate::math::poly::Poly;

/// Highest order of the tabulated families.
pub const MAX_ORDER: usize = 8;

type Table = [&'static [(f64, f64)]; MAX_ORDER];

const BUTTERWORTH: Table = [
    &[(1.0, 0.0)],
    &[(1.4142, 1.0)],
    &[(1.0, 0.0), (1.0, 1.0)],
    &[(1.8478, 1.0), (0.7654, 1.0)],
    &[(1.0, 0.0), (1.6180, 1.0), (0.6180, 1.0)],
    &[(1.9319, 1.0), (1.4142, 1.0), (0.5176, 1.0)],
    &[(1.0, 0.0), (1.8019, 1.0), (1.2470, 1.0), (0.4450, 1.0)],
    &[(1.9616, 1.0), (1.6629, 1.0), (1.1111, 1.0), (0.3902, 1.0)],
];

const BESSEL: Table = [
    &[(1.0, 0.0)],
    &[(1.3617, 0.6180)],
    &[(0.7560, 0.0), (0.9996, 0.4772)],
    &[(1.3397, 0.4889), (0.7743, 0.3890)],
    &[(0.6656, 0.0), (1.1402, 0.4128), (0.6216, 0.3245)],
    &[(1.2217, 0.3887), (0.9686, 0.3505), (0.5131, 0.2756)],
    &[(0.5937, 0.0), (1.0944, 0.3395), (0.8304, 0.3011), (0.4332, 0.2381)],
    &[(1.1112, 0.3162), (0.9754, 0.2979), (0.7202, 0.2621), (0.3728, 0.2087)],
];

/// 0.5 dB ripple
const CHEBYCHEV: Table = [
    &[(1.0, 0.0)],
    &[(1.3067, 1.2738)],
    &[(1.8636, 0.0), (0.6402, 1.1931)],
    &[(2.5967, 3.3525), (0.3605, 1.1235)],
    &[(2.9235, 0.0), (1.3025, 2.3534), (0.2290, 1.0833)],
    &[(3.8432, 6.9029), (0.7486, 1.8368), (0.1580, 1.0594)],
    &[(4.0211, 0.0), (1.8729, 4.1795), (0.4861, 1.5676), (0.1156, 1.0443)],
    &[(5.0956, 11.8856), (1.0606, 2.9180), (0.3428, 1.4117), (0.0882, 1.0342)],
];

const LEGENDRE: Table = [
    &[(1.0, 0.0)],
    &[(1.4142, 1.0)],
    &[(1.6120, 0.0), (0.7418, 1.0744)],
    &[(2.5522, 2.3213), (0.4890, 1.0552)],
    &[(2.1363, 0.0), (1.5615, 2.0115), (0.3197, 1.0407)],
    &[(3.5080, 3.9964), (1.0601, 1.7156), (0.2376, 1.0314)],
    &[(2.6171, 0.0), (2.2826, 3.2680), (0.7172, 1.5103), (0.1766, 1.0242)],
    &[(4.3833, 5.9689), (1.5685, 2.6117), (0.5412, 1.3928), (0.1406, 1.0195)],
];

const GAUSSIAN: Table = [
    &[(1.0, 0.0)],
    &[(1.3294, 0.5176)],
    &[(0.6617, 0.0), (0.9909, 0.3605)],
    &[(1.1612, 0.3568), (0.7810, 0.2754)],
    &[(0.5638, 0.0), (0.9977, 0.2932), (0.6388, 0.2209)],
    &[(1.0366, 0.2766), (0.8600, 0.2450), (0.5372, 0.1832)],
    &[(0.5012, 0.0), (0.9367, 0.2403), (0.7484, 0.2083), (0.4615, 0.1557)],
    &[(0.9415, 0.2256), (0.8435, 0.2101), (0.6583, 0.1799), (0.4033, 0.1348)],
];

const LINEAR_PHASE: Table = [
    &[(1.0, 0.0)],
    &[(1.7321, 1.0)],
    &[(1.0620, 0.0), (1.4042, 0.9416)],
    &[(2.0286, 1.1211), (1.1724, 0.8920)],
    &[(1.0794, 0.0), (1.8489, 1.0856), (1.0080, 0.8534)],
    &[(2.1112, 1.1608), (1.6738, 1.0466), (0.8866, 0.8231)],
    &[(1.0876, 0.0), (2.0049, 1.1391), (1.5211, 1.0104), (0.7936, 0.7989)],
    &[(2.1468, 1.1800), (1.8843, 1.1119), (1.3914, 0.9783), (0.7201, 0.7791)],
];

/// Filter response family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterFamily {
    #[default]
    Butterworth,
    Bessel,
    /// Squared Butterworth of half the order (even orders)
    LinkwitzRiley,
    Chebychev,
    Legendre,
    Gaussian,
    LinearPhase,
    /// User-supplied values
    Custom,
}

impl FilterFamily {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "butterworth" | "bw" => Some(Self::Butterworth),
            "bessel" => Some(Self::Bessel),
            "linkwitz_riley" | "linkwitzriley" | "lr" => Some(Self::LinkwitzRiley),
            "chebychev" | "chebyshev" => Some(Self::Chebychev),
            "legendre" => Some(Self::Legendre),
            "gaussian" => Some(Self::Gaussian),
            "linear_phase" | "linearphase" => Some(Self::LinearPhase),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FilterFamily::Butterworth => "butterworth",
            FilterFamily::Bessel => "bessel",
            FilterFamily::LinkwitzRiley => "linkwitz_riley",
            FilterFamily::Chebychev => "chebychev",
            FilterFamily::Legendre => "legendre",
            FilterFamily::Gaussian => "gaussian",
            FilterFamily::LinearPhase => "linear_phase",
            FilterFamily::Custom => "custom",
        }
    }

    fn table(&self) -> Option<&'static Table> {
        match self {
            FilterFamily::Butterworth => Some(&BUTTERWORTH),
            FilterFamily::Bessel => Some(&BESSEL),
            FilterFamily::Chebychev => Some(&CHEBYCHEV),
            FilterFamily::Legendre => Some(&LEGENDRE),
            FilterFamily::Gaussian => Some(&GAUSSIAN),
            FilterFamily::LinearPhase => Some(&LINEAR_PHASE),
            FilterFamily::LinkwitzRiley | FilterFamily::Custom => None,
        }
    }

    /// Normalized low-pass denominator of `order`.
    pub fn denominator(&self, order: usize) -> Result<Poly> {
        if order == 0 || order > MAX_ORDER {
            return Err(SpeakerSimError::invalid_parameter(
                self.name(),
                "order",
                format!("order {} outside 1..={}", order, MAX_ORDER),
            ));
        }
        match self {
            FilterFamily::LinkwitzRiley => {
                if order % 2 != 0 {
                    return Err(SpeakerSimError::invalid_parameter(
                        self.name(),
                        "order",
                        "Linkwitz-Riley needs an even order",
                    ));
                }
                Ok(Poly::from_sections(BUTTERWORTH[order / 2 - 1]).squared())
            }
            FilterFamily::Custom => Err(SpeakerSimError::Unsupported {
                operation: "tabulated denominator",
                kind: "custom filter".to_string(),
            }),
            family => {
                let table = family.table().ok_or_else(|| SpeakerSimError::Unsupported {
                    operation: "tabulated denominator",
                    kind: family.name().to_string(),
                })?;
                Ok(Poly::from_sections(table[order - 1]))
            }
        }
    }
}

/// Which side of the crossover frequency a filter passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    HighPass,
    LowPass,
}

impl PassKind {
    pub fn passive_tag(&self) -> &'static str {
        match self {
            PassKind::HighPass => "highpass",
            PassKind::LowPass => "lowpass",
        }
    }

    pub fn active_tag(&self) -> &'static str {
        match self {
            PassKind::HighPass => "active_highpass",
            PassKind::LowPass => "active_lowpass",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_butterworth_fourth_order() {
        let d = FilterFamily::Butterworth.denominator(4).unwrap();
        assert_eq!(d.degree(), 4);
        assert_abs_diff_eq!(d.coeff(1), 2.6131, epsilon = 1e-3);
        assert_abs_diff_eq!(d.coeff(2), 3.4142, epsilon = 1e-3);
        assert_abs_diff_eq!(d.coeff(4), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_linkwitz_riley_is_squared_butterworth() {
        let lr = FilterFamily::LinkwitzRiley.denominator(4).unwrap();
        let bw = Poly::from_sections(&[(1.4142, 1.0)]).squared();
        assert_eq!(lr, bw);
        assert!(FilterFamily::LinkwitzRiley.denominator(3).is_err());
    }

    #[test]
    fn test_every_table_has_matching_degree() {
        let families = [
            FilterFamily::Butterworth,
            FilterFamily::Bessel,
            FilterFamily::Chebychev,
            FilterFamily::Legendre,
            FilterFamily::Gaussian,
            FilterFamily::LinearPhase,
        ];
        for family in families {
            for order in 1..=MAX_ORDER {
                assert_eq!(family.denominator(order).unwrap().degree(), order, "{:?} {}", family, order);
            }
            assert!(family.denominator(9).is_err());
            assert!(family.denominator(0).is_err());
        }
    }

    #[test]
    fn test_family_names() {
        assert_eq!(FilterFamily::from_name("Linkwitz-Riley"), Some(FilterFamily::LinkwitzRiley));
        assert_eq!(FilterFamily::from_name("chebyshev"), Some(FilterFamily::Chebychev));
        assert!(FilterFamily::Custom.denominator(2).is_err());
    }
}
