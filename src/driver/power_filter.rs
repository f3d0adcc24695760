//! Power-handling shaping curves.
//!
//! A driver's rated power is specified with band-limited noise. The weight
//! `w(f) = |H(f)|²` of the standard's shaping filter scales the thermal limit
//! at each frequency.

use serde::{Deserialize, Serialize};

/// Corner of the IEC 268-5 shaping high-pass (Hz).
const IEC_268_5_CORNER: f64 = 100.0;

/// Power rating shaping standard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerFilter {
    /// Flat rating
    #[default]
    None,
    /// First-order high-pass at 100 Hz
    Iec268_5,
    /// Second-order Butterworth high-pass at the driver's Fs
    Aes2_1984,
}

impl PowerFilter {
    /// Parse a filter name as written in project files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().replace(['-', ' ', '.'], "_").as_str() {
            "none" | "flat" => Some(Self::None),
            "iec" | "iec268_5" | "iec_268_5" => Some(Self::Iec268_5),
            "aes" | "aes2" | "aes2_1984" => Some(Self::Aes2_1984),
            _ => None,
        }
    }

    /// Power weight `|H(f)|²` in 0..1.
    pub fn weight(&self, f: f64, fs: f64) -> f64 {
        match self {
            PowerFilter::None => 1.0,
            PowerFilter::Iec268_5 => {
                let r2 = (f / IEC_268_5_CORNER).powi(2);
                r2 / (1.0 + r2)
            }
            PowerFilter::Aes2_1984 => {
                let r4 = (f / fs).powi(4);
                r4 / (1.0 + r4)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_weights_at_corner() {
        assert_relative_eq!(PowerFilter::None.weight(10.0, 40.0), 1.0);
        assert_relative_eq!(PowerFilter::Iec268_5.weight(100.0, 40.0), 0.5);
        assert_relative_eq!(PowerFilter::Aes2_1984.weight(40.0, 40.0), 0.5);
        assert!(PowerFilter::Aes2_1984.weight(4000.0, 40.0) > 0.999);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(PowerFilter::from_name("IEC-268-5"), Some(PowerFilter::Iec268_5));
        assert_eq!(PowerFilter::from_name("aes2-1984"), Some(PowerFilter::Aes2_1984));
        assert_eq!(PowerFilter::from_name("pink"), None);
    }
}
