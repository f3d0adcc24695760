//! Vented-box alignment tables.
//!
//! Each table is indexed by Qts on a 0.01 grid and gives
//! `(α = Vas/Vb, h = Fb/Fs, F3/Fs)`. Values between grid points are
//! interpolated linearly.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SpeakerSimError};

/// Qts grid step of the tables.
const QTS_STEP: f64 = 0.01;

/// Tolerance on the table bounds.
const RANGE_TOLERANCE: f64 = 1e-9;

/// Range of the power-law fallback.
const FALLBACK_RANGE: (f64, f64) = (0.15, 0.80);

/// Named vented alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Pick the table covering the driver's Qts
    #[default]
    Auto,
    /// Quasi-Butterworth third order
    Qb3,
    /// Butterworth fourth order (Boombox family, h = 1)
    Bb4,
    /// Chebychev fourth order
    C4,
}

impl Alignment {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "qb3" => Some(Self::Qb3),
            "bb4" | "b4" => Some(Self::Bb4),
            "c4" => Some(Self::C4),
            _ => None,
        }
    }

    fn table(&self) -> Option<&'static AlignmentTable> {
        match self {
            Alignment::Auto => None,
            Alignment::Qb3 => Some(&QB3),
            Alignment::Bb4 => Some(&BB4),
            Alignment::C4 => Some(&C4),
        }
    }
}

/// Resolved alignment for one driver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentPoint {
    /// Table the values come from, `Auto` for the power-law fallback
    pub alignment: Alignment,
    /// Vas / Vb
    pub alpha: f64,
    /// Fb / Fs
    pub h: f64,
    /// F3 / Fs, unknown for the fallback
    pub f3_ratio: Option<f64>,
}

struct AlignmentTable {
    name: &'static str,
    qts_min: f64,
    rows: &'static [(f64, f64, f64)],
}

impl AlignmentTable {
    fn qts_max(&self) -> f64 {
        self.qts_min + (self.rows.len() - 1) as f64 * QTS_STEP
    }

    fn covers(&self, qts: f64) -> bool {
        qts >= self.qts_min - RANGE_TOLERANCE && qts <= self.qts_max() + RANGE_TOLERANCE
    }

    fn lookup(&self, alignment: Alignment, qts: f64) -> Result<AlignmentPoint> {
        if !self.covers(qts) {
            return Err(SpeakerSimError::alignment_out_of_range(
                self.name,
                qts,
                self.qts_min,
                self.qts_max(),
            ));
        }
        let position = ((qts - self.qts_min) / QTS_STEP).max(0.0);
        let lo = (position.floor() as usize).min(self.rows.len() - 1);
        let hi = (lo + 1).min(self.rows.len() - 1);
        let t = (position - lo as f64).clamp(0.0, 1.0);
        let (a0, h0, f0) = self.rows[lo];
        let (a1, h1, f1) = self.rows[hi];
        Ok(AlignmentPoint {
            alignment,
            alpha: a0 + t * (a1 - a0),
            h: h0 + t * (h1 - h0),
            f3_ratio: Some(f0 + t * (f1 - f0)),
        })
    }
}

/// Resolve alignment constants for a driver with total Q `qts`.
///
/// `Auto` uses QB3 up to 0.38, BB4 between 0.38 and 0.41 and C4 from 0.41
/// to 0.69. Outside those tables the power law `Vb = 15·Qts^2.87·Vas`,
/// `Fb = 0.42·Fs·Qts^−0.9` applies within 0.15..0.80.
pub fn resolve(alignment: Alignment, qts: f64) -> Result<AlignmentPoint> {
    if let Some(table) = alignment.table() {
        return table.lookup(alignment, qts);
    }
    let candidates = [(Alignment::Qb3, &QB3), (Alignment::Bb4, &BB4), (Alignment::C4, &C4)];
    let auto_pick = if qts <= QB3.qts_max() + RANGE_TOLERANCE {
        candidates[0]
    } else if qts < C4.qts_min - RANGE_TOLERANCE {
        candidates[1]
    } else {
        candidates[2]
    };
    if auto_pick.1.covers(qts) {
        return auto_pick.1.lookup(auto_pick.0, qts);
    }

    let (lo, hi) = FALLBACK_RANGE;
    if qts < lo || qts > hi {
        return Err(SpeakerSimError::alignment_out_of_range("vented", qts, lo, hi));
    }
    warn!(qts, "no tabulated alignment, using power-law fallback");
    Ok(AlignmentPoint {
        alignment: Alignment::Auto,
        alpha: 1.0 / (15.0 * qts.powf(2.87)),
        h: 0.42 * qts.powf(-0.9),
        f3_ratio: None,
    })
}

static QB3: AlignmentTable = AlignmentTable {
    name: "QB3",
    qts_min: 0.20,
    rows: &[
        (8.245, 1.8042, 2.3879),
        (7.373, 1.7220, 2.2617),
        (6.617, 1.6474, 2.1461),
        (5.957, 1.5795, 2.0397),
        (5.378, 1.5175, 1.9411),
        (4.867, 1.4606, 1.8494),
        (4.413, 1.4083, 1.7638),
        (4.009, 1.3600, 1.6834),
        (3.648, 1.3153, 1.6077),
        (3.322, 1.2739, 1.5360),
        (3.029, 1.2354, 1.4679),
        (2.764, 1.1996, 1.4030),
        (2.523, 1.1662, 1.3408),
        (2.303, 1.1350, 1.2810),
        (2.103, 1.1057, 1.2234),
        (1.919, 1.0784, 1.1679),
        (1.750, 1.0527, 1.1142),
        (1.594, 1.0285, 1.0625),
        (1.451, 1.0059, 1.0129),
    ],
};

static BB4: AlignmentTable = AlignmentTable {
    name: "BB4",
    qts_min: 0.30,
    rows: &[
        (3.556, 1.0, 1.8101),
        (3.203, 1.0, 1.7013),
        (2.883, 1.0, 1.5946),
        (2.591, 1.0, 1.4892),
        (2.325, 1.0, 1.3849),
        (2.082, 1.0, 1.2822),
        (1.858, 1.0, 1.1835),
        (1.652, 1.0, 1.0935),
        (1.463, 1.0, 1.0175),
        (1.287, 1.0, 0.9582),
        (1.125, 1.0, 0.9141),
        (0.974, 1.0, 0.8817),
        (0.834, 1.0, 0.8580),
        (0.704, 1.0, 0.8405),
        (0.583, 1.0, 0.8278),
        (0.469, 1.0, 0.8184),
        (0.363, 1.0, 0.8118),
    ],
};

static C4: AlignmentTable = AlignmentTable {
    name: "C4",
    qts_min: 0.41,
    rows: &[
        (1.099, 0.9389, 0.8844),
        (1.009, 0.9167, 0.8491),
        (0.931, 0.8953, 0.8172),
        (0.863, 0.8748, 0.7883),
        (0.803, 0.8554, 0.7623),
        (0.752, 0.8373, 0.7389),
        (0.707, 0.8204, 0.7178),
        (0.668, 0.8048, 0.6988),
        (0.634, 0.7903, 0.6815),
        (0.604, 0.7769, 0.6659),
        (0.577, 0.7645, 0.6518),
        (0.553, 0.7531, 0.6389),
        (0.532, 0.7425, 0.6271),
        (0.514, 0.7327, 0.6164),
        (0.497, 0.7237, 0.6065),
        (0.481, 0.7153, 0.5975),
        (0.468, 0.7075, 0.5891),
        (0.455, 0.7002, 0.5814),
        (0.444, 0.6935, 0.5743),
        (0.433, 0.6872, 0.5677),
        (0.424, 0.6813, 0.5616),
        (0.415, 0.6758, 0.5558),
        (0.407, 0.6706, 0.5505),
        (0.400, 0.6658, 0.5455),
        (0.393, 0.6612, 0.5409),
        (0.386, 0.6569, 0.5365),
        (0.380, 0.6529, 0.5324),
        (0.375, 0.6491, 0.5285),
        (0.370, 0.6455, 0.5249),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_table_rows() {
        let p = resolve(Alignment::Qb3, 0.20).unwrap();
        assert_abs_diff_eq!(p.alpha, 8.245);
        assert_abs_diff_eq!(p.h, 1.8042);
        let p = resolve(Alignment::C4, 0.69).unwrap();
        assert_abs_diff_eq!(p.alpha, 0.370, epsilon = 1e-6);
    }

    #[test]
    fn test_interpolation() {
        // Classic fourth-order Butterworth: Qts 0.383, α ≈ 1.41, h = 1
        let p = resolve(Alignment::Bb4, 0.383).unwrap();
        assert_abs_diff_eq!(p.alpha, 1.41, epsilon = 0.01);
        assert_abs_diff_eq!(p.h, 1.0);
    }

    #[test]
    fn test_auto_selection() {
        assert_eq!(resolve(Alignment::Auto, 0.30).unwrap().alignment, Alignment::Qb3);
        assert_eq!(resolve(Alignment::Auto, 0.395).unwrap().alignment, Alignment::Bb4);
        assert_eq!(resolve(Alignment::Auto, 0.50).unwrap().alignment, Alignment::C4);
        let fallback = resolve(Alignment::Auto, 0.75).unwrap();
        assert_eq!(fallback.alignment, Alignment::Auto);
        assert!(fallback.f3_ratio.is_none());
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            resolve(Alignment::Qb3, 0.45),
            Err(SpeakerSimError::AlignmentOutOfRange { .. })
        ));
        assert!(resolve(Alignment::Auto, 0.10).is_err());
        assert!(resolve(Alignment::Auto, 0.95).is_err());
    }
}
