//! Measured response and impedance curves.
//!
//! [`ResponseData`] holds samples sorted by strictly increasing frequency.
//! Repeated frequencies are merged by averaging when the curve is built.
//! Phase is stored unwrapped so that interpolation between samples never
//! crosses a ±180° jump.

mod frd;

pub use frd::parse_frd;

use serde::{Deserialize, Serialize};

use crate::environment::REFERENCE_VOLTAGE;
use crate::error::{require_positive, Result, SpeakerSimError};
use crate::math::fnc::{from_db, interp_clamped, to_db, wrap_degrees};
use crate::math::hilbert::min_phase;
use crate::math::{Complex, ComplexExt};

/// What the amplitude column of a curve means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// Sound pressure level in dB (FRD)
    #[default]
    Response,
    /// Impedance magnitude in ohms (ZMA)
    Impedance,
}

/// One measured sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseEntry {
    /// Frequency (Hz)
    pub frequency: f64,
    /// dB SPL for responses, ohms for impedances
    pub amplitude: f64,
    /// Phase (degrees)
    pub phase: f64,
}

impl ResponseEntry {
    pub fn new(frequency: f64, amplitude: f64, phase: f64) -> Self {
        Self {
            frequency,
            amplitude,
            phase,
        }
    }
}

/// A measured curve with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    kind: MeasurementKind,
    frequencies: Vec<f64>,
    amplitudes: Vec<f64>,
    /// Unwrapped phase in degrees
    phases: Vec<f64>,
    /// Measurement distance (m)
    distance: f64,
    /// Input voltage the measurement was taken at (V)
    reference_voltage: f64,
    /// Phase was reconstructed from the amplitude
    min_phase: bool,
}

impl ResponseData {
    /// Build a curve from unsorted samples, merging repeated frequencies.
    ///
    /// Samples with a non-positive or non-finite frequency are dropped. An
    /// empty result is an error.
    pub fn new(kind: MeasurementKind, mut entries: Vec<ResponseEntry>) -> Result<Self> {
        entries.retain(|e| e.frequency.is_finite() && e.frequency > 0.0);
        if entries.is_empty() {
            return Err(SpeakerSimError::EmptyMeasurement {
                name: format!("{:?}", kind).to_lowercase(),
            });
        }
        entries.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));

        let mut frequencies: Vec<f64> = Vec::with_capacity(entries.len());
        let mut amplitudes = Vec::with_capacity(entries.len());
        let mut phases = Vec::with_capacity(entries.len());
        let mut run = 0usize;
        for entry in &entries {
            let last = frequencies.len();
            if last > 0 && frequencies[last - 1] == entry.frequency {
                // Running average over the duplicate run
                run += 1;
                let n = run as f64;
                amplitudes[last - 1] += (entry.amplitude - amplitudes[last - 1]) / n;
                phases[last - 1] += (entry.phase - phases[last - 1]) / n;
            } else {
                run = 1;
                frequencies.push(entry.frequency);
                amplitudes.push(entry.amplitude);
                phases.push(entry.phase);
            }
        }

        Ok(Self {
            kind,
            frequencies,
            amplitudes,
            phases: unwrap_phase(&phases),
            distance: 1.0,
            reference_voltage: REFERENCE_VOLTAGE,
            min_phase: false,
        })
    }

    /// Build a curve from amplitudes only; phase is reconstructed as
    /// minimum phase.
    pub fn from_amplitudes(kind: MeasurementKind, samples: &[(f64, f64)]) -> Result<Self> {
        let entries = samples
            .iter()
            .map(|&(f, a)| ResponseEntry::new(f, a, 0.0))
            .collect();
        let mut data = Self::new(kind, entries)?;
        data.apply_min_phase();
        Ok(data)
    }

    /// Replace the phase with the minimum phase implied by the amplitude.
    pub fn apply_min_phase(&mut self) {
        let db: Vec<f64> = match self.kind {
            MeasurementKind::Response => self.amplitudes.clone(),
            MeasurementKind::Impedance => self.amplitudes.iter().map(|&z| to_db(z)).collect(),
        };
        self.phases = min_phase(&self.frequencies, &db);
        self.min_phase = true;
    }

    /// Set the measurement distance (m).
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// Set the input voltage the measurement was taken at (V).
    pub fn with_reference_voltage(mut self, volts: f64) -> Self {
        self.reference_voltage = volts;
        self
    }

    /// Reject a distance or drive voltage that would make the curve's level
    /// undefined.
    pub fn validate(&self, owner: &str) -> Result<()> {
        require_positive(owner, "distance", self.distance)?;
        require_positive(owner, "voltage", self.reference_voltage)?;
        Ok(())
    }

    pub fn kind(&self) -> MeasurementKind {
        self.kind
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn reference_voltage(&self) -> f64 {
        self.reference_voltage
    }

    pub fn is_min_phase(&self) -> bool {
        self.min_phase
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Lowest and highest measured frequency.
    pub fn frequency_range(&self) -> (f64, f64) {
        (self.frequencies[0], self.frequencies[self.frequencies.len() - 1])
    }

    /// Whether `f` lies inside the measured band.
    pub fn covers(&self, f: f64) -> bool {
        let (lo, hi) = self.frequency_range();
        f >= lo && f <= hi
    }

    /// Samples in frequency order, phase wrapped to (-180, 180].
    pub fn entries(&self) -> impl Iterator<Item = ResponseEntry> + '_ {
        self.frequencies
            .iter()
            .zip(&self.amplitudes)
            .zip(&self.phases)
            .map(|((&f, &a), &p)| ResponseEntry::new(f, a, wrap_degrees(p)))
    }

    /// Raw amplitude and wrapped phase at `f`, linear in frequency with
    /// clamping to the end samples.
    pub fn value_at(&self, f: f64) -> ResponseEntry {
        let amplitude = interp_clamped(&self.frequencies, &self.amplitudes, f);
        let phase = interp_clamped(&self.frequencies, &self.phases, f);
        ResponseEntry::new(f, amplitude, wrap_degrees(phase))
    }

    /// Amplitude in dB corrected to 1 m and the 2.83 V reference.
    ///
    /// Only meaningful for response curves.
    pub fn normalized_db_at(&self, f: f64) -> f64 {
        self.value_at(f).amplitude + self.normalization_db()
    }

    /// dB offset that maps this measurement to 1 m / 2.83 V.
    pub fn normalization_db(&self) -> f64 {
        to_db(self.distance.max(crate::math::MIN_DISTANCE)) + to_db(REFERENCE_VOLTAGE / self.reference_voltage)
    }

    /// Complex value at `f`.
    ///
    /// Responses return linear pressure re 20 µPa normalized to 1 m and
    /// 2.83 V; impedances return ohms.
    pub fn complex_at(&self, f: f64) -> Complex {
        let entry = self.value_at(f);
        match self.kind {
            MeasurementKind::Response => {
                Complex::from_polar_deg(from_db(entry.amplitude + self.normalization_db()), entry.phase)
            }
            MeasurementKind::Impedance => Complex::from_polar_deg(entry.amplitude.abs(), entry.phase),
        }
    }

    /// Complex value at `f` relative to the curve's own level, treating the
    /// amplitude column as a dB gain (for transfer curves).
    pub fn transfer_at(&self, f: f64) -> Complex {
        let entry = self.value_at(f);
        Complex::from_polar_deg(from_db(entry.amplitude), entry.phase)
    }
}

/// Remove ±360° jumps between consecutive phase samples.
fn unwrap_phase(phases: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phases.len());
    let mut offset = 0.0;
    for (i, &p) in phases.iter().enumerate() {
        if i > 0 {
            let prev = phases[i - 1];
            let delta = p - prev;
            if delta > 180.0 {
                offset -= 360.0 * ((delta + 180.0) / 360.0).floor();
            } else if delta < -180.0 {
                offset += 360.0 * ((-delta + 180.0) / 360.0).floor();
            }
        }
        out.push(p + offset);
    }
    out
}
