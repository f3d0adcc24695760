//! FRD / ZMA text codec.
//!
//! Each data line holds `frequency amplitude [phase]` separated by spaces,
//! tabs or commas. Lines starting with `*`, `#`, `;` or `"` are comments.
//! Text lines before the first sample are treated as a header.

use tracing::debug;

use super::{MeasurementKind, ResponseData, ResponseEntry};
use crate::error::{Result, SpeakerSimError};

/// Parse FRD (dB SPL) or ZMA (ohms) text.
///
/// When no line carries a phase column the phase is reconstructed as minimum
/// phase. Mixing lines with and without phase is an error.
pub fn parse_frd(text: &str, kind: MeasurementKind) -> Result<ResponseData> {
    let mut entries = Vec::new();
    let mut with_phase = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim().trim_start_matches('\u{feff}');
        if line.is_empty() || line.starts_with(['*', '#', ';', '"']) {
            continue;
        }

        let fields: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();

        let first = match fields.first().and_then(|s| s.parse::<f64>().ok()) {
            Some(v) => v,
            None if entries.is_empty() => continue,
            None => {
                return Err(SpeakerSimError::malformed(
                    line_no,
                    format!("expected a frequency, got '{}'", fields.first().copied().unwrap_or("")),
                ))
            }
        };
        if fields.len() < 2 {
            return Err(SpeakerSimError::malformed(line_no, "missing amplitude column"));
        }
        if !(first.is_finite() && first > 0.0) {
            return Err(SpeakerSimError::malformed(
                line_no,
                format!("frequency must be positive, got {}", first),
            ));
        }

        let amplitude = parse_field(fields[1], line_no, "amplitude")?;
        let phase = match fields.get(2) {
            Some(s) => Some(parse_field(s, line_no, "phase")?),
            None => None,
        };

        match (with_phase, phase.is_some()) {
            (None, has) => with_phase = Some(has),
            (Some(expected), has) if expected != has => {
                return Err(SpeakerSimError::malformed(
                    line_no,
                    "phase column present on some lines only",
                ))
            }
            _ => {}
        }

        entries.push(ResponseEntry::new(first, amplitude, phase.unwrap_or(0.0)));
    }

    let mut data = ResponseData::new(kind, entries)?;
    if with_phase != Some(true) {
        data.apply_min_phase();
    }
    debug!(samples = data.len(), min_phase = data.is_min_phase(), "parsed measurement");
    Ok(data)
}

fn parse_field(text: &str, line: usize, what: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SpeakerSimError::malformed(line, format!("invalid {} '{}'", what, text)))
}
