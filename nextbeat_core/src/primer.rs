// Primer records: untrusted note data coming from the primer source.
//
// A primer arrives as a JSON array of loosely-typed records (drum name or
// pitch, beat time, optional duration, velocity). Nothing about it is
// trusted: unknown drums are dropped, every number is clamped into a musical
// range, and missing fields take defaults. What survives is a list of
// well-formed `NoteEvent`s ready for post-processing.

use crate::error::{Error, Result};
use crate::note::{DrumKind, Instrument, NoteEvent, VelocityBounds};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Lowest and highest piano key (A0 to C8).
pub const PIANO_RANGE: (i64, i64) = (21, 108);

const DEFAULT_PITCH: i64 = 60;
const DEFAULT_DURATION: f64 = 1.0;
const DEFAULT_VELOCITY: i64 = 80;

/// One raw note record as the primer source emits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<i64>,
}

/// Latest beat a primer note may start on: the last sixteenth of the primer.
pub fn primer_max_time(primer_bars: u32) -> f64 {
    (primer_bars as f64 * 4.0 - 0.25).max(0.0)
}

/// Parse a JSON array of primer records.
pub fn parse_primer_records(text: &str) -> Result<Vec<PrimerRecord>> {
    serde_json::from_str(text).map_err(|e| Error::Primer(format!("malformed primer JSON: {e}")))
}

/// Read a JSON array of primer records from a file.
pub fn load_primer_records(path: &Path) -> Result<Vec<PrimerRecord>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Primer(format!("cannot read {}: {e}", path.display())))?;
    parse_primer_records(&text)
}

/// Turn raw records into note events for `instrument`.
///
/// Fails only if no record survives.
pub fn validate_records(
    records: &[PrimerRecord],
    instrument: Instrument,
    primer_bars: u32,
    bounds: VelocityBounds,
) -> Result<Vec<NoteEvent>> {
    let max_time = primer_max_time(primer_bars);
    let notes: Vec<NoteEvent> = records
        .iter()
        .filter_map(|r| match instrument {
            Instrument::Drums => validate_drum(r, max_time, bounds),
            Instrument::Piano => Some(validate_pitched(r, max_time, bounds)),
        })
        .collect();

    if notes.is_empty() {
        return Err(Error::Primer(format!(
            "no valid {instrument} notes in {} records",
            records.len()
        )));
    }
    info!(notes = notes.len(), records = records.len(), %instrument, "primer validated");
    Ok(notes)
}

fn validate_drum(
    record: &PrimerRecord,
    max_time: f64,
    bounds: VelocityBounds,
) -> Option<NoteEvent> {
    let name = record.drum.as_deref().unwrap_or("");
    let Some(drum) = DrumKind::from_name(name) else {
        warn!(drum = name, "unknown drum, skipping");
        return None;
    };
    Some(NoteEvent::drum(
        drum,
        clamp_time(record.time, max_time),
        bounds.clamp(record.velocity.unwrap_or(DEFAULT_VELOCITY)),
    ))
}

fn validate_pitched(record: &PrimerRecord, max_time: f64, bounds: VelocityBounds) -> NoteEvent {
    let pitch = record
        .pitch
        .unwrap_or(DEFAULT_PITCH)
        .clamp(PIANO_RANGE.0, PIANO_RANGE.1) as u8;
    // NoteEvent::pitched clamps the duration.
    NoteEvent::pitched(
        pitch,
        clamp_time(record.time, max_time),
        record.duration.unwrap_or(DEFAULT_DURATION),
        bounds.clamp(record.velocity.unwrap_or(DEFAULT_VELOCITY)),
    )
}

fn clamp_time(time: Option<f64>, max_time: f64) -> f64 {
    match time {
        Some(t) if !t.is_nan() => t.clamp(0.0, max_time),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{MAX_PITCHED_DURATION, MIN_PITCHED_DURATION, NoteKind};

    fn bounds() -> VelocityBounds {
        VelocityBounds::default()
    }

    #[test]
    fn parses_drum_records() {
        let records = parse_primer_records(
            r#"[{"drum": "kick", "time": 0.0, "velocity": 100},
                {"drum": "hihat", "time": 0.5, "velocity": 70},
                {"drum": "snare", "time": 1.0}]"#,
        )
        .unwrap();
        let notes = validate_records(&records, Instrument::Drums, 2, bounds()).unwrap();
        assert_eq!(notes.len(), 3);
        assert_eq!(notes[0].pitch, 36);
        assert_eq!(notes[1].pitch, 42);
        assert_eq!(notes[2].velocity, 80);
        assert!(notes.iter().all(|n| n.kind == NoteKind::Percussive));
    }

    #[test]
    fn unknown_drums_are_dropped() {
        let records = vec![
            PrimerRecord {
                drum: Some("kazoo".into()),
                ..Default::default()
            },
            PrimerRecord {
                drum: Some("ride".into()),
                time: Some(2.0),
                ..Default::default()
            },
            PrimerRecord::default(),
        ];
        let notes = validate_records(&records, Instrument::Drums, 2, bounds()).unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].pitch, 51);
    }

    #[test]
    fn pitched_values_are_clamped() {
        let records = vec![
            PrimerRecord {
                pitch: Some(3),
                time: Some(99.0),
                duration: Some(0.01),
                velocity: Some(300),
                ..Default::default()
            },
            PrimerRecord {
                pitch: Some(120),
                time: Some(-1.0),
                duration: Some(16.0),
                velocity: Some(-3),
                ..Default::default()
            },
        ];
        let notes = validate_records(&records, Instrument::Piano, 2, bounds()).unwrap();
        assert_eq!(notes[0].pitch, 21);
        assert_eq!(notes[0].time, 7.75);
        assert_eq!(notes[0].duration, MIN_PITCHED_DURATION);
        assert_eq!(notes[0].velocity, 120);
        assert_eq!(notes[1].pitch, 108);
        assert_eq!(notes[1].time, 0.0);
        assert_eq!(notes[1].duration, MAX_PITCHED_DURATION);
        assert_eq!(notes[1].velocity, 40);
    }

    #[test]
    fn pitched_defaults() {
        let notes =
            validate_records(&[PrimerRecord::default()], Instrument::Piano, 1, bounds()).unwrap();
        assert_eq!(notes[0].pitch, 60);
        assert_eq!(notes[0].time, 0.0);
        assert_eq!(notes[0].duration, 1.0);
        assert_eq!(notes[0].velocity, 80);
    }

    #[test]
    fn nothing_valid_is_an_error() {
        let records = vec![PrimerRecord {
            drum: Some("gong".into()),
            ..Default::default()
        }];
        assert!(matches!(
            validate_records(&records, Instrument::Drums, 2, bounds()),
            Err(Error::Primer(_))
        ));
        assert!(validate_records(&[], Instrument::Piano, 2, bounds()).is_err());
    }

    #[test]
    fn malformed_json_is_a_primer_error() {
        assert!(matches!(parse_primer_records("{\"drum\": 1}"), Err(Error::Primer(_))));
    }

    #[test]
    fn max_time_is_last_sixteenth() {
        assert_eq!(primer_max_time(2), 7.75);
        assert_eq!(primer_max_time(1), 3.75);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primer.json");
        std::fs::write(&path, r#"[{"pitch": 64, "time": 1.0, "duration": 0.5, "velocity": 90}]"#)
            .unwrap();
        let records = load_primer_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pitch, Some(64));
    }
}
