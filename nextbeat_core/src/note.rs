// Note events: the value type that flows through every pipeline stage.
//
// A `NoteEvent` is one sounding note or drum hit, positioned in beats from
// the start of the sequence. Events are plain values with no identity; every
// stage takes a slice and returns a fresh `Vec`, never mutating its input.
//
// Also defines the General MIDI drum map (`DrumKind`), the instrument routing
// tag (`Instrument`), and `VelocityBounds`, the clamp every stage applies to
// velocities.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MIDI channel (0-indexed) for General MIDI percussion.
pub const PERCUSSION_CHANNEL: u8 = 9;

/// MIDI channel for pitched (melodic) notes.
pub const MELODIC_CHANNEL: u8 = 0;

/// Shortest pitched note accepted from a primer (a 32nd note).
pub const MIN_PITCHED_DURATION: f64 = 0.125;

/// Longest pitched note accepted from a primer (two bars of 4/4).
pub const MAX_PITCHED_DURATION: f64 = 8.0;

/// Length of a drum hit in seconds. Converted to beats at the sequence tempo.
pub const DRUM_HIT_SECONDS: f64 = 0.05;

/// Tempo used for a drum hit's placeholder duration before a sequence tempo
/// is known.
pub const REFERENCE_TEMPO_BPM: u32 = 120;

/// Highest value a MIDI velocity can take.
pub const VELOCITY_CEILING: u8 = 127;

/// Latest onset a note may have, in beats (16384 bars of 4/4).
pub const MAX_NOTE_TIME: f64 = 65_536.0;

/// Duration of a drum hit in beats at the given tempo.
pub fn drum_hit_beats(tempo_bpm: u32) -> f64 {
    DRUM_HIT_SECONDS * tempo_bpm as f64 / 60.0
}

/// Whether a note is a drum hit or a pitched note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteKind {
    Percussive,
    Pitched,
}

/// General MIDI percussion instruments a primer may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrumKind {
    Kick,
    Snare,
    Rimshot,
    Clap,
    Hihat,
    HihatOpen,
    Ride,
    Crash,
    TomHigh,
    TomMid,
    TomLow,
    Cowbell,
}

impl DrumKind {
    pub const ALL: [DrumKind; 12] = [
        DrumKind::Kick,
        DrumKind::Snare,
        DrumKind::Rimshot,
        DrumKind::Clap,
        DrumKind::Hihat,
        DrumKind::HihatOpen,
        DrumKind::Ride,
        DrumKind::Crash,
        DrumKind::TomHigh,
        DrumKind::TomMid,
        DrumKind::TomLow,
        DrumKind::Cowbell,
    ];

    /// General MIDI percussion key for this drum.
    pub fn gm_key(self) -> u8 {
        match self {
            DrumKind::Kick => 36,
            DrumKind::Snare => 38,
            DrumKind::Rimshot => 37,
            DrumKind::Clap => 39,
            DrumKind::Hihat => 42, // closed
            DrumKind::HihatOpen => 46,
            DrumKind::Ride => 51,
            DrumKind::Crash => 49,
            DrumKind::TomHigh => 50,
            DrumKind::TomMid => 47,
            DrumKind::TomLow => 45,
            DrumKind::Cowbell => 56,
        }
    }

    /// The name primers use for this drum.
    pub fn name(self) -> &'static str {
        match self {
            DrumKind::Kick => "kick",
            DrumKind::Snare => "snare",
            DrumKind::Rimshot => "rimshot",
            DrumKind::Clap => "clap",
            DrumKind::Hihat => "hihat",
            DrumKind::HihatOpen => "hihat_open",
            DrumKind::Ride => "ride",
            DrumKind::Crash => "crash",
            DrumKind::TomHigh => "tom_high",
            DrumKind::TomMid => "tom_mid",
            DrumKind::TomLow => "tom_low",
            DrumKind::Cowbell => "cowbell",
        }
    }

    /// Look up a drum by its primer name. Exact match only.
    pub fn from_name(name: &str) -> Option<DrumKind> {
        DrumKind::ALL.into_iter().find(|d| d.name() == name)
    }
}

/// Which kind of part a request generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Drums,
    Piano,
}

impl Instrument {
    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Drums => "drums",
            Instrument::Piano => "piano",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "drums" | "percussion" | "drum" => Ok(Instrument::Drums),
            "piano" | "melody" | "keys" | "keyboard" => Ok(Instrument::Piano),
            _ => Err(Error::InvalidRequest(format!(
                "unknown instrument '{s}', use 'drums', 'piano', or 'melody'"
            ))),
        }
    }
}

/// Inclusive velocity range every stage clamps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VelocityBounds {
    min: u8,
    max: u8,
}

impl VelocityBounds {
    /// Build bounds, forcing both ends into 1..=127 and ordering them.
    /// Velocity 0 is a note-off in MIDI, so it is never a valid bound.
    pub fn new(min: u8, max: u8) -> Self {
        let a = min.clamp(1, VELOCITY_CEILING);
        let b = max.clamp(1, VELOCITY_CEILING);
        VelocityBounds {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(self) -> u8 {
        self.min
    }

    pub fn max(self) -> u8 {
        self.max
    }

    pub fn contains(self, velocity: u8) -> bool {
        (self.min..=self.max).contains(&velocity)
    }

    /// Clamp an arbitrary integer velocity into the bounds.
    pub fn clamp(self, velocity: i64) -> u8 {
        velocity.clamp(self.min as i64, self.max as i64) as u8
    }

    /// Multiply a velocity by `factor`, round to nearest, then clamp.
    pub fn scale(self, velocity: u8, factor: f64) -> u8 {
        let scaled = (velocity as f64 * factor).round();
        if scaled.is_finite() {
            self.clamp(scaled as i64)
        } else {
            self.clamp(velocity as i64)
        }
    }
}

impl Default for VelocityBounds {
    fn default() -> Self {
        VelocityBounds { min: 40, max: 120 }
    }
}

/// One sounding note or drum hit.
///
/// `time` and `duration` are in beats (quarter notes) from sequence start.
/// Constructors enforce `0 <= time <= MAX_NOTE_TIME`, `duration > 0`, and a
/// 0..=127 pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub kind: NoteKind,
    /// MIDI note number, or the GM percussion key for drum hits.
    pub pitch: u8,
    pub time: f64,
    pub duration: f64,
    pub velocity: u8,
}

impl NoteEvent {
    /// A drum hit. Its duration is a placeholder until the sequence tempo is
    /// known; the assembler replaces it with `drum_hit_beats(tempo)`.
    pub fn drum(drum: DrumKind, time: f64, velocity: u8) -> Self {
        NoteEvent {
            kind: NoteKind::Percussive,
            pitch: drum.gm_key(),
            time: clamp_time(time),
            duration: drum_hit_beats(REFERENCE_TEMPO_BPM),
            velocity,
        }
    }

    /// A pitched note. Duration is clamped to
    /// [`MIN_PITCHED_DURATION`, `MAX_PITCHED_DURATION`].
    pub fn pitched(pitch: u8, time: f64, duration: f64, velocity: u8) -> Self {
        let duration = if duration.is_nan() {
            MIN_PITCHED_DURATION
        } else {
            duration.clamp(MIN_PITCHED_DURATION, MAX_PITCHED_DURATION)
        };
        NoteEvent {
            kind: NoteKind::Pitched,
            pitch: pitch.min(127),
            time: clamp_time(time),
            duration,
            velocity,
        }
    }

    pub fn is_percussive(&self) -> bool {
        self.kind == NoteKind::Percussive
    }

    /// MIDI channel this note plays on.
    pub fn channel(&self) -> u8 {
        match self.kind {
            NoteKind::Percussive => PERCUSSION_CHANNEL,
            NoteKind::Pitched => MELODIC_CHANNEL,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.time + self.duration
    }

    /// Copy of this note at a different time.
    pub fn with_time(&self, time: f64) -> Self {
        NoteEvent {
            time: clamp_time(time),
            ..*self
        }
    }

    /// Copy of this note with a different velocity.
    pub fn with_velocity(&self, velocity: u8) -> Self {
        NoteEvent { velocity, ..*self }
    }
}

/// Clamp a time into `[0, MAX_NOTE_TIME]`. NaN and -0.0 become 0.0.
pub(crate) fn clamp_time(beats: f64) -> f64 {
    if beats.is_nan() || beats <= 0.0 {
        0.0
    } else {
        beats.min(MAX_NOTE_TIME)
    }
}
