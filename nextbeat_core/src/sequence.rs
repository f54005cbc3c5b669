// The assembled, tempo-stamped note sequence handed to the MIDI encoder.
//
// `assemble` is the boundary between the beat-domain pipeline and output:
// it validates the tempo, gives drum hits their tempo-dependent length,
// stable-sorts by onset, and derives the total length. The result is
// read-only; the encoder only borrows it.

use crate::error::{Error, Result};
use crate::note::{NoteEvent, drum_hit_beats};

/// MIDI time division used for every sequence.
pub const TICKS_PER_QUARTER: u16 = 480;

/// Tempo range the assembler accepts. Requests are held to 40..=300 before
/// they get here.
pub const TEMPO_RANGE: std::ops::RangeInclusive<u32> = 1..=1000;

#[derive(Debug, Clone, PartialEq)]
pub struct NoteSequence {
    tempo_bpm: u32,
    notes: Vec<NoteEvent>,
    total_time: f64,
}

impl NoteSequence {
    pub fn tempo_bpm(&self) -> u32 {
        self.tempo_bpm
    }

    pub fn ticks_per_quarter(&self) -> u16 {
        TICKS_PER_QUARTER
    }

    /// Notes sorted by onset; equal onsets keep assembly input order.
    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    /// Latest note end, in beats. 0 for an empty sequence.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Latest note end, in seconds at the sequence tempo.
    pub fn duration_seconds(&self) -> f64 {
        self.total_time * 60.0 / self.tempo_bpm as f64
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Build a `NoteSequence` from post-processed notes.
pub fn assemble(notes: Vec<NoteEvent>, tempo_bpm: u32) -> Result<NoteSequence> {
    if !TEMPO_RANGE.contains(&tempo_bpm) {
        return Err(Error::InvalidTempo(tempo_bpm));
    }

    let hit = drum_hit_beats(tempo_bpm);
    let mut notes: Vec<NoteEvent> = notes
        .into_iter()
        .map(|n| {
            if n.is_percussive() {
                NoteEvent { duration: hit, ..n }
            } else {
                n
            }
        })
        .collect();
    notes.sort_by(|a, b| a.time.total_cmp(&b.time));

    let total_time = notes.iter().map(NoteEvent::end_time).fold(0.0, f64::max);

    Ok(NoteSequence {
        tempo_bpm,
        notes,
        total_time,
    })
}
