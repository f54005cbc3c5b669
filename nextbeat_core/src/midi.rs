// Standard MIDI File output for assembled note sequences.
//
// Produces an SMF Format 0 file: one track holding a Set Tempo meta event at
// tick 0, the Note On / Note Off pairs of every note, and End of Track.
// Drum hits go to channel 9 (GM percussion), pitched notes to channel 0.
//
// Beat times become ticks with `round(beats * ticks_per_quarter)`. All note
// events are gathered into one list and stable-sorted by absolute tick, so
// events at the same tick keep the order they were emitted in (note order,
// On before Off). Absolute ticks are then turned into delta times, which
// `midly` writes as variable-length quantities.
//
// This is the last stop before a sequencer loads the file, so out-of-range
// values are clamped here rather than reported: pitch to 0..=127, velocity to
// 1..=127, negative or NaN times to tick 0, oversized deltas and tempos to
// what their fields can hold. The only failure is the sink refusing bytes.

use crate::error::Result;
use crate::note::{NoteEvent, VELOCITY_CEILING, drum_hit_beats};
use crate::sequence::NoteSequence;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Largest delta a track event can carry (28-bit VLQ).
const MAX_DELTA: u32 = 0x0FFF_FFFF;

/// Largest microseconds-per-quarter value a Set Tempo event can carry.
const MAX_TEMPO_MICROS: u32 = 0x00FF_FFFF;

/// Convert a beat position to an absolute tick.
///
/// Negative and NaN positions map to tick 0.
pub fn beats_to_ticks(beats: f64, ticks_per_quarter: u16) -> u32 {
    let ticks = (beats * ticks_per_quarter as f64).round();
    if ticks.is_nan() || ticks <= 0.0 {
        0
    } else {
        // Saturates at u32::MAX.
        ticks as u32
    }
}

/// Length of a drum hit in ticks at `tempo_bpm`. Never shorter than one tick.
pub fn drum_hit_ticks(tempo_bpm: u32, ticks_per_quarter: u16) -> u32 {
    beats_to_ticks(drum_hit_beats(tempo_bpm), ticks_per_quarter).max(1)
}

/// Microseconds per quarter note for a Set Tempo event.
pub fn tempo_micros(tempo_bpm: u32) -> u32 {
    (60_000_000 / tempo_bpm.max(1)).min(MAX_TEMPO_MICROS)
}

/// Encode a sequence into Standard MIDI File bytes.
pub fn encode(sequence: &NoteSequence) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_midi(sequence, &mut buf)?;
    Ok(buf)
}

/// Encode a sequence into any byte sink.
pub fn write_midi<W: Write>(sequence: &NoteSequence, sink: W) -> Result<()> {
    sequence_to_smf(sequence).write_std(sink)?;
    Ok(())
}

/// Encode a sequence and write it to `path`, replacing any existing file.
/// Returns the bytes written.
pub fn write_midi_file(sequence: &NoteSequence, path: &Path) -> Result<Vec<u8>> {
    let bytes = encode(sequence)?;
    std::fs::write(path, &bytes)?;
    info!(
        path = %path.display(),
        notes = sequence.len(),
        bytes = bytes.len(),
        "MIDI file written"
    );
    Ok(bytes)
}

/// A note event at an absolute tick, before delta conversion.
struct TimedEvent {
    tick: u32,
    kind: TrackEventKind<'static>,
}

fn sequence_to_smf(sequence: &NoteSequence) -> Smf<'static> {
    let tpq = sequence.ticks_per_quarter();
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(tpq)),
    ));

    let mut track: Track<'static> = Vec::with_capacity(sequence.len() * 2 + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_micros(
            sequence.tempo_bpm(),
        )))),
    });

    let drum_ticks = drum_hit_ticks(sequence.tempo_bpm(), tpq);
    let mut events: Vec<TimedEvent> = Vec::with_capacity(sequence.len() * 2);
    for note in sequence.notes() {
        push_note(&mut events, note, tpq, drum_ticks);
    }
    events.sort_by_key(|e| e.tick);

    let mut prev_tick = 0u32;
    for event in events {
        let delta = event.tick.saturating_sub(prev_tick).min(MAX_DELTA);
        track.push(TrackEvent {
            delta: u28::new(delta),
            kind: event.kind,
        });
        prev_tick = event.tick;
    }

    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);
    smf
}

/// Emit the On/Off pair for one note, On first.
fn push_note(events: &mut Vec<TimedEvent>, note: &NoteEvent, tpq: u16, drum_ticks: u32) {
    let channel = u4::new(note.channel());
    let key = u7::new(note.pitch.min(127));
    let vel = u7::new(note.velocity.clamp(1, VELOCITY_CEILING));

    let start = beats_to_ticks(note.time, tpq);
    let length = if note.is_percussive() {
        drum_ticks
    } else {
        beats_to_ticks(note.duration, tpq).max(1)
    };

    events.push(TimedEvent {
        tick: start,
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOn { key, vel },
        },
    });
    events.push(TimedEvent {
        tick: start.saturating_add(length),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::NoteOff {
                key,
                vel: u7::new(0),
            },
        },
    });
}
