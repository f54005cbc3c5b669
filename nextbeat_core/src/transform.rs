// Style transforms: intentional, category-specific deviations from the grid.
//
// Each transform reads grid-aligned notes (`QuantizedNotes`) and returns a new
// list. Positions are matched with small tolerances (0.01 beats, or 0.1 for
// reggae) that only make sense on quantized input.
//
// - Swing: delays the upbeat eighth (x.5) to `floor + ratio` and the last
//   sixteenth (x.75) to `floor + 0.5 + ratio / 2`, giving a long-short feel.
// - Rock: accents beats 1 and 3 of each 4/4 bar (x1.15) and softens 2 and 4
//   (x0.95).
// - Funk: rock accents, then on drum parts scatters quiet snare ghost notes
//   over empty odd sixteenths. The only stage that adds notes and the only
//   random one, so it draws from a caller-supplied `NoteRng`.
// - Reggae: lifts the offbeat (x1.2) and pulls back the downbeat (x0.85).
// - Neutral: unchanged apart from the velocity clamp.
//
// Velocity changes round to nearest. Every note a transform emits, touched or
// not, has its velocity clamped into `VelocityBounds`.

use crate::note::{DrumKind, Instrument, NoteEvent, VelocityBounds};
use crate::quantize::QuantizedNotes;
use crate::style::StyleCategory;
use nextbeat_prng::NoteRng;

/// Tolerance for on-grid position checks, in beats.
const POSITION_TOLERANCE: f64 = 0.01;

/// Wider tolerance used by the reggae offbeat check.
const REGGAE_TOLERANCE: f64 = 0.1;

/// Chance of a ghost note on each eligible sixteenth.
const GHOST_NOTE_PROBABILITY: f64 = 0.4;

/// Inclusive velocity range ghost notes are drawn from, before clamping.
const GHOST_VELOCITY: (i32, i32) = (35, 55);

const BEATS_PER_BAR: f64 = 4.0;
const SIXTEENTHS_PER_BEAT: f64 = 4.0;

/// Parameters shared by the style transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyleParams {
    pub swing_ratio: f64,
    pub bounds: VelocityBounds,
}

/// Apply the transform for `category`.
///
/// `rng` is only drawn from on the funk drum path.
pub fn apply_style(
    category: StyleCategory,
    notes: &QuantizedNotes,
    instrument: Instrument,
    params: &StyleParams,
    rng: &mut NoteRng,
) -> Vec<NoteEvent> {
    match category {
        StyleCategory::Swing => apply_swing(notes, params.swing_ratio, params.bounds),
        StyleCategory::Rock => apply_rock_emphasis(notes, params.bounds),
        StyleCategory::Funk => apply_funk(notes, instrument, params.bounds, rng),
        StyleCategory::Reggae => apply_reggae_offbeat(notes, params.bounds),
        StyleCategory::Neutral => clamp_all(notes.notes(), params.bounds),
    }
}

/// Shift upbeat eighths and the "a" sixteenth of each beat late by `ratio`.
///
/// A ratio within 0.01 of 0.5 is straight time and leaves timing alone.
pub fn apply_swing(
    notes: &QuantizedNotes,
    ratio: f64,
    bounds: VelocityBounds,
) -> Vec<NoteEvent> {
    if (ratio - 0.5).abs() < POSITION_TOLERANCE {
        return clamp_all(notes.notes(), bounds);
    }

    notes
        .notes()
        .iter()
        .map(|note| {
            let note = clamp_velocity(note, bounds);
            let beat_floor = note.time.floor();
            let beat_pos = note.time - beat_floor;
            if (beat_pos - 0.5).abs() < POSITION_TOLERANCE {
                note.with_time(beat_floor + ratio)
            } else if (beat_pos - 0.75).abs() < POSITION_TOLERANCE {
                note.with_time(beat_floor + 0.5 + ratio / 2.0)
            } else {
                note
            }
        })
        .collect()
}

/// Accent beats 1 and 3, soften beats 2 and 4.
pub fn apply_rock_emphasis(notes: &QuantizedNotes, bounds: VelocityBounds) -> Vec<NoteEvent> {
    emphasize(notes.notes(), bounds)
}

/// Rock accents, plus snare ghost notes when the part is drums.
pub fn apply_funk(
    notes: &QuantizedNotes,
    instrument: Instrument,
    bounds: VelocityBounds,
    rng: &mut NoteRng,
) -> Vec<NoteEvent> {
    let emphasized = emphasize(notes.notes(), bounds);
    match instrument {
        Instrument::Drums => add_ghost_notes(emphasized, bounds, rng),
        Instrument::Piano => emphasized,
    }
}

/// Boost offbeats and pull back downbeats.
pub fn apply_reggae_offbeat(notes: &QuantizedNotes, bounds: VelocityBounds) -> Vec<NoteEvent> {
    notes
        .notes()
        .iter()
        .map(|note| {
            let beat_pos = note.time.rem_euclid(1.0);
            if (beat_pos - 0.5).abs() < REGGAE_TOLERANCE {
                note.with_velocity(bounds.scale(note.velocity, 1.2))
            } else if beat_pos.abs() < REGGAE_TOLERANCE {
                note.with_velocity(bounds.scale(note.velocity, 0.85))
            } else {
                clamp_velocity(note, bounds)
            }
        })
        .collect()
}

fn emphasize(notes: &[NoteEvent], bounds: VelocityBounds) -> Vec<NoteEvent> {
    let near = |pos: f64, target: f64| (pos - target).abs() < POSITION_TOLERANCE;
    notes
        .iter()
        .map(|note| {
            let bar_pos = note.time.rem_euclid(BEATS_PER_BAR);
            if near(bar_pos, 0.0) || near(bar_pos, 2.0) {
                note.with_velocity(bounds.scale(note.velocity, 1.15))
            } else if near(bar_pos, 1.0) || near(bar_pos, 3.0) {
                note.with_velocity(bounds.scale(note.velocity, 0.95))
            } else {
                clamp_velocity(note, bounds)
            }
        })
        .collect()
}

fn clamp_velocity(note: &NoteEvent, bounds: VelocityBounds) -> NoteEvent {
    note.with_velocity(bounds.clamp(note.velocity as i64))
}

fn clamp_all(notes: &[NoteEvent], bounds: VelocityBounds) -> Vec<NoteEvent> {
    notes.iter().map(|n| clamp_velocity(n, bounds)).collect()
}

/// Append snare ghost notes on odd sixteenths (the "e" and "a" of each beat)
/// that have no snare hit yet, up to the last note's onset.
///
/// Ghosts are appended after the existing notes; the pipeline's final stable
/// sort puts them in place.
fn add_ghost_notes(
    mut notes: Vec<NoteEvent>,
    bounds: VelocityBounds,
    rng: &mut NoteRng,
) -> Vec<NoteEvent> {
    let snare = DrumKind::Snare.gm_key();
    let mut snare_times: Vec<f64> = notes
        .iter()
        .filter(|n| n.is_percussive() && n.pitch == snare)
        .map(|n| n.time)
        .collect();
    snare_times.sort_by(f64::total_cmp);
    let near_snare = |time: f64| {
        let i = snare_times.partition_point(|t| *t <= time - POSITION_TOLERANCE);
        snare_times.get(i).is_some_and(|t| *t < time + POSITION_TOLERANCE)
    };

    // Note times are capped at MAX_NOTE_TIME, so this stays bounded.
    let max_time = notes.iter().map(|n| n.time).fold(0.0, f64::max);
    let last_slot = (max_time * SIXTEENTHS_PER_BEAT).floor() as u64;

    let mut ghosts = Vec::new();
    for slot in 0..=last_slot {
        let time = slot as f64 / SIXTEENTHS_PER_BEAT;
        if near_snare(time) {
            continue;
        }
        let odd_sixteenth = slot % 2 == 1;
        if odd_sixteenth && rng.random_bool(GHOST_NOTE_PROBABILITY) {
            let velocity = rng.range_i32_inclusive(GHOST_VELOCITY.0, GHOST_VELOCITY.1);
            ghosts.push(NoteEvent::drum(DrumKind::Snare, time, bounds.clamp(velocity as i64)));
        }
    }

    notes.extend(ghosts);
    notes
}
