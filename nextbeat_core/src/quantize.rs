// Grid quantization.
//
// Snaps note onsets (and pitched durations) to the nearest multiple of a
// grid subdivision. Primer data is imprecise (0.498 where 0.5 was meant), and
// every style transform downstream detects beat positions with a 0.01-beat
// tolerance, so they only work on grid-aligned input.
//
// That precondition is carried in the type: `quantize` is the only way to
// build a `QuantizedNotes`, and the style transforms accept nothing else.

use crate::note::NoteEvent;

/// Sixteenth-note grid, in beats.
pub const DEFAULT_GRID: f64 = 0.25;

/// Notes whose onsets lie on a grid. Produced only by [`quantize`].
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedNotes {
    grid: f64,
    notes: Vec<NoteEvent>,
}

impl QuantizedNotes {
    pub fn grid(&self) -> f64 {
        self.grid
    }

    pub fn notes(&self) -> &[NoteEvent] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

/// Snap every note to `grid` beats.
///
/// `time` becomes `round(time / grid) * grid`; a pitched note's duration
/// becomes `max(grid, round(duration / grid) * grid)`. Drum hit durations are
/// fixed and left alone. Ties round to even, so 0.125 on a 0.25 grid lands on
/// 0.0. A grid that is not a positive normal number falls back to
/// [`DEFAULT_GRID`].
pub fn quantize(notes: &[NoteEvent], grid: f64) -> QuantizedNotes {
    let grid = if grid.is_normal() && grid > 0.0 {
        grid
    } else {
        DEFAULT_GRID
    };

    let notes = notes
        .iter()
        .map(|note| {
            let mut n = note.with_time(snap(note.time, grid));
            if !n.is_percussive() {
                n.duration = snap(note.duration, grid).max(grid);
            }
            n
        })
        .collect();

    QuantizedNotes { grid, notes }
}

/// Values too large to snap are returned unchanged.
fn snap(value: f64, grid: f64) -> f64 {
    let snapped = (value / grid).round_ties_even() * grid;
    if snapped.is_finite() { snapped } else { value }
}
