// Humanization: small random timing and velocity variations.
//
// Runs after the style transforms so it never disturbs an intentional groove.
// Timing offsets are Gaussian (mean 0, standard deviation `timing / 2`),
// clipped to `[-timing, timing]`, and never push a note before 0. Velocity
// offsets are uniform integers in `[-velocity, velocity]`, clamped into the
// velocity bounds. Randomness comes from the caller's `NoteRng`.

use crate::note::{NoteEvent, VelocityBounds, clamp_time};
use nextbeat_prng::NoteRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanizeParams {
    /// Maximum timing offset in beats.
    pub timing: f64,
    /// Maximum velocity offset.
    pub velocity: u8,
}

impl Default for HumanizeParams {
    fn default() -> Self {
        HumanizeParams {
            timing: 0.015,
            velocity: 8,
        }
    }
}

/// Jitter every note's time and velocity.
///
/// Draws one Gaussian timing sample then one velocity sample per note, in
/// input order.
pub fn humanize(
    notes: &[NoteEvent],
    params: HumanizeParams,
    bounds: VelocityBounds,
    rng: &mut NoteRng,
) -> Vec<NoteEvent> {
    let timing = if params.timing.is_finite() {
        params.timing.max(0.0)
    } else {
        0.0
    };
    let velocity_span = params.velocity as i32;

    notes
        .iter()
        .map(|note| {
            let time_offset = rng.gaussian(0.0, timing / 2.0).clamp(-timing, timing);
            let vel_offset = rng.range_i32_inclusive(-velocity_span, velocity_span);
            NoteEvent {
                time: clamp_time(note.time + time_offset),
                velocity: bounds.clamp(note.velocity as i64 + vel_offset as i64),
                ..*note
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::DrumKind;

    fn grid_of_notes() -> Vec<NoteEvent> {
        (0..64)
            .map(|i| NoteEvent::pitched(60 + (i % 12) as u8, i as f64 * 0.25, 0.5, 40 + i as u8))
            .collect()
    }

    #[test]
    fn offsets_stay_within_bounds() {
        let input = grid_of_notes();
        let params = HumanizeParams::default();
        let bounds = VelocityBounds::default();
        for seed in 0..50 {
            let out = humanize(&input, params, bounds, &mut NoteRng::new(seed));
            assert_eq!(out.len(), input.len());
            for (before, after) in input.iter().zip(&out) {
                assert!(after.time >= 0.0);
                assert!((after.time - before.time).abs() <= params.timing + 1e-12);
                assert!(bounds.contains(after.velocity));
                let dv = after.velocity as i32 - bounds.clamp(before.velocity as i64) as i32;
                assert!(dv.abs() <= params.velocity as i32);
                assert_eq!(after.pitch, before.pitch);
                assert_eq!(after.duration, before.duration);
            }
        }
    }

    #[test]
    fn never_moves_before_zero() {
        let input = vec![NoteEvent::drum(DrumKind::Kick, 0.0, 100); 200];
        let params = HumanizeParams {
            timing: 0.5,
            velocity: 0,
        };
        let out = humanize(&input, params, VelocityBounds::default(), &mut NoteRng::new(11));
        assert!(out.iter().all(|n| n.time >= 0.0));
        assert!(out.iter().any(|n| n.time > 0.0));
        assert!(out.iter().all(|n| n.velocity == 100));
    }

    #[test]
    fn zero_bounds_leave_notes_unchanged() {
        let input = grid_of_notes();
        let params = HumanizeParams {
            timing: 0.0,
            velocity: 0,
        };
        let bounds = VelocityBounds::new(1, 127);
        let out = humanize(&input, params, bounds, &mut NoteRng::new(2));
        assert_eq!(out, input);
    }

    #[test]
    fn same_seed_same_performance() {
        let input = grid_of_notes();
        let params = HumanizeParams::default();
        let bounds = VelocityBounds::default();
        let a = humanize(&input, params, bounds, &mut NoteRng::new(77));
        let b = humanize(&input, params, bounds, &mut NoteRng::new(77));
        assert_eq!(a, b);
    }

    #[test]
    fn velocity_is_clamped_even_if_input_is_out_of_range() {
        let input = vec![NoteEvent::drum(DrumKind::Crash, 1.0, 127)];
        let out = humanize(
            &input,
            HumanizeParams::default(),
            VelocityBounds::default(),
            &mut NoteRng::new(4),
        );
        assert!(out[0].velocity <= 120);
    }
}
