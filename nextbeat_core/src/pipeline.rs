// Post-processing pipeline: raw primer notes in, performance-ready notes out.
//
// Order matters:
// 1. Quantize: snap to the grid (clean up imprecise primer timing).
// 2. Style transform: intentional deviations (swing, accents, ghost notes).
// 3. Humanize: micro-variations so it does not sound mechanical.
// 4. Stable sort by onset, so equal-time notes keep their relative order.
//
// Total over any input; an empty list short-circuits to an empty list
// without touching the generator.

use crate::config::Settings;
use crate::humanize::humanize;
use crate::note::{Instrument, NoteEvent};
use crate::quantize::quantize;
use crate::style::StyleCategory;
use crate::transform::{StyleParams, apply_style};
use nextbeat_prng::NoteRng;
use tracing::{debug, info};

/// Run the full post-processing pipeline on primer notes.
pub fn post_process(
    notes: &[NoteEvent],
    style: &str,
    instrument: Instrument,
    settings: &Settings,
    rng: &mut NoteRng,
) -> Vec<NoteEvent> {
    if notes.is_empty() {
        return Vec::new();
    }

    info!(
        notes = notes.len(),
        %instrument,
        style,
        "post-processing primer"
    );

    let quantized = quantize(notes, settings.quantize_grid);
    debug!(notes = quantized.len(), grid = quantized.grid(), "quantized");

    let category = StyleCategory::classify(style);
    info!(%category, "detected style category");

    let params = StyleParams {
        swing_ratio: settings.swing_ratio,
        bounds: settings.velocity_bounds(),
    };
    let styled = apply_style(category, &quantized, instrument, &params, rng);
    debug!(notes = styled.len(), %category, "applied style transform");

    let mut processed = humanize(
        &styled,
        settings.humanize_params(),
        settings.velocity_bounds(),
        rng,
    );
    debug!(notes = processed.len(), "humanized");

    processed.sort_by(|a, b| a.time.total_cmp(&b.time));

    info!(notes = processed.len(), "post-processing complete");
    processed
}
