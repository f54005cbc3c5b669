// The continuation seam: extending a primer into a full-length part.
//
// The sequence-continuation model lives outside this crate. It is modelled as
// an explicitly constructed service behind `ContinuationSource`, handed to
// the generator at startup, with its own readiness state. When it is not
// ready, or returns something shorter than the primer, the generator keeps
// the primer alone so a request still produces playable output.

use crate::note::{Instrument, NoteEvent};
use tracing::{info, warn};

/// What a continuation source is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuationRequest {
    pub instrument: Instrument,
    pub total_bars: u32,
    pub primer_bars: u32,
    pub tempo_bpm: u32,
    pub temperature: f64,
}

/// A model that extends a primer to a longer performance.
///
/// `extend` returns the whole performance, primer included.
pub trait ContinuationSource: Send + Sync {
    fn name(&self) -> &str;

    fn is_ready(&self) -> bool;

    fn extend(&self, primer: &[NoteEvent], request: &ContinuationRequest) -> Vec<NoteEvent>;
}

/// Always-ready source that returns the primer unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimerOnly;

impl ContinuationSource for PrimerOnly {
    fn name(&self) -> &str {
        "primer-only"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn extend(&self, primer: &[NoteEvent], _request: &ContinuationRequest) -> Vec<NoteEvent> {
        primer.to_vec()
    }
}

/// Extend `primer` with `source`, falling back to the primer alone.
pub fn continue_or_primer(
    source: &dyn ContinuationSource,
    primer: &[NoteEvent],
    request: &ContinuationRequest,
) -> Vec<NoteEvent> {
    if !source.is_ready() {
        warn!(source = source.name(), "continuation source not ready, returning primer only");
        return primer.to_vec();
    }

    let extended = source.extend(primer, request);
    if extended.len() < primer.len() {
        warn!(
            source = source.name(),
            returned = extended.len(),
            primer = primer.len(),
            "continuation dropped primer notes, returning primer only"
        );
        return primer.to_vec();
    }

    info!(
        source = source.name(),
        generated = extended.len() - primer.len(),
        "continuation complete"
    );
    extended
}
