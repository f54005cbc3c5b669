// NextBeat core: note-event post-processing and MIDI serialization.
//
// Takes a sparse primer (a couple of bars of note events from an external
// primer source), turns it into a timing-accurate, stylized performance, and
// writes it out as a Standard MIDI File. Prompting for the primer and the
// continuation model are external; they meet this crate at `primer.rs` and
// `continuation.rs`.
//
// Architecture:
// - note.rs: NoteEvent value type, GM drum map, instrument tag, velocity bounds
// - quantize.rs: grid snapping; produces the grid-aligned `QuantizedNotes`
// - style.rs: keyword classification of style text into a `StyleCategory`
// - transform.rs: swing, rock/funk accents, funk ghost notes, reggae offbeats
// - humanize.rs: bounded Gaussian timing and uniform velocity jitter
// - pipeline.rs: quantize -> style -> humanize -> stable sort
// - sequence.rs: tempo-stamped, sorted `NoteSequence` with derived length
// - midi.rs: SMF Format 0 encoding (tick conversion, event interleaving)
// - primer.rs: untrusted primer records -> validated NoteEvents
// - continuation.rs: `ContinuationSource` seam with primer-only fallback
// - generate.rs: request validation and end-to-end orchestration
// - config.rs: JSON-loadable `Settings`
// - error.rs: crate error type
//
// Randomness (humanizer, ghost notes) always comes from a `NoteRng` passed in
// by the caller, so output is reproducible given a seed.

pub mod config;
pub mod continuation;
pub mod error;
pub mod generate;
pub mod humanize;
pub mod midi;
pub mod note;
pub mod pipeline;
pub mod primer;
pub mod quantize;
pub mod sequence;
pub mod style;
pub mod transform;

pub use error::{Error, Result};
