// Error taxonomy for the NextBeat core.
//
// Only boundaries fail: the sequence assembler (tempo), the MIDI encoder's
// sink, and request/primer/config validation. Every pipeline stage in
// between is total and clamps malformed numbers instead of erroring.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("tempo {0} BPM is outside the supported range 1..=1000")]
    InvalidTempo(u32),
    #[error("failed to write MIDI output: {0}")]
    Encoding(#[from] std::io::Error),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid primer: {0}")]
    Primer(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
