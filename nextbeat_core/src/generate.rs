// Request-level orchestration: one generation request, end to end.
//
// validate request -> validate primer records -> post-process ->
// continuation (primer-only fallback) -> assemble -> encode -> write file.
//
// A `Generator` is built once at startup from shared, read-only `Settings`
// and a continuation source. Each call to `run` owns everything else it
// touches, including its `NoteRng`, so concurrent requests share nothing
// mutable.

use crate::config::Settings;
use crate::continuation::{ContinuationRequest, ContinuationSource, continue_or_primer};
use crate::error::{Error, Result};
use crate::midi::write_midi_file;
use crate::note::Instrument;
use crate::pipeline::post_process;
use crate::primer::{PrimerRecord, validate_records};
use crate::sequence::assemble;
use crate::style::StyleCategory;
use nextbeat_prng::NoteRng;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, info_span};

pub const BARS_RANGE: std::ops::RangeInclusive<u32> = 1..=64;
pub const PRIMER_BARS_RANGE: std::ops::RangeInclusive<u32> = 1..=8;
pub const REQUEST_TEMPO_RANGE: std::ops::RangeInclusive<u32> = 40..=300;
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.1..=2.0;

/// One generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Free-text style description, e.g. "1920s jazz piano melody".
    pub prompt: String,
    pub instrument: Instrument,
    pub bars: u32,
    pub primer_bars: u32,
    pub tempo_bpm: u32,
    pub temperature: f64,
}

impl GenerationRequest {
    /// A request using the configured defaults for everything but the style
    /// and instrument.
    pub fn new(prompt: impl Into<String>, instrument: Instrument, settings: &Settings) -> Self {
        GenerationRequest {
            prompt: prompt.into(),
            instrument,
            bars: settings.default_bars,
            primer_bars: settings.default_primer_bars,
            tempo_bpm: settings.default_tempo,
            temperature: settings.default_temperature,
        }
    }

    /// Check every range and cap the primer at the total length.
    pub fn validate(mut self) -> Result<Self> {
        check_range("bars", self.bars, &BARS_RANGE)?;
        check_range("primer_bars", self.primer_bars, &PRIMER_BARS_RANGE)?;
        check_range("tempo", self.tempo_bpm, &REQUEST_TEMPO_RANGE)?;
        if !TEMPERATURE_RANGE.contains(&self.temperature) {
            return Err(Error::InvalidRequest(format!(
                "temperature {} outside {:?}",
                self.temperature, TEMPERATURE_RANGE
            )));
        }
        self.primer_bars = self.primer_bars.min(self.bars);
        Ok(self)
    }
}

fn check_range(name: &str, value: u32, range: &std::ops::RangeInclusive<u32>) -> Result<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidRequest(format!(
            "{name} {value} outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

/// Outcome of a successful request.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub request_id: String,
    pub filename: String,
    pub path: PathBuf,
    pub midi: Vec<u8>,
    pub total_notes: usize,
    pub primer_notes: usize,
    pub generated_notes: usize,
    /// Rounded to hundredths.
    pub duration_seconds: f64,
    pub style: StyleCategory,
    pub instrument: Instrument,
    pub tempo_bpm: u32,
    pub bars: u32,
}

pub struct Generator<'a> {
    settings: &'a Settings,
    continuation: Box<dyn ContinuationSource>,
}

impl<'a> Generator<'a> {
    pub fn new(settings: &'a Settings, continuation: Box<dyn ContinuationSource>) -> Self {
        Generator {
            settings,
            continuation,
        }
    }

    /// Run one request and write its MIDI file under `output_dir`.
    pub fn run(
        &self,
        request: GenerationRequest,
        records: &[PrimerRecord],
        rng: &mut NoteRng,
    ) -> Result<GenerationReport> {
        let request = request.validate()?;
        let request_id = format!("{:08x}", rng.next_u32());
        let _span = info_span!("generate", id = %request_id).entered();
        let started = Instant::now();
        info!(
            prompt = %request.prompt,
            instrument = %request.instrument,
            bars = request.bars,
            tempo = request.tempo_bpm,
            "generate request"
        );

        let bounds = self.settings.velocity_bounds();
        let primer = validate_records(records, request.instrument, request.primer_bars, bounds)?;
        let primer_notes = primer.len();

        let processed = post_process(
            &primer,
            &request.prompt,
            request.instrument,
            self.settings,
            rng,
        );

        let continuation_request = ContinuationRequest {
            instrument: request.instrument,
            total_bars: request.bars,
            primer_bars: request.primer_bars,
            tempo_bpm: request.tempo_bpm,
            temperature: request.temperature,
        };
        let performance = continue_or_primer(
            self.continuation.as_ref(),
            &processed,
            &continuation_request,
        );

        let sequence = assemble(performance, request.tempo_bpm)?;

        let filename = format!("nextbeat_{}_{}.mid", request.instrument, request_id);
        let dir = &self.settings.output_dir;
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&filename);
        let midi = write_midi_file(&sequence, &path)?;

        let total_notes = sequence.len();
        info!(
            notes = total_notes,
            path = %path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generate complete"
        );

        Ok(GenerationReport {
            request_id,
            filename,
            path,
            midi,
            total_notes,
            primer_notes,
            generated_notes: total_notes.saturating_sub(primer_notes),
            duration_seconds: (sequence.duration_seconds() * 100.0).round() / 100.0,
            style: StyleCategory::classify(&request.prompt),
            instrument: request.instrument,
            tempo_bpm: request.tempo_bpm,
            bars: request.bars,
        })
    }
}
