// NextBeat CLI entry point.
//
// Reads a primer (JSON array of note records), post-processes it for the
// requested style, and writes the resulting MIDI file. No continuation model
// is wired in here, so the output is the polished primer.
//
// Usage:
//   nextbeat <primer.json> [--style TEXT] [--instrument NAME] [--tempo BPM]
//     [--bars N] [--primer-bars N] [--temperature T] [--seed N]
//     [--config FILE] [--out-dir DIR]
//
// Set RUST_LOG (e.g. RUST_LOG=debug) to change log verbosity.

use nextbeat_core::config::Settings;
use nextbeat_core::continuation::PrimerOnly;
use nextbeat_core::generate::{GenerationRequest, Generator};
use nextbeat_core::note::Instrument;
use nextbeat_core::primer::load_primer_records;
use nextbeat_prng::NoteRng;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> nextbeat_core::Result<()> {
    let Some(primer_path) = args.get(1).filter(|s| !s.starts_with("--")) else {
        eprintln!(
            "Usage: nextbeat <primer.json> [--style TEXT] [--instrument NAME] [--tempo BPM] ..."
        );
        std::process::exit(2);
    };

    let mut settings = match parse_flag::<PathBuf>(args, "--config") {
        Some(path) => Settings::load(&path)?,
        None => Settings::default(),
    };
    if let Some(dir) = parse_flag::<PathBuf>(args, "--out-dir") {
        settings.output_dir = dir;
    }

    let instrument: Instrument = parse_flag::<String>(args, "--instrument")
        .unwrap_or_else(|| "drums".to_string())
        .parse()?;
    let style: String = parse_flag(args, "--style").unwrap_or_default();

    let mut request = GenerationRequest::new(style, instrument, &settings);
    if let Some(tempo) = parse_flag(args, "--tempo") {
        request.tempo_bpm = tempo;
    }
    if let Some(bars) = parse_flag(args, "--bars") {
        request.bars = bars;
    }
    if let Some(primer_bars) = parse_flag(args, "--primer-bars") {
        request.primer_bars = primer_bars;
    }
    if let Some(temperature) = parse_flag(args, "--temperature") {
        request.temperature = temperature;
    }

    let seed: u64 = parse_flag(args, "--seed").unwrap_or_else(clock_seed);

    println!("=== NextBeat ===");
    println!("Primer: {primer_path}");
    println!("Style: {:?}", request.prompt);
    println!("Instrument: {}", request.instrument);
    println!("Tempo: {} BPM", request.tempo_bpm);
    println!("Seed: {seed}");
    println!();

    let records = load_primer_records(Path::new(primer_path))?;
    let generator = Generator::new(&settings, Box::new(PrimerOnly));
    let mut rng = NoteRng::new(seed);
    let report = generator.run(request, &records, &mut rng)?;

    println!("Style category: {}", report.style);
    println!(
        "Notes: {} ({} primer, {} generated)",
        report.total_notes, report.primer_notes, report.generated_notes
    );
    println!("Duration: {:.2}s", report.duration_seconds);
    println!("Wrote {} ({} bytes)", report.path.display(), report.midi.len());
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn parse_flag<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|v| v.parse().ok())
}
