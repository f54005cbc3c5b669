// End-to-end tests: primer notes through post-processing, assembly, and MIDI
// encoding, checked by re-parsing the output with midly.

use midly::{MetaMessage, MidiMessage, Smf, TrackEventKind};
use nextbeat_core::config::Settings;
use nextbeat_core::continuation::{ContinuationRequest, ContinuationSource, PrimerOnly};
use nextbeat_core::generate::{GenerationRequest, Generator};
use nextbeat_core::midi::encode;
use nextbeat_core::note::{DrumKind, Instrument, NoteEvent};
use nextbeat_core::pipeline::post_process;
use nextbeat_core::primer::parse_primer_records;
use nextbeat_core::sequence::assemble;
use nextbeat_core::style::StyleCategory;
use nextbeat_prng::NoteRng;

/// (absolute tick, channel, key, velocity, is_note_on) for each note event.
fn note_events(bytes: &[u8]) -> Vec<(u32, u8, u8, u8, bool)> {
    let smf = Smf::parse(bytes).unwrap();
    assert_eq!(smf.tracks.len(), 1);
    let mut tick = 0;
    let mut out = Vec::new();
    for ev in &smf.tracks[0] {
        tick += ev.delta.as_int();
        if let TrackEventKind::Midi { channel, message } = ev.kind {
            match message {
                MidiMessage::NoteOn { key, vel } => {
                    out.push((tick, channel.as_int(), key.as_int(), vel.as_int(), true))
                }
                MidiMessage::NoteOff { key, vel } => {
                    out.push((tick, channel.as_int(), key.as_int(), vel.as_int(), false))
                }
                _ => {}
            }
        }
    }
    out
}

#[test]
fn single_kick_rock_at_120() {
    let settings = Settings::default();
    let primer = vec![NoteEvent::drum(DrumKind::Kick, 0.0, 100)];

    for seed in 0..50 {
        let mut rng = NoteRng::new(seed);
        let processed = post_process(&primer, "rock", Instrument::Drums, &settings, &mut rng);
        assert_eq!(processed.len(), 1);
        let kick = processed[0];
        // Rock accent makes it 115; humanizing moves it at most 8, capped at 120.
        assert!((107..=120).contains(&kick.velocity), "velocity {}", kick.velocity);
        assert!(kick.time <= settings.humanize_timing);

        let sequence = assemble(processed, 120).unwrap();
        let events = note_events(&encode(&sequence).unwrap());
        assert_eq!(events.len(), 2);
        let (on_tick, on_ch, on_key, on_vel, is_on) = events[0];
        assert!(is_on);
        assert_eq!((on_ch, on_key, on_vel), (9, 36, kick.velocity));
        // 0.015 beats of jitter is at most 7 ticks.
        assert!(on_tick <= 7);
        let (off_tick, off_ch, off_key, _, is_on) = events[1];
        assert!(!is_on);
        assert_eq!((off_ch, off_key), (9, 36));
        assert_eq!(off_tick - on_tick, 48);
    }
}

#[test]
fn single_kick_without_jitter_lands_on_tick_zero() {
    let settings = Settings {
        humanize_timing: 0.0,
        humanize_velocity: 0,
        ..Settings::default()
    };
    let primer = vec![NoteEvent::drum(DrumKind::Kick, 0.0, 100)];
    let mut rng = NoteRng::new(1);
    let processed = post_process(&primer, "rock", Instrument::Drums, &settings, &mut rng);
    assert_eq!(processed[0].velocity, 115);
    let events = note_events(&encode(&assemble(processed, 120).unwrap()).unwrap());
    assert_eq!(events, vec![(0, 9, 36, 115, true), (48, 9, 36, 0, false)]);
}

#[test]
fn empty_primer_gives_valid_empty_file() {
    let settings = Settings::default();
    let mut rng = NoteRng::new(0);
    let processed = post_process(&[], "anything", Instrument::Piano, &settings, &mut rng);
    assert!(processed.is_empty());

    let bytes = encode(&assemble(processed, 120).unwrap()).unwrap();
    let smf = Smf::parse(&bytes).unwrap();
    let kinds: Vec<TrackEventKind> = smf.tracks[0].iter().map(|e| e.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(matches!(
        kinds[0],
        TrackEventKind::Meta(MetaMessage::Tempo(t)) if t.as_int() == 500_000
    ));
    assert!(matches!(kinds[1], TrackEventKind::Meta(MetaMessage::EndOfTrack)));
}

#[test]
fn jazz_piano_swings_the_upbeat() {
    assert_eq!(StyleCategory::classify("1920s jazz piano"), StyleCategory::Swing);

    let settings = Settings {
        humanize_timing: 0.0,
        ..Settings::default()
    };
    let primer = vec![
        NoteEvent::pitched(60, 0.0, 0.5, 80),
        NoteEvent::pitched(64, 0.5, 0.5, 80),
        NoteEvent::pitched(67, 2.5, 0.5, 80),
    ];
    let mut rng = NoteRng::new(4);
    let processed = post_process(
        &primer,
        "1920s jazz piano",
        Instrument::Piano,
        &settings,
        &mut rng,
    );
    let times: Vec<f64> = processed.iter().map(|n| n.time).collect();
    assert!((times[0] - 0.0).abs() < 1e-9);
    assert!((times[1] - 0.66).abs() < 1e-9);
    assert!((times[2] - 2.66).abs() < 1e-9);
}

#[test]
fn swing_survives_into_ticks() {
    let settings = Settings {
        humanize_timing: 0.0,
        humanize_velocity: 0,
        ..Settings::default()
    };
    let primer = vec![NoteEvent::pitched(64, 0.5, 0.5, 80)];
    let mut rng = NoteRng::new(4);
    let processed = post_process(&primer, "bebop", Instrument::Piano, &settings, &mut rng);
    let events = note_events(&encode(&assemble(processed, 120).unwrap()).unwrap());
    // 0.66 beats = 316.8 ticks -> 317.
    assert_eq!(events[0], (317, 0, 64, 80, true));
    assert_eq!(events[1].0, 317 + 240);
}

#[test]
fn funk_drums_round_trip_through_midi() {
    let settings = Settings::default();
    let mut primer = Vec::new();
    for bar in 0..2 {
        let base = bar as f64 * 4.0;
        for beat in 0..4 {
            primer.push(NoteEvent::drum(DrumKind::Hihat, base + beat as f64, 70));
        }
        primer.push(NoteEvent::drum(DrumKind::Kick, base, 100));
        primer.push(NoteEvent::drum(DrumKind::Snare, base + 1.0, 95));
        primer.push(NoteEvent::drum(DrumKind::Snare, base + 3.0, 95));
    }

    let mut rng = NoteRng::new(2024);
    let processed = post_process(&primer, "70s funk", Instrument::Drums, &settings, &mut rng);
    assert!(processed.len() >= primer.len());
    assert!(processed.windows(2).all(|w| w[0].time <= w[1].time));

    let sequence = assemble(processed.clone(), 100).unwrap();
    let events = note_events(&encode(&sequence).unwrap());
    assert_eq!(events.len(), processed.len() * 2);
    assert!(events.iter().all(|e| e.1 == 9));

    let ons: Vec<u32> = events.iter().filter(|e| e.4).map(|e| e.0).collect();
    let expected: Vec<u32> = sequence
        .notes()
        .iter()
        .map(|n| (n.time * 480.0).round() as u32)
        .collect();
    let mut ons_sorted = ons.clone();
    ons_sorted.sort_unstable();
    let mut expected_sorted = expected;
    expected_sorted.sort_unstable();
    assert_eq!(ons_sorted, expected_sorted);
}

/// Repeats the primer bar-by-bar to the requested length.
struct Looper;

impl ContinuationSource for Looper {
    fn name(&self) -> &str {
        "looper"
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn extend(&self, primer: &[NoteEvent], request: &ContinuationRequest) -> Vec<NoteEvent> {
        let span = request.primer_bars as f64 * 4.0;
        let repeats = request.total_bars / request.primer_bars.max(1);
        (0..repeats)
            .flat_map(|r| primer.iter().map(move |n| n.with_time(n.time + r as f64 * span)))
            .collect()
    }
}

#[test]
fn generator_with_continuation_reports_generated_notes() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        output_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let records = parse_primer_records(
        r#"[{"pitch": 60, "time": 0.0, "duration": 1.0, "velocity": 80},
            {"pitch": 64, "time": 1.0, "duration": 1.0, "velocity": 80},
            {"pitch": 67, "time": 2.0, "duration": 2.0, "velocity": 80}]"#,
    )
    .unwrap();

    let generator = Generator::new(&settings, Box::new(Looper));
    let request = GenerationRequest {
        bars: 4,
        primer_bars: 1,
        ..GenerationRequest::new("classical melody", Instrument::Piano, &settings)
    };
    let report = generator.run(request, &records, &mut NoteRng::new(12)).unwrap();

    assert_eq!(report.primer_notes, 3);
    assert_eq!(report.total_notes, 12);
    assert_eq!(report.generated_notes, 9);
    assert_eq!(report.style, StyleCategory::Neutral);
    // 16 beats at 120 BPM, give or take the humanizer.
    assert!((report.duration_seconds - 8.0).abs() < 0.05);
    assert!(report.path.starts_with(dir.path()));
    assert_eq!(std::fs::read(&report.path).unwrap(), report.midi);
}

#[test]
fn generator_is_reproducible_for_a_seed() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        output_dir: dir.path().to_path_buf(),
        ..Settings::default()
    };
    let records = parse_primer_records(
        r#"[{"drum": "kick", "time": 0.0, "velocity": 100},
            {"drum": "snare", "time": 1.02, "velocity": 90},
            {"drum": "hihat", "time": 1.49, "velocity": 60}]"#,
    )
    .unwrap();
    let generator = Generator::new(&settings, Box::new(PrimerOnly));
    let request = GenerationRequest::new("funk", Instrument::Drums, &settings);

    let a = generator.run(request.clone(), &records, &mut NoteRng::new(77)).unwrap();
    let b = generator.run(request, &records, &mut NoteRng::new(77)).unwrap();
    assert_eq!(a.midi, b.midi);
    assert_eq!(a.filename, b.filename);
}
