// End-to-end melody requests against stub oracles.
//
// Covers the full path from request to parsed MIDI bytes: constant
// predictions at two tempos, an oracle that fails immediately, and the
// track layout of the composed file.

use midly::{MidiMessage, Smf, TrackEventKind};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use tunesmith_music::bass::{CHORD_PROGRESSION, arrange_bass};
use tunesmith_music::config::NormalizationParams;
use tunesmith_music::note::total_duration;
use tunesmith_music::window::ContextWindow;
use tunesmith_music::{
    Genre, MelodyNote, MelodyRequest, MelodyResponse, MelodyService, NoteSpan, Oracle,
    OracleError, OracleOutput,
};

/// Always predicts E4, step 0.5, duration 0.4, and records every window.
struct RecordingOracle {
    seen: Arc<Mutex<Vec<ContextWindow>>>,
}

impl Oracle for RecordingOracle {
    fn infer(&mut self, window: &ContextWindow) -> Result<OracleOutput, OracleError> {
        self.seen.lock().unwrap().push(window.clone());
        Ok(OracleOutput::certain(64, 0.5, 0.4))
    }
}

struct BrokenOracle;

impl Oracle for BrokenOracle {
    fn infer(&mut self, _window: &ContextWindow) -> Result<OracleOutput, OracleError> {
        Err(OracleError::Inference("model not reachable".to_string()))
    }
}

fn params() -> NormalizationParams {
    NormalizationParams {
        vocab_size: 128,
        max_step: 2.0,
        max_duration: 1.5,
    }
}

fn run_recorded(tempo: u32) -> (MelodyResponse, Vec<ContextWindow>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let oracle = RecordingOracle { seen: seen.clone() };
    let mut service = MelodyService::new(Some(Box::new(oracle)), params());
    let response = service.generate_melody(&MelodyRequest {
        tempo,
        genre: "pop".to_string(),
        bars: 8,
        temperature: 1.1,
        seed: Some(2024),
    });
    let windows = seen.lock().unwrap().clone();
    (response, windows)
}

fn model_notes(response: &MelodyResponse) -> Vec<tunesmith_music::GeneratedNote> {
    response
        .notes
        .iter()
        .map(|n| match n {
            MelodyNote::ModelGenerated(g) => *g,
            MelodyNote::Fallback(_) => panic!("expected model-generated notes"),
        })
        .collect()
}

fn note_on_keys(smf: &Smf<'_>, track: usize) -> Vec<u8> {
    smf.tracks[track]
        .iter()
        .filter_map(|e| match e.kind {
            TrackEventKind::Midi {
                message: MidiMessage::NoteOn { key, .. },
                ..
            } => Some(key.as_int()),
            _ => None,
        })
        .collect()
}

#[test]
fn constant_oracle_at_reference_tempo() {
    let (response, windows) = run_recorded(120);
    let notes = model_notes(&response);

    assert_eq!(notes.len(), 48);
    assert_eq!(windows.len(), 48);
    assert_eq!(notes[0].pitch, 64);
    assert_eq!(notes[0].start, 0.5);
    assert_eq!(notes[0].end, 0.875);
    for pair in notes.windows(2) {
        assert!(pair[0].start <= pair[1].start);
    }
    assert!(notes.iter().all(|n| n.end >= n.start));
}

#[test]
fn doubling_tempo_halves_timing_but_not_the_window() {
    let (slow, slow_windows) = run_recorded(120);
    let (fast, fast_windows) = run_recorded(240);
    let slow_notes = model_notes(&slow);
    let fast_notes = model_notes(&fast);

    assert_eq!(fast_notes[0].start, 0.25);
    assert_eq!(fast_notes[0].end, 0.4375);
    for (s, f) in slow_notes.iter().zip(&fast_notes) {
        assert_eq!(f.step, s.step / 2.0);
        assert_eq!(f.duration, s.duration / 2.0);
        assert_eq!(f.start, s.start / 2.0);
    }

    assert_eq!(slow_windows, fast_windows);
    let fed_back = fast_windows[1].latest().copied().unwrap();
    assert_eq!(fed_back.pitch, 0.5);
    assert_eq!(fed_back.step, 0.25); // 0.5 / MAX_STEP
    assert_eq!(fed_back.duration, 0.25); // 0.375 / MAX_DURATION
}

#[test]
fn failing_oracle_falls_back_to_demo_melody() {
    let mut service = MelodyService::new(Some(Box::new(BrokenOracle)), params());
    let response = service.generate_melody(&MelodyRequest {
        seed: Some(7),
        ..MelodyRequest::default()
    });

    assert_eq!(response.notes.len(), 48);
    assert!(response.notes.iter().all(MelodyNote::is_fallback));

    let template = Genre::Pop.demo_template();
    for (i, note) in response.notes.iter().enumerate() {
        let MelodyNote::Fallback(demo) = note else {
            unreachable!()
        };
        assert!(template.scale.contains(&demo.pitch));
        let base = template.rhythm[i % template.rhythm.len()];
        assert!(demo.step >= base * 0.9 - 0.001 && demo.step <= base * 1.1 + 0.001);
    }
    assert!(!response.midi.is_empty());
}

#[test]
fn composed_file_round_trips_track_contents() {
    let (response, _) = run_recorded(120);
    let smf = Smf::parse(&response.midi).unwrap();
    assert_eq!(smf.tracks.len(), 4);

    let spans: Vec<NoteSpan> = response.notes.iter().map(|n| n.span(response.tempo)).collect();
    let expected_bass = arrange_bass(total_duration(&spans), 120);

    let melody_keys = note_on_keys(&smf, 1);
    assert_eq!(melody_keys.len(), response.notes.len());
    assert!(melody_keys.iter().all(|&k| k == 64));

    let bass_keys = note_on_keys(&smf, 2);
    assert_eq!(bass_keys.len(), expected_bass.len());
    let roots: Vec<u8> = bass_keys.iter().step_by(2).copied().collect();
    let cycled: Vec<u8> = CHORD_PROGRESSION.iter().copied().cycle().take(roots.len()).collect();
    assert_eq!(roots, cycled);

    assert!(!note_on_keys(&smf, 3).is_empty());
}

#[test]
fn demo_mode_and_seeds_are_reproducible() {
    let mut a = MelodyService::new(None, NormalizationParams::default());
    let mut b = MelodyService::new(None, NormalizationParams::default());
    let request = MelodyRequest {
        genre: "rock".to_string(),
        tempo: 150,
        bars: 4,
        seed: Some(99),
        ..MelodyRequest::default()
    };
    assert_eq!(a.generate_melody(&request), b.generate_melody(&request));
}
