// The constrained generation loop.
//
// One oracle call per note. Each raw prediction is snapped to the genre's
// scale and quantized to the rhythm grid, then split two ways:
//
// - the emitted note is tempo-scaled and placed on an absolute timeline
//   (start = previous start + step, end = start + duration);
// - the feedback entry pushed into the context window keeps the
//   reference-tempo values, normalized by the same params as the seed.
//
// Keeping the window tempo-free is what lets one oracle serve every tempo:
// the same prediction trace produces the same windows at 60 BPM and 200 BPM,
// and only the emitted timeline stretches.
//
// Every 16 notes the sampling temperature flips between 0.9 and 1.2 to
// break up the loops a recurrent oracle tends to fall into.
//
// All loop state (window, time cursor, temperature) is local to one
// `generate` call; a `NoteSequencer` carries only read-only settings.

use crate::config::{
    MIN_NOTE_VALUE, NormalizationParams, QUANTIZE_GRID, TEMPERATURE_TOGGLE_INTERVAL,
};
use crate::error::OracleError;
use crate::genre::Genre;
use crate::note::GeneratedNote;
use crate::oracle::{Oracle, predict_next_note};
use crate::rhythm::quantize;
use crate::scale::Scale;
use crate::tempo::tempo_scale;
use crate::window::{ContextWindow, NormalizedNote};
use tracing::{debug, info};
use tunesmith_prng::TuneRng;

const COOL_TEMPERATURE: f64 = 0.9;
const WARM_TEMPERATURE: f64 = 1.2;

#[derive(Debug, Clone, Copy)]
pub struct NoteSequencer<'a> {
    params: &'a NormalizationParams,
    scale: Scale,
    tempo_scale: f64,
}

/// Mutable state threaded through one generation run.
struct SequencerState {
    window: ContextWindow,
    cursor: f64,
    temperature: f64,
}

impl<'a> NoteSequencer<'a> {
    pub fn new(genre: Genre, tempo: u32, params: &'a NormalizationParams) -> Self {
        let scale = genre.scale();
        debug!(genre = genre.name(), ?scale, "sequencer scale");
        NoteSequencer {
            params,
            scale,
            tempo_scale: tempo_scale(tempo),
        }
    }

    pub fn tempo_scale(&self) -> f64 {
        self.tempo_scale
    }

    /// Generate exactly `total_notes` notes starting from `seed`.
    ///
    /// Any oracle failure aborts the whole run; there is no per-note retry.
    pub fn generate(
        &self,
        oracle: &mut dyn Oracle,
        total_notes: usize,
        seed: ContextWindow,
        temperature: f64,
        rng: &mut TuneRng,
    ) -> Result<Vec<GeneratedNote>, OracleError> {
        self.run(oracle, total_notes, seed, temperature, rng, |_| {})
    }

    /// The generation loop. `on_query` sees the temperature used for each
    /// oracle call, in order.
    fn run(
        &self,
        oracle: &mut dyn Oracle,
        total_notes: usize,
        seed: ContextWindow,
        temperature: f64,
        rng: &mut TuneRng,
        mut on_query: impl FnMut(f64),
    ) -> Result<Vec<GeneratedNote>, OracleError> {
        let mut state = SequencerState {
            window: seed,
            cursor: 0.0,
            temperature,
        };
        let mut notes = Vec::with_capacity(total_notes);

        for i in 0..total_notes {
            on_query(state.temperature);
            let raw = predict_next_note(oracle, &state.window, state.temperature, rng)?;

            let pitch = self.scale.snap(raw.pitch);
            let step = quantize(raw.step, QUANTIZE_GRID).max(MIN_NOTE_VALUE);
            let duration = quantize(raw.duration, QUANTIZE_GRID).max(MIN_NOTE_VALUE);

            let scaled_step = step * self.tempo_scale;
            let scaled_duration = duration * self.tempo_scale;
            let start = state.cursor + scaled_step;
            notes.push(GeneratedNote {
                pitch,
                start,
                end: start + scaled_duration,
                step: scaled_step,
                duration: scaled_duration,
            });
            state.cursor = start;

            state
                .window
                .push(NormalizedNote::from_note(pitch, step, duration, self.params));

            if i > 0 && i % TEMPERATURE_TOGGLE_INTERVAL == 0 {
                state.temperature = toggled_temperature(state.temperature);
            }
        }

        info!(
            notes = notes.len(),
            tempo_scale = self.tempo_scale,
            "generated melody from oracle"
        );
        Ok(notes)
    }
}

fn toggled_temperature(current: f64) -> f64 {
    if current > 1.0 {
        COOL_TEMPERATURE
    } else {
        WARM_TEMPERATURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SEQ_LENGTH;
    use crate::oracle::OracleOutput;
    use crate::seed::generate_seed;

    /// Cycles through a fixed list of outputs.
    struct Scripted {
        outputs: Vec<OracleOutput>,
        calls: usize,
    }

    impl Oracle for Scripted {
        fn infer(&mut self, _window: &ContextWindow) -> Result<OracleOutput, OracleError> {
            let out = self.outputs[self.calls % self.outputs.len()].clone();
            self.calls += 1;
            Ok(out)
        }
    }

    struct FailsAfter(usize);

    impl Oracle for FailsAfter {
        fn infer(&mut self, _window: &ContextWindow) -> Result<OracleOutput, OracleError> {
            if self.0 == 0 {
                return Err(OracleError::Inference("model crashed".to_string()));
            }
            self.0 -= 1;
            Ok(OracleOutput::certain(60, 0.5, 0.5))
        }
    }

    fn run(
        oracle: &mut dyn Oracle,
        tempo: u32,
        n: usize,
    ) -> Result<Vec<GeneratedNote>, OracleError> {
        let params = NormalizationParams::default();
        let seq = NoteSequencer::new(Genre::Pop, tempo, &params);
        let seed = generate_seed(Genre::Pop, SEQ_LENGTH, &params);
        seq.generate(oracle, n, seed, 1.1, &mut TuneRng::new(7))
    }

    #[test]
    fn constant_prediction_at_reference_tempo() {
        let mut oracle = Scripted {
            outputs: vec![OracleOutput::certain(64, 0.5, 0.4)],
            calls: 0,
        };
        let notes = run(&mut oracle, 120, 3).unwrap();
        assert_eq!(oracle.calls, 3);
        assert_eq!(notes[0].pitch, 64);
        assert_eq!(notes[0].start, 0.5);
        assert_eq!(notes[0].end, 0.875);
        assert_eq!(notes[1].start, 1.0);
        assert_eq!(notes[2].start, 1.5);
    }

    #[test]
    fn out_of_scale_pitches_are_snapped_and_silence_is_floored() {
        let mut oracle = Scripted {
            outputs: vec![OracleOutput::certain(61, 0.0, 0.02)],
            calls: 0,
        };
        let notes = run(&mut oracle, 120, 2).unwrap();
        assert_eq!(notes[0].pitch, 60);
        assert_eq!(notes[0].step, MIN_NOTE_VALUE);
        assert_eq!(notes[0].duration, MIN_NOTE_VALUE);
        assert_eq!(notes[1].start, 0.25);
    }

    #[test]
    fn output_is_ordered_and_complete() {
        let mut oracle = Scripted {
            outputs: vec![
                OracleOutput::certain(70, 0.3, 1.7),
                OracleOutput::certain(55, 0.0, 0.0),
                OracleOutput::certain(81, 1.1, 0.6),
            ],
            calls: 0,
        };
        let notes = run(&mut oracle, 97, 50).unwrap();
        assert_eq!(notes.len(), 50);
        for pair in notes.windows(2) {
            assert!(pair[0].start <= pair[1].start);
        }
        assert!(notes.iter().all(|n| n.end >= n.start));
    }

    #[test]
    fn oracle_failure_aborts_the_run() {
        let err = run(&mut FailsAfter(5), 120, 10).unwrap_err();
        assert!(matches!(err, OracleError::Inference(_)));
    }

    #[test]
    fn zero_notes_never_calls_the_oracle() {
        let notes = run(&mut FailsAfter(0), 120, 0).unwrap();
        assert!(notes.is_empty());
    }

    #[test]
    fn loop_toggles_temperature_after_every_sixteenth_note() {
        let params = NormalizationParams::default();
        let seq = NoteSequencer::new(Genre::Pop, 120, &params);
        let seed = generate_seed(Genre::Pop, SEQ_LENGTH, &params);
        let mut oracle = Scripted {
            outputs: vec![OracleOutput::certain(64, 0.5, 0.4)],
            calls: 0,
        };
        let mut used = Vec::new();
        seq.run(&mut oracle, 50, seed, 1.1, &mut TuneRng::new(8), |t| {
            used.push(t)
        })
        .unwrap();

        // Note 0 never toggles; notes 16, 32 and 48 do, after being sampled.
        let mut expected = vec![1.1; 17];
        expected.extend([COOL_TEMPERATURE; 16]);
        expected.extend([WARM_TEMPERATURE; 16]);
        expected.push(COOL_TEMPERATURE);
        assert_eq!(used, expected);
    }

    #[test]
    fn temperature_alternates_between_cool_and_warm() {
        assert_eq!(toggled_temperature(1.1), COOL_TEMPERATURE);
        assert_eq!(toggled_temperature(COOL_TEMPERATURE), WARM_TEMPERATURE);
        assert_eq!(toggled_temperature(WARM_TEMPERATURE), COOL_TEMPERATURE);
        assert_eq!(toggled_temperature(1.0), WARM_TEMPERATURE);
    }
}
