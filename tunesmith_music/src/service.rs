// Caller-facing melody generation.
//
// A `MelodyService` is built once per process with an optional oracle and
// the normalization params. Whether it runs the model or the demo generator
// is decided there and never re-examined per request.
//
// Per request:
// 1. build a `TuneRng` from the request seed (or an OS-entropy seed);
// 2. seed the context window and run the sequencer, or go straight to the
//    demo generator when there is no oracle;
// 3. on any oracle error, log it and regenerate the whole melody in demo
//    mode;
// 4. derive bass and drums from the melody's length and compose the MIDI
//    file. A composition failure yields an empty payload, not an error.
//
// `generate_melody` has no error path. Every failure degrades to a fallback.

use crate::bass::arrange_bass;
use crate::config::{NormalizationParams, SEQ_LENGTH};
use crate::demo::generate_demo_melody;
use crate::drums::arrange_drums;
use crate::genre::Genre;
use crate::midi::compose;
use crate::note::{MelodyNote, NoteSpan, total_duration};
use crate::oracle::Oracle;
use crate::seed::generate_seed;
use crate::sequencer::NoteSequencer;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tunesmith_prng::TuneRng;

pub const MIN_TEMPO: u32 = 60;
pub const MAX_TEMPO: u32 = 200;
pub const MIN_BARS: u32 = 4;
pub const MAX_BARS: u32 = 32;

/// Melody notes requested per bar (1.5 per beat in 4/4).
pub const NOTES_PER_BAR: f64 = 4.0 * 1.5;

fn default_tempo() -> u32 {
    120
}

fn default_genre() -> String {
    "pop".to_string()
}

fn default_bars() -> u32 {
    8
}

fn default_temperature() -> f64 {
    1.1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyRequest {
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    #[serde(default = "default_genre")]
    pub genre: String,
    #[serde(default = "default_bars")]
    pub bars: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Seed for this request's random stream. `None` draws fresh entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for MelodyRequest {
    fn default() -> Self {
        MelodyRequest {
            tempo: default_tempo(),
            genre: default_genre(),
            bars: default_bars(),
            temperature: default_temperature(),
            seed: None,
        }
    }
}

impl MelodyRequest {
    /// Clamp tempo and bar count into the ranges the public API accepts.
    pub fn clamped(mut self) -> Self {
        self.tempo = self.tempo.clamp(MIN_TEMPO, MAX_TEMPO);
        self.bars = self.bars.clamp(MIN_BARS, MAX_BARS);
        self
    }

    pub fn num_notes(&self) -> usize {
        (f64::from(self.bars) * NOTES_PER_BAR) as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyResponse {
    /// Standard MIDI File bytes; empty if composition failed.
    pub midi: Vec<u8>,
    pub notes: Vec<MelodyNote>,
    pub tempo: u32,
    pub genre: String,
    pub bars: u32,
}

/// Which generator backs the service.
pub enum Backend {
    Model(Box<dyn Oracle + Send>),
    Demo,
}

pub struct MelodyService {
    backend: Backend,
    params: NormalizationParams,
}

impl MelodyService {
    pub fn new(oracle: Option<Box<dyn Oracle + Send>>, params: NormalizationParams) -> Self {
        let backend = match oracle {
            Some(oracle) => {
                info!("melody service using oracle backend");
                Backend::Model(oracle)
            }
            None => {
                warn!("no oracle configured, melody service running in demo mode");
                Backend::Demo
            }
        };
        MelodyService {
            backend,
            params: params.sanitized(),
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self.backend, Backend::Demo)
    }

    pub fn params(&self) -> &NormalizationParams {
        &self.params
    }

    pub fn generate_melody(&mut self, request: &MelodyRequest) -> MelodyResponse {
        let mut rng = TuneRng::new(request.seed.unwrap_or_else(rand::random::<u64>));
        let genre = Genre::from_name(&request.genre);
        let num_notes = request.num_notes();

        let notes = self.generate_notes(request, genre, num_notes, &mut rng);

        let spans: Vec<NoteSpan> = notes.iter().map(|n| n.span(request.tempo)).collect();
        let total = total_duration(&spans);
        let bass = arrange_bass(total, request.tempo);
        let drums = arrange_drums(total, request.tempo, &mut rng);
        let midi = compose(&spans, bass, drums, request.tempo, genre, &mut rng);

        MelodyResponse {
            midi,
            notes,
            tempo: request.tempo,
            genre: request.genre.clone(),
            bars: request.bars,
        }
    }

    fn generate_notes(
        &mut self,
        request: &MelodyRequest,
        genre: Genre,
        num_notes: usize,
        rng: &mut TuneRng,
    ) -> Vec<MelodyNote> {
        let oracle = match &mut self.backend {
            Backend::Model(oracle) => oracle,
            Backend::Demo => return demo_notes(num_notes, request.tempo, genre, rng),
        };

        let seed = generate_seed(genre, SEQ_LENGTH, &self.params);
        let sequencer = NoteSequencer::new(genre, request.tempo, &self.params);
        match sequencer.generate(&mut **oracle, num_notes, seed, request.temperature, rng) {
            Ok(notes) => notes.into_iter().map(MelodyNote::ModelGenerated).collect(),
            Err(e) => {
                error!(
                    error = %e,
                    genre = genre.name(),
                    "oracle inference failed, using demo melody"
                );
                demo_notes(num_notes, request.tempo, genre, rng)
            }
        }
    }
}

fn demo_notes(num_notes: usize, tempo: u32, genre: Genre, rng: &mut TuneRng) -> Vec<MelodyNote> {
    generate_demo_melody(num_notes, tempo, genre, rng)
        .into_iter()
        .map(MelodyNote::Fallback)
        .collect()
}
