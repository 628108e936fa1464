// Normalization constants and fixed generation parameters.
//
// The oracle was trained on notes normalized by three corpus-wide maxima
// (VOCAB_SIZE, MAX_STEP, MAX_DURATION). They ship next to the model as a
// small JSON file and must be used both when building the seed window and
// when feeding predictions back, otherwise the oracle sees a different input
// distribution than it learned. Loaded once at startup and never mutated.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Length of the oracle's rolling context window.
pub const SEQ_LENGTH: usize = 25;

/// Leading zero-triple entries in a freshly seeded window.
pub const SEED_PADDING: usize = 15;

/// Rhythmic quantization grid in reference-tempo seconds (a 16th note at
/// 120 BPM).
pub const QUANTIZE_GRID: f64 = 0.125;

/// Floor applied to quantized steps and durations before emission.
pub const MIN_NOTE_VALUE: f64 = 0.125;

/// Tempo the oracle's raw timing outputs are expressed in.
pub const REFERENCE_TEMPO: f64 = 120.0;

/// Notes between temperature toggles in the sequencer.
pub const TEMPERATURE_TOGGLE_INTERVAL: usize = 16;

const DEFAULT_VOCAB_SIZE: u32 = 128;
const DEFAULT_MAX: f64 = 1.0;

fn default_vocab_size() -> u32 {
    DEFAULT_VOCAB_SIZE
}

fn default_max() -> f64 {
    DEFAULT_MAX
}

/// Corpus maxima used to normalize oracle input.
///
/// Field names match the `normalization_params.json` written by the
/// training pipeline. Missing fields fall back individually.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    #[serde(rename = "VOCAB_SIZE", default = "default_vocab_size")]
    pub vocab_size: u32,
    #[serde(rename = "MAX_STEP", default = "default_max")]
    pub max_step: f64,
    #[serde(rename = "MAX_DURATION", default = "default_max")]
    pub max_duration: f64,
}

impl Default for NormalizationParams {
    fn default() -> Self {
        NormalizationParams {
            vocab_size: DEFAULT_VOCAB_SIZE,
            max_step: DEFAULT_MAX,
            max_duration: DEFAULT_MAX,
        }
    }
}

impl NormalizationParams {
    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| Error::ParamsIo {
            path: path.to_path_buf(),
            source,
        })?;
        let params: NormalizationParams = serde_json::from_str(&data)?;
        Ok(params.sanitized())
    }

    /// Load from a JSON file, falling back to defaults on any failure.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            warn!(path = %path.display(), "normalization params not found, using defaults");
            return Self::default();
        }
        match Self::load(path) {
            Ok(params) => {
                info!(
                    max_step = params.max_step,
                    max_duration = params.max_duration,
                    vocab_size = params.vocab_size,
                    "loaded normalization params"
                );
                params
            }
            Err(e) => {
                warn!(error = %e, "failed to load normalization params, using defaults");
                Self::default()
            }
        }
    }

    /// Replace zero, negative, or non-finite maxima with defaults so
    /// normalization never divides by zero.
    pub fn sanitized(self) -> Self {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        NormalizationParams {
            vocab_size: if self.vocab_size == 0 {
                DEFAULT_VOCAB_SIZE
            } else {
                self.vocab_size
            },
            max_step: if positive(self.max_step) {
                self.max_step
            } else {
                DEFAULT_MAX
            },
            max_duration: if positive(self.max_duration) {
                self.max_duration
            } else {
                DEFAULT_MAX
            },
        }
    }
}
