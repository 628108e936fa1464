// The oracle contract: an opaque next-note predictor.
//
// An oracle takes the current context window and returns logits over the
// 128 MIDI pitches plus two regressions, step and duration, in
// reference-tempo seconds. Whatever runs behind it (a recurrent network, a
// remote inference server) is the implementor's business. This module owns
// the sampling policy applied to that raw output: temperature-scaled
// categorical sampling for pitch, non-negative clamping for the timing
// regressions.

use crate::error::OracleError;
use crate::window::ContextWindow;
use tunesmith_prng::TuneRng;

/// Size of the pitch distribution.
pub const PITCH_VOCAB: usize = 128;

/// Raw model output for one prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleOutput {
    /// Unnormalized log-probabilities, one per pitch. `-inf` entries are
    /// impossible pitches.
    pub pitch_logits: Vec<f32>,
    pub step: f32,
    pub duration: f32,
}

impl OracleOutput {
    /// An output that puts all of its mass on `pitch`.
    pub fn certain(pitch: u8, step: f32, duration: f32) -> Self {
        let mut pitch_logits = vec![f32::NEG_INFINITY; PITCH_VOCAB];
        pitch_logits[usize::from(pitch) % PITCH_VOCAB] = 0.0;
        OracleOutput {
            pitch_logits,
            step,
            duration,
        }
    }
}

/// A sampled prediction before any musical constraint is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrediction {
    pub pitch: i32,
    pub step: f64,
    pub duration: f64,
}

pub trait Oracle {
    /// Run one inference over the window.
    fn infer(&mut self, window: &ContextWindow) -> Result<OracleOutput, OracleError>;
}

/// Query the oracle and sample a prediction from its output.
///
/// Lower temperatures sharpen the pitch distribution.
pub fn predict_next_note(
    oracle: &mut dyn Oracle,
    window: &ContextWindow,
    temperature: f64,
    rng: &mut TuneRng,
) -> Result<RawPrediction, OracleError> {
    if !(temperature.is_finite() && temperature > 0.0) {
        return Err(OracleError::InvalidTemperature(temperature));
    }
    let output = oracle.infer(window)?;
    if !(output.step.is_finite() && output.duration.is_finite()) {
        return Err(OracleError::MalformedOutput(format!(
            "non-finite timing (step {}, duration {})",
            output.step, output.duration
        )));
    }
    let pitch = sample_pitch(&output.pitch_logits, temperature, rng)?;
    Ok(RawPrediction {
        pitch: pitch as i32,
        step: f64::from(output.step).max(0.0),
        duration: f64::from(output.duration).max(0.0),
    })
}

/// Categorical sample over `softmax(logits / temperature)`.
pub fn sample_pitch(
    logits: &[f32],
    temperature: f64,
    rng: &mut TuneRng,
) -> Result<usize, OracleError> {
    if logits.iter().any(|l| l.is_nan() || *l == f32::INFINITY) {
        return Err(OracleError::MalformedOutput(
            "pitch logits contain NaN or +inf".to_string(),
        ));
    }
    let scaled: Vec<f64> = logits.iter().map(|&l| f64::from(l) / temperature).collect();
    let max = scaled
        .iter()
        .copied()
        .filter(|s| s.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return Err(OracleError::MalformedOutput(format!(
            "no finite pitch logits among {}",
            logits.len()
        )));
    }

    let weights: Vec<f64> = scaled.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = weights.iter().sum();
    let target = rng.next_f64() * total;
    let mut cumulative = 0.0;
    let mut last_possible = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        last_possible = i;
        if cumulative > target {
            return Ok(i);
        }
    }
    // Rounding can leave `target` a hair above the running sum.
    Ok(last_possible)
}
