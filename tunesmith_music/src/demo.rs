// Procedural melody generator used when no oracle is available.
//
// Also serves as the full-sequence fallback when the oracle fails partway
// through a run. Each genre supplies an absolute-pitch scale and cyclic
// rhythm and duration templates (see genre.rs). Pitch moves by a random walk
// over the scale, restricted to members within a fourth of the previous
// pitch; step and duration are read from the templates and jittered by
// ±10%.

use crate::genre::Genre;
use crate::note::DemoNote;
use tunesmith_prng::TuneRng;

/// Largest melodic leap between consecutive demo notes, in semitones.
pub const MAX_LEAP: u8 = 5;

const JITTER_LOW: f64 = 0.9;
const JITTER_HIGH: f64 = 1.1;

/// Generate `num_notes` demo notes for `genre`.
///
/// Notes are recorded at reference-tempo timing whatever `tempo` is;
/// `MelodyNote::span` scales them when the score is built.
pub fn generate_demo_melody(
    num_notes: usize,
    _tempo: u32,
    genre: Genre,
    rng: &mut TuneRng,
) -> Vec<DemoNote> {
    let template = genre.demo_template();
    let scale = template.scale;
    let mut notes = Vec::with_capacity(num_notes);
    let mut clock = 0.0;
    let mut prev_pitch = scale[scale.len() / 2];

    for i in 0..num_notes {
        let neighbors: Vec<u8> = scale
            .iter()
            .copied()
            .filter(|p| p.abs_diff(prev_pitch) <= MAX_LEAP)
            .collect();
        let choices = if neighbors.is_empty() { scale } else { &neighbors[..] };
        let pitch = rng.choose(choices).copied().unwrap_or(prev_pitch);

        let base_step = template.rhythm[i % template.rhythm.len()];
        let base_duration = template.durations[i % template.durations.len()];
        let step = base_step * rng.range_f64(JITTER_LOW, JITTER_HIGH);
        let duration = base_duration * rng.range_f64(JITTER_LOW, JITTER_HIGH);

        notes.push(DemoNote {
            pitch,
            step: round3(step),
            duration: round3(duration),
            start_time: round3(clock),
        });

        clock += step;
        prev_pitch = pitch;
    }

    notes
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
