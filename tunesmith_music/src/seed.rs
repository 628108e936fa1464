// Seed window construction.
//
// The oracle needs a full window before its first prediction. The seed is
// mostly padding (zero triples) followed by a short ascending motif starting
// on a genre-specific pitch, which is enough to push the first predictions
// toward the right register without dictating a melody.

use crate::config::{NormalizationParams, SEED_PADDING};
use crate::genre::Genre;
use crate::window::{ContextWindow, NormalizedNote};

/// Step of every motif note, in reference-tempo seconds (an eighth note).
pub const SEED_STEP: f64 = 0.5;

/// Duration of every motif note, slightly detached.
pub const SEED_DURATION: f64 = 0.4;

/// Build a `seq_length` window for `genre`.
pub fn generate_seed(
    genre: Genre,
    seq_length: usize,
    params: &NormalizationParams,
) -> ContextWindow {
    let base = genre.seed_pitch();
    let notes = (0..seq_length)
        .map(|i| {
            if i < SEED_PADDING {
                NormalizedNote::ZERO
            } else {
                let offset = (i - SEED_PADDING) % 5;
                NormalizedNote::from_note(base + offset as u8, SEED_STEP, SEED_DURATION, params)
            }
        })
        .collect();
    ContextWindow::from_notes(notes)
}
