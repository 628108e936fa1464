// The oracle's rolling context window.
//
// A fixed-length ring of normalized (pitch, step, duration) triples. Every
// push evicts the oldest entry, so the length never changes after
// construction. Values stored here are always constrained and quantized but
// never tempo-scaled: the oracle must see the same distribution it was
// trained on no matter what tempo the caller asked for.

use crate::config::NormalizationParams;
use std::collections::VecDeque;

/// One note as the oracle sees it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizedNote {
    pub pitch: f32,
    pub step: f32,
    pub duration: f32,
}

impl NormalizedNote {
    /// The padding triple used for silence.
    pub const ZERO: NormalizedNote = NormalizedNote {
        pitch: 0.0,
        step: 0.0,
        duration: 0.0,
    };

    /// Normalize a reference-tempo note by the corpus maxima.
    pub fn from_note(pitch: u8, step: f64, duration: f64, params: &NormalizationParams) -> Self {
        NormalizedNote {
            pitch: (f64::from(pitch) / f64::from(params.vocab_size)) as f32,
            step: (step / params.max_step) as f32,
            duration: (duration / params.max_duration) as f32,
        }
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.pitch, self.step, self.duration]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    notes: VecDeque<NormalizedNote>,
}

impl ContextWindow {
    /// Build a window from exactly the given entries. The window's length
    /// is fixed to `notes.len()` from here on.
    pub fn from_notes(notes: Vec<NormalizedNote>) -> Self {
        ContextWindow {
            notes: notes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Drop the oldest entry and append `note`.
    pub fn push(&mut self, note: NormalizedNote) {
        if self.notes.is_empty() {
            return;
        }
        self.notes.pop_front();
        self.notes.push_back(note);
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedNote> {
        self.notes.iter()
    }

    pub fn latest(&self) -> Option<&NormalizedNote> {
        self.notes.back()
    }

    /// Row-major `len × 3` matrix, the layout model runtimes expect.
    pub fn to_matrix(&self) -> Vec<[f32; 3]> {
        self.notes.iter().map(NormalizedNote::as_array).collect()
    }
}
