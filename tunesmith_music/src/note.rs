// Note shapes emitted by melody generation.
//
// Model-backed generation and the demo fallback describe notes differently:
// the sequencer knows absolute start and end times, while the demo generator
// records a running start time plus step and duration. Both are kept intact
// for the caller inside `MelodyNote`, and `span()` is the one place that
// reduces either shape to absolute (pitch, start, end) at the target tempo
// for arrangement and composition. Demo notes are recorded at reference-tempo
// timing and are scaled there; sequencer notes are already scaled.

use crate::tempo::tempo_scale;
use serde::{Deserialize, Serialize};

/// A note produced by the sequencer. Times are absolute seconds at the
/// target tempo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratedNote {
    pub pitch: u8,
    pub start: f64,
    pub end: f64,
    pub step: f64,
    pub duration: f64,
}

/// A note produced by the demo fallback. Values are reference-tempo seconds
/// rounded to 3 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemoNote {
    pub pitch: u8,
    pub step: f64,
    pub duration: f64,
    pub start_time: f64,
}

/// Either note shape, tagged by where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MelodyNote {
    ModelGenerated(GeneratedNote),
    Fallback(DemoNote),
}

/// A note reduced to absolute timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteSpan {
    pub pitch: u8,
    pub start: f64,
    pub end: f64,
}

impl MelodyNote {
    /// Absolute timing at `tempo`, the tempo the melody was requested at.
    pub fn span(&self, tempo: u32) -> NoteSpan {
        match *self {
            MelodyNote::ModelGenerated(n) => NoteSpan {
                pitch: n.pitch,
                start: n.start,
                end: n.end,
            },
            MelodyNote::Fallback(n) => {
                let scale = tempo_scale(tempo);
                NoteSpan {
                    pitch: n.pitch,
                    start: n.start_time * scale,
                    end: (n.start_time + n.duration) * scale,
                }
            }
        }
    }

    pub fn pitch(&self) -> u8 {
        match self {
            MelodyNote::ModelGenerated(n) => n.pitch,
            MelodyNote::Fallback(n) => n.pitch,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, MelodyNote::Fallback(_))
    }
}

/// Latest end time across a melody, or 0 for an empty one.
pub fn total_duration(spans: &[NoteSpan]) -> f64 {
    spans.iter().map(|s| s.end).fold(0.0, f64::max)
}
