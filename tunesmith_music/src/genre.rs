// Genre lookup tables.
//
// A genre selects four things: the scale predictions are snapped to, the
// starting pitch of the seed motif, the melody instrument, and the demo-mode
// template. Genre names arrive as free text from the caller; anything that
// isn't one of the four known names resolves to pop, which is also what
// every table uses as its default.

use crate::scale::Scale;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Pop,
    Rock,
    Jazz,
    Classical,
}

/// Per-genre demo-mode template: an absolute-pitch scale plus cyclic
/// step and duration patterns in reference-tempo seconds.
#[derive(Debug, Clone, Copy)]
pub struct DemoTemplate {
    pub scale: &'static [u8],
    pub rhythm: &'static [f64],
    pub durations: &'static [f64],
}

const POP_TEMPLATE: DemoTemplate = DemoTemplate {
    scale: &[60, 62, 64, 65, 67, 69, 71, 72],
    rhythm: &[0.5, 0.5, 1.0, 0.5, 0.5, 1.0, 0.25, 0.25],
    durations: &[0.4, 0.4, 0.8, 0.4, 0.4, 0.8, 0.2, 0.2],
};

const JAZZ_TEMPLATE: DemoTemplate = DemoTemplate {
    scale: &[60, 63, 65, 66, 67, 70, 72],
    rhythm: &[0.33, 0.67, 0.5, 0.5, 1.0, 0.33, 0.67],
    durations: &[0.3, 0.6, 0.4, 0.4, 0.9, 0.3, 0.6],
};

const CLASSICAL_TEMPLATE: DemoTemplate = DemoTemplate {
    scale: &[60, 62, 64, 65, 67, 69, 71, 72, 74, 76],
    rhythm: &[1.0, 1.0, 0.5, 0.5, 1.0, 1.0, 2.0],
    durations: &[0.9, 0.9, 0.45, 0.45, 0.9, 0.9, 1.8],
};

const ROCK_TEMPLATE: DemoTemplate = DemoTemplate {
    scale: &[60, 63, 65, 67, 70, 72],
    rhythm: &[0.25, 0.25, 0.5, 0.25, 0.25, 0.5, 1.0],
    durations: &[0.2, 0.2, 0.4, 0.2, 0.2, 0.4, 0.8],
};

impl Genre {
    pub const ALL: [Genre; 4] = [Genre::Pop, Genre::Rock, Genre::Jazz, Genre::Classical];

    /// Case-insensitive lookup. Returns `None` for unknown names.
    pub fn parse(name: &str) -> Option<Genre> {
        match name.trim().to_lowercase().as_str() {
            "pop" => Some(Genre::Pop),
            "rock" => Some(Genre::Rock),
            "jazz" => Some(Genre::Jazz),
            "classical" => Some(Genre::Classical),
            _ => None,
        }
    }

    /// Resolve a caller-supplied name, falling back to pop.
    pub fn from_name(name: &str) -> Genre {
        Genre::parse(name).unwrap_or_else(|| {
            debug!(genre = name, "unknown genre, using pop tables");
            Genre::Pop
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Genre::Pop => "pop",
            Genre::Rock => "rock",
            Genre::Jazz => "jazz",
            Genre::Classical => "classical",
        }
    }

    pub fn scale(self) -> Scale {
        match self {
            Genre::Pop | Genre::Classical => Scale::Major,
            Genre::Rock => Scale::Pentatonic,
            Genre::Jazz => Scale::Blues,
        }
    }

    /// First pitch of the seed motif.
    pub fn seed_pitch(self) -> u8 {
        match self {
            Genre::Pop => 60,       // C4
            Genre::Rock => 57,      // A3
            Genre::Jazz => 63,      // Eb4
            Genre::Classical => 64, // E4
        }
    }

    /// General MIDI program for the melody track.
    pub fn melody_program(self) -> u8 {
        match self {
            Genre::Pop => 0,        // Acoustic Grand Piano
            Genre::Rock => 29,      // Overdriven Guitar
            Genre::Jazz => 66,      // Tenor Sax
            Genre::Classical => 40, // Violin
        }
    }

    pub fn demo_template(self) -> &'static DemoTemplate {
        match self {
            Genre::Pop => &POP_TEMPLATE,
            Genre::Rock => &ROCK_TEMPLATE,
            Genre::Jazz => &JAZZ_TEMPLATE,
            Genre::Classical => &CLASSICAL_TEMPLATE,
        }
    }
}
