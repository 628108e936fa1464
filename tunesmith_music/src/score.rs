// Multi-track symbolic score.
//
// The intermediate form between arrangement and MIDI encoding: named tracks
// of timed notes in absolute seconds, plus one initial tempo. midi.rs turns
// this into SMF bytes; nothing reads a score back.

/// A single sounding note in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreNote {
    pub pitch: u8,
    pub velocity: u8,
    pub start: f64,
    pub end: f64,
}

impl ScoreNote {
    pub fn new(pitch: u8, velocity: u8, start: f64, duration: f64) -> Self {
        ScoreNote {
            pitch,
            velocity,
            start,
            end: start + duration,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    /// General MIDI program. Ignored by players for drum tracks.
    pub program: u8,
    /// Drum tracks play on the percussion channel.
    pub is_drum: bool,
    pub notes: Vec<ScoreNote>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// Initial tempo in BPM.
    pub tempo: u32,
    pub tracks: Vec<Track>,
}

impl Score {
    pub fn new(tempo: u32) -> Self {
        Score {
            tempo,
            tracks: Vec::new(),
        }
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.name == name)
    }
}
