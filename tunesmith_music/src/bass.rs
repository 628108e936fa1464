// Bass accompaniment.
//
// Root notes of a fixed I-V-vi-IV progression in C, one chord per bar: a
// half note on beat 1 and a repeat on beat 3 if the melody is still going.
// Fully deterministic.

use crate::score::ScoreNote;
use crate::tempo::{seconds_per_bar, seconds_per_beat};

/// C2, G2, A2, F2.
pub const CHORD_PROGRESSION: [u8; 4] = [36, 43, 45, 41];

/// Electric Bass (finger).
pub const BASS_PROGRAM: u8 = 33;

const DOWNBEAT_VELOCITY: u8 = 90;
const BACKBEAT_VELOCITY: u8 = 85;

/// Bass notes covering a melody that ends at `total_duration` seconds.
pub fn arrange_bass(total_duration: f64, tempo: u32) -> Vec<ScoreNote> {
    let beat = seconds_per_beat(tempo);
    let bar = seconds_per_bar(tempo);
    let mut notes = Vec::new();
    let mut cursor = 0.0;
    let mut bar_index = 0;

    while cursor < total_duration {
        let root = CHORD_PROGRESSION[bar_index % CHORD_PROGRESSION.len()];
        notes.push(ScoreNote::new(root, DOWNBEAT_VELOCITY, cursor, beat * 2.0));

        let third_beat = cursor + beat * 2.0;
        if third_beat < total_duration {
            notes.push(ScoreNote::new(root, BACKBEAT_VELOCITY, third_beat, beat * 2.0));
        }

        cursor += bar;
        bar_index += 1;
    }

    notes
}
