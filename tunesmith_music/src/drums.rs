// Drum accompaniment.
//
// Bars come in two kinds, keyed purely by bar index:
//
// - Groove (default): eighth-note hi-hats with alternating accent, kick on
//   beats 1, 3 and the "and" of 3, snare on 2 and 4, plus a ghost snare just
//   before the next downbeat on every odd bar.
// - Fill (every 4th bar): hi-hats across the first three beats, a
//   kick/snare/kick skeleton, and a four-hit snare-to-tom run on beat 4 that
//   leads into the next phrase.
//
// Velocities are humanized from the request's rng. All hits are a fixed
// short length; players ignore drum note-offs anyway. Groove hits at or past
// the melody's end are dropped, and no new bar starts past it.

use crate::score::ScoreNote;
use crate::tempo::{seconds_per_bar, seconds_per_beat};
use tunesmith_prng::TuneRng;

// General MIDI percussion keys.
pub const KICK: u8 = 36;
pub const SNARE: u8 = 38;
pub const CLOSED_HI_HAT: u8 = 42;
pub const HIGH_FLOOR_TOM: u8 = 43;
pub const LOW_MID_TOM: u8 = 47;
pub const HIGH_TOM: u8 = 50;

const HIT_LENGTH: f64 = 0.1;
const GHOST_LENGTH: f64 = 0.05;
const GHOST_VELOCITY: u8 = 50;

const GROOVE_HATS: usize = 8;
const FILL_HATS: usize = 6;
const GROOVE_KICK_BEATS: [f64; 3] = [0.0, 2.0, 2.5];
const GROOVE_SNARE_BEATS: [f64; 2] = [1.0, 3.0];
const GHOST_BEAT: f64 = 3.75;

/// Fill figure on beat 4: (offset in beats from beat 4, key, velocity).
const FILL_FIGURE: [(f64, u8, u8); 4] = [
    (0.0, SNARE, 110),
    (0.25, HIGH_TOM, 100),
    (0.5, LOW_MID_TOM, 110),
    (0.75, HIGH_FLOOR_TOM, 120),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarKind {
    Groove,
    Fill,
}

pub fn bar_kind(bar_index: usize) -> BarKind {
    if (bar_index + 1) % 4 == 0 {
        BarKind::Fill
    } else {
        BarKind::Groove
    }
}

/// Drum hits covering a melody that ends at `total_duration` seconds.
pub fn arrange_drums(total_duration: f64, tempo: u32, rng: &mut TuneRng) -> Vec<ScoreNote> {
    let beat = seconds_per_beat(tempo);
    let bar = seconds_per_bar(tempo);
    let mut hits = Vec::new();
    let mut cursor = 0.0;
    let mut bar_index = 0;

    while cursor < total_duration {
        match bar_kind(bar_index) {
            BarKind::Groove => groove_bar(&mut hits, cursor, beat, bar_index, total_duration, rng),
            BarKind::Fill => fill_bar(&mut hits, cursor, beat, rng),
        }
        cursor += bar;
        bar_index += 1;
    }

    hits
}

fn groove_bar(
    hits: &mut Vec<ScoreNote>,
    bar_start: f64,
    beat: f64,
    bar_index: usize,
    total_duration: f64,
    rng: &mut TuneRng,
) {
    for i in 0..GROOVE_HATS {
        let t = bar_start + i as f64 * (beat / 2.0);
        if t >= total_duration {
            break;
        }
        let base = if i % 2 == 0 { 85 } else { 60 };
        let velocity = humanize(base, rng.range_i32(-10, 10));
        hits.push(ScoreNote::new(CLOSED_HI_HAT, velocity, t, HIT_LENGTH));
    }

    for kick_beat in GROOVE_KICK_BEATS {
        let t = bar_start + kick_beat * beat;
        if t >= total_duration {
            break;
        }
        let velocity = if kick_beat.fract() == 0.0 { 100 } else { 90 };
        hits.push(ScoreNote::new(KICK, velocity, t, HIT_LENGTH));
    }

    for snare_beat in GROOVE_SNARE_BEATS {
        let t = bar_start + snare_beat * beat;
        if t >= total_duration {
            break;
        }
        let velocity = humanize(95, rng.range_i32(-5, 5));
        hits.push(ScoreNote::new(SNARE, velocity, t, HIT_LENGTH));
    }

    if bar_index % 2 == 1 {
        let t = bar_start + GHOST_BEAT * beat;
        if t < total_duration {
            hits.push(ScoreNote::new(SNARE, GHOST_VELOCITY, t, GHOST_LENGTH));
        }
    }
}

fn fill_bar(hits: &mut Vec<ScoreNote>, bar_start: f64, beat: f64, rng: &mut TuneRng) {
    for i in 0..FILL_HATS {
        let t = bar_start + i as f64 * (beat / 2.0);
        let velocity = rng.range_i32(60, 90) as u8;
        hits.push(ScoreNote::new(CLOSED_HI_HAT, velocity, t, HIT_LENGTH));
    }

    hits.push(ScoreNote::new(KICK, 100, bar_start, HIT_LENGTH));
    hits.push(ScoreNote::new(SNARE, 95, bar_start + beat, HIT_LENGTH));
    hits.push(ScoreNote::new(KICK, 90, bar_start + beat * 2.0, HIT_LENGTH));

    let fill_start = bar_start + beat * 3.0;
    for (offset, key, velocity) in FILL_FIGURE {
        hits.push(ScoreNote::new(key, velocity, fill_start + offset * beat, HIT_LENGTH));
    }
}

fn humanize(base: i32, jitter: i32) -> u8 {
    (base + jitter).clamp(1, 127) as u8
}
