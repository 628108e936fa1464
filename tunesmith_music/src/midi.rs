// MIDI output: melody, bass and drums as one Standard MIDI File.
//
// Builds a `Score` from the melody spans and the two accompaniment tracks,
// then encodes it as SMF Format 1 (multi-track):
//
// - Track 0: tempo meta-event plus a 4/4 time signature.
// - Tracks 1..: one per instrument, each with a track name, a program
//   change, and note-on/note-off pairs. Melodic tracks take channels in
//   order, skipping channel 9; the drum track always plays on channel 9.
//
// Melody velocities are shaped here: a base of 100, ±5 of humanization, and
// an accent on beats 1 and 3 of each bar.
//
// Uses the `midly` crate for MIDI writing. Times are converted from seconds
// to ticks using the score's own tempo, so the file plays back with the
// exact timeline the sequencer produced.

use crate::bass::BASS_PROGRAM;
use crate::error::{Error, Result};
use crate::genre::Genre;
use crate::note::NoteSpan;
use crate::score::{Score, ScoreNote, Track};
use crate::tempo::seconds_per_beat;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use tracing::error;
use tunesmith_prng::TuneRng;

/// Ticks per quarter note in MIDI output.
pub const TICKS_PER_QUARTER: u16 = 480;

pub const MELODY_TRACK: &str = "Melody";
pub const BASS_TRACK: &str = "Bass";
pub const DRUM_TRACK: &str = "Drums";

const PERCUSSION_CHANNEL: u8 = 9;
const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;
const MAX_DELTA: u32 = (1 << 28) - 1;

const BASE_VELOCITY: i32 = 100;
const DOWNBEAT_ACCENT: i32 = 15;
const MIDBAR_ACCENT: i32 = 10;
const ACCENT_TOLERANCE: f64 = 0.1;

/// Compose and encode, returning an empty payload on failure.
///
/// Serialization problems never fail a melody request; they are logged and
/// the caller gets no score.
pub fn compose(
    melody: &[NoteSpan],
    bass: Vec<ScoreNote>,
    drums: Vec<ScoreNote>,
    tempo: u32,
    genre: Genre,
    rng: &mut TuneRng,
) -> Vec<u8> {
    match try_compose(melody, bass, drums, tempo, genre, rng) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "failed to compose MIDI score");
            Vec::new()
        }
    }
}

pub fn try_compose(
    melody: &[NoteSpan],
    bass: Vec<ScoreNote>,
    drums: Vec<ScoreNote>,
    tempo: u32,
    genre: Genre,
    rng: &mut TuneRng,
) -> Result<Vec<u8>> {
    let score = build_score(melody, bass, drums, tempo, genre, rng);
    encode_score(&score)
}

/// Assemble the three-track score.
pub fn build_score(
    melody: &[NoteSpan],
    bass: Vec<ScoreNote>,
    drums: Vec<ScoreNote>,
    tempo: u32,
    genre: Genre,
    rng: &mut TuneRng,
) -> Score {
    let beat = seconds_per_beat(tempo);
    let melody_notes = melody
        .iter()
        .map(|span| ScoreNote {
            pitch: span.pitch,
            velocity: melody_velocity(span.start, beat, rng),
            start: span.start,
            end: span.end,
        })
        .collect();

    let mut score = Score::new(tempo);
    score.tracks.push(Track {
        name: MELODY_TRACK.to_string(),
        program: genre.melody_program(),
        is_drum: false,
        notes: melody_notes,
    });
    score.tracks.push(Track {
        name: BASS_TRACK.to_string(),
        program: BASS_PROGRAM,
        is_drum: false,
        notes: bass,
    });
    score.tracks.push(Track {
        name: DRUM_TRACK.to_string(),
        program: 0,
        is_drum: true,
        notes: drums,
    });
    score
}

/// Velocity for a melody note starting at `start` seconds.
fn melody_velocity(start: f64, seconds_per_beat: f64, rng: &mut TuneRng) -> u8 {
    let humanize = rng.range_i32(-5, 6);
    let beat_pos = (start / seconds_per_beat) % 4.0;
    let accent = if beat_pos.abs() < ACCENT_TOLERANCE {
        DOWNBEAT_ACCENT
    } else if (beat_pos - 2.0).abs() < ACCENT_TOLERANCE {
        MIDBAR_ACCENT
    } else {
        0
    };
    (BASE_VELOCITY + humanize + accent).clamp(0, 127) as u8
}

/// Encode a score as SMF bytes.
pub fn encode_score(score: &Score) -> Result<Vec<u8>> {
    let smf = score_to_smf(score)?;
    let mut buf = Vec::new();
    smf.write(&mut buf)
        .map_err(|e| Error::Composition(e.to_string()))?;
    Ok(buf)
}

fn tempo_micros(tempo: u32) -> u32 {
    (60_000_000 / tempo.max(1)).clamp(1, MAX_TEMPO_MICROS)
}

fn score_to_smf(score: &Score) -> Result<Smf<'_>> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    let micros = tempo_micros(score.tempo);
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(micros))),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TimeSignature(4, 2, 24, 8)),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        },
    ]);

    let ticks_per_second = f64::from(TICKS_PER_QUARTER) * 1_000_000.0 / f64::from(micros);
    let mut next_channel = 0u8;

    for track in &score.tracks {
        let channel = if track.is_drum {
            PERCUSSION_CHANNEL
        } else {
            if next_channel == PERCUSSION_CHANNEL {
                next_channel += 1;
            }
            let ch = next_channel;
            next_channel += 1;
            ch
        };
        if channel > 15 {
            return Err(Error::Composition(format!(
                "no MIDI channel left for track '{}'",
                track.name
            )));
        }
        smf.tracks.push(encode_track(track, u4::new(channel), ticks_per_second)?);
    }

    Ok(smf)
}

/// A note boundary waiting to be written. Offs sort before ons at the same
/// tick so a repeated pitch re-triggers cleanly.
#[derive(Debug, Clone, Copy)]
struct PendingEvent {
    tick: u32,
    is_on: bool,
    key: u8,
    velocity: u8,
}

fn encode_track(track: &Track, channel: u4, ticks_per_second: f64) -> Result<Vec<TrackEvent<'_>>> {
    let mut pending = Vec::with_capacity(track.notes.len() * 2);
    for note in &track.notes {
        if !(note.start.is_finite() && note.end.is_finite()) {
            return Err(Error::Composition(format!(
                "note in track '{}' has a non-finite time",
                track.name
            )));
        }
        let on = seconds_to_ticks(note.start, ticks_per_second)?;
        let off = seconds_to_ticks(note.end.max(note.start), ticks_per_second)?;
        let key = note.pitch.min(127);
        pending.push(PendingEvent {
            tick: on,
            is_on: true,
            key,
            velocity: note.velocity.min(127),
        });
        pending.push(PendingEvent {
            tick: off,
            is_on: false,
            key,
            velocity: 0,
        });
    }
    pending.sort_by_key(|e| (e.tick, e.is_on));

    let mut events = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(track.name.as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(track.program.min(127)),
                },
            },
        },
    ];

    let mut last_tick = 0;
    for event in pending {
        let message = if event.is_on {
            MidiMessage::NoteOn {
                key: u7::new(event.key),
                vel: u7::new(event.velocity),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(event.key),
                vel: u7::new(0),
            }
        };
        events.push(TrackEvent {
            delta: u28::new(event.tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = event.tick;
    }

    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    Ok(events)
}

fn seconds_to_ticks(seconds: f64, ticks_per_second: f64) -> Result<u32> {
    let ticks = (seconds.max(0.0) * ticks_per_second).round();
    if ticks > f64::from(MAX_DELTA) {
        return Err(Error::Composition(format!(
            "time {seconds}s is beyond the encodable range"
        )));
    }
    Ok(ticks as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bass::arrange_bass;
    use crate::drums::arrange_drums;

    fn spans(starts: &[f64]) -> Vec<NoteSpan> {
        starts
            .iter()
            .map(|&s| NoteSpan {
                pitch: 64,
                start: s,
                end: s + 0.25,
            })
            .collect()
    }

    fn note_ons(track: &[TrackEvent<'_>]) -> Vec<(u8, u8)> {
        track
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    channel,
                    message: MidiMessage::NoteOn { key, .. },
                } => Some((channel.as_int(), key.as_int())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn downbeats_are_accented() {
        let mut rng = TuneRng::new(31);
        for _ in 0..200 {
            let v = melody_velocity(0.0, 0.5, &mut rng);
            assert!((110..=120).contains(&v), "downbeat velocity {v}");
            let v = melody_velocity(1.0, 0.5, &mut rng);
            assert!((105..=115).contains(&v), "beat 3 velocity {v}");
            let v = melody_velocity(0.75, 0.5, &mut rng);
            assert!((95..=105).contains(&v), "offbeat velocity {v}");
            // Beat 1 of the second bar.
            let v = melody_velocity(2.02, 0.5, &mut rng);
            assert!((110..=120).contains(&v), "second bar velocity {v}");
        }
    }

    #[test]
    fn score_has_three_named_tracks() {
        let mut rng = TuneRng::new(32);
        let melody = spans(&[0.5, 1.0]);
        let score = build_score(
            &melody,
            arrange_bass(1.25, 120),
            arrange_drums(1.25, 120, &mut rng),
            120,
            Genre::Jazz,
            &mut rng,
        );
        let names: Vec<&str> = score.tracks.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Melody", "Bass", "Drums"]);
        assert_eq!(score.track(MELODY_TRACK).unwrap().program, 66);
        assert!(score.track(DRUM_TRACK).unwrap().is_drum);
    }

    #[test]
    fn encoded_file_parses_with_expected_layout() {
        let mut rng = TuneRng::new(33);
        let melody = spans(&[0.5, 1.0, 1.5, 2.0]);
        let bass = arrange_bass(2.25, 100);
        let drums = arrange_drums(2.25, 100, &mut rng);
        let bytes = try_compose(
            &melody,
            bass.clone(),
            drums.clone(),
            100,
            Genre::Pop,
            &mut rng,
        )
        .unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 4);

        let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(600_000));

        let melody_ons = note_ons(&smf.tracks[1]);
        let bass_ons = note_ons(&smf.tracks[2]);
        let drum_ons = note_ons(&smf.tracks[3]);
        assert_eq!(melody_ons.len(), melody.len());
        assert_eq!(bass_ons.len(), bass.len());
        assert_eq!(drum_ons.len(), drums.len());
        assert!(melody_ons.iter().all(|&(ch, _)| ch == 0));
        assert!(bass_ons.iter().all(|&(ch, _)| ch == 1));
        assert!(drum_ons.iter().all(|&(ch, _)| ch == 9));
    }

    #[test]
    fn note_times_map_to_ticks_at_score_tempo() {
        let mut rng = TuneRng::new(34);
        let bytes =
            try_compose(&spans(&[0.5]), Vec::new(), Vec::new(), 120, Genre::Pop, &mut rng)
                .unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        // At 120 BPM 0.5s is one quarter note; the note lasts an eighth.
        let deltas: Vec<u32> = smf.tracks[1]
            .iter()
            .filter(|e| {
                matches!(
                    e.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::NoteOn { .. } | MidiMessage::NoteOff { .. },
                        ..
                    }
                )
            })
            .map(|e| e.delta.as_int())
            .collect();
        assert_eq!(deltas, vec![480, 240]);
    }

    #[test]
    fn note_off_precedes_note_on_at_same_tick() {
        let track = Track {
            name: "t".to_string(),
            program: 0,
            is_drum: false,
            notes: vec![ScoreNote::new(60, 100, 0.0, 0.5), ScoreNote::new(60, 100, 0.5, 0.5)],
        };
        let events = encode_track(&track, u4::new(0), 960.0).unwrap();
        let kinds: Vec<&str> = events
            .iter()
            .filter_map(|e| match e.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { .. },
                    ..
                } => Some("on"),
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOff { .. },
                    ..
                } => Some("off"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["on", "off", "on", "off"]);
    }

    #[test]
    fn non_finite_times_yield_an_empty_payload() {
        let mut rng = TuneRng::new(35);
        let melody = vec![NoteSpan {
            pitch: 60,
            start: f64::NAN,
            end: 1.0,
        }];
        assert!(matches!(
            try_compose(&melody, Vec::new(), Vec::new(), 120, Genre::Pop, &mut rng),
            Err(Error::Composition(_))
        ));
        assert!(compose(&melody, Vec::new(), Vec::new(), 120, Genre::Pop, &mut rng).is_empty());
    }

    #[test]
    fn extreme_tempo_is_clamped_in_meta_event() {
        assert_eq!(tempo_micros(0), MAX_TEMPO_MICROS);
        assert_eq!(tempo_micros(120), 500_000);
        assert_eq!(tempo_micros(u32::MAX), 1);
    }

    #[test]
    fn tempo_beyond_microsecond_resolution_still_encodes() {
        let mut rng = TuneRng::new(36);
        let bytes =
            try_compose(&spans(&[0.0]), Vec::new(), Vec::new(), u32::MAX, Genre::Pop, &mut rng)
                .unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let tempo = smf.tracks[0].iter().find_map(|e| match e.kind {
            TrackEventKind::Meta(MetaMessage::Tempo(t)) => Some(t.as_int()),
            _ => None,
        });
        assert_eq!(tempo, Some(1));
    }
}
