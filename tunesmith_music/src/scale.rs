// Scale definitions and pitch snapping.
//
// The oracle samples from all 128 pitches, so most raw predictions land
// outside the genre's key. Each prediction is snapped to the nearest member
// of the genre's scale by pitch class, keeping the original octave. Scales
// are rooted on C; there is no transposition.
//
// Used by sequencer.rs on every oracle prediction.

/// Pitch returned for predictions outside the MIDI range.
pub const OUT_OF_RANGE_PITCH: u8 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    /// C D E F G A B
    Major,
    /// Natural minor intervals from C.
    Minor,
    /// C D E G A
    Pentatonic,
    /// C Eb F F# G Bb
    Blues,
}

impl Scale {
    /// Pitch classes (semitones above C) in declared order. Order matters:
    /// ties in `nearest_in_scale` go to the earlier entry.
    pub fn pitch_classes(self) -> &'static [u8] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Pentatonic => &[0, 2, 4, 7, 9],
            Scale::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    pub fn contains(self, pitch: u8) -> bool {
        self.pitch_classes().contains(&(pitch % 12))
    }

    pub fn snap(self, pitch: i32) -> u8 {
        nearest_in_scale(pitch, self.pitch_classes())
    }
}

/// Snap a pitch to the nearest scale member by pitch class.
///
/// The distance is measured within the octave only (no wraparound), so a
/// low pitch class never snaps down into the previous octave. Ties go to the
/// scale member declared first. Pitches outside 0..=127 map to middle C.
pub fn nearest_in_scale(pitch: i32, scale: &[u8]) -> u8 {
    if !(0..=127).contains(&pitch) || scale.is_empty() {
        return OUT_OF_RANGE_PITCH;
    }
    let pc = (pitch % 12) as u8;
    if scale.contains(&pc) {
        return pitch as u8;
    }
    let octave = pitch / 12;
    let nearest = scale
        .iter()
        .copied()
        .min_by_key(|&member| member.abs_diff(pc))
        .unwrap_or(pc);
    // Even when the nearest member sits above a low pitch class, the octave
    // is kept as is.
    let snapped = octave * 12 + nearest as i32;
    // Only reachable for custom scales lacking a member at or below G.
    if snapped > 127 {
        (snapped - 12) as u8
    } else {
        snapped as u8
    }
}
