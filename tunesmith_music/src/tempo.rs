// Tempo scaling between the oracle's reference tempo and playback tempo.
//
// The oracle thinks in seconds at 120 BPM. Scaling happens once, on the
// emitted timeline only; the feedback window keeps reference-tempo values.

use crate::config::REFERENCE_TEMPO;

/// Seconds per beat at the reference tempo.
pub const REFERENCE_SECONDS_PER_BEAT: f64 = 60.0 / REFERENCE_TEMPO;

pub const BEATS_PER_BAR: f64 = 4.0;

/// Factor converting reference-tempo seconds to target-tempo seconds.
/// Tempo is floored at 1 BPM.
pub fn tempo_scale(tempo: u32) -> f64 {
    REFERENCE_TEMPO / f64::from(tempo.max(1))
}

/// Seconds per quarter-note beat at the target tempo.
pub fn seconds_per_beat(tempo: u32) -> f64 {
    REFERENCE_SECONDS_PER_BEAT * tempo_scale(tempo)
}

pub fn seconds_per_bar(tempo: u32) -> f64 {
    seconds_per_beat(tempo) * BEATS_PER_BAR
}
