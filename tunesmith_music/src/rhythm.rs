// Rhythmic quantization of predicted timing values.

use crate::config::QUANTIZE_GRID;

/// Values at or below this are treated as silence.
pub const SILENCE_THRESHOLD: f64 = 0.05;

/// Snap a timing value (seconds at reference tempo) to the grid.
///
/// Rounds half to even on `value / grid`. A value above the silence
/// threshold never rounds down to zero; it is clamped up to one grid unit.
pub fn quantize(value: f64, grid: f64) -> f64 {
    if value <= SILENCE_THRESHOLD {
        return 0.0;
    }
    let quantized = (value / grid).round_ties_even() * grid;
    if quantized == 0.0 { grid } else { quantized }
}

/// `quantize` on the default 0.125s grid.
pub fn quantize_default(value: f64) -> f64 {
    quantize(value, QUANTIZE_GRID)
}
