// tunesmith melody generator
//
// Turns a next-note oracle's noisy per-step predictions into a tempo-correct
// three-track performance (melody, bass, drums) encoded as a Standard MIDI
// File. The oracle is an injected trait object; when none is configured, or
// when it fails mid-run, a procedural demo generator takes over so a request
// always produces a melody.
//
// Architecture:
// - config.rs: Normalization params (VOCAB_SIZE, MAX_STEP, MAX_DURATION) and
//   fixed generation constants
// - genre.rs: Genre tables (scale, seed pitch, instrument, demo template)
// - scale.rs: Scale definitions and nearest-in-scale pitch snapping
// - rhythm.rs: Grid quantization of predicted step/duration
// - tempo.rs: Reference-tempo to target-tempo scaling
// - window.rs: Fixed-length ring of normalized notes fed to the oracle
// - seed.rs: Initial window (padding + genre motif)
// - oracle.rs: Oracle trait and temperature-scaled sampling of its output
// - sequencer.rs: The constrained generation loop
// - demo.rs: Procedural fallback melody generator
// - note.rs: Model vs. fallback note shapes and their common span
// - bass.rs, drums.rs: Procedural accompaniment driven by bar index
// - score.rs: Multi-track score representation
// - midi.rs: Score assembly, melody dynamics, SMF encoding
// - service.rs: Caller-facing request/response and backend selection
//
// Given a request seed, generation is fully deterministic.

pub mod bass;
pub mod config;
pub mod demo;
pub mod drums;
pub mod error;
pub mod genre;
pub mod midi;
pub mod note;
pub mod oracle;
pub mod rhythm;
pub mod scale;
pub mod score;
pub mod seed;
pub mod sequencer;
pub mod service;
pub mod tempo;
pub mod window;

pub use error::{Error, OracleError, Result};
pub use genre::Genre;
pub use note::{DemoNote, GeneratedNote, MelodyNote, NoteSpan};
pub use oracle::{Oracle, OracleOutput};
pub use service::{MelodyRequest, MelodyResponse, MelodyService};
