// Error types for the generation core.
//
// Nothing here is fatal to a melody request: `service.rs` turns an
// `OracleError` into a demo-mode fallback and `midi.rs` turns a composition
// error into an empty payload. The `Result`-returning entry points exist for
// callers (and tests) that want to see the failure.

use std::path::PathBuf;

/// Failures raised by an oracle or by sampling its output.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle inference failed: {0}")]
    Inference(String),
    #[error("oracle returned malformed output: {0}")]
    MalformedOutput(String),
    #[error("sampling temperature must be finite and positive, got {0}")]
    InvalidTemperature(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("score serialization failed: {0}")]
    Composition(String),
    #[error("failed to read normalization params from {path}: {source}")]
    ParamsIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse normalization params: {0}")]
    ParamsParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
