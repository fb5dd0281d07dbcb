//! Shell error taxonomy
//!
//! Everything here except I/O failures is a control-flow condition the
//! controller recovers from locally; only the engine's termination
//! request (see [`crate::engine::EngineError`]) exits the process.

use thiserror::Error;

/// Shell result
pub type ShellResult<T> = Result<T, ShellError>;

/// Shell errors and control-flow conditions
#[derive(Debug, Error)]
pub enum ShellError {
    /// User-requested cancellation mid-read; the controller prints a
    /// notice and restarts the loop
    #[error("interrupted")]
    Interrupted,

    /// First line of a statement started with the shell-escape marker;
    /// carries the raw line, never reaches the evaluator
    #[error("shell escape: {0}")]
    ShellEscape(String),

    /// Feeder exhausted; surfaced as normal loop termination
    #[error("end of input")]
    EndOfInput,

    /// Recoverable configuration problem (invalid style name, malformed
    /// macro line); falls back to a safe default
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
