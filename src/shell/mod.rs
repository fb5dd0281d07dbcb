//! Interactive shell subsystem
//!
//! This module owns everything between the terminal and the engine
//! boundary: the line-feeding contract, the two input backends, result
//! presentation, completion, and key bindings.

pub mod bindkeys;
pub mod completion;
pub mod config;
pub mod controller;
pub mod error;
pub mod feeder;
pub mod highlight;
pub mod history;
pub mod minimal;
pub mod presenter;
pub mod rich;

pub use config::{BackendOptions, EditModeOpt};
pub use controller::{interactive_eval_loop, LoopOptions};
pub use error::ShellError;
pub use feeder::{BatchShell, LineFeeder, StringLineFeeder};
pub use minimal::MinimalShell;
pub use presenter::Presenter;
pub use rich::RichShell;

use crate::engine::value::EvalResult;

/// Shell backend contract
///
/// Both backends are line feeders plus the presentation surface the
/// controller drives. Given identical configuration and results, the
/// two implementations must produce byte-identical prompts and
/// `print_result` output; the shared [`Presenter`] enforces this.
pub trait ShellBackend: LineFeeder {
    /// Format and print an evaluation result to stdout
    fn print_result(
        &mut self,
        result: &EvalResult,
        show_prompt: bool,
        output_style: &str,
        strict: bool,
    );

    /// Engine-initiated output (`Print[...]`), written outside the
    /// result flow with lines after the first indented to the Out
    /// column
    fn out_callback(
        &mut self,
        text: &str,
    );

    /// Flush pending history entries; called at statement boundaries
    fn flush_history(&mut self);
}

/// Shared per-line postprocessing for both backends: shell-escape
/// detection on the first line of a statement, unicode normalization,
/// and the blank-line statement terminator.
pub(crate) fn postprocess_line(
    line: String,
    lineno: usize,
    use_unicode: bool,
) -> Result<String, ShellError> {
    if lineno == 0 && line.starts_with('!') {
        return Err(ShellError::ShellEscape(line));
    }
    let line = if use_unicode {
        config::normalize_unicode(&line)
    } else {
        line
    };
    if line.is_empty() {
        return Ok(String::new());
    }
    Ok(line + "\n")
}
