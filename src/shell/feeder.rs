//! The line-feeding contract
//!
//! The evaluator pulls raw lines through [`LineFeeder`] until it has one
//! complete statement. `feed()` returns the next line including its
//! trailing newline; an empty string terminates the current statement
//! without meaning end-of-input. `empty()` reports exhaustion and is
//! polled by the evaluator before calling `feed()` again.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Read;
use std::path::Path;
use std::rc::Rc;

use crate::engine::definitions::Definitions;
use crate::engine::value::EvalResult;
use crate::shell::error::ShellError;
use crate::shell::presenter::Presenter;
use crate::shell::ShellBackend;

/// Pull-based line supply consumed by the evaluator's parser
pub trait LineFeeder {
    /// Next raw line including trailing `'\n'`; `""` terminates the
    /// statement. Increments the per-statement line count on every
    /// non-empty line and checks EOF before blocking.
    fn feed(&mut self) -> Result<String, ShellError>;

    /// Whether the feeder can supply no further input
    fn empty(&self) -> bool;

    /// Reset the per-statement line count; called by the controller
    /// after every completed statement, successful or not
    fn reset_line_number(&mut self);

    /// Current line index within the statement being fed (0 at start)
    fn line_number(&self) -> usize;
}

/// Feeder over in-memory text; used for `--code`, `--file`, and tests
#[derive(Debug)]
pub struct StringLineFeeder {
    lines: VecDeque<String>,
    lineno: usize,
}

impl StringLineFeeder {
    pub fn new(source: &str) -> Self {
        Self {
            lines: source.lines().map(|l| l.to_string()).collect(),
            lineno: 0,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ShellError> {
        let mut source = String::new();
        std::fs::File::open(path)?.read_to_string(&mut source)?;
        Ok(Self::new(&source))
    }
}

impl LineFeeder for StringLineFeeder {
    fn feed(&mut self) -> Result<String, ShellError> {
        match self.lines.pop_front() {
            Some(line) if line.trim().is_empty() => Ok(String::new()),
            Some(line) => {
                self.lineno += 1;
                Ok(line + "\n")
            }
            None => Ok(String::new()),
        }
    }

    fn empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn reset_line_number(&mut self) {
        self.lineno = 0;
    }

    fn line_number(&self) -> usize {
        self.lineno
    }
}

/// Non-interactive backend over in-memory source; drives `--code`,
/// `--file`, and the plain backend's piped input
pub struct BatchShell {
    feeder: StringLineFeeder,
    presenter: Presenter,
}

impl BatchShell {
    pub fn new(
        definitions: Rc<RefCell<Definitions>>,
        source: &str,
        style: Option<String>,
        use_unicode: bool,
    ) -> Self {
        let source = if use_unicode {
            crate::shell::config::normalize_unicode(source)
        } else {
            source.to_string()
        };
        Self {
            feeder: StringLineFeeder::new(&source),
            presenter: Presenter::new(definitions, style),
        }
    }
}

impl LineFeeder for BatchShell {
    fn feed(&mut self) -> Result<String, ShellError> {
        self.feeder.feed()
    }

    fn empty(&self) -> bool {
        self.feeder.empty()
    }

    fn reset_line_number(&mut self) {
        self.feeder.reset_line_number();
    }

    fn line_number(&self) -> usize {
        self.feeder.line_number()
    }
}

impl ShellBackend for BatchShell {
    fn print_result(
        &mut self,
        result: &EvalResult,
        show_prompt: bool,
        output_style: &str,
        strict: bool,
    ) {
        self.presenter
            .print_result(result, show_prompt, output_style, strict);
    }

    fn out_callback(
        &mut self,
        text: &str,
    ) {
        self.presenter.print_out(text);
    }

    fn flush_history(&mut self) {}
}
