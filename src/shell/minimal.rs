//! Minimal readline backend
//!
//! Line editing through `rustyline` with tab completion, persistent
//! history, and user macros bound as escape-prefixed insert sequences.
//! On a non-terminal stdin the backend degrades to plain buffered
//! reads so piped input works unchanged.

use std::cell::RefCell;
use std::io::{BufRead, BufReader, IsTerminal, Stdin};
use std::rc::Rc;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter as RlHighlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, CompletionType, Config, EditMode, Editor, Event, EventHandler, Helper, KeyCode,
    KeyEvent, Modifiers,
};
use tracing::{debug, warn};

use crate::engine::definitions::{Definitions, KEY_HISTORY_LENGTH};
use crate::engine::value::EvalResult;
use crate::shell::bindkeys::KeyBindingTable;
use crate::shell::completion::CompletionEngine;
use crate::shell::config::{BackendOptions, EditModeOpt};
use crate::shell::error::ShellError;
use crate::shell::feeder::LineFeeder;
use crate::shell::presenter::Presenter;
use crate::shell::{postprocess_line, ShellBackend};
use crate::util::paths;

/// rustyline helper wiring the completion engine into the editor
pub struct ShellHelper {
    completion: Option<CompletionEngine>,
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let engine = match &self.completion {
            Some(engine) => engine,
            None => return Ok((pos, Vec::new())),
        };
        let (start, candidates) = engine.complete(&line[..pos]);
        let pairs = candidates
            .into_iter()
            .map(|c| Pair {
                display: match c.meta {
                    Some(meta) => format!("{} {}", c.display, meta),
                    None => c.display,
                },
                replacement: c.text,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl RlHighlighter for ShellHelper {}
impl Validator for ShellHelper {}
impl Helper for ShellHelper {}

enum Input {
    Terminal(Editor<ShellHelper, FileHistory>),
    Pipe(std::io::Lines<BufReader<Stdin>>),
}

/// The minimal backend
pub struct MinimalShell {
    presenter: Presenter,
    input: Input,
    /// Lines of the statement currently being fed, for history
    pending: Vec<String>,
    lineno: usize,
    eof: bool,
    use_unicode: bool,
    show_prompt: bool,
}

impl MinimalShell {
    pub fn new(
        definitions: Rc<RefCell<Definitions>>,
        options: &BackendOptions,
    ) -> Result<Self, ShellError> {
        let presenter = Presenter::new(Rc::clone(&definitions), options.style.clone());
        let input = if std::io::stdin().is_terminal() {
            Input::Terminal(build_editor(&definitions, options)?)
        } else {
            debug!("stdin is not a terminal, reading without line editing");
            Input::Pipe(BufReader::new(std::io::stdin()).lines())
        };
        Ok(Self {
            presenter,
            input,
            pending: Vec::new(),
            lineno: 0,
            eof: false,
            use_unicode: options.use_unicode,
            show_prompt: options.show_prompt,
        })
    }

    fn prompt(&self) -> String {
        if !self.show_prompt {
            return String::new();
        }
        if self.lineno == 0 {
            self.presenter.in_prompt()
        } else {
            self.presenter.continuation_prompt()
        }
    }

    fn read_line(&mut self) -> Result<Option<String>, ShellError> {
        let prompt = self.prompt();
        match &mut self.input {
            Input::Terminal(editor) => match editor.readline(&prompt) {
                Ok(line) => Ok(Some(line)),
                Err(ReadlineError::Interrupted) => Err(ShellError::Interrupted),
                Err(ReadlineError::Eof) => Ok(None),
                Err(err) => Err(ShellError::Config(err.to_string())),
            },
            Input::Pipe(lines) => match lines.next() {
                Some(line) => Ok(Some(line?)),
                None => Ok(None),
            },
        }
    }
}

impl LineFeeder for MinimalShell {
    fn feed(&mut self) -> Result<String, ShellError> {
        if self.eof {
            return Ok(String::new());
        }
        let line = match self.read_line()? {
            Some(line) => line,
            None => {
                self.eof = true;
                return Ok(String::new());
            }
        };
        if line.trim().is_empty() {
            return Ok(String::new());
        }
        let fed = postprocess_line(line.clone(), self.lineno, self.use_unicode)?;
        self.pending.push(line);
        self.lineno += 1;
        Ok(fed)
    }

    fn empty(&self) -> bool {
        self.eof
    }

    fn reset_line_number(&mut self) {
        self.lineno = 0;
    }

    fn line_number(&self) -> usize {
        self.lineno
    }
}

impl ShellBackend for MinimalShell {
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

    fn flush_history(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let entry = self.pending.join(" ");
        self.pending.clear();
        if let Input::Terminal(editor) = &mut self.input {
            let _ = editor.add_history_entry(&entry);
            if let Err(err) = editor.save_history(&paths::history_file()) {
                warn!(%err, "failed to save history");
            }
        }
    }
}

impl Drop for MinimalShell {
    fn drop(&mut self) {
        if let Input::Terminal(editor) = &mut self.input {
            let _ = editor.save_history(&paths::history_file());
        }
    }
}

fn build_editor(
    definitions: &Rc<RefCell<Definitions>>,
    options: &BackendOptions,
) -> Result<Editor<ShellHelper, FileHistory>, ShellError> {
    let history_len =
        paths::history_length(definitions.borrow().get_int(KEY_HISTORY_LENGTH));
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .auto_add_history(false)
        .edit_mode(match options.edit_mode {
            EditModeOpt::Emacs => EditMode::Emacs,
            EditModeOpt::Vi => EditMode::Vi,
        })
        .max_history_size(history_len)
        .map_err(|e| ShellError::Config(e.to_string()))?
        .build();

    let history = FileHistory::with_config(config.clone());
    let mut editor =
        Editor::with_history(config, history).map_err(|e| ShellError::Config(e.to_string()))?;
    editor.set_helper(Some(ShellHelper {
        completion: options
            .want_completion
            .then(|| CompletionEngine::new(Rc::clone(definitions))),
    }));
    if let Err(err) = editor.load_history(&paths::history_file()) {
        debug!(%err, "no readable history file");
    }

    // user macros become escape-prefixed insert sequences
    let mut table = KeyBindingTable::standard();
    table.load_macro_file(&paths::bindings_file());
    for binding in table.macros() {
        let mut seq = vec![KeyEvent(KeyCode::Esc, Modifiers::NONE)];
        seq.extend(
            binding
                .keys
                .iter()
                .map(|c| KeyEvent(KeyCode::Char(*c), Modifiers::NONE)),
        );
        editor.bind_sequence(
            Event::KeySeq(seq),
            EventHandler::Simple(Cmd::Insert(1, binding.replacement.clone())),
        );
    }
    Ok(editor)
}
