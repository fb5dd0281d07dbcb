//! Rich terminal backend
//!
//! A raw-mode line editor built directly on `crossterm`: live syntax
//! highlighting on every repaint, auto-pairing bracket keys, Emacs and
//! Vi editing modes switchable at runtime, escape-prefixed user macros,
//! a bottom-row status toolbar, and bounded persistent history.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use crossterm::cursor::{MoveTo, MoveToColumn, RestorePosition, SavePosition};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use tracing::debug;

use crate::engine::definitions::{Definitions, KEY_GROUP_AUTOCOMPLETE, KEY_HISTORY_LENGTH};
use crate::engine::value::EvalResult;
use crate::shell::bindkeys::{EditAction, KeyBindingTable};
use crate::shell::completion::CompletionEngine;
use crate::shell::config::{BackendOptions, EditModeOpt};
use crate::shell::error::ShellError;
use crate::shell::feeder::LineFeeder;
use crate::shell::history::History;
use crate::shell::presenter::{visible_width, Presenter};
use crate::shell::{postprocess_line, ShellBackend};
use crate::util::paths;
use crate::VERSION;

/// Line buffer with a byte-offset cursor kept on a char boundary
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    text: String,
    cursor: usize,
}

impl EditBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Characters left of the cursor, for the screen column
    pub fn cursor_chars(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }

    pub fn before_cursor(&self) -> &str {
        &self.text[..self.cursor]
    }

    fn char_at_cursor(&self) -> Option<char> {
        self.text[self.cursor..].chars().next()
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .char_indices()
            .last()
            .map(|(i, _)| i)
    }

    pub fn insert_char(
        &mut self,
        c: char,
    ) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(
        &mut self,
        s: &str,
    ) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.text.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete_at(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.char_at_cursor() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn kill_to_end(&mut self) {
        self.text.truncate(self.cursor);
    }

    pub fn kill_to_start(&mut self) {
        self.text.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Delete the word left of the cursor, including trailing spaces
    pub fn delete_word_back(&mut self) {
        let before = &self.text[..self.cursor];
        let trimmed = before.trim_end_matches(' ');
        let start = trimmed
            .rfind(|c: char| !(c.is_alphanumeric() || c == '`' || c == '$'))
            .map(|p| p + 1)
            .unwrap_or(0);
        self.text.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Replace the whole buffer (history recall)
    pub fn set(
        &mut self,
        text: &str,
    ) {
        self.text = text.to_string();
        self.cursor = self.text.len();
    }

    /// Replace `start..cursor` with `replacement` (completion accept)
    pub fn replace_back_to(
        &mut self,
        start: usize,
        replacement: &str,
    ) {
        self.text.replace_range(start..self.cursor, replacement);
        self.cursor = start + replacement.len();
    }
}

/// Apply a binding-produced edit to the buffer
pub fn apply_edit_action(
    buffer: &mut EditBuffer,
    action: &EditAction,
) {
    match action {
        EditAction::InsertPair(open, close) => {
            buffer.insert_char(*open);
            buffer.insert_char(*close);
            buffer.move_left();
        }
        EditAction::CloseOrSkip(close) => {
            if buffer.char_at_cursor() == Some(*close) {
                buffer.move_right();
            } else {
                buffer.insert_char(*close);
            }
        }
        EditAction::Quote => {
            if buffer.char_at_cursor() == Some('"') {
                buffer.move_right();
            } else {
                buffer.insert_char('"');
                buffer.insert_char('"');
                buffer.move_left();
            }
        }
        EditAction::InsertText(text) => buffer.insert_str(text),
        // mode toggles are handled by the editor loop, not the buffer
        EditAction::ToggleEditMode | EditAction::ToggleAutobrace | EditAction::CycleStyle => {}
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ViState {
    Insert,
    Normal,
}

enum LoopStep {
    Continue,
    Accept,
    Eof,
}

/// The rich backend
pub struct RichShell {
    definitions: Rc<RefCell<Definitions>>,
    presenter: Presenter,
    completion: Option<CompletionEngine>,
    bindings: KeyBindingTable,
    history: History,
    /// Lines of the statement currently being fed, for history
    pending: Vec<String>,
    edit_mode: EditModeOpt,
    vi_state: ViState,
    lineno: usize,
    eof: bool,
    use_unicode: bool,
    show_prompt: bool,
    buffer: EditBuffer,
    /// History navigation cursor; `history.len()` means the live draft
    nav: usize,
    draft: String,
}

impl RichShell {
    pub fn new(
        definitions: Rc<RefCell<Definitions>>,
        options: &BackendOptions,
    ) -> Result<Self, ShellError> {
        let presenter = Presenter::new(Rc::clone(&definitions), options.style.clone());
        let history_len =
            paths::history_length(definitions.borrow().get_int(KEY_HISTORY_LENGTH));
        let history = History::with_file(paths::rich_history_file(), history_len);
        let mut bindings = KeyBindingTable::standard();
        bindings.load_macro_file(&paths::bindings_file());
        let nav = history.len();
        Ok(Self {
            completion: options
                .want_completion
                .then(|| CompletionEngine::new(Rc::clone(&definitions))),
            definitions,
            presenter,
            bindings,
            history,
            pending: Vec::new(),
            edit_mode: options.edit_mode,
            vi_state: ViState::Insert,
            lineno: 0,
            eof: false,
            use_unicode: options.use_unicode,
            show_prompt: options.show_prompt,
            buffer: EditBuffer::default(),
            nav,
            draft: String::new(),
        })
    }

    fn autobrace(&self) -> bool {
        self.definitions
            .borrow()
            .get_bool(KEY_GROUP_AUTOCOMPLETE, true)
    }

    fn toggle_autobrace(&self) {
        let current = self.autobrace();
        self.definitions.borrow_mut().set(
            KEY_GROUP_AUTOCOMPLETE,
            crate::engine::definitions::Value::Bool(!current),
        );
    }

    fn toolbar(&self) -> String {
        format!(
            " mathshell: {}, Style: {}, Mode: {}, Autobrace: {}",
            VERSION,
            self.presenter.style().unwrap_or("none"),
            match self.edit_mode {
                EditModeOpt::Emacs => "Emacs".to_string(),
                EditModeOpt::Vi => match self.vi_state {
                    ViState::Insert => "Vi (insert)".to_string(),
                    ViState::Normal => "Vi".to_string(),
                },
            },
            if self.autobrace() { "on" } else { "off" }
        )
    }

    fn repaint(
        &mut self,
        prompt: &str,
    ) -> Result<(), ShellError> {
        let mut stdout = std::io::stdout();
        let highlighted = self.presenter.highlighter().highlight(self.buffer.text());
        queue!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        write!(stdout, "{prompt}{highlighted}")?;
        if let Ok((_, rows)) = terminal::size() {
            let toolbar = self.toolbar();
            let last_row = rows.saturating_sub(1);
            queue!(stdout, SavePosition, MoveTo(0, last_row), Clear(ClearType::CurrentLine))?;
            write!(stdout, "{toolbar}")?;
            queue!(stdout, RestorePosition)?;
        }
        let column = visible_width(prompt) + self.buffer.cursor_chars();
        queue!(stdout, MoveToColumn(column as u16))?;
        stdout.flush()?;
        Ok(())
    }

    /// Read one line in raw mode; `None` means end of input
    fn read_line_raw(
        &mut self,
        prompt: &str,
    ) -> Result<Option<String>, ShellError> {
        terminal::enable_raw_mode()?;
        let outcome = self.edit_loop(prompt);
        let _ = terminal::disable_raw_mode();
        outcome
    }

    fn edit_loop(
        &mut self,
        prompt: &str,
    ) -> Result<Option<String>, ShellError> {
        self.buffer = EditBuffer::default();
        self.nav = self.history.len();
        self.draft.clear();
        self.vi_state = ViState::Insert;
        loop {
            self.repaint(prompt)?;
            let ev = event::read()?;
            let key = match ev {
                Event::Key(key) if key.kind != KeyEventKind::Release => key,
                _ => continue,
            };
            match self.handle_key(key.code, key.modifiers, prompt)? {
                LoopStep::Continue => {}
                LoopStep::Accept => {
                    self.finish_line()?;
                    return Ok(Some(std::mem::take(&mut self.buffer).text));
                }
                LoopStep::Eof => {
                    self.finish_line()?;
                    return Ok(None);
                }
            }
        }
    }

    fn finish_line(&mut self) -> Result<(), ShellError> {
        let mut stdout = std::io::stdout();
        write!(stdout, "\r\n")?;
        stdout.flush()?;
        Ok(())
    }

    fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        prompt: &str,
    ) -> Result<LoopStep, ShellError> {
        // function-key toggles come from the binding table and work in
        // every mode
        if let KeyCode::F(n) = code {
            if let Some(action) = self.bindings.action_for_function_key(n) {
                self.apply_action(&action);
            }
            return Ok(LoopStep::Continue);
        }

        if modifiers.contains(KeyModifiers::CONTROL) {
            return self.handle_control(code);
        }

        if self.edit_mode == EditModeOpt::Vi && self.vi_state == ViState::Normal {
            return Ok(self.handle_vi_normal(code));
        }

        match code {
            KeyCode::Enter => return Ok(LoopStep::Accept),
            KeyCode::Backspace => self.buffer.backspace(),
            KeyCode::Delete => self.buffer.delete_at(),
            KeyCode::Left => self.buffer.move_left(),
            KeyCode::Right => self.buffer.move_right(),
            KeyCode::Home => self.buffer.move_home(),
            KeyCode::End => self.buffer.move_end(),
            KeyCode::Up => self.history_back(),
            KeyCode::Down => self.history_forward(),
            KeyCode::Tab => self.complete(prompt)?,
            KeyCode::Esc => match self.edit_mode {
                EditModeOpt::Vi => self.vi_state = ViState::Normal,
                EditModeOpt::Emacs => self.read_macro()?,
            },
            KeyCode::Char(c) => match self.bindings.action_for_char(c, self.autobrace()) {
                Some(action) => self.apply_action(&action),
                None => self.buffer.insert_char(c),
            },
            _ => {}
        }
        Ok(LoopStep::Continue)
    }

    /// Run a binding-table action: shell-level toggles here, buffer
    /// edits through [`apply_edit_action`]
    fn apply_action(
        &mut self,
        action: &EditAction,
    ) {
        match action {
            EditAction::CycleStyle => {
                self.presenter.cycle_style();
            }
            EditAction::ToggleAutobrace => self.toggle_autobrace(),
            EditAction::ToggleEditMode => {
                self.edit_mode = self.edit_mode.toggled();
                self.vi_state = ViState::Insert;
                debug!(mode = self.edit_mode.label(), "edit mode switched");
            }
            _ => apply_edit_action(&mut self.buffer, action),
        }
    }

    fn handle_control(
        &mut self,
        code: KeyCode,
    ) -> Result<LoopStep, ShellError> {
        match code {
            KeyCode::Char('c') => {
                self.finish_line()?;
                return Err(ShellError::Interrupted);
            }
            KeyCode::Char('d') => {
                if self.buffer.text().is_empty() {
                    return Ok(LoopStep::Eof);
                }
                self.buffer.delete_at();
            }
            KeyCode::Char('a') => self.buffer.move_home(),
            KeyCode::Char('e') => self.buffer.move_end(),
            KeyCode::Char('b') => self.buffer.move_left(),
            KeyCode::Char('f') => self.buffer.move_right(),
            KeyCode::Char('k') => self.buffer.kill_to_end(),
            KeyCode::Char('u') => self.buffer.kill_to_start(),
            KeyCode::Char('w') => self.buffer.delete_word_back(),
            KeyCode::Char('l') => {
                execute!(std::io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
            }
            KeyCode::Char('p') => self.history_back(),
            KeyCode::Char('n') => self.history_forward(),
            _ => {}
        }
        Ok(LoopStep::Continue)
    }

    fn handle_vi_normal(
        &mut self,
        code: KeyCode,
    ) -> LoopStep {
        match code {
            KeyCode::Enter => return LoopStep::Accept,
            KeyCode::Char('h') | KeyCode::Left => self.buffer.move_left(),
            KeyCode::Char('l') | KeyCode::Right => self.buffer.move_right(),
            KeyCode::Char('0') => self.buffer.move_home(),
            KeyCode::Char('$') => self.buffer.move_end(),
            KeyCode::Char('x') => self.buffer.delete_at(),
            KeyCode::Char('D') => self.buffer.kill_to_end(),
            KeyCode::Char('k') | KeyCode::Up => self.history_back(),
            KeyCode::Char('j') | KeyCode::Down => self.history_forward(),
            KeyCode::Char('i') => self.vi_state = ViState::Insert,
            KeyCode::Char('a') => {
                self.buffer.move_right();
                self.vi_state = ViState::Insert;
            }
            KeyCode::Char('A') => {
                self.buffer.move_end();
                self.vi_state = ViState::Insert;
            }
            KeyCode::Char('I') => {
                self.buffer.move_home();
                self.vi_state = ViState::Insert;
            }
            _ => {}
        }
        LoopStep::Continue
    }

    /// Collect keys after Escape until they match a bound macro or stop
    /// being a prefix of one
    fn read_macro(&mut self) -> Result<(), ShellError> {
        let mut keys = Vec::new();
        loop {
            if let Some(replacement) = self.bindings.macro_for(&keys) {
                let action = EditAction::InsertText(replacement.to_string());
                self.apply_action(&action);
                return Ok(());
            }
            if !keys.is_empty() && !self.bindings.is_macro_prefix(&keys) {
                return Ok(());
            }
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
                    KeyCode::Char(c) => keys.push(c),
                    _ => return Ok(()),
                },
                _ => {}
            }
            if keys.is_empty() {
                return Ok(());
            }
        }
    }

    fn history_back(&mut self) {
        if self.nav == 0 {
            return;
        }
        if self.nav == self.history.len() {
            self.draft = self.buffer.text().to_string();
        }
        self.nav -= 1;
        if let Some(entry) = self.history.get(self.nav) {
            let entry = entry.to_string();
            self.buffer.set(&entry);
        }
    }

    fn history_forward(&mut self) {
        if self.nav >= self.history.len() {
            return;
        }
        self.nav += 1;
        if self.nav == self.history.len() {
            let draft = std::mem::take(&mut self.draft);
            self.buffer.set(&draft);
        } else if let Some(entry) = self.history.get(self.nav) {
            let entry = entry.to_string();
            self.buffer.set(&entry);
        }
    }

    fn complete(
        &mut self,
        prompt: &str,
    ) -> Result<(), ShellError> {
        let engine = match &self.completion {
            Some(engine) => engine,
            None => return Ok(()),
        };
        let (start, candidates) = engine.complete(self.buffer.before_cursor());
        match candidates.len() {
            0 => {}
            1 => self.buffer.replace_back_to(start, &candidates[0].text),
            _ => {
                let mut stdout = std::io::stdout();
                write!(stdout, "\r\n")?;
                for candidate in &candidates {
                    match &candidate.meta {
                        Some(meta) => write!(stdout, "{} {}\r\n", candidate.display, meta)?,
                        None => write!(stdout, "{}\r\n", candidate.display)?,
                    }
                }
                stdout.flush()?;
                self.repaint(prompt)?;
            }
        }
        Ok(())
    }
}

impl LineFeeder for RichShell {
    fn feed(&mut self) -> Result<String, ShellError> {
        if self.eof {
            return Ok(String::new());
        }
        let prompt = if !self.show_prompt {
            String::new()
        } else if self.lineno == 0 {
            self.presenter.in_prompt()
        } else {
            self.presenter.continuation_prompt()
        };
        let line = match self.read_line_raw(&prompt)? {
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

impl ShellBackend for RichShell {
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
        self.history.push(&entry);
        if let Err(err) = self.history.save() {
            debug!(%err, "failed to save history");
        }
    }
}

impl Drop for RichShell {
    fn drop(&mut self) {
        let _ = self.history.save();
    }
}
