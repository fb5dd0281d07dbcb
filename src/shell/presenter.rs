//! Result presentation
//!
//! Renders prompts and evaluation results. Both backends print through
//! one presenter so that identical configuration and results yield
//! byte-identical output. The presenter also keeps its highlight style
//! synchronized with the shared store in both directions: a style set by
//! an evaluated statement is adopted on the next render, and an invalid
//! store value is overwritten with the presenter's current style.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::engine::definitions::{Definitions, Value, KEY_STYLE};
use crate::engine::value::{EvalResult, ResultKind};
use crate::shell::highlight::{self, Highlighter};

/// Shown in place of graph results; terminals render no plots
pub const GRAPH_SENTINEL: &str = "-Graph-";

/// ANSI escape prefixes of the In prompt: color, bold, unbold, reset-fg
const IN_COLORS: [&str; 4] = ["\x1b[32m", "\x1b[1m", "\x1b[22m", "\x1b[39m"];
/// Same shape as the In prompt, in the Out color
const OUT_COLORS: [&str; 4] = ["\x1b[31m", "\x1b[1m", "\x1b[22m", "\x1b[39m"];

static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("\x1b\\[[0-9;]+m").expect("static ANSI pattern")
});

/// Width of `text` on screen, with ANSI escapes stripped
pub fn visible_width(text: &str) -> usize {
    ANSI_ESCAPE.replace_all(text, "").chars().count()
}

/// Outcome of a style change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleChange {
    /// Requested style already active; no state or store write happened
    Unchanged,
    Changed,
    /// Unknown style name; state and store untouched
    Invalid,
}

/// Prompt and result renderer shared by both backends
pub struct Presenter {
    definitions: Rc<RefCell<Definitions>>,
    highlighter: Highlighter,
    style: Option<String>,
}

impl Presenter {
    /// Presenter with an initial style; an unknown name is reported on
    /// stderr and falls back to unstyled output
    pub fn new(
        definitions: Rc<RefCell<Definitions>>,
        style: Option<String>,
    ) -> Self {
        let (highlighter, style) = match style {
            Some(name) => match Highlighter::with_style(&name) {
                Some(hl) => (hl, Some(name)),
                None => {
                    eprintln!("{}", highlight::unknown_style_notice(&name));
                    (Highlighter::plain(), None)
                }
            },
            None => (Highlighter::plain(), None),
        };
        let presenter = Self {
            definitions,
            highlighter,
            style,
        };
        presenter.write_style_to_store();
        presenter
    }

    /// Name of the active style
    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Switch styles. `None` turns styling off. Requesting the active
    /// style is a no-op that touches neither presenter nor store.
    pub fn set_style(
        &mut self,
        style: Option<&str>,
    ) -> StyleChange {
        if self.style.as_deref() == style {
            return StyleChange::Unchanged;
        }
        match style {
            None => {
                self.highlighter = Highlighter::plain();
                self.style = None;
            }
            Some(name) => match Highlighter::with_style(name) {
                Some(hl) => {
                    self.highlighter = hl;
                    self.style = Some(name.to_string());
                }
                None => return StyleChange::Invalid,
            },
        }
        self.write_style_to_store();
        debug!(style = ?self.style, "highlight style changed");
        StyleChange::Changed
    }

    /// Advance to the next style in the available list
    pub fn cycle_style(&mut self) -> StyleChange {
        let next = highlight::next_style(self.style.as_deref());
        self.set_style(Some(next))
    }

    fn write_style_to_store(&self) {
        let value = match &self.style {
            Some(name) => Value::Str(name.clone()),
            None => Value::Null,
        };
        self.definitions.borrow_mut().set(KEY_STYLE, value);
    }

    /// Adopt a style written into the store by an evaluated statement;
    /// an invalid store value is replaced with the presenter's own
    pub fn sync_style_from_store(&mut self) {
        let stored = self.definitions.borrow().get(KEY_STYLE).cloned();
        match stored {
            // nobody wrote the key yet, publish the active style
            None => self.write_style_to_store(),
            Some(Value::Null) => {
                self.highlighter = Highlighter::plain();
                self.style = None;
            }
            Some(Value::Str(name)) => {
                if self.style.as_deref() == Some(name.as_str()) {
                    return;
                }
                match Highlighter::with_style(&name) {
                    Some(hl) => {
                        self.highlighter = hl;
                        self.style = Some(name);
                    }
                    None => self.write_style_to_store(),
                }
            }
            // a non-string write is treated like an invalid name
            Some(_) => self.write_style_to_store(),
        }
    }

    /// The `In[n]:= ` prompt for the next statement
    pub fn in_prompt(&self) -> String {
        let n = self.definitions.borrow().line_no() + 1;
        if self.style.is_some() {
            format!(
                "{}In[{}{}{}]:= {}",
                IN_COLORS[0], IN_COLORS[1], n, IN_COLORS[2], IN_COLORS[3]
            )
        } else {
            format!("In[{n}]:= ")
        }
    }

    /// Continuation prompt: spaces matching the In prompt's width
    pub fn continuation_prompt(&self) -> String {
        " ".repeat(visible_width(&self.in_prompt()))
    }

    /// The `Out[n]= ` prompt, with the output form tag between bracket
    /// and equals sign
    pub fn out_prompt(
        &self,
        form_tag: &str,
    ) -> String {
        let n = self.definitions.borrow().line_no();
        if self.style.is_some() {
            format!(
                "{}Out[{}{}{}]{}= {}",
                OUT_COLORS[0], OUT_COLORS[1], n, OUT_COLORS[2], form_tag, OUT_COLORS[3]
            )
        } else {
            format!("Out[{n}]{form_tag}= ")
        }
    }

    /// Indent every line after the first to the Out column
    fn to_output(
        &self,
        text: &str,
        prompt_width: usize,
    ) -> String {
        let pad = " ".repeat(prompt_width);
        let mut lines = text.lines();
        let mut out = String::new();
        if let Some(first) = lines.next() {
            out.push_str(first);
        }
        for line in lines {
            out.push('\n');
            out.push_str(&pad);
            out.push_str(line);
        }
        out
    }

    /// Exact bytes `print_result` would write, or `None` when the result
    /// prints nothing
    pub fn render_result(
        &mut self,
        result: &EvalResult,
        show_prompt: bool,
        output_style: &str,
        strict: bool,
    ) -> Option<String> {
        self.sync_style_from_store();

        if result.is_void() {
            // void statements still separate from the next prompt
            return if show_prompt && output_style != "text" {
                Some("\n".to_string())
            } else {
                None
            };
        }

        let body = match result.kind {
            // strict mode shows the bare string through the literal
            // string token path; otherwise the string is re-quoted for
            // terminal display
            ResultKind::Str if strict => {
                self.highlighter.format_string_token(result.display.trim_end())
            }
            ResultKind::Str => {
                format!("\"{}\"", result.display.replace('"', "\\\""))
            }
            ResultKind::Graph => GRAPH_SENTINEL.to_string(),
            ResultKind::Generic | ResultKind::Void => self.highlighter.highlight(&result.display),
        };

        if !show_prompt || output_style == "text" {
            return Some(format!("{body}\n"));
        }

        let prompt = self.out_prompt(output_style);
        let width = visible_width(&prompt);
        Some(format!("{}{}\n\n", prompt, self.to_output(&body, width)))
    }

    /// Render and write a result to stdout
    pub fn print_result(
        &mut self,
        result: &EvalResult,
        show_prompt: bool,
        output_style: &str,
        strict: bool,
    ) {
        if let Some(bytes) = self.render_result(result, show_prompt, output_style, strict) {
            let mut stdout = std::io::stdout();
            let _ = stdout.write_all(bytes.as_bytes());
            let _ = stdout.flush();
        }
    }

    /// Engine-initiated output (`Print[...]`) with every line after the
    /// first indented to the Out column
    pub fn render_out(
        &self,
        text: &str,
    ) -> String {
        let width = visible_width(&self.out_prompt(""));
        let mut out = self.to_output(text.trim_end_matches('\n'), width);
        out.push('\n');
        out
    }

    /// Render and write engine-initiated output to stdout
    pub fn print_out(
        &mut self,
        text: &str,
    ) {
        let bytes = self.render_out(text);
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(bytes.as_bytes());
        let _ = stdout.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::ResultKind;

    fn presenter(style: Option<&str>) -> Presenter {
        let defs = Rc::new(RefCell::new(Definitions::new()));
        Presenter::new(defs, style.map(|s| s.to_string()))
    }

    #[test]
    fn test_plain_prompts() {
        let p = presenter(None);
        assert_eq!(p.in_prompt(), "In[1]:= ");
        assert_eq!(p.out_prompt(""), "Out[0]= ");
        assert_eq!(p.out_prompt("//TeXForm"), "Out[0]//TeXForm= ");
        assert_eq!(p.continuation_prompt(), "        ");
    }

    #[test]
    fn test_styled_prompt_visible_width() {
        let p = presenter(Some("default"));
        let prompt = p.in_prompt();
        assert!(prompt.contains("\x1b[32m"));
        assert_eq!(visible_width(&prompt), "In[1]:= ".len());
    }

    #[test]
    fn test_multiline_output_indented() {
        let mut p = presenter(None);
        p.definitions.borrow_mut().set_line_no(1);
        let result = EvalResult {
            kind: ResultKind::Generic,
            display: "a\nb\nc".into(),
        };
        let rendered = p.render_result(&result, true, "", false).unwrap();
        assert_eq!(rendered, "Out[1]= a\n        b\n        c\n\n");
    }

    #[test]
    fn test_void_renders_blank_separator() {
        let mut p = presenter(None);
        let void = EvalResult::void();
        assert_eq!(p.render_result(&void, true, "", false).as_deref(), Some("\n"));
        assert_eq!(p.render_result(&void, false, "", false), None);
        assert_eq!(p.render_result(&void, true, "text", false), None);
    }

    #[test]
    fn test_string_requoted_unless_strict() {
        let mut p = presenter(None);
        let result = EvalResult {
            kind: ResultKind::Str,
            display: "say \"hi\"".into(),
        };
        let loose = p.render_result(&result, false, "", false).unwrap();
        assert_eq!(loose, "\"say \\\"hi\\\"\"\n");
        let strict = p.render_result(&result, false, "", true).unwrap();
        assert_eq!(strict, "say \"hi\"\n");
    }

    #[test]
    fn test_strict_string_trims_trailing_whitespace() {
        let mut p = presenter(None);
        let result = EvalResult {
            kind: ResultKind::Str,
            display: "padded  \n".into(),
        };
        let strict = p.render_result(&result, false, "", true).unwrap();
        assert_eq!(strict, "padded\n");
    }

    #[test]
    fn test_set_style_idempotent() {
        let mut p = presenter(Some("default"));
        assert_eq!(p.set_style(Some("default")), StyleChange::Unchanged);
        assert_eq!(p.set_style(Some("inkpot")), StyleChange::Changed);
        assert_eq!(p.set_style(Some("nope")), StyleChange::Invalid);
        assert_eq!(p.style(), Some("inkpot"));
        assert_eq!(p.set_style(None), StyleChange::Changed);
        assert_eq!(p.style(), None);
    }

    #[test]
    fn test_style_sync_both_ways() {
        let defs = Rc::new(RefCell::new(Definitions::new()));
        let mut p = Presenter::new(Rc::clone(&defs), Some("default".to_string()));
        // an evaluated statement switched the style
        defs.borrow_mut().set(KEY_STYLE, Value::Str("inkpot".into()));
        p.sync_style_from_store();
        assert_eq!(p.style(), Some("inkpot"));
        // an invalid store value is overwritten with the active style
        defs.borrow_mut().set(KEY_STYLE, Value::Str("bogus".into()));
        p.sync_style_from_store();
        assert_eq!(p.style(), Some("inkpot"));
        assert_eq!(defs.borrow().get_str(KEY_STYLE).as_deref(), Some("inkpot"));
    }

    #[test]
    fn test_out_callback_indents_to_out_column() {
        let p = presenter(None);
        p.definitions.borrow_mut().set_line_no(3);
        assert_eq!(p.render_out("one\ntwo"), "one\n        two\n");
        assert_eq!(p.render_out("single\n"), "single\n");
    }

    #[test]
    fn test_unknown_initial_style_falls_back_plain() {
        let defs = Rc::new(RefCell::new(Definitions::new()));
        let p = Presenter::new(Rc::clone(&defs), Some("bogus".to_string()));
        assert_eq!(p.style(), None);
        assert!(matches!(defs.borrow().get(KEY_STYLE), Some(Value::Null)));
    }

    #[test]
    fn test_graph_sentinel() {
        let mut p = presenter(None);
        p.definitions.borrow_mut().set_line_no(2);
        let result = EvalResult {
            kind: ResultKind::Graph,
            display: "Graph[{1 -> 2}]".into(),
        };
        let rendered = p.render_result(&result, true, "", false).unwrap();
        assert_eq!(rendered, "Out[2]= -Graph-\n\n");
    }
}
