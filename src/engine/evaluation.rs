//! Statement parsing and evaluation
//!
//! [`Evaluation::parse_feeder`] is the pull side of the feeding protocol:
//! it calls `feed()` on the shell until the accumulated source forms one
//! complete statement (balanced delimiters outside strings), then hands
//! back a [`Query`]. [`Evaluation::evaluate`] runs the reference engine
//! over the query and advances the statement counter.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::engine::definitions::{Definitions, Value};
use crate::engine::value::{EvalResult, OutputForm, Query, ResultKind};
use crate::shell::error::ShellError;
use crate::shell::feeder::LineFeeder;

/// Engine-side errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// `Quit[]` / `Exit[n]`: propagated out of the loop to terminate the
    /// process with the requested exit code
    #[error("termination requested with exit code {0}")]
    Termination(i32),

    #[error("evaluation error: {0}")]
    Evaluation(String),
}

/// One evaluation turn against the shared definitions store
pub struct Evaluation {
    definitions: Rc<RefCell<Definitions>>,
}

impl Evaluation {
    pub fn new(definitions: Rc<RefCell<Definitions>>) -> Self {
        Self { definitions }
    }

    /// Pull lines from the feeder until one complete statement is parsed.
    ///
    /// Returns `Ok(None)` for an empty statement (blank line). Interrupt
    /// and shell-escape conditions from `feed()` propagate to the caller.
    /// An exhausted feeder at the start of a statement surfaces as
    /// [`ShellError::EndOfInput`].
    pub fn parse_feeder(
        &self,
        feeder: &mut dyn LineFeeder,
    ) -> Result<Option<Query>, ShellError> {
        let mut source = String::new();

        loop {
            if feeder.empty() {
                if source.trim().is_empty() {
                    return Err(ShellError::EndOfInput);
                }
                break;
            }

            let line = feeder.feed()?;
            if line.is_empty() {
                // statement terminator, not end of input
                break;
            }
            source.push_str(&line);
            if is_complete(&source) {
                break;
            }
        }

        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let (source, form) = match trimmed.strip_suffix("//TeXForm") {
            Some(rest) => (rest.trim().to_string(), OutputForm::TeX),
            None => (trimmed.to_string(), OutputForm::Standard),
        };

        Ok(Some(Query { source, form }))
    }

    /// Evaluate a parsed statement.
    ///
    /// `out` receives engine-initiated output (`Print[...]`), routed to
    /// the shell's out-callback outside the normal result flow. The
    /// statement counter advances exactly once per evaluated statement,
    /// whether or not the result is void.
    pub fn evaluate(
        &self,
        query: &Query,
        out: &mut dyn FnMut(&str),
    ) -> Result<EvalResult, EngineError> {
        let src = query.source.trim();

        if let Some(code) = parse_termination(src) {
            return Err(EngineError::Termination(code));
        }

        let (src, void) = match src.strip_suffix(';') {
            Some(rest) => (rest.trim(), true),
            None => (src, false),
        };

        let result = self.evaluate_expression(src, out)?;
        self.definitions.borrow_mut().increment_line_no();

        if void {
            Ok(EvalResult::void())
        } else {
            Ok(result)
        }
    }

    fn evaluate_expression(
        &self,
        src: &str,
        out: &mut dyn FnMut(&str),
    ) -> Result<EvalResult, EngineError> {
        // Print[...] produces engine output and a void result
        if let Some(inner) = call_argument(src, "Print") {
            let text = match string_content(inner) {
                Some(s) => s,
                None => self
                    .evaluate_expression(inner, out)
                    .map(|r| r.display)
                    .unwrap_or_else(|_| inner.to_string()),
            };
            out(&text);
            return Ok(EvalResult::void());
        }

        // assignment: define the symbol, result is the right-hand side
        if let Some((name, rhs)) = split_assignment(src) {
            let result = self.evaluate_expression(rhs, out)?;
            self.definitions
                .borrow_mut()
                .define(name, Value::Str(result.display.clone()));
            return Ok(result);
        }

        if let Some(content) = string_content(src) {
            return Ok(EvalResult {
                kind: ResultKind::Str,
                display: content,
            });
        }

        if call_argument(src, "Graph").is_some() {
            return Ok(EvalResult {
                kind: ResultKind::Graph,
                display: src.to_string(),
            });
        }

        // bare symbol lookup
        if is_identifier(src) {
            if let Some(Value::Str(v)) = self.definitions.borrow().lookup(src).cloned() {
                return Ok(EvalResult {
                    kind: ResultKind::Generic,
                    display: v,
                });
            }
        }

        if let Some(n) = eval_arithmetic(src) {
            return Ok(EvalResult {
                kind: ResultKind::Generic,
                display: n.to_string(),
            });
        }

        // anything else stays symbolic
        Ok(EvalResult {
            kind: ResultKind::Generic,
            display: src.to_string(),
        })
    }
}

/// `Quit[]`, `Exit[]`, `Quit[n]`, `Exit[n]`
fn parse_termination(src: &str) -> Option<i32> {
    for head in ["Quit", "Exit"] {
        if let Some(arg) = call_argument(src, head) {
            if arg.is_empty() {
                return Some(0);
            }
            if let Ok(code) = arg.parse::<i32>() {
                return Some(code);
            }
        }
    }
    None
}

/// For `Head[arg]` with matching brackets spanning the whole input,
/// return `arg` trimmed.
fn call_argument<'a>(
    src: &'a str,
    head: &str,
) -> Option<&'a str> {
    let rest = src.strip_prefix(head)?;
    let rest = rest.strip_prefix('[')?;
    let rest = rest.strip_suffix(']')?;
    Some(rest.trim())
}

/// Top-level `name = rhs` (not `==`, `<=`, `>=`, `!=`)
fn split_assignment(src: &str) -> Option<(&str, &str)> {
    let bytes = src.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'=' {
            continue;
        }
        let prev = if i > 0 { bytes[i - 1] } else { 0 };
        let next = bytes.get(i + 1).copied().unwrap_or(0);
        if next == b'=' || matches!(prev, b'=' | b'<' | b'>' | b'!' | b':') {
            return None;
        }
        let name = src[..i].trim();
        let rhs = src[i + 1..].trim();
        if is_identifier(name) && !rhs.is_empty() {
            return Some((name, rhs));
        }
        return None;
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '$' || c == '`')
}

/// Content of a double-quoted string literal spanning the whole input,
/// with `\"` unescaped
fn string_content(src: &str) -> Option<String> {
    let inner = src.strip_prefix('"')?.strip_suffix('"')?;
    // reject `"a" <> "b"` style inputs where the quotes do not enclose
    let mut escaped = false;
    for c in inner.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return None,
            _ => {}
        }
    }
    Some(inner.replace("\\\"", "\""))
}

/// Minimal integer arithmetic: `+ - * / ^` and parentheses. Returns
/// `None` when the input is not a closed integer expression, leaving it
/// symbolic.
fn eval_arithmetic(src: &str) -> Option<i64> {
    let tokens: Vec<char> = src.chars().filter(|c| !c.is_whitespace()).collect();
    let mut pos = 0usize;
    let value = parse_sum(&tokens, &mut pos)?;
    if pos == tokens.len() {
        Some(value)
    } else {
        None
    }
}

fn parse_sum(
    tokens: &[char],
    pos: &mut usize,
) -> Option<i64> {
    let mut acc = parse_product(tokens, pos)?;
    while let Some(&op) = tokens.get(*pos) {
        match op {
            '+' => {
                *pos += 1;
                acc = acc.checked_add(parse_product(tokens, pos)?)?;
            }
            '-' => {
                *pos += 1;
                acc = acc.checked_sub(parse_product(tokens, pos)?)?;
            }
            _ => break,
        }
    }
    Some(acc)
}

fn parse_product(
    tokens: &[char],
    pos: &mut usize,
) -> Option<i64> {
    let mut acc = parse_atom(tokens, pos)?;
    while let Some(&op) = tokens.get(*pos) {
        match op {
            '*' => {
                *pos += 1;
                acc = acc.checked_mul(parse_atom(tokens, pos)?)?;
            }
            '/' => {
                *pos += 1;
                let rhs = parse_atom(tokens, pos)?;
                if rhs == 0 || acc % rhs != 0 {
                    return None;
                }
                acc /= rhs;
            }
            '^' => {
                *pos += 1;
                let rhs = parse_atom(tokens, pos)?;
                acc = acc.checked_pow(u32::try_from(rhs).ok()?)?;
            }
            _ => break,
        }
    }
    Some(acc)
}

fn parse_atom(
    tokens: &[char],
    pos: &mut usize,
) -> Option<i64> {
    match tokens.get(*pos)? {
        '(' => {
            *pos += 1;
            let value = parse_sum(tokens, pos)?;
            if tokens.get(*pos) != Some(&')') {
                return None;
            }
            *pos += 1;
            Some(value)
        }
        '-' => {
            *pos += 1;
            Some(-parse_atom(tokens, pos)?)
        }
        c if c.is_ascii_digit() => {
            let mut value = 0i64;
            while let Some(c) = tokens.get(*pos) {
                if let Some(d) = c.to_digit(10) {
                    value = value.checked_mul(10)?.checked_add(d as i64)?;
                    *pos += 1;
                } else {
                    break;
                }
            }
            Some(value)
        }
        _ => None,
    }
}

/// Check whether the accumulated source forms a complete statement:
/// balanced braces, brackets, and parens outside of string literals.
pub fn is_complete(code: &str) -> bool {
    let code = code.trim();
    if code.is_empty() {
        return true;
    }

    let mut braces = 0i32;
    let mut brackets = 0i32;
    let mut parens = 0i32;
    let mut in_string = false;
    let mut escaped = false;

    for c in code.chars() {
        if escaped {
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => braces += 1,
            '}' if !in_string => {
                if braces == 0 {
                    return true;
                }
                braces -= 1;
            }
            '[' if !in_string => brackets += 1,
            ']' if !in_string => {
                if brackets == 0 {
                    return true;
                }
                brackets -= 1;
            }
            '(' if !in_string => parens += 1,
            ')' if !in_string => {
                if parens == 0 {
                    return true;
                }
                parens -= 1;
            }
            _ => {}
        }
    }

    braces == 0 && brackets == 0 && parens == 0 && !in_string && !escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation() -> Evaluation {
        Evaluation::new(Rc::new(RefCell::new(Definitions::new())))
    }

    fn eval(
        ev: &Evaluation,
        src: &str,
    ) -> EvalResult {
        let query = Query {
            source: src.to_string(),
            form: OutputForm::Standard,
        };
        ev.evaluate(&query, &mut |_| {}).unwrap()
    }

    #[test]
    fn test_is_complete() {
        assert!(is_complete("1 + 2"));
        assert!(is_complete("f[x, {1, 2}]"));
        assert!(!is_complete("f[x,"));
        assert!(!is_complete("{1, 2"));
        assert!(!is_complete("\"open string"));
        // brackets inside strings do not count
        assert!(is_complete("\"a [ b\""));
    }

    #[test]
    fn test_arithmetic() {
        let ev = evaluation();
        assert_eq!(eval(&ev, "1 + 2 * 3").display, "7");
        assert_eq!(eval(&ev, "(1 + 2) * 3").display, "9");
        assert_eq!(eval(&ev, "2^10").display, "1024");
        // non-exact division stays symbolic
        assert_eq!(eval(&ev, "1/2").display, "1/2");
    }

    #[test]
    fn test_string_and_graph_kinds() {
        let ev = evaluation();
        let r = eval(&ev, "\"hello\"");
        assert_eq!(r.kind, ResultKind::Str);
        assert_eq!(r.display, "hello");

        let r = eval(&ev, "Graph[{1 -> 2}]");
        assert_eq!(r.kind, ResultKind::Graph);
    }

    #[test]
    fn test_void_statement() {
        let ev = evaluation();
        let r = eval(&ev, "x = 5;");
        assert!(r.is_void());
        // the assignment still happened and the counter advanced
        assert_eq!(eval(&ev, "x").display, "5");
    }

    #[test]
    fn test_counter_advances_per_statement() {
        let ev = evaluation();
        eval(&ev, "1 + 1");
        eval(&ev, "2 + 2;");
        assert_eq!(ev.definitions.borrow().line_no(), 2);
    }

    #[test]
    fn test_termination() {
        let ev = evaluation();
        let query = Query {
            source: "Exit[3]".into(),
            form: OutputForm::Standard,
        };
        match ev.evaluate(&query, &mut |_| {}) {
            Err(EngineError::Termination(3)) => {}
            other => panic!("expected termination, got {other:?}"),
        }
        // counter must not advance on termination
        assert_eq!(ev.definitions.borrow().line_no(), 0);
    }

    #[test]
    fn test_print_routes_to_out_callback() {
        let ev = evaluation();
        let mut seen = Vec::new();
        let query = Query {
            source: "Print[\"side effect\"]".into(),
            form: OutputForm::Standard,
        };
        let r = ev.evaluate(&query, &mut |s| seen.push(s.to_string())).unwrap();
        assert!(r.is_void());
        assert_eq!(seen, vec!["side effect"]);
    }

    #[test]
    fn test_texform_suffix_parsing() {
        let ev = evaluation();
        let mut feeder = crate::shell::feeder::StringLineFeeder::new("x + y //TeXForm\n");
        let query = ev.parse_feeder(&mut feeder).unwrap().unwrap();
        assert_eq!(query.form, OutputForm::TeX);
        assert_eq!(query.source, "x + y");
    }
}
