//! The read-eval-print loop
//!
//! Drives any [`ShellBackend`] against the engine: parse one statement,
//! evaluate it, print the result, flush history, reset the feeder.
//! Interrupts and shell escapes recover locally; only feeder exhaustion
//! and engine termination requests leave the loop.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::rc::Rc;

use tracing::{debug, error};

use crate::engine::definitions::Definitions;
use crate::engine::evaluation::{EngineError, Evaluation};
use crate::shell::error::ShellError;
use crate::shell::ShellBackend;

/// Per-session presentation options for the loop
#[derive(Debug, Clone, Default)]
pub struct LoopOptions {
    /// Show `In[n]:=` / `Out[n]=` decoration
    pub show_prompt: bool,
    /// Re-quote string results instead of printing their raw content
    pub strict: bool,
    /// Fixed output style overriding the per-statement form tag; batch
    /// evaluation passes `"text"` here
    pub output_style: Option<String>,
}

/// Run the loop to completion, returning the process exit code
pub fn interactive_eval_loop<B: ShellBackend>(
    shell: &mut B,
    definitions: &Rc<RefCell<Definitions>>,
    options: &LoopOptions,
) -> Result<i32, ShellError> {
    let evaluation = Evaluation::new(Rc::clone(definitions));

    loop {
        let parsed = evaluation.parse_feeder(shell);
        match parsed {
            Err(ShellError::EndOfInput) => {
                if options.show_prompt {
                    eprintln!("\nGoodbye!");
                }
                return Ok(0);
            }
            Err(ShellError::Interrupted) => {
                eprintln!("\nKeyboardInterrupt");
            }
            Err(ShellError::ShellEscape(line)) => {
                if let Err(err) = run_shell_escape(&line) {
                    eprintln!("mathshell: {err}");
                }
            }
            Err(err) => return Err(err),
            Ok(None) => {}
            Ok(Some(query)) => {
                debug!(source = %query.source, "evaluating statement");
                let outcome = evaluation.evaluate(&query, &mut |text| shell.out_callback(text));
                match outcome {
                    Ok(result) => {
                        let style = options
                            .output_style
                            .as_deref()
                            .unwrap_or_else(|| query.form.tag());
                        shell.print_result(&result, options.show_prompt, style, options.strict);
                    }
                    Err(EngineError::Termination(code)) => {
                        shell.flush_history();
                        debug!(code, "termination requested");
                        return Ok(code);
                    }
                    Err(EngineError::Evaluation(message)) => {
                        error!(%message, "evaluation failed");
                        eprintln!("mathshell: {message}");
                    }
                }
            }
        }
        shell.flush_history();
        shell.reset_line_number();
    }
}

/// Execute a `!`-prefixed line: `!!file` dumps the file to stdout,
/// `!command` runs it through the system shell.
fn run_shell_escape(line: &str) -> Result<(), ShellError> {
    if let Some(path) = line.strip_prefix("!!") {
        let mut contents = String::new();
        std::fs::File::open(path.trim())?.read_to_string(&mut contents)?;
        let mut stdout = std::io::stdout();
        stdout.write_all(contents.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    }
    let command = line.trim_start_matches('!').trim();
    if command.is_empty() {
        return Ok(());
    }
    let status = std::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .status()?;
    if !status.success() {
        debug!(?status, "shell escape exited nonzero");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::EvalResult;
    use crate::shell::feeder::{LineFeeder, StringLineFeeder};

    /// Backend over canned input recording everything it would print
    struct RecordingShell {
        feeder: StringLineFeeder,
        printed: Vec<String>,
        out: Vec<String>,
        flushes: usize,
    }

    impl RecordingShell {
        fn new(source: &str) -> Self {
            Self {
                feeder: StringLineFeeder::new(source),
                printed: Vec::new(),
                out: Vec::new(),
                flushes: 0,
            }
        }
    }

    impl LineFeeder for RecordingShell {
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

    impl ShellBackend for RecordingShell {
        fn print_result(
            &mut self,
            result: &EvalResult,
            _show_prompt: bool,
            output_style: &str,
            _strict: bool,
        ) {
            if !result.is_void() {
                self.printed.push(format!("{}{}", output_style, result.display));
            }
        }

        fn out_callback(
            &mut self,
            text: &str,
        ) {
            self.out.push(text.to_string());
        }

        fn flush_history(&mut self) {
            self.flushes += 1;
        }
    }

    fn run(source: &str) -> (RecordingShell, i32) {
        let definitions = Rc::new(RefCell::new(Definitions::new()));
        let mut shell = RecordingShell::new(source);
        let options = LoopOptions::default();
        let code = interactive_eval_loop(&mut shell, &definitions, &options).unwrap();
        (shell, code)
    }

    #[test]
    fn test_loop_runs_to_exhaustion() {
        let (shell, code) = run("1 + 1\n2 + 2\n");
        assert_eq!(code, 0);
        assert_eq!(shell.printed, vec!["2", "4"]);
    }

    #[test]
    fn test_termination_code_propagates() {
        let (shell, code) = run("1 + 1\nExit[7]\nnever reached\n");
        assert_eq!(code, 7);
        assert_eq!(shell.printed, vec!["2"]);
    }

    #[test]
    fn test_print_routes_through_out_callback() {
        let (shell, _) = run("Print[\"hi\"]\n");
        assert_eq!(shell.out, vec!["hi"]);
        assert!(shell.printed.is_empty());
    }

    #[test]
    fn test_multiline_statement_joined() {
        let (shell, _) = run("1 +\n2\n");
        assert_eq!(shell.printed, vec!["3"]);
    }

    #[test]
    fn test_texform_tag_reaches_backend() {
        let (shell, _) = run("x + y //TeXForm\n");
        assert_eq!(shell.printed, vec!["//TeXFormx + y"]);
    }

    #[test]
    fn test_counter_survives_blank_lines() {
        let definitions = Rc::new(RefCell::new(Definitions::new()));
        let mut shell = RecordingShell::new("1 + 1\n\n\n2 + 2\n");
        let options = LoopOptions::default();
        interactive_eval_loop(&mut shell, &definitions, &options).unwrap();
        // only evaluated statements advance the counter
        assert_eq!(definitions.borrow().line_no(), 2);
    }
}
