//! Session integration tests
//!
//! Full read-eval-print loops over canned input: statement numbering,
//! interrupts, termination requests, and shell escapes.

use std::cell::RefCell;
use std::rc::Rc;

use mathshell::engine::definitions::Definitions;
use mathshell::engine::value::EvalResult;
use mathshell::shell::{
    interactive_eval_loop, LineFeeder, LoopOptions, ShellBackend, ShellError, StringLineFeeder,
};

/// Backend over canned input that records printed output and can inject
/// an interrupt before a chosen feed
struct ScriptedShell {
    feeder: StringLineFeeder,
    printed: Vec<String>,
    out: Vec<String>,
    interrupt_before_feed: Option<usize>,
    feeds: usize,
}

impl ScriptedShell {
    fn new(source: &str) -> Self {
        Self {
            feeder: StringLineFeeder::new(source),
            printed: Vec::new(),
            out: Vec::new(),
            interrupt_before_feed: None,
            feeds: 0,
        }
    }

    fn interrupt_before(
        mut self,
        feed: usize,
    ) -> Self {
        self.interrupt_before_feed = Some(feed);
        self
    }
}

impl LineFeeder for ScriptedShell {
    fn feed(&mut self) -> Result<String, ShellError> {
        if self.interrupt_before_feed == Some(self.feeds) {
            self.interrupt_before_feed = None;
            self.feeds += 1;
            return Err(ShellError::Interrupted);
        }
        self.feeds += 1;
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

impl ShellBackend for ScriptedShell {
    fn print_result(
        &mut self,
        result: &EvalResult,
        _show_prompt: bool,
        _output_style: &str,
        _strict: bool,
    ) {
        if !result.is_void() {
            self.printed.push(result.display.clone());
        }
    }

    fn out_callback(
        &mut self,
        text: &str,
    ) {
        self.out.push(text.to_string());
    }

    fn flush_history(&mut self) {}
}

fn run_session(shell: &mut ScriptedShell) -> (i32, usize) {
    let definitions = Rc::new(RefCell::new(Definitions::new()));
    let options = LoopOptions::default();
    let code = interactive_eval_loop(shell, &definitions, &options).unwrap();
    let line_no = definitions.borrow().line_no();
    (code, line_no)
}

#[test]
fn test_statements_numbered_in_order() {
    let mut shell = ScriptedShell::new("1 + 1\n2 + 2\n3 + 3\n");
    let (code, line_no) = run_session(&mut shell);
    assert_eq!(code, 0);
    assert_eq!(line_no, 3);
    assert_eq!(shell.printed, vec!["2", "4", "6"]);
}

#[test]
fn test_interrupt_does_not_advance_counter() {
    // the interrupt lands between the two statements; both still
    // evaluate and the counter never skips a number
    let mut shell = ScriptedShell::new("1 + 1\n2 + 2\n").interrupt_before(1);
    let (code, line_no) = run_session(&mut shell);
    assert_eq!(code, 0);
    assert_eq!(line_no, 2);
    assert_eq!(shell.printed, vec!["2", "4"]);
}

#[test]
fn test_quit_exits_with_code() {
    let mut shell = ScriptedShell::new("x = 40 + 2\nQuit[]\nx\n");
    let (code, line_no) = run_session(&mut shell);
    assert_eq!(code, 0);
    assert_eq!(line_no, 1);
    assert_eq!(shell.printed, vec!["42"]);
}

#[test]
fn test_exit_code_propagates() {
    let mut shell = ScriptedShell::new("Exit[5]\n");
    let (code, _) = run_session(&mut shell);
    assert_eq!(code, 5);
}

#[test]
fn test_void_statement_prints_nothing_but_counts() {
    let mut shell = ScriptedShell::new("x = 1;\nx\n");
    let (_, line_no) = run_session(&mut shell);
    assert_eq!(line_no, 2);
    assert_eq!(shell.printed, vec!["1"]);
}

#[test]
fn test_multiline_statement_fed_to_completion() {
    let mut shell = ScriptedShell::new("f[1,\n2,\n3]\n1 + 1\n");
    let (_, line_no) = run_session(&mut shell);
    assert_eq!(line_no, 2);
    assert_eq!(shell.printed, vec!["f[1,\n2,\n3]", "2"]);
}

#[test]
fn test_definitions_persist_across_statements() {
    let mut shell = ScriptedShell::new("total = 6 * 7\ntotal\n");
    run_session(&mut shell);
    assert_eq!(shell.printed, vec!["42", "42"]);
}

#[test]
fn test_print_output_bypasses_result_flow() {
    let mut shell = ScriptedShell::new("Print[\"working\"]\n1 + 1\n");
    run_session(&mut shell);
    assert_eq!(shell.out, vec!["working"]);
    assert_eq!(shell.printed, vec!["2"]);
}
