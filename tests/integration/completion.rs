//! Completion integration tests
//!
//! Token classification and candidate generation against a live
//! definitions store, including symbols defined mid-session.

use std::cell::RefCell;
use std::rc::Rc;

use mathshell::engine::definitions::{Definitions, Value, KEY_GROUP_AUTOCOMPLETE};
use mathshell::engine::evaluation::Evaluation;
use mathshell::engine::value::{OutputForm, Query};
use mathshell::shell::completion::{CompletionEngine, TokenClass};

fn setup() -> (Rc<RefCell<Definitions>>, CompletionEngine) {
    let defs = Rc::new(RefCell::new(Definitions::new()));
    let engine = CompletionEngine::new(Rc::clone(&defs));
    (defs, engine)
}

#[test]
fn test_named_character_classification() {
    let (_, engine) = setup();
    let (word, class, start) = engine.classify("1 + \\[Alph");
    assert_eq!(class, TokenClass::NamedCharacter);
    assert_eq!(word, "Alph");
    assert_eq!(start, 4);

    // a closed escape no longer completes as a named character
    let (_, class, _) = engine.classify("\\[Alpha] + x");
    assert_eq!(class, TokenClass::Symbol);
}

#[test]
fn test_named_character_candidates_carry_glyph() {
    let (_, engine) = setup();
    let (start, candidates) = engine.complete("\\[Infinit");
    assert_eq!(start, 0);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].text, "\\[Infinity]");
    assert_eq!(candidates[0].meta.as_deref(), Some("∞"));
}

#[test]
fn test_numbers_produce_no_candidates() {
    let (_, engine) = setup();
    let (_, class, _) = engine.classify("123");
    assert_eq!(class, TokenClass::None);
    let (_, candidates) = engine.complete("3.14");
    assert!(candidates.is_empty());
}

#[test]
fn test_builtin_symbols_complete_case_insensitively() {
    let (_, engine) = setup();
    let (_, candidates) = engine.complete("integ");
    assert!(candidates.iter().any(|c| c.text == "Integrate"));
}

#[test]
fn test_session_definitions_become_candidates() {
    let (defs, engine) = setup();
    {
        let evaluation = Evaluation::new(Rc::clone(&defs));
        let query = Query {
            source: "Fibonacci = 55".into(),
            form: OutputForm::Standard,
        };
        evaluation.evaluate(&query, &mut |_| {}).unwrap();
    }
    let (_, candidates) = engine.complete("Fibo");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].text, "Fibonacci");
}

#[test]
fn test_qualified_prefix_keeps_context() {
    let (_, engine) = setup();
    let (_, candidates) = engine.complete("System`Ta");
    assert!(candidates.iter().any(|c| c.text == "System`Table"));
    assert!(candidates.iter().all(|c| c.text.contains('`')));
}

#[test]
fn test_grouping_toggle_switches_to_qualified_names() {
    let (defs, engine) = setup();
    defs.borrow_mut()
        .set(KEY_GROUP_AUTOCOMPLETE, Value::Bool(false));
    let (_, candidates) = engine.complete("Sin");
    assert!(candidates.iter().any(|c| c.text == "System`Sin"));
}
