//! Presentation integration tests
//!
//! Prompt rendering, output indentation, style synchronization through
//! the settings store, and the requirement that interchangeable
//! backends print byte-identical output for the same configuration.

use std::cell::RefCell;
use std::rc::Rc;

use mathshell::engine::definitions::{Definitions, Value, KEY_STYLE};
use mathshell::engine::value::{EvalResult, ResultKind};
use mathshell::shell::presenter::{visible_width, StyleChange};
use mathshell::shell::Presenter;

fn store() -> Rc<RefCell<Definitions>> {
    Rc::new(RefCell::new(Definitions::new()))
}

#[test]
fn test_prompt_numbering_follows_store() {
    let defs = store();
    let presenter = Presenter::new(Rc::clone(&defs), None);
    assert_eq!(presenter.in_prompt(), "In[1]:= ");
    defs.borrow_mut().set_line_no(41);
    assert_eq!(presenter.in_prompt(), "In[42]:= ");
    assert_eq!(presenter.out_prompt(""), "Out[41]= ");
}

#[test]
fn test_continuation_lines_align_under_output() {
    let defs = store();
    defs.borrow_mut().set_line_no(1);
    let mut presenter = Presenter::new(defs, None);
    let result = EvalResult {
        kind: ResultKind::Generic,
        display: "first\nsecond\nthird".into(),
    };
    let rendered = presenter.render_result(&result, true, "", false).unwrap();
    assert_eq!(
        rendered,
        "Out[1]= first\n        second\n        third\n\n"
    );
}

#[test]
fn test_form_tag_sits_between_bracket_and_equals() {
    let defs = store();
    defs.borrow_mut().set_line_no(3);
    let presenter = Presenter::new(defs, None);
    assert_eq!(presenter.out_prompt("//TeXForm"), "Out[3]//TeXForm= ");
}

#[test]
fn test_styled_and_plain_prompts_same_visible_width() {
    let plain = Presenter::new(store(), None);
    let styled = Presenter::new(store(), Some("default".to_string()));
    assert_eq!(
        visible_width(&plain.in_prompt()),
        visible_width(&styled.in_prompt())
    );
    assert_ne!(plain.in_prompt(), styled.in_prompt());
}

#[test]
fn test_setting_active_style_is_a_no_op() {
    let defs = store();
    let mut presenter = Presenter::new(Rc::clone(&defs), Some("inkpot".to_string()));
    defs.borrow_mut().set(KEY_STYLE, Value::Str("sentinel".into()));
    // requesting the already-active style must not touch the store
    assert_eq!(presenter.set_style(Some("inkpot")), StyleChange::Unchanged);
    assert_eq!(defs.borrow().get_str(KEY_STYLE).as_deref(), Some("sentinel"));
}

#[test]
fn test_style_change_via_store_reaches_rendering() {
    let defs = store();
    let mut presenter = Presenter::new(Rc::clone(&defs), None);
    let result = EvalResult {
        kind: ResultKind::Generic,
        display: "Sin[x]".into(),
    };
    let before = presenter.render_result(&result, false, "", false).unwrap();
    assert_eq!(before, "Sin[x]\n");

    // an evaluated statement wrote a style into the store
    defs.borrow_mut()
        .set(KEY_STYLE, Value::Str("default".into()));
    let after = presenter.render_result(&result, false, "", false).unwrap();
    assert!(after.contains("\x1b["));
}

#[test]
fn test_interchangeable_backends_print_identical_bytes() {
    // both backends render through a presenter constructed from the
    // same options; two independent presenters over equal stores must
    // agree byte for byte on every result category
    let results = [
        EvalResult {
            kind: ResultKind::Generic,
            display: "x ^ 2 + 1".into(),
        },
        EvalResult {
            kind: ResultKind::Str,
            display: "hello \"there\"".into(),
        },
        EvalResult {
            kind: ResultKind::Graph,
            display: "Graph[{1 -> 2}]".into(),
        },
        EvalResult::void(),
    ];
    for strict in [false, true] {
        for style in [None, Some("default".to_string())] {
            let defs_a = store();
            let defs_b = store();
            defs_a.borrow_mut().set_line_no(4);
            defs_b.borrow_mut().set_line_no(4);
            let mut a = Presenter::new(defs_a, style.clone());
            let mut b = Presenter::new(defs_b, style.clone());
            for result in &results {
                assert_eq!(
                    a.render_result(result, true, "", strict),
                    b.render_result(result, true, "", strict)
                );
            }
        }
    }
}

#[test]
fn test_void_result_renders_single_separator() {
    let mut presenter = Presenter::new(store(), None);
    let rendered = presenter.render_result(&EvalResult::void(), true, "", false);
    assert_eq!(rendered.as_deref(), Some("\n"));
}

#[test]
fn test_text_output_style_drops_decoration() {
    let defs = store();
    defs.borrow_mut().set_line_no(9);
    let mut presenter = Presenter::new(defs, Some("default".to_string()));
    let result = EvalResult {
        kind: ResultKind::Str,
        display: "plain".into(),
    };
    let rendered = presenter.render_result(&result, true, "text", false).unwrap();
    assert_eq!(rendered, "plain\n");
}
