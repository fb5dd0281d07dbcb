//! Key binding integration tests
//!
//! The macro file round trip, malformed-line tolerance, and the
//! auto-pairing edit actions applied to a live edit buffer.

use std::io::Write;

use mathshell::shell::bindkeys::{EditAction, KeyBindingTable};
use mathshell::shell::rich::{apply_edit_action, EditBuffer};

fn write_bindings(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bindings");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

#[test]
fn test_macro_file_round_trip() {
    let (_dir, path) = write_bindings(
        "# integration macros\n\
         \"ii\": \"Integrate[, x]\"\n\
         \"dd\": \"D[, x]\"\n",
    );
    let mut table = KeyBindingTable::standard();
    table.load_macro_file(&path);
    assert_eq!(table.macros().len(), 2);
    assert_eq!(table.macro_for(&['i', 'i']), Some("Integrate[, x]"));
    assert_eq!(table.macro_for(&['d', 'd']), Some("D[, x]"));
}

#[test]
fn test_malformed_lines_skipped_good_lines_kept() {
    let (_dir, path) = write_bindings(
        "\"ok\": \"Sin[]\"\n\
         this line is garbage\n\
         \"unterminated: \"x\"\n\
         \"also\": \"Cos[]\"\n",
    );
    let mut table = KeyBindingTable::standard();
    table.load_macro_file(&path);
    assert_eq!(table.macros().len(), 2);
    assert_eq!(table.macro_for(&['o', 'k']), Some("Sin[]"));
    assert_eq!(table.macro_for(&['a', 'l', 's', 'o']), Some("Cos[]"));
}

#[test]
fn test_missing_file_loads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut table = KeyBindingTable::standard();
    table.load_macro_file(&dir.path().join("does-not-exist"));
    assert!(table.macros().is_empty());
}

#[test]
fn test_escape_decoding_in_replacements() {
    let (_dir, path) = write_bindings("\"q\": \"tab\\there \\e end\"\n");
    let mut table = KeyBindingTable::standard();
    table.load_macro_file(&path);
    assert_eq!(table.macro_for(&['q']), Some("tab\there \x1b end"));
}

#[test]
fn test_autopair_typing_sequence() {
    // typing "Sin[x]" with auto-pairing on: the closer typed at the end
    // skips over the one inserted by the opener
    let table = KeyBindingTable::standard();
    let mut buffer = EditBuffer::default();
    for c in "Sin".chars() {
        assert_eq!(table.action_for_char(c, true), None);
        buffer.insert_char(c);
    }
    apply_edit_action(&mut buffer, &table.action_for_char('[', true).unwrap());
    buffer.insert_char('x');
    apply_edit_action(&mut buffer, &table.action_for_char(']', true).unwrap());
    assert_eq!(buffer.text(), "Sin[x]");
    assert_eq!(buffer.cursor_chars(), 6);
}

#[test]
fn test_autopair_respects_toggle() {
    let table = KeyBindingTable::standard();
    assert_eq!(table.action_for_char('[', false), None);
    assert_eq!(
        table.action_for_char('[', true),
        Some(EditAction::InsertPair('[', ']'))
    );
}

#[test]
fn test_macro_expansion_inserts_at_cursor() {
    let mut buffer = EditBuffer::default();
    buffer.insert_str("1 + ");
    apply_edit_action(
        &mut buffer,
        &EditAction::InsertText("Integrate[, x]".to_string()),
    );
    assert_eq!(buffer.text(), "1 + Integrate[, x]");
}
