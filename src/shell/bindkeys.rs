//! Key bindings and user macros
//!
//! The auto-pairing bracket bindings, the function-key toggles, and the
//! user macro file. Bracket and quote bindings are gated on the
//! autobrace toggle; the function-key toggles are always live.

use std::path::Path;

use tracing::warn;

/// Buffer edit produced by a bound key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Insert an opener/closer pair and leave the cursor between them
    InsertPair(char, char),
    /// Skip over a matching closer at the cursor, else insert it
    CloseOrSkip(char),
    /// Double-quote behaves as both opener and closer
    Quote,
    /// Insert literal text at the cursor (macro expansion)
    InsertText(String),
    /// Flip between Emacs and Vi editing
    ToggleEditMode,
    /// Flip the auto-pairing bindings on or off
    ToggleAutobrace,
    /// Advance the highlight style through the available list
    CycleStyle,
}

/// The standard binding table
#[derive(Debug, Clone, Default)]
pub struct KeyBindingTable {
    macros: Vec<MacroBinding>,
}

impl KeyBindingTable {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Action for a typed character. Pairing actions only fire while
    /// autobrace is on; plain insertion is signalled by `None`.
    pub fn action_for_char(
        &self,
        c: char,
        autobrace: bool,
    ) -> Option<EditAction> {
        if !autobrace {
            return None;
        }
        match c {
            '(' => Some(EditAction::InsertPair('(', ')')),
            '[' => Some(EditAction::InsertPair('[', ']')),
            '{' => Some(EditAction::InsertPair('{', '}')),
            ')' => Some(EditAction::CloseOrSkip(')')),
            ']' => Some(EditAction::CloseOrSkip(']')),
            '}' => Some(EditAction::CloseOrSkip('}')),
            '"' => Some(EditAction::Quote),
            _ => None,
        }
    }

    /// Action for a function key. The toggles are live in every editing
    /// mode regardless of autobrace.
    pub fn action_for_function_key(
        &self,
        n: u8,
    ) -> Option<EditAction> {
        match n {
            2 => Some(EditAction::CycleStyle),
            3 => Some(EditAction::ToggleAutobrace),
            4 => Some(EditAction::ToggleEditMode),
            _ => None,
        }
    }

    /// Replacement for an escape-prefixed macro key sequence
    pub fn macro_for(
        &self,
        keys: &[char],
    ) -> Option<&str> {
        self.macros
            .iter()
            .find(|m| m.keys == keys)
            .map(|m| m.replacement.as_str())
    }

    /// Whether `keys` is a prefix of any bound macro; the rich backend
    /// keeps collecting keys while this holds
    pub fn is_macro_prefix(
        &self,
        keys: &[char],
    ) -> bool {
        self.macros.iter().any(|m| m.keys.starts_with(keys))
    }

    pub fn add_macro(
        &mut self,
        binding: MacroBinding,
    ) {
        self.macros.push(binding);
    }

    pub fn macros(&self) -> &[MacroBinding] {
        &self.macros
    }

    /// Load user macros from the bindings file; malformed lines are
    /// reported and skipped, never fatal
    pub fn load_macro_file(
        &mut self,
        path: &Path,
    ) {
        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(_) => return,
        };
        for (n, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_macro_line(line) {
                Some(binding) => self.macros.push(binding),
                None => {
                    warn!("skipping malformed binding at {}:{}", path.display(), n + 1);
                    eprintln!("mathshell: bad binding line {} in {}", n + 1, path.display());
                }
            }
        }
    }
}

/// One user macro: an escape-prefixed key sequence and its replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBinding {
    pub keys: Vec<char>,
    pub replacement: String,
}

/// Parse one line of the macro file, `"alias": "replacement"`. The
/// sequence `\e` stands for the escape character; `\\` and `\"` are the
/// usual escapes.
pub fn parse_macro_line(line: &str) -> Option<MacroBinding> {
    let (alias, rest) = read_quoted(line.trim_start())?;
    let rest = rest.trim_start().strip_prefix(':')?;
    let (replacement, rest) = read_quoted(rest.trim_start())?;
    if !rest.trim().is_empty() || alias.is_empty() {
        return None;
    }
    Some(MacroBinding {
        keys: alias.chars().collect(),
        replacement,
    })
}

/// Read one double-quoted token with escape handling, returning the
/// decoded content and the remaining input
fn read_quoted(input: &str) -> Option<(String, &str)> {
    let rest = input.strip_prefix('"')?;
    let mut out = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &rest[i + 1..])),
            '\\' => match chars.next() {
                Some((_, 'e')) => out.push('\x1b'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, c)) => out.push(c),
                None => return None,
            },
            c => out.push(c),
        }
    }
    None
}
