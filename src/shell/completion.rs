//! Tab completion
//!
//! Classifies the word under the cursor and produces candidates for it.
//! Two token classes complete: named characters (`\[Alph` completes to
//! `\[Alpha]` and can show the glyph as a hint) and symbols, matched
//! case-insensitively against the engine's qualified and short names.
//! Numeric words and everything else produce no candidates.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use once_cell::sync::Lazy;

use crate::engine::definitions::{strip_context, Definitions, KEY_GROUP_AUTOCOMPLETE};

/// Named characters bundled into the binary, name to glyph
static NAMED_CHARACTERS: Lazy<BTreeMap<String, String>> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../data/named-characters.json"))
        .unwrap_or_default()
});

/// Class of the word under the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    /// No completable word at the cursor
    None,
    /// Partial `\[Name` named-character escape
    NamedCharacter,
    /// Symbol name, possibly context-qualified
    Symbol,
}

/// One completion candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Text substituted into the buffer
    pub text: String,
    /// Text shown in the candidate list
    pub display: String,
    /// Extra hint shown next to the display text (the glyph, for named
    /// characters)
    pub meta: Option<String>,
}

/// Completion over the shared definitions store
pub struct CompletionEngine {
    definitions: Rc<RefCell<Definitions>>,
    match_middle: bool,
}

impl CompletionEngine {
    pub fn new(definitions: Rc<RefCell<Definitions>>) -> Self {
        Self {
            definitions,
            match_middle: false,
        }
    }

    /// Match symbols anywhere in the name instead of prefix-only
    pub fn set_match_middle(
        &mut self,
        on: bool,
    ) {
        self.match_middle = on;
    }

    /// Classify the text left of the cursor. Returns the word being
    /// completed, its class, and the byte offset where it starts.
    pub fn classify(
        &self,
        before_cursor: &str,
    ) -> (String, TokenClass, usize) {
        // a named-character escape wins when the rightmost "\[" is
        // followed only by alphanumerics up to the cursor
        if let Some(pos) = before_cursor.rfind("\\[") {
            let partial = &before_cursor[pos + 2..];
            if partial.chars().all(|c| c.is_ascii_alphanumeric()) {
                return (partial.to_string(), TokenClass::NamedCharacter, pos);
            }
        }

        let start = before_cursor
            .rfind(|c: char| !(c.is_alphanumeric() || c == '`' || c == '$'))
            .map(|p| p + before_cursor[p..].chars().next().map(char::len_utf8).unwrap_or(1))
            .unwrap_or(0);
        let word = &before_cursor[start..];

        if word.is_empty() || word.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return (String::new(), TokenClass::None, before_cursor.len());
        }
        (word.to_string(), TokenClass::Symbol, start)
    }

    /// Candidates for the text left of the cursor, with the replacement
    /// start offset
    pub fn complete(
        &self,
        before_cursor: &str,
    ) -> (usize, Vec<Candidate>) {
        let (word, class, start) = self.classify(before_cursor);
        match class {
            TokenClass::None => (start, Vec::new()),
            TokenClass::NamedCharacter => (start, self.named_character_candidates(&word)),
            TokenClass::Symbol => (start, self.symbol_candidates(&word)),
        }
    }

    fn named_character_candidates(
        &self,
        partial: &str,
    ) -> Vec<Candidate> {
        let lower = partial.to_lowercase();
        NAMED_CHARACTERS
            .iter()
            .filter(|(name, _)| name.to_lowercase().starts_with(&lower))
            .map(|(name, glyph)| Candidate {
                text: format!("\\[{name}]"),
                display: name.clone(),
                meta: Some(glyph.clone()),
            })
            .collect()
    }

    fn symbol_candidates(
        &self,
        word: &str,
    ) -> Vec<Candidate> {
        let defs = self.definitions.borrow();
        let grouped = defs.get_bool(KEY_GROUP_AUTOCOMPLETE, true);
        let qualified = word.contains('`');
        let matches = if self.match_middle {
            let lower = word.to_lowercase();
            defs.names()
                .into_iter()
                .filter(|n| n.to_lowercase().contains(&lower))
                .collect()
        } else {
            defs.matching_names(word)
        };
        let mut seen = Vec::new();
        for name in matches {
            // a qualified word only completes against qualified names
            let text = if qualified || !grouped {
                name.clone()
            } else {
                strip_context(&name).to_string()
            };
            if qualified && !name.to_lowercase().starts_with(&word.to_lowercase()) {
                continue;
            }
            if !seen.iter().any(|c: &Candidate| c.text == text) {
                seen.push(Candidate {
                    display: text.clone(),
                    text,
                    meta: None,
                });
            }
        }
        seen.sort_by(|a, b| a.text.cmp(&b.text));
        seen
    }
}

/// Glyph for a named character, if known
pub fn named_character(name: &str) -> Option<&'static str> {
    NAMED_CHARACTERS.get(name).map(|s| s.as_str())
}
