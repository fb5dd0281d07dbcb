//! Backend configuration
//!
//! Construction options for both backends, the initial settings-store
//! install, and the unicode input normalization table.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::definitions::{
    Definitions, Value, KEY_GROUP_AUTOCOMPLETE, KEY_HISTORY_LENGTH, KEY_STYLE,
    KEY_STYLES_AVAILABLE, KEY_USE_UNICODE,
};
use crate::shell::highlight::AVAILABLE_STYLES;
use crate::util::paths;

/// Initial edit mode for the rich backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditModeOpt {
    #[default]
    Emacs,
    Vi,
}

impl EditModeOpt {
    pub fn label(&self) -> &'static str {
        match self {
            EditModeOpt::Emacs => "Emacs",
            EditModeOpt::Vi => "Vi",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            EditModeOpt::Emacs => EditModeOpt::Vi,
            EditModeOpt::Vi => EditModeOpt::Emacs,
        }
    }
}

/// Options shared by both backend constructors
#[derive(Debug, Clone)]
pub struct BackendOptions {
    /// Highlight style; `None` disables styling everywhere
    pub style: Option<String>,
    /// Register the completion engine
    pub want_completion: bool,
    /// Normalize unicode input spellings to engine ASCII forms
    pub use_unicode: bool,
    /// Show `In[n]:=` / `Out[n]=` decoration
    pub show_prompt: bool,
    /// Initial edit mode (rich backend only)
    pub edit_mode: EditModeOpt,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            style: Some("default".to_string()),
            want_completion: true,
            use_unicode: true,
            show_prompt: true,
            edit_mode: EditModeOpt::Emacs,
        }
    }
}

/// Write the initial shell configuration into the shared store.
///
/// Later writes from either side (evaluated statements or key bindings)
/// win over these values on the next read.
pub fn install_settings(
    definitions: &Rc<RefCell<Definitions>>,
    options: &BackendOptions,
) {
    let mut defs = definitions.borrow_mut();
    defs.set(
        KEY_STYLE,
        match &options.style {
            Some(name) => Value::Str(name.clone()),
            None => Value::Null,
        },
    );
    defs.set(
        KEY_STYLES_AVAILABLE,
        Value::List(AVAILABLE_STYLES.iter().map(|s| s.to_string()).collect()),
    );
    defs.set(KEY_USE_UNICODE, Value::Bool(options.use_unicode));
    defs.set(KEY_GROUP_AUTOCOMPLETE, Value::Bool(true));
    if defs.get_int(KEY_HISTORY_LENGTH).is_none() {
        defs.set(
            KEY_HISTORY_LENGTH,
            Value::Int(paths::DEFAULT_HISTSIZE as i64),
        );
    }
}

/// Unicode spellings the engine does not understand, mapped to their
/// ASCII input forms
const UNICODE_REPLACEMENTS: &[(&str, &str)] = &[
    ("→", "->"),
    ("↔", "<->"),
    ("≤", "<="),
    ("≥", ">="),
    ("≠", "!="),
    ("×", "*"),
    ("÷", "/"),
    ("π", "Pi"),
    ("∞", "Infinity"),
    ("∈", "\\[Element]"),
    ("°", "Degree"),
];

/// Replace unicode input spellings with the engine's ASCII equivalents
pub fn normalize_unicode(input: &str) -> String {
    let mut out = input.to_string();
    for (from, to) in UNICODE_REPLACEMENTS {
        if out.contains(from) {
            out = out.replace(from, to);
        }
    }
    out
}
