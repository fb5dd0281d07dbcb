//! Shared settings and definitions store
//!
//! The engine owns a single mutable store holding the statement counter,
//! `Settings`-prefixed configuration values, and the symbol namespace.
//! Both shell backends and the presenter read and write it through typed
//! accessors; whichever side wrote a key most recently wins on the next
//! read, which is how style changes made by evaluated statements reach
//! the presenter (and vice versa on invalid-style fallback).

use std::collections::{BTreeMap, HashMap};

/// Highlight style setting, mirrored by the presenter
pub const KEY_STYLE: &str = "Settings`$HighlightStyle";
/// Ordered list of valid highlight style names
pub const KEY_STYLES_AVAILABLE: &str = "Settings`HighlightStylesAvailable";
/// Unicode input normalization toggle
pub const KEY_USE_UNICODE: &str = "Settings`$UseUnicode";
/// Auto-closing bracket/quote key bindings toggle
pub const KEY_GROUP_AUTOCOMPLETE: &str = "Settings`$GroupAutocomplete";
/// Bounded history length
pub const KEY_HISTORY_LENGTH: &str = "Settings`$HistoryLength";

/// A value in the definitions store
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    Null,
}

/// Strip the context prefix from a fully-qualified name:
/// `System`Sin` becomes `Sin`.
pub fn strip_context(name: &str) -> &str {
    match name.rfind('`') {
        Some(pos) => &name[pos + 1..],
        None => name,
    }
}

/// Builtin symbol names known to the reference engine
const BUILTIN_NAMES: &[&str] = &[
    "System`Abs",
    "System`ArcTan",
    "System`Cos",
    "System`D",
    "System`E",
    "System`Exit",
    "System`Exp",
    "System`Expand",
    "System`Factor",
    "System`First",
    "System`Graph",
    "System`Head",
    "System`Infinity",
    "System`Integrate",
    "System`Last",
    "System`Length",
    "System`List",
    "System`Log",
    "System`Map",
    "System`N",
    "System`Pi",
    "System`Plus",
    "System`Power",
    "System`Print",
    "System`Quit",
    "System`Range",
    "System`Simplify",
    "System`Sin",
    "System`Solve",
    "System`Sqrt",
    "System`Table",
    "System`Tan",
    "System`TeXForm",
    "System`Times",
];

/// Settings and definitions store shared between the engine and the shell
#[derive(Debug, Default)]
pub struct Definitions {
    /// Statement counter behind `In[n]` / `Out[n]`
    line_no: usize,
    /// `Settings`-prefixed configuration values
    settings: HashMap<String, Value>,
    /// User-defined symbols, fully qualified under `Global`
    symbols: BTreeMap<String, Value>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current statement counter
    pub fn line_no(&self) -> usize {
        self.line_no
    }

    pub fn set_line_no(
        &mut self,
        n: usize,
    ) {
        self.line_no = n;
    }

    /// Advance the statement counter by one; called by the engine when a
    /// statement has been evaluated, never on aborted statements
    pub fn increment_line_no(&mut self) {
        self.line_no += 1;
    }

    /// Raw settings read
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.settings.get(key)
    }

    /// Raw settings write
    pub fn set(
        &mut self,
        key: &str,
        value: Value,
    ) {
        self.settings.insert(key.to_string(), value);
    }

    pub fn get_bool(
        &self,
        key: &str,
        default: bool,
    ) -> bool {
        match self.settings.get(key) {
            Some(Value::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn get_int(
        &self,
        key: &str,
    ) -> Option<i64> {
        match self.settings.get(key) {
            Some(Value::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// String read; `Value::Null` and missing keys both read as `None`
    pub fn get_str(
        &self,
        key: &str,
    ) -> Option<String> {
        match self.settings.get(key) {
            Some(Value::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Define or update a symbol in the user namespace
    pub fn define(
        &mut self,
        name: &str,
        value: Value,
    ) {
        let qualified = if name.contains('`') {
            name.to_string()
        } else {
            format!("Global`{name}")
        };
        self.symbols.insert(qualified, value);
    }

    /// Look up a user symbol by short or qualified name
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&Value> {
        if name.contains('`') {
            self.symbols.get(name)
        } else {
            self.symbols.get(&format!("Global`{name}"))
        }
    }

    /// All names known to the engine: builtins plus user symbols, fully
    /// qualified. Rebuilt on every call since the namespace mutates
    /// during a session.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
        names.extend(self.symbols.keys().cloned());
        names
    }

    /// Names starting with `prefix`, compared case-insensitively against
    /// both the qualified and context-stripped spellings
    pub fn matching_names(
        &self,
        prefix: &str,
    ) -> Vec<String> {
        let lower = prefix.to_lowercase();
        self.names()
            .into_iter()
            .filter(|n| {
                n.to_lowercase().starts_with(&lower)
                    || strip_context(n).to_lowercase().starts_with(&lower)
            })
            .collect()
    }
}
