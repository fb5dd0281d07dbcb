//! Engine result values
//!
//! Results cross the engine boundary as a closed category enum plus a
//! display string. The shell never inspects expression semantics; it
//! switches exhaustively over [`ResultKind`].

/// Category of an evaluation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// A generic expression, highlighted by the presenter
    Generic,
    /// A string value; the presenter re-quotes or renders it through the
    /// string-token path depending on strict mode
    Str,
    /// A graph placeholder; the presenter substitutes a fixed sentinel
    Graph,
    /// No output; the null sentinel ("void" statements ending in `;`)
    Void,
}

/// Result of evaluating one statement
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Result category
    pub kind: ResultKind,
    /// Display string; for [`ResultKind::Str`] this is the unquoted
    /// string content
    pub display: String,
}

impl EvalResult {
    /// The void sentinel: a statement that produces no output line
    pub fn void() -> Self {
        Self {
            kind: ResultKind::Void,
            display: String::new(),
        }
    }

    /// Whether this result is the void sentinel
    pub fn is_void(&self) -> bool {
        self.kind == ResultKind::Void
    }
}

/// Output form annotation attached to a parsed statement
///
/// Rendered as a suffix between the `Out[n]` bracket and the `=` sign,
/// e.g. `Out[3]//TeXForm= `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputForm {
    #[default]
    Standard,
    TeX,
}

impl OutputForm {
    /// The prompt suffix for this form
    pub fn tag(&self) -> &'static str {
        match self {
            OutputForm::Standard => "",
            OutputForm::TeX => "//TeXForm",
        }
    }
}

/// One complete parsed statement, ready for evaluation
#[derive(Debug, Clone)]
pub struct Query {
    /// Statement source with continuation lines joined
    pub source: String,
    /// Output form requested by the statement
    pub form: OutputForm,
}
