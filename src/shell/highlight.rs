//! Syntax highlighting
//!
//! A small tokenizing lexer over the engine's surface syntax plus a set
//! of named terminal color palettes. Both backends highlight through
//! this module: the rich backend on every repaint, the presenter when
//! rendering results.

use owo_colors::Style;

/// Ordered list of available style names; style cycling wraps over it
pub const AVAILABLE_STYLES: &[&str] = &["default", "inkpot", "colorful"];

/// Token categories recognized by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Symbol,
    Number,
    Str,
    Operator,
    Bracket,
    Comment,
    /// Whitespace and anything unrecognized; never styled
    Text,
}

/// One lexed token borrowing from the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// A named color palette
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub name: &'static str,
    symbol: Style,
    number: Style,
    string: Style,
    operator: Style,
    bracket: Style,
    comment: Style,
}

impl Palette {
    fn style_for(
        &self,
        kind: TokenKind,
    ) -> Option<Style> {
        match kind {
            TokenKind::Symbol => Some(self.symbol),
            TokenKind::Number => Some(self.number),
            TokenKind::Str => Some(self.string),
            TokenKind::Operator => Some(self.operator),
            TokenKind::Bracket => Some(self.bracket),
            TokenKind::Comment => Some(self.comment),
            TokenKind::Text => None,
        }
    }
}

/// Look up a palette by name
pub fn palette(name: &str) -> Option<Palette> {
    match name {
        "default" => Some(Palette {
            name: "default",
            symbol: Style::new().yellow(),
            number: Style::new().blue(),
            string: Style::new().cyan(),
            operator: Style::new().magenta(),
            bracket: Style::new().default_color(),
            comment: Style::new().bright_black(),
        }),
        "inkpot" => Some(Palette {
            name: "inkpot",
            symbol: Style::new().bright_yellow(),
            number: Style::new().bright_blue(),
            string: Style::new().bright_green(),
            operator: Style::new().bright_magenta(),
            bracket: Style::new().bright_white(),
            comment: Style::new().bright_black().italic(),
        }),
        "colorful" => Some(Palette {
            name: "colorful",
            symbol: Style::new().green(),
            number: Style::new().red(),
            string: Style::new().yellow(),
            operator: Style::new().magenta().bold(),
            bracket: Style::new().default_color(),
            comment: Style::new().bright_black(),
        }),
        _ => None,
    }
}

/// Diagnostic for a style name with no palette, listing the valid names
pub fn unknown_style_notice(name: &str) -> String {
    format!(
        "Highlight style '{}' not found. Style names are: {}",
        name,
        AVAILABLE_STYLES.join(", ")
    )
}

/// The style name following `current` in [`AVAILABLE_STYLES`], wrapping
/// at the ends. `None` (styling off) cycles to the first style.
pub fn next_style(current: Option<&str>) -> &'static str {
    match current {
        None => AVAILABLE_STYLES[0],
        Some(name) => {
            let idx = AVAILABLE_STYLES.iter().position(|s| *s == name);
            match idx {
                Some(i) => AVAILABLE_STYLES[(i + 1) % AVAILABLE_STYLES.len()],
                None => AVAILABLE_STYLES[0],
            }
        }
    }
}

/// Tokenizing highlighter with an optional active palette
#[derive(Debug, Clone, Copy, Default)]
pub struct Highlighter {
    palette: Option<Palette>,
}

impl Highlighter {
    /// Highlighter with no palette: all output passes through untouched
    pub fn plain() -> Self {
        Self { palette: None }
    }

    /// Highlighter for a named style
    pub fn with_style(name: &str) -> Option<Self> {
        palette(name).map(|p| Self { palette: Some(p) })
    }

    pub fn is_active(&self) -> bool {
        self.palette.is_some()
    }

    /// Name of the active palette, if any
    pub fn style_name(&self) -> Option<&'static str> {
        self.palette.map(|p| p.name)
    }

    /// Highlight a line of engine syntax
    pub fn highlight(
        &self,
        text: &str,
    ) -> String {
        let palette = match self.palette {
            Some(p) => p,
            None => return text.to_string(),
        };
        let mut out = String::with_capacity(text.len());
        for token in tokenize(text) {
            match palette.style_for(token.kind) {
                Some(style) => out.push_str(&style.style(token.text).to_string()),
                None => out.push_str(token.text),
            }
        }
        out
    }

    /// Render text through the literal-string token path (strict mode
    /// string results)
    pub fn format_string_token(
        &self,
        text: &str,
    ) -> String {
        match self.palette {
            Some(p) => p.string.style(text).to_string(),
            None => text.to_string(),
        }
    }
}

/// Lex one line into tokens. The lexer is lossless: concatenating the
/// token texts reproduces the input.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let c = match rest.chars().next() {
            Some(c) => c,
            None => break,
        };

        // comments (* ... *), nesting allowed
        if rest.starts_with("(*") {
            let mut depth = 0usize;
            let mut j = i;
            while j < text.len() {
                if text[j..].starts_with("(*") {
                    depth += 1;
                    j += 2;
                } else if text[j..].starts_with("*)") {
                    depth -= 1;
                    j += 2;
                    if depth == 0 {
                        break;
                    }
                } else {
                    j += text[j..].chars().next().map(char::len_utf8).unwrap_or(1);
                }
            }
            tokens.push(Token {
                kind: TokenKind::Comment,
                text: &text[i..j.min(text.len())],
            });
            i = j.min(text.len());
            continue;
        }

        // string literals with escapes
        if c == '"' {
            let mut j = i + 1;
            let mut escaped = false;
            while j < text.len() {
                let cj = bytes[j];
                if escaped {
                    escaped = false;
                } else if cj == b'\\' {
                    escaped = true;
                } else if cj == b'"' {
                    j += 1;
                    break;
                }
                j += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Str,
                text: &text[i..j],
            });
            i = j;
            continue;
        }

        // named characters \[Name]
        if rest.starts_with("\\[") {
            let close = rest.find(']').map(|p| i + p + 1).unwrap_or(text.len());
            tokens.push(Token {
                kind: TokenKind::Symbol,
                text: &text[i..close],
            });
            i = close;
            continue;
        }

        if c.is_ascii_digit() {
            let mut j = i;
            let mut seen_dot = false;
            for (off, cj) in rest.char_indices() {
                if cj.is_ascii_digit() {
                    j = i + off + 1;
                } else if cj == '.' && !seen_dot {
                    seen_dot = true;
                    j = i + off + 1;
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                text: &text[i..j],
            });
            i = j;
            continue;
        }

        if c.is_alphabetic() || c == '$' {
            let mut j = i;
            for (off, cj) in rest.char_indices() {
                if cj.is_alphanumeric() || cj == '$' || cj == '`' {
                    j = i + off + cj.len_utf8();
                } else {
                    break;
                }
            }
            tokens.push(Token {
                kind: TokenKind::Symbol,
                text: &text[i..j],
            });
            i = j;
            continue;
        }

        let kind = match c {
            '(' | ')' | '[' | ']' | '{' | '}' => TokenKind::Bracket,
            '+' | '-' | '*' | '/' | '^' | '=' | '<' | '>' | '!' | ',' | ';' | '&' | '|'
            | '@' | '#' | '_' | '.' | ':' | '\'' | '~' | '?' | '%' => TokenKind::Operator,
            _ => TokenKind::Text,
        };
        let len = c.len_utf8();
        // coalesce runs of plain text so the output stays compact
        if kind == TokenKind::Text {
            if let Some(last) = tokens.last_mut() {
                if last.kind == TokenKind::Text {
                    let start = last.text.as_ptr() as usize - text.as_ptr() as usize;
                    last.text = &text[start..i + len];
                    i += len;
                    continue;
                }
            }
        }
        tokens.push(Token {
            kind,
            text: &text[i..i + len],
        });
        i += len;
    }

    tokens
}
