//! Lexical units consumed by every front-end.
//!
//! Tokens are produced by an external tokenizer and consumed exactly once by one
//! of the parsers. The core never lexes raw text itself; the only textual
//! conventions it owns are the bracket-pair table and the arity-suffix marker on
//! [`TokenKind::SymbolWithArity`] tokens.

use strum::EnumIs;

/// Marker separating a symbol identifier from its encoded arity suffix,
/// as in `foo$2,1` (two arguments, one result).
pub const ARITY_MARKER: char = '$';

/// Separator between argument and result counts inside an arity suffix.
pub const ARITY_SEPARATOR: char = ',';

/// Kind of a lexical unit. Closed set; parsers match exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum TokenKind {
    /// A literal of the value domain; the text is handed to the host's value parser.
    Value,
    /// An operator identifier, resolved against the operator dictionary.
    Operator,
    /// A plain symbol identifier, resolved at execution time.
    Symbol,
    /// A symbol identifier with an explicit `$args,rets` arity suffix.
    SymbolWithArity,
    /// An opening bracket (`(`, `[` or `{`).
    LeftBracket,
    /// A closing bracket (`)`, `]` or `}`).
    RightBracket,
    /// Argument separator inside bracketed lists (`,`).
    Separator,
    /// A modifier introducing a front-end specific sub-grammar (e.g. quoting).
    Modifier,
}

/// An immutable lexical unit: a kind plus its literal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
        }
    }

    pub fn value(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Value, text)
    }

    pub fn operator(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Operator, text)
    }

    pub fn symbol(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Symbol, text)
    }

    pub fn symbol_with_arity(text: impl Into<String>) -> Self {
        Token::new(TokenKind::SymbolWithArity, text)
    }

    pub fn left_bracket(text: impl Into<String>) -> Self {
        Token::new(TokenKind::LeftBracket, text)
    }

    pub fn right_bracket(text: impl Into<String>) -> Self {
        Token::new(TokenKind::RightBracket, text)
    }

    pub fn separator() -> Self {
        Token::new(TokenKind::Separator, ",")
    }

    pub fn modifier(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Modifier, text)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}:{}", self.kind, self.text)
    }
}

/// Closing bracket paired with a known opening bracket, if any.
pub fn matching_bracket(open: &str) -> Option<&'static str> {
    match open {
        "(" => Some(")"),
        "[" => Some("]"),
        "{" => Some("}"),
        _ => None,
    }
}

/// Whether the opening bracket introduces a container (any number of children)
/// rather than a transparent grouping.
pub fn is_container_bracket(open: &str) -> bool {
    open == "["
}
