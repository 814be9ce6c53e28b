//! Error taxonomy of the compiler core.
//!
//! Three categories, none of them retried:
//! - setup mistakes (duplicate registrations, post-freeze mutation, wrong child
//!   counts handed to a node factory) are programming errors and panic at setup
//!   time;
//! - [`ParseError`] covers malformed caller input rejected by a front-end;
//! - [`ExecError`] covers failures while running a program against a frame.

use strum::EnumIs;
use thiserror::Error;

use crate::token::Token;

pub type ParseResult<T> = Result<T, ParseError>;
pub type ExecResult<T> = Result<T, ExecError>;

/// Caller input rejected by one of the front-ends.
#[derive(Debug, Error, EnumIs)]
pub enum ParseError {
    /// A token the active parser state refuses to consume.
    #[error("token `{token}` not accepted in {state}")]
    UnexpectedToken { token: Token, state: &'static str },

    /// A sub-expression result the active parser state refuses to consume.
    #[error("sub-expression result not accepted in {state}")]
    UnexpectedChildResult { state: &'static str },

    /// A token that cannot appear at this position of the grammar.
    #[error("unexpected token `{0}` in expression")]
    InvalidToken(Token),

    /// An opening bracket closed by the wrong closing bracket.
    #[error("unmatched brackets: `{open}` and `{close}`")]
    MismatchedBrackets { open: String, close: String },

    /// A bracket with no counterpart in the input.
    #[error("unmatched bracket: `{0}`")]
    UnmatchedBracket(String),

    /// A modifier token with no registered state provider.
    #[error("no handler registered for modifier `{0}`")]
    UnsupportedModifier(String),

    /// An opening bracket with no registered state provider.
    #[error("no handler registered for bracket `{0}`")]
    UnsupportedBracket(String),

    /// A grouping bracket whose content is not a single expression.
    #[error("bracket `{bracket}` must contain a single expression, found {count}")]
    BracketChildCount { bracket: String, count: usize },

    /// A `SymbolWithArity` token whose `$args,rets` suffix fails to decode.
    #[error("malformed arity suffix on token `{0}`")]
    MalformedAritySuffix(String),

    /// A value literal the host's value parser refuses.
    #[error("invalid value literal `{token}`: {message}")]
    InvalidValue { token: Token, message: String },

    /// An operator identifier absent from the dictionary.
    #[error("invalid operator: `{0}`")]
    UnknownOperator(String),

    /// An operator used in prefix position without a registered unary form.
    #[error("no unary version of operator: `{0}`")]
    NoUnaryVersion(String),

    /// An operator in head position with nothing to apply to.
    #[error("operator `{0}` called without arguments")]
    OperatorWithoutArguments(String),

    /// Two adjacent operands with no operator between them and no default
    /// operator registered for juxtaposition.
    #[error("adjacent operands with no operator and no default operator registered")]
    MissingDefaultOperator,

    /// Input ended in the middle of an expression.
    #[error("expression ended unexpectedly")]
    UnfinishedExpression,

    /// The token stream does not reduce to a single expression.
    #[error("tokens do not form a single expression")]
    NonExpression,
}

impl ParseError {
    /// Convenience constructor for hosts' value parsers.
    pub fn invalid_value(token: &Token, message: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            token: token.clone(),
            message: message.into(),
        }
    }
}

/// Failure while executing a compiled program against a [`Frame`](crate::frame::Frame).
#[derive(Debug, Error, EnumIs)]
pub enum ExecError {
    /// An identifier with no entry in the frame's symbol table.
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// The value stack held fewer entries than an operation required.
    #[error("stack underflow: needed {needed} operands, had {available}")]
    StackUnderflow { needed: usize, available: usize },

    /// A call site supplied an argument count the symbol does not accept.
    #[error("expected {expected} arguments, got {actual}")]
    ArgCountMismatch { expected: usize, actual: usize },

    /// A call site expected a result count the symbol does not produce.
    #[error("produces {expected} results, caller expected {actual}")]
    RetCountMismatch { expected: usize, actual: usize },

    /// A symbol that is callable only and has no plain value.
    #[error("symbol is not readable as a value")]
    NotAValue,

    /// A failure of the value domain itself (e.g. division by zero). Passed
    /// through symbol-call boundaries unchanged so hosts can recognize it.
    #[error("{0}")]
    Domain(String),

    /// Any non-domain failure raised inside a symbol call, wrapped with the
    /// symbol's identifier for traceability.
    #[error("failed to execute symbol `{id}`")]
    Symbol {
        id: String,
        #[source]
        source: Box<ExecError>,
    },
}
