//! The value-parser boundary: the sole entry point of a concrete value domain.

use crate::error::ParseResult;
use crate::token::Token;

/// Parses the literal text of a `Value` token into the value domain `E`.
///
/// Implemented by the host once per domain; any `Fn(&Token) -> ParseResult<E>`
/// works directly.
pub trait ValueParser<E> {
    fn parse(&self, token: &Token) -> ParseResult<E>;
}

impl<E, F> ValueParser<E> for F
where
    F: Fn(&Token) -> ParseResult<E>,
{
    fn parse(&self, token: &Token) -> ParseResult<E> {
        self(token)
    }
}
