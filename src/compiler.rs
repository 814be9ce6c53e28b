//! Front-end façade: anything that turns a token stream into one executable.

use std::iter::Peekable;

use crate::ast::factory::ExprNodeFactory;
use crate::ast::infix::InfixParser;
use crate::ast::node::ExprNode;
use crate::ast::prefix::PrefixParser;
use crate::error::{ParseError, ParseResult};
use crate::exec::{Executable, ExecutableList};
use crate::token::{Token, TokenKind};

/// A complete front-end: consumes a full token stream, produces a runnable
/// program. The infix, prefix, and postfix paths all implement this.
pub trait Compiler<E> {
    fn compile<I: IntoIterator<Item = Token>>(&self, tokens: I) -> ParseResult<Executable<E>>;
}

/// Reject leftover input, then flatten and wrap the parsed tree.
fn finish<E: Clone, I: Iterator<Item = Token>>(
    node: ExprNode<E>,
    input: &mut Peekable<I>,
) -> ParseResult<Executable<E>> {
    if let Some(trailing) = input.next() {
        return Err(match trailing.kind {
            TokenKind::RightBracket => ParseError::UnmatchedBracket(trailing.text),
            _ => ParseError::InvalidToken(trailing),
        });
    }
    let mut output = Vec::new();
    node.flatten(&mut output);
    Ok(ExecutableList::wrap(output))
}

/// The infix path: shunting-yard parse to a tree, flatten, wrap.
pub struct AstCompiler<E, F> {
    parser: InfixParser<E, F>,
}

impl<E, F: ExprNodeFactory<E>> AstCompiler<E, F> {
    /// Panics if any binary operator in the dictionary lacks a registered
    /// precedence; the gap is a setup mistake and must not wait for input to
    /// trip over it.
    pub fn new(parser: InfixParser<E, F>) -> Self {
        parser.assert_precedence_coverage();
        AstCompiler { parser }
    }
}

impl<E: Clone, F: ExprNodeFactory<E>> Compiler<E> for AstCompiler<E, F> {
    fn compile<I: IntoIterator<Item = Token>>(&self, tokens: I) -> ParseResult<Executable<E>> {
        let mut input = tokens.into_iter().peekable();
        let node = self.parser.parse(&mut input)?;
        finish(node, &mut input)
    }
}

/// The prefix path: head-position parse to a tree, flatten, wrap.
pub struct PrefixCompiler<E, F> {
    parser: PrefixParser<E, F>,
}

impl<E, F: ExprNodeFactory<E>> PrefixCompiler<E, F> {
    pub fn new(parser: PrefixParser<E, F>) -> Self {
        PrefixCompiler { parser }
    }
}

impl<E: Clone, F: ExprNodeFactory<E>> Compiler<E> for PrefixCompiler<E, F> {
    fn compile<I: IntoIterator<Item = Token>>(&self, tokens: I) -> ParseResult<Executable<E>> {
        let mut input = tokens.into_iter().peekable();
        let node = self.parser.parse(&mut input)?;
        finish(node, &mut input)
    }
}
