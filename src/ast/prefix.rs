//! Lisp-style prefix parser producing expression trees through a node
//! factory.
//!
//! A `(` dispatches on the token in head position: a symbol makes the form a
//! call over the collected arguments, an operator applies to them (one
//! argument selects the unary form, more the binary form, folded into nested
//! applications when variadic). Separator tokens read as whitespace. Other
//! opening brackets build container nodes, and bare values and symbols stand
//! on their own.

use std::collections::HashSet;
use std::iter::Peekable;
use std::sync::Arc;

use crate::ast::factory::ExprNodeFactory;
use crate::ast::node::ExprNode;
use crate::error::{ParseError, ParseResult};
use crate::op::{Operator, OperatorDictionary};
use crate::token::{Token, TokenKind, matching_bracket};

/// The bracket whose head position selects a call or operator application.
const CALL_BRACKET: &str = "(";

/// Prefix front-end over an operator dictionary and a node factory.
///
/// Precedence never matters here (nesting is explicit), only the fold
/// direction of variadic operator applications: left unless registered via
/// [`Self::with_right_assoc`].
pub struct PrefixParser<E, F> {
    operators: Arc<OperatorDictionary<E>>,
    factory: F,
    right_assoc: HashSet<String>,
}

impl<E, F: ExprNodeFactory<E>> PrefixParser<E, F> {
    pub fn new(operators: Arc<OperatorDictionary<E>>, factory: F) -> Self {
        PrefixParser {
            operators,
            factory,
            right_assoc: HashSet::new(),
        }
    }

    /// Fold variadic applications of `id` to the right instead of the left.
    ///
    /// Panics if the id has no binary registration in the dictionary or was
    /// already marked.
    pub fn with_right_assoc(mut self, id: &str) -> Self {
        assert!(
            self.operators.binary(id).is_some(),
            "`{id}` is not a registered binary operator"
        );
        let inserted = self.right_assoc.insert(id.to_owned());
        assert!(inserted, "duplicate associativity for `{id}`");
        self
    }

    /// Parse exactly one expression from the front of the input.
    pub fn parse<I: Iterator<Item = Token>>(
        &self,
        input: &mut Peekable<I>,
    ) -> ParseResult<ExprNode<E>> {
        let token = input.next().ok_or(ParseError::UnfinishedExpression)?;
        self.parse_node(token, input)
    }

    fn parse_node<I: Iterator<Item = Token>>(
        &self,
        token: Token,
        input: &mut Peekable<I>,
    ) -> ParseResult<ExprNode<E>> {
        match token.kind {
            TokenKind::Value => self.factory.value_node(&token),
            TokenKind::Symbol => Ok(self.factory.symbol_get_node(&token.text)),
            TokenKind::LeftBracket => self.parse_nested(token.text, input),
            TokenKind::Modifier => Err(ParseError::UnsupportedModifier(token.text)),
            _ => Err(ParseError::InvalidToken(token)),
        }
    }

    fn parse_nested<I: Iterator<Item = Token>>(
        &self,
        open: String,
        input: &mut Peekable<I>,
    ) -> ParseResult<ExprNode<E>> {
        let close = matching_bracket(&open)
            .ok_or_else(|| ParseError::UnsupportedBracket(open.clone()))?;

        if open != CALL_BRACKET {
            let children = self.collect_args(&open, close, input)?;
            return self.factory.bracket_node(&open, close, children);
        }

        let head = input
            .next()
            .ok_or_else(|| ParseError::UnmatchedBracket(open.clone()))?;
        match head.kind {
            TokenKind::Symbol => {
                let args = self.collect_args(&open, close, input)?;
                Ok(self.factory.symbol_call_node(&head.text, args))
            }
            TokenKind::Operator => {
                let args = self.collect_args(&open, close, input)?;
                self.apply_operator(&head.text, args)
            }
            _ => Err(ParseError::InvalidToken(head)),
        }
    }

    /// Parse the arguments of a bracketed form, consuming the closing bracket.
    fn collect_args<I: Iterator<Item = Token>>(
        &self,
        open: &str,
        close: &str,
        input: &mut Peekable<I>,
    ) -> ParseResult<Vec<ExprNode<E>>> {
        let mut args = Vec::new();
        loop {
            let token = input
                .next()
                .ok_or_else(|| ParseError::UnmatchedBracket(open.to_owned()))?;
            match token.kind {
                // commas read as whitespace
                TokenKind::Separator => {}
                TokenKind::RightBracket => {
                    if token.text != close {
                        return Err(ParseError::MismatchedBrackets {
                            open: open.to_owned(),
                            close: token.text,
                        });
                    }
                    return Ok(args);
                }
                _ => args.push(self.parse_node(token, input)?),
            }
        }
    }

    fn apply_operator(&self, id: &str, mut args: Vec<ExprNode<E>>) -> ParseResult<ExprNode<E>> {
        match args.len() {
            0 => Err(ParseError::OperatorWithoutArguments(id.to_owned())),
            1 => {
                let op = self
                    .operators
                    .unary(id)
                    .ok_or_else(|| ParseError::NoUnaryVersion(id.to_owned()))?;
                let arg = args.pop().expect("len checked");
                Ok(self.factory.op_node(&Arc::clone(op), vec![arg]))
            }
            _ => {
                let op = self
                    .operators
                    .binary(id)
                    .ok_or_else(|| ParseError::UnknownOperator(id.to_owned()))?;
                Ok(self.fold_binary(&Arc::clone(op), args))
            }
        }
    }

    /// Reduce a variadic application to nested two-argument nodes.
    fn fold_binary(&self, op: &Arc<Operator<E>>, args: Vec<ExprNode<E>>) -> ExprNode<E> {
        if self.right_assoc.contains(op.id()) {
            let mut iter = args.into_iter().rev();
            let mut node = iter.next().expect("at least two arguments");
            for left in iter {
                node = self.factory.op_node(op, vec![left, node]);
            }
            node
        } else {
            let mut iter = args.into_iter();
            let mut node = iter.next().expect("at least two arguments");
            for right in iter {
                node = self.factory.op_node(op, vec![node, right]);
            }
            node
        }
    }
}
