//! Shunting-yard infix parser producing expression trees through a node
//! factory.
//!
//! Precedence and associativity live here, not in the operator dictionary:
//! they are a property of the infix grammar alone. Every binary operator that
//! can appear in input must have a precedence registered before parsing; unary
//! operators always bind tighter than any binary operator.

use std::collections::HashMap;
use std::iter::Peekable;
use std::sync::Arc;

use log::trace;

use crate::ast::factory::ExprNodeFactory;
use crate::ast::node::ExprNode;
use crate::error::{ParseError, ParseResult};
use crate::op::{Arity, Operator, OperatorDictionary};
use crate::token::{Token, TokenKind, matching_bracket};

/// The bracket that turns a preceding symbol into a call.
const CALL_BRACKET: &str = "(";

/// Associativity of a binary operator at equal precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
}

/// Infix front-end over an operator dictionary and a node factory.
pub struct InfixParser<E, F> {
    operators: Arc<OperatorDictionary<E>>,
    factory: F,
    precedence: HashMap<String, (u32, Assoc)>,
}

impl<E, F: ExprNodeFactory<E>> InfixParser<E, F> {
    pub fn new(operators: Arc<OperatorDictionary<E>>, factory: F) -> Self {
        InfixParser {
            operators,
            factory,
            precedence: HashMap::new(),
        }
    }

    /// Register precedence and associativity for a binary operator id.
    ///
    /// Panics if the id has no binary registration in the dictionary or if a
    /// precedence was already registered for it.
    pub fn with_precedence(mut self, id: &str, precedence: u32, assoc: Assoc) -> Self {
        assert!(
            self.operators.binary(id).is_some(),
            "`{id}` is not a registered binary operator"
        );
        let prev = self.precedence.insert(id.to_owned(), (precedence, assoc));
        assert!(prev.is_none(), "duplicate precedence for `{id}`");
        self
    }

    /// Assert that every binary operator in the dictionary (the default
    /// included) has a registered precedence, so a gap surfaces when the
    /// front-end is assembled rather than mid-parse.
    pub fn assert_precedence_coverage(&self) {
        for id in self.operators.all_ids() {
            if self.operators.binary(id).is_some() {
                assert!(
                    self.precedence.contains_key(id),
                    "no precedence registered for binary operator `{id}`"
                );
            }
        }
    }

    /// Parse one expression, stopping (without consuming) at a separator or
    /// closing bracket, or at end of input.
    pub fn parse<I: Iterator<Item = Token>>(
        &self,
        input: &mut Peekable<I>,
    ) -> ParseResult<ExprNode<E>> {
        let mut node_stack: Vec<ExprNode<E>> = Vec::new();
        let mut op_stack: Vec<Arc<Operator<E>>> = Vec::new();
        let mut last_was_operand = false;

        while let Some(peeked) = input.peek() {
            if matches!(
                peeked.kind,
                TokenKind::RightBracket | TokenKind::Separator
            ) {
                break;
            }
            let token = input.next().expect("peeked");
            let mut is_operand = true;

            match token.kind {
                TokenKind::Value => node_stack.push(self.factory.value_node(&token)?),
                TokenKind::Symbol => {
                    let is_call = matches!(
                        input.peek(),
                        Some(next) if next.kind == TokenKind::LeftBracket
                            && next.text == CALL_BRACKET
                    );
                    if is_call {
                        input.next();
                        let close = matching_bracket(CALL_BRACKET).expect("known bracket");
                        let args = self.collect_children(input, CALL_BRACKET, close)?;
                        node_stack.push(self.factory.symbol_call_node(&token.text, args));
                    } else {
                        node_stack.push(self.factory.symbol_get_node(&token.text));
                    }
                }
                // explicit arity suffixes only make sense in postfix programs
                TokenKind::SymbolWithArity => return Err(ParseError::InvalidToken(token)),
                TokenKind::LeftBracket => {
                    let open = token.text;
                    let close = matching_bracket(&open)
                        .ok_or_else(|| ParseError::UnsupportedBracket(open.clone()))?;
                    let children = self.collect_children(input, &open, close)?;
                    node_stack.push(self.factory.bracket_node(&open, close, children)?);
                }
                TokenKind::Operator => {
                    let op = if last_was_operand {
                        self.operators
                            .binary(&token.text)
                            .ok_or_else(|| ParseError::UnknownOperator(token.text.clone()))?
                    } else {
                        self.operators
                            .unary(&token.text)
                            .ok_or_else(|| ParseError::NoUnaryVersion(token.text.clone()))?
                    };
                    let op = Arc::clone(op);
                    self.push_operator(&mut node_stack, &mut op_stack, op)?;
                    is_operand = false;
                }
                TokenKind::Modifier => return Err(ParseError::UnsupportedModifier(token.text)),
                TokenKind::RightBracket | TokenKind::Separator => {
                    unreachable!("terminators handled before consuming")
                }
            }

            // two adjacent operands: splice in the default operator
            if last_was_operand && is_operand {
                let default = self
                    .operators
                    .default_op()
                    .ok_or(ParseError::MissingDefaultOperator)?;
                let default = Arc::clone(default);
                trace!("inserting default operator `{}` between operands", default.id());
                let just_pushed = node_stack.pop().expect("operand pushed this iteration");
                self.push_operator(&mut node_stack, &mut op_stack, default)?;
                node_stack.push(just_pushed);
            }
            last_was_operand = is_operand;
        }

        while let Some(op) = op_stack.pop() {
            self.apply(&mut node_stack, &op)?;
        }

        match node_stack.len() {
            0 => Err(ParseError::UnfinishedExpression),
            1 => Ok(node_stack.pop().expect("len checked")),
            _ => Err(ParseError::NonExpression),
        }
    }

    /// Parse the comma-separated children of a bracketed construct, consuming
    /// the closing bracket.
    fn collect_children<I: Iterator<Item = Token>>(
        &self,
        input: &mut Peekable<I>,
        open: &str,
        close: &str,
    ) -> ParseResult<Vec<ExprNode<E>>> {
        let mut children = Vec::new();

        match input.peek() {
            None => return Err(ParseError::UnmatchedBracket(open.to_owned())),
            Some(token) if token.kind == TokenKind::RightBracket => {
                let token = input.next().expect("peeked");
                if token.text != close {
                    return Err(ParseError::MismatchedBrackets {
                        open: open.to_owned(),
                        close: token.text,
                    });
                }
                return Ok(children);
            }
            Some(_) => {}
        }

        loop {
            children.push(self.parse(input)?);
            let token = input
                .next()
                .ok_or_else(|| ParseError::UnmatchedBracket(open.to_owned()))?;
            match token.kind {
                TokenKind::RightBracket => {
                    if token.text != close {
                        return Err(ParseError::MismatchedBrackets {
                            open: open.to_owned(),
                            close: token.text,
                        });
                    }
                    return Ok(children);
                }
                TokenKind::Separator => continue,
                _ => return Err(ParseError::InvalidToken(token)),
            }
        }
    }

    fn push_operator(
        &self,
        node_stack: &mut Vec<ExprNode<E>>,
        op_stack: &mut Vec<Arc<Operator<E>>>,
        new_op: Arc<Operator<E>>,
    ) -> ParseResult<()> {
        while let Some(top) = op_stack.last() {
            if !self.should_pop(&new_op, top) {
                break;
            }
            let top = op_stack.pop().expect("just peeked");
            self.apply(node_stack, &top)?;
        }
        op_stack.push(new_op);
        Ok(())
    }

    /// Whether `top` must be applied before `new_op` goes onto the stack.
    fn should_pop(&self, new_op: &Operator<E>, top: &Operator<E>) -> bool {
        match (new_op.arity(), top.arity()) {
            // prefix operators take their operand from the right; nothing on
            // the stack can bind it first
            (Arity::Unary, _) => false,
            // unary binds tighter than any binary
            (Arity::Binary, Arity::Unary) => true,
            (Arity::Binary, Arity::Binary) => {
                let (new_prec, new_assoc) = self.binary_precedence(new_op);
                let (top_prec, _) = self.binary_precedence(top);
                new_prec < top_prec || (new_prec == top_prec && new_assoc == Assoc::Left)
            }
        }
    }

    fn binary_precedence(&self, op: &Operator<E>) -> (u32, Assoc) {
        *self.precedence.get(op.id()).unwrap_or_else(|| {
            panic!(
                "no precedence registered for binary operator `{}`",
                op.id()
            )
        })
    }

    fn apply(
        &self,
        node_stack: &mut Vec<ExprNode<E>>,
        op: &Arc<Operator<E>>,
    ) -> ParseResult<()> {
        let count = op.arity().arg_count();
        if node_stack.len() < count {
            return Err(ParseError::UnfinishedExpression);
        }
        let children = node_stack.split_off(node_stack.len() - count);
        node_stack.push(self.factory.op_node(op, children));
        Ok(())
    }
}
