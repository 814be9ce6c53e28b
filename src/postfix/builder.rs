//! Accumulation of executable sequences during postfix parsing.

use crate::error::{ParseError, ParseResult};
use crate::exec::{Executable, ExecutableList, SymbolCall};
use crate::op::OperatorDictionary;
use crate::token::Token;
use crate::value::ValueParser;
use std::sync::Arc;

/// Sink for the operations a parser state emits while consuming tokens.
/// `build` produces the wrap-collapsed result.
pub trait ExecutableBuilder<E> {
    fn push_value(&mut self, token: &Token) -> ParseResult<()>;
    fn push_operator(&mut self, id: &str) -> ParseResult<()>;
    fn push_symbol_get(&mut self, id: &str);
    fn push_symbol_call(&mut self, call: SymbolCall);
    /// Append a finished sub-expression. Nested lists are inlined and no-ops
    /// dropped, so built sequences stay flat.
    fn push_result(&mut self, result: Executable<E>);
    fn build(self) -> Executable<E>
    where
        Self: Sized;
}

/// Standard builder over a value parser and an operator dictionary. Owns both
/// (the dictionary via `Arc`), so states created long after setup can carry
/// one.
pub struct DefaultExecutableBuilder<E, P> {
    value_parser: P,
    operators: Arc<OperatorDictionary<E>>,
    buffer: Vec<Executable<E>>,
}

impl<E, P> DefaultExecutableBuilder<E, P> {
    pub fn new(value_parser: P, operators: Arc<OperatorDictionary<E>>) -> Self {
        DefaultExecutableBuilder {
            value_parser,
            operators,
            buffer: Vec::new(),
        }
    }
}

impl<E, P: ValueParser<E>> ExecutableBuilder<E> for DefaultExecutableBuilder<E, P> {
    fn push_value(&mut self, token: &Token) -> ParseResult<()> {
        let value = self.value_parser.parse(token)?;
        self.buffer.push(Executable::Value(value));
        Ok(())
    }

    fn push_operator(&mut self, id: &str) -> ParseResult<()> {
        let op = self
            .operators
            .any(id)
            .ok_or_else(|| ParseError::UnknownOperator(id.to_owned()))?;
        self.buffer.push(Executable::Operator(Arc::clone(op)));
        Ok(())
    }

    fn push_symbol_get(&mut self, id: &str) {
        self.buffer.push(Executable::SymbolGet(id.to_owned()));
    }

    fn push_symbol_call(&mut self, call: SymbolCall) {
        self.buffer.push(Executable::SymbolCall(call));
    }

    fn push_result(&mut self, result: Executable<E>) {
        match result {
            Executable::Noop => {}
            Executable::List(list) => list.deep_flatten(&mut self.buffer),
            other => self.buffer.push(other),
        }
    }

    fn build(self) -> Executable<E> {
        ExecutableList::wrap(self.buffer)
    }
}
