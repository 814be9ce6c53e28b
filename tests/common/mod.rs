//! Shared `i64` calculator fixture used by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use exprvm::error::{ExecError, ExecResult, ParseError, ParseResult};
use exprvm::exec::Executable;
use exprvm::frame::{Frame, SymbolTable};
use exprvm::op::{Operator, OperatorDictionary, OperatorDictionaryBuilder};
use exprvm::token::Token;

pub fn parse_i64(token: &Token) -> ParseResult<i64> {
    token
        .text
        .parse()
        .map_err(|e| ParseError::invalid_value(token, format!("{e}")))
}

/// Integer arithmetic with `*` as the default (juxtaposition) operator and a
/// unary `-` alongside the binary one. Postfix programs spell negation `neg`.
pub fn operators() -> Arc<OperatorDictionary<i64>> {
    let mut builder = OperatorDictionaryBuilder::new();
    builder.register(Operator::binary("+", |a, b| Ok(a + b)));
    builder.register(Operator::binary("-", |a, b| Ok(a - b)));
    builder
        .register(Operator::binary("*", |a, b| Ok(a * b)))
        .set_default();
    builder.register(Operator::binary("/", |a, b| {
        if b == 0 {
            Err(ExecError::Domain("division by zero".to_owned()))
        } else {
            Ok(a / b)
        }
    }));
    builder.register(Operator::binary("^", |a: i64, b| Ok(a.pow(b as u32))));
    builder.register(Operator::unary("-", |a: i64| Ok(-a)));
    builder.register(Operator::unary("neg", |a: i64| Ok(-a)));
    Arc::new(builder.build())
}

pub fn symbols() -> Arc<SymbolTable<i64>> {
    let mut table = SymbolTable::new();
    table.define_constant("pi", 3);
    table.define_constant("x", 10);
    table.define_function("answer", 0, |_| Ok(42));
    table.define_function("max", 2, |args| {
        Ok(*args.iter().max().expect("two arguments"))
    });
    Arc::new(table)
}

/// Run a program against a fresh frame over [`symbols`] and pop its result.
pub fn run(program: &Executable<i64>) -> ExecResult<i64> {
    let mut frame = Frame::new(symbols());
    program.execute(&mut frame)?;
    frame.pop()
}

pub fn val(text: &str) -> Token {
    Token::value(text)
}

pub fn op(text: &str) -> Token {
    Token::operator(text)
}

pub fn sym(text: &str) -> Token {
    Token::symbol(text)
}

pub fn lb(text: &str) -> Token {
    Token::left_bracket(text)
}

pub fn rb(text: &str) -> Token {
    Token::right_bracket(text)
}

pub fn sep() -> Token {
    Token::separator()
}
