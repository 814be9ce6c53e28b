//! Exprvm: a type-generic expression compiler and stack executor.
//!
//! This crate turns streams of classified tokens into small runnable programs
//! over a caller-chosen value type `E`. It provides:
//! - a token model (via [`token`]) with a closed set of kinds
//! - an operator dictionary (via [`op`]) built once and frozen, identifying
//!   operators by `(arity, id)`
//! - a flat executable form (via [`exec`]) evaluated against a [`frame::Frame`]
//!   holding a value stack and an `Arc`-shared symbol scope
//! - three front-ends implementing [`compiler::Compiler`]: an infix
//!   shunting-yard parser and a Lisp-style prefix parser, both producing
//!   expression trees (via [`ast`]) that flatten post-order, and a postfix
//!   parser (via [`postfix`]) driven by a stack of pluggable states
//!
//! The design keeps every piece generic over `E`: hosts supply a value parser
//! for literals, closures for operators, and [`frame::Symbol`]
//! implementations for named entities. Precedence is a property of the infix
//! grammar alone and is registered on the parser, never on the dictionary.
//!
//! Examples
//! ```
//! use std::sync::Arc;
//! use exprvm::ast::{Assoc, DefaultExprNodeFactory, InfixParser};
//! use exprvm::compiler::{AstCompiler, Compiler};
//! use exprvm::error::{ParseError, ParseResult};
//! use exprvm::frame::{Frame, SymbolTable};
//! use exprvm::op::{Operator, OperatorDictionaryBuilder};
//! use exprvm::token::Token;
//!
//! fn parse_i64(token: &Token) -> ParseResult<i64> {
//!     token
//!         .text
//!         .parse()
//!         .map_err(|e| ParseError::invalid_value(token, format!("{e}")))
//! }
//!
//! let mut builder = OperatorDictionaryBuilder::new();
//! builder.register(Operator::binary("+", |a, b| Ok(a + b)));
//! builder.register(Operator::binary("*", |a, b| Ok(a * b)));
//! let operators = Arc::new(builder.build());
//!
//! let parser = InfixParser::new(Arc::clone(&operators), DefaultExprNodeFactory::new(parse_i64))
//!     .with_precedence("+", 1, Assoc::Left)
//!     .with_precedence("*", 2, Assoc::Left);
//! let compiler = AstCompiler::new(parser);
//!
//! // 1 + 2 * 3
//! let program = compiler
//!     .compile([
//!         Token::value("1"),
//!         Token::operator("+"),
//!         Token::value("2"),
//!         Token::operator("*"),
//!         Token::value("3"),
//!     ])
//!     .unwrap();
//!
//! let mut frame = Frame::new(Arc::new(SymbolTable::new()));
//! program.execute(&mut frame).unwrap();
//! assert_eq!(frame.pop().unwrap(), 7);
//! ```

/// Expression trees: node variants, factories, and the infix and prefix parsers.
pub mod ast;
/// The `Compiler` trait and the AST-based front-ends.
pub mod compiler;
/// Parse-time and execution-time error types.
pub mod error;
/// The flat executable form and its evaluation.
pub mod exec;
/// Execution context: symbol tables and the per-execution value stack.
pub mod frame;
/// Operators and the registration-then-freeze dictionary.
pub mod op;
/// The postfix front-end: parser states, unwind, and the postfix compiler.
pub mod postfix;
/// Token kinds and construction helpers.
pub mod token;
/// Literal parsing abstraction over the value type.
pub mod value;
