//! End-to-end coverage of the postfix front-end: the state stack, bracket and
//! modifier sub-states, unwinding, and arity suffixes.

mod common;

use std::sync::Arc;

use exprvm::compiler::Compiler;
use exprvm::error::{ParseError, ParseResult};
use exprvm::exec::{Executable, ExecutableList, SymbolCall};
use exprvm::postfix::builder::DefaultExecutableBuilder;
use exprvm::postfix::{Accept, BracketState, ParserState, PostfixCompiler};
use exprvm::token::{Token, TokenKind};

use common::{lb, op, operators, parse_i64, rb, run, sep, sym, val};

type Parser = fn(&Token) -> ParseResult<i64>;

fn compiler() -> PostfixCompiler<i64, Parser> {
    PostfixCompiler::new(operators(), parse_i64)
}

#[test]
fn values_then_operator() {
    let program = compiler()
        .compile(vec![val("2"), val("3"), op("+")])
        .unwrap();
    let ops = operators();
    assert_eq!(
        program,
        Executable::List(ExecutableList::new(vec![
            Executable::Value(2),
            Executable::Value(3),
            Executable::Operator(Arc::clone(ops.binary("+").unwrap())),
        ]))
    );
    assert_eq!(run(&program).unwrap(), 5);
}

#[test]
fn operand_order_is_preserved() {
    // 10 4 - computes 10 - 4
    let program = compiler()
        .compile(vec![val("10"), val("4"), op("-")])
        .unwrap();
    assert_eq!(run(&program).unwrap(), 6);
}

#[test]
fn unary_spelled_distinctly() {
    let program = compiler().compile(vec![val("5"), op("neg")]).unwrap();
    assert_eq!(run(&program).unwrap(), -5);
}

#[test]
fn plain_symbol_defers_counts_to_the_symbol() {
    let program = compiler()
        .compile(vec![val("1"), val("8"), sym("max")])
        .unwrap();
    assert_eq!(
        program,
        Executable::List(ExecutableList::new(vec![
            Executable::Value(1),
            Executable::Value(8),
            Executable::SymbolCall(SymbolCall::new("max")),
        ]))
    );
    assert_eq!(run(&program).unwrap(), 8);
}

#[test]
fn arity_suffix_fixes_counts() {
    let program = compiler()
        .compile(vec![
            val("1"),
            val("8"),
            Token::symbol_with_arity("max$2,1"),
        ])
        .unwrap();
    assert_eq!(run(&program).unwrap(), 8);

    // a wrong fixed count is the symbol's error, attributed to it
    let program = compiler()
        .compile(vec![val("1"), Token::symbol_with_arity("max$1,1")])
        .unwrap();
    let err = run(&program).unwrap_err();
    match err {
        exprvm::error::ExecError::Symbol { ref id, ref source } => {
            assert_eq!(id, "max");
            assert!(source.is_arg_count_mismatch());
        }
        other => panic!("expected symbol error, got {other}"),
    }
}

#[test]
fn parse_errors() {
    let c = compiler();
    assert!(
        c.compile(vec![val("1"), op("?")])
            .unwrap_err()
            .is_unknown_operator()
    );
    assert!(
        c.compile(vec![val("nope")])
            .unwrap_err()
            .is_invalid_value()
    );
    assert!(
        c.compile(vec![Token::symbol_with_arity("max$-1,1")])
            .unwrap_err()
            .is_malformed_arity_suffix()
    );
    // structural tokens have no meaning in a flat postfix program
    assert!(
        c.compile(vec![val("1"), sep()])
            .unwrap_err()
            .is_unexpected_token()
    );
    assert!(
        c.compile(vec![val("1"), rb(")")])
            .unwrap_err()
            .is_unexpected_token()
    );
    // no states are registered by default
    assert!(
        c.compile(vec![lb("(")])
            .unwrap_err()
            .is_unsupported_bracket()
    );
    assert!(
        c.compile(vec![Token::modifier("@")])
            .unwrap_err()
            .is_unsupported_modifier()
    );
}

/// `[ ... ]` evaluates its content and negates the result.
fn with_negating_bracket(c: PostfixCompiler<i64, Parser>) -> PostfixCompiler<i64, Parser> {
    let ops = operators();
    c.with_bracket_state("[", move || {
        let neg = Arc::clone(ops.unary("neg").expect("registered"));
        Box::new(BracketState::new(
            DefaultExecutableBuilder::new(parse_i64 as Parser, operators()),
            "[",
            "]",
            move |inner| {
                Ok(ExecutableList::wrap(vec![
                    inner,
                    Executable::Operator(neg),
                ]))
            },
        ))
    })
}

#[test]
fn bracket_states_nest() {
    let c = with_negating_bracket(compiler());
    let program = c
        .compile(vec![lb("["), val("2"), val("3"), op("+"), rb("]")])
        .unwrap();
    assert_eq!(run(&program).unwrap(), -5);

    // [ [ 2 ] 3 + ] = -((-2) + 3)
    let program = c
        .compile(vec![
            lb("["),
            lb("["),
            val("2"),
            rb("]"),
            val("3"),
            op("+"),
            rb("]"),
        ])
        .unwrap();
    assert_eq!(run(&program).unwrap(), -1);
}

#[test]
fn bracket_state_errors() {
    let c = with_negating_bracket(compiler());
    assert!(
        c.compile(vec![lb("["), val("2"), rb(")")])
            .unwrap_err()
            .is_mismatched_brackets()
    );
    assert!(
        c.compile(vec![lb("["), val("2")])
            .unwrap_err()
            .is_unfinished_expression()
    );
}

/// Reads a single symbol token and yields a plain value read of it.
struct QuoteState {
    id: Option<String>,
}

impl ParserState<i64> for QuoteState {
    fn accept_token(&mut self, token: &Token) -> ParseResult<Accept> {
        match token.kind {
            TokenKind::Symbol => {
                self.id = Some(token.text.clone());
                Ok(Accept::Finished)
            }
            _ => Ok(Accept::Rejected),
        }
    }

    fn accept_child_result(&mut self, _result: Executable<i64>) -> ParseResult<Accept> {
        Ok(Accept::Rejected)
    }

    fn finish(self: Box<Self>) -> ParseResult<Executable<i64>> {
        match self.id {
            Some(id) => Ok(Executable::SymbolGet(id)),
            None => Err(ParseError::UnfinishedExpression),
        }
    }

    fn describe(&self) -> &'static str {
        "quote state"
    }
}

#[test]
fn modifier_state_changes_the_sub_grammar() {
    let c = compiler()
        .with_modifier_state("@", || Box::new(QuoteState { id: None }));
    let program = c.compile(vec![Token::modifier("@"), sym("pi")]).unwrap();
    // a read, not a call
    assert_eq!(program, Executable::SymbolGet("pi".to_owned()));
    assert_eq!(run(&program).unwrap(), 3);

    // the quote state consumes exactly one symbol
    assert!(
        c.compile(vec![Token::modifier("@"), val("1")])
            .unwrap_err()
            .is_unexpected_token()
    );
    assert!(
        c.compile(vec![Token::modifier("@")])
            .unwrap_err()
            .is_unfinished_expression()
    );
}

/// Finishes as soon as it receives one child result, negating it.
struct NegateOnceState {
    inner: Option<Executable<i64>>,
}

impl ParserState<i64> for NegateOnceState {
    fn accept_token(&mut self, _token: &Token) -> ParseResult<Accept> {
        Ok(Accept::Rejected)
    }

    fn accept_child_result(&mut self, result: Executable<i64>) -> ParseResult<Accept> {
        self.inner = Some(result);
        Ok(Accept::Finished)
    }

    fn finish(self: Box<Self>) -> ParseResult<Executable<i64>> {
        let inner = self.inner.ok_or(ParseError::UnfinishedExpression)?;
        let neg = Arc::clone(operators().unary("neg").expect("registered"));
        Ok(ExecutableList::wrap(vec![
            inner,
            Executable::Operator(neg),
        ]))
    }
}

#[test]
fn finished_states_unwind_transitively() {
    let c = with_negating_bracket(compiler())
        .with_modifier_state("#", || Box::new(NegateOnceState { inner: None }));
    // closing `]` finishes the bracket state, whose result finishes the
    // modifier state, whose result lands in the initial state: -(-(2)) = 2
    let program = c
        .compile(vec![
            Token::modifier("#"),
            lb("["),
            val("2"),
            rb("]"),
            val("1"),
            op("+"),
        ])
        .unwrap();
    assert_eq!(run(&program).unwrap(), 3);
}

#[test]
fn child_results_can_be_rejected() {
    let c = with_negating_bracket(compiler())
        .with_modifier_state("@", || Box::new(QuoteState { id: None }));
    let err = c
        .compile(vec![Token::modifier("@"), lb("["), val("2"), rb("]")])
        .unwrap_err();
    assert!(matches!(
        err,
        ParseError::UnexpectedChildResult { state: "quote state" }
    ));
}
