//! The postfix front-end: a stack of cooperating parser states that builds an
//! executable sequence straight from the token stream, without a tree.
//!
//! The driver owns an explicit state stack (never call-stack recursion), so
//! bracket and modifier nesting depth is bounded only by memory. Modifier and
//! left-bracket tokens push provider-created states; when a state reports
//! itself finished, its result is fed to its parent, transitively, until a
//! parent merely accepts it.

pub mod builder;

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use log::trace;
use strum::EnumIs;

use crate::compiler::Compiler;
use crate::error::{ParseError, ParseResult};
use crate::exec::{Executable, SymbolCall};
use crate::op::OperatorDictionary;
use crate::postfix::builder::{DefaultExecutableBuilder, ExecutableBuilder};
use crate::token::{ARITY_MARKER, ARITY_SEPARATOR, Token, TokenKind};
use crate::value::ValueParser;

/// Outcome of offering a token or a child result to a parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIs)]
pub enum Accept {
    /// Consumed; the state continues.
    Accepted,
    /// Consumed and the state is complete; the driver unwinds it.
    Finished,
    /// Not consumable here; a fatal parse error.
    Rejected,
}

/// One stack frame of postfix parsing.
pub trait ParserState<E> {
    fn accept_token(&mut self, token: &Token) -> ParseResult<Accept>;

    fn accept_child_result(&mut self, result: Executable<E>) -> ParseResult<Accept>;

    /// Yield the state's result. Consumes the state; called once, either
    /// during unwinding or for the final remaining state at end of input.
    fn finish(self: Box<Self>) -> ParseResult<Executable<E>>;

    /// Short human-readable name used in parse-error context.
    fn describe(&self) -> &'static str {
        "expression state"
    }
}

/// A postfix front-end: an initial-state provider plus optional providers for
/// modifier- and bracket-opened sub-states. `parse` drives the state stack.
pub trait PostfixParser<E> {
    fn initial_state(&self) -> Box<dyn ParserState<E> + '_>;

    fn modifier_state(&self, modifier: &str) -> ParseResult<Box<dyn ParserState<E> + '_>> {
        Err(ParseError::UnsupportedModifier(modifier.to_owned()))
    }

    fn bracket_state(&self, bracket: &str) -> ParseResult<Box<dyn ParserState<E> + '_>> {
        Err(ParseError::UnsupportedBracket(bracket.to_owned()))
    }

    fn parse<I: IntoIterator<Item = Token>>(&self, tokens: I) -> ParseResult<Executable<E>>
    where
        Self: Sized,
    {
        let mut stack: Vec<Box<dyn ParserState<E> + '_>> = vec![self.initial_state()];

        for token in tokens {
            match token.kind {
                TokenKind::Modifier => {
                    trace!("pushing state for modifier `{}`", token.text);
                    stack.push(self.modifier_state(&token.text)?);
                }
                TokenKind::LeftBracket => {
                    trace!("pushing state for bracket `{}`", token.text);
                    stack.push(self.bracket_state(&token.text)?);
                }
                _ => {
                    let state = stack.last_mut().expect("state stack never empty");
                    match state.accept_token(&token)? {
                        Accept::Accepted => {}
                        Accept::Finished => unwind(&mut stack)?,
                        Accept::Rejected => {
                            return Err(ParseError::UnexpectedToken {
                                state: state.describe(),
                                token,
                            });
                        }
                    }
                }
            }
        }

        if stack.len() != 1 {
            return Err(ParseError::UnfinishedExpression);
        }
        stack.pop().expect("len checked").finish()
    }
}

/// Pop the finished top state and feed its result down the stack until some
/// parent accepts it without finishing itself.
fn unwind<E>(stack: &mut Vec<Box<dyn ParserState<E> + '_>>) -> ParseResult<()> {
    let mut child = stack.pop().expect("state stack never empty");
    loop {
        let result = child.finish()?;
        let parent = stack
            .last_mut()
            .expect("initial parser state finished with input remaining");
        match parent.accept_child_result(result)? {
            Accept::Accepted => return Ok(()),
            Accept::Finished => {
                trace!("unwinding through {}", parent.describe());
                child = stack.pop().expect("just peeked");
            }
            Accept::Rejected => {
                return Err(ParseError::UnexpectedChildResult {
                    state: parent.describe(),
                });
            }
        }
    }
}

/// Decode the `id$args,rets` form of a `SymbolWithArity` token.
///
/// Either half of the suffix may be empty, meaning "infer"; a suffix without a
/// separator is an argument count alone. Anything that fails to parse as an
/// unsigned integer (including negative counts) is a parse error.
pub fn decode_arity_suffix(text: &str) -> ParseResult<SymbolCall> {
    let marker = text
        .rfind(ARITY_MARKER)
        .ok_or_else(|| ParseError::MalformedAritySuffix(text.to_owned()))?;
    let id = &text[..marker];
    let suffix = &text[marker + 1..];
    let malformed = || ParseError::MalformedAritySuffix(text.to_owned());

    let (arg_count, ret_count) = match suffix.split_once(ARITY_SEPARATOR) {
        Some((args, rets)) => {
            let parse_half = |half: &str| -> ParseResult<Option<usize>> {
                if half.is_empty() {
                    Ok(None)
                } else {
                    half.parse().map(Some).map_err(|_| malformed())
                }
            };
            (parse_half(args)?, parse_half(rets)?)
        }
        None => (Some(suffix.parse().map_err(|_| malformed())?), None),
    };

    Ok(SymbolCall::with_counts(id, arg_count, ret_count))
}

/// The default state: appends operators, symbol calls, and values to its
/// builder, accepts child results, rejects structural tokens.
pub struct SimpleState<E, B> {
    builder: B,
    _marker: PhantomData<fn() -> E>,
}

impl<E, B: ExecutableBuilder<E>> SimpleState<E, B> {
    pub fn new(builder: B) -> Self {
        SimpleState {
            builder,
            _marker: PhantomData,
        }
    }

    fn consume(&mut self, token: &Token) -> ParseResult<Accept> {
        match token.kind {
            TokenKind::Operator => self.builder.push_operator(&token.text)?,
            TokenKind::Symbol => self
                .builder
                .push_symbol_call(SymbolCall::new(token.text.clone())),
            TokenKind::SymbolWithArity => {
                let call = decode_arity_suffix(&token.text)?;
                self.builder.push_symbol_call(call);
            }
            TokenKind::Value => self.builder.push_value(token)?,
            _ => return Ok(Accept::Rejected),
        }
        Ok(Accept::Accepted)
    }

    fn into_result(self) -> Executable<E> {
        self.builder.build()
    }
}

impl<E, B: ExecutableBuilder<E>> ParserState<E> for SimpleState<E, B> {
    fn accept_token(&mut self, token: &Token) -> ParseResult<Accept> {
        self.consume(token)
    }

    fn accept_child_result(&mut self, result: Executable<E>) -> ParseResult<Accept> {
        self.builder.push_result(result);
        Ok(Accept::Accepted)
    }

    fn finish(self: Box<Self>) -> ParseResult<Executable<E>> {
        Ok(self.into_result())
    }
}

type ResultTransform<E> = Box<dyn FnOnce(Executable<E>) -> ParseResult<Executable<E>>>;

/// A state opened by a specific bracket. Behaves like [`SimpleState`] until
/// the matching closing bracket arrives; a closing bracket of the wrong pair
/// is a parse error. On close, a transform is applied to the built sub-result
/// (e.g. wrapping it into a sequence-constructor call).
pub struct BracketState<E, B> {
    inner: SimpleState<E, B>,
    open: String,
    close: String,
    transform: ResultTransform<E>,
}

impl<E, B: ExecutableBuilder<E>> BracketState<E, B> {
    pub fn new(
        builder: B,
        open: impl Into<String>,
        close: impl Into<String>,
        transform: impl FnOnce(Executable<E>) -> ParseResult<Executable<E>> + 'static,
    ) -> Self {
        BracketState {
            inner: SimpleState::new(builder),
            open: open.into(),
            close: close.into(),
            transform: Box::new(transform),
        }
    }
}

impl<E, B: ExecutableBuilder<E>> ParserState<E> for BracketState<E, B> {
    fn accept_token(&mut self, token: &Token) -> ParseResult<Accept> {
        if token.kind == TokenKind::RightBracket {
            if token.text != self.close {
                return Err(ParseError::MismatchedBrackets {
                    open: self.open.clone(),
                    close: token.text.clone(),
                });
            }
            return Ok(Accept::Finished);
        }
        self.inner.consume(token)
    }

    fn accept_child_result(&mut self, result: Executable<E>) -> ParseResult<Accept> {
        self.inner.accept_child_result(result)
    }

    fn finish(self: Box<Self>) -> ParseResult<Executable<E>> {
        let this = *self;
        (this.transform)(this.inner.into_result())
    }

    fn describe(&self) -> &'static str {
        "bracket state"
    }
}

type StateFactory<E> = Box<dyn Fn() -> Box<dyn ParserState<E>> + Send + Sync>;

/// The standard postfix front-end: a [`SimpleState`] over the default builder,
/// with put-once registries of bracket- and modifier-opened sub-states.
pub struct PostfixCompiler<E, P> {
    operators: Arc<OperatorDictionary<E>>,
    value_parser: P,
    bracket_states: HashMap<String, StateFactory<E>>,
    modifier_states: HashMap<String, StateFactory<E>>,
}

impl<E, P> PostfixCompiler<E, P> {
    pub fn new(operators: Arc<OperatorDictionary<E>>, value_parser: P) -> Self {
        PostfixCompiler {
            operators,
            value_parser,
            bracket_states: HashMap::new(),
            modifier_states: HashMap::new(),
        }
    }

    /// Register the state opened by `bracket`. Panics on duplicates.
    pub fn with_bracket_state(
        mut self,
        bracket: &str,
        factory: impl Fn() -> Box<dyn ParserState<E>> + Send + Sync + 'static,
    ) -> Self {
        let prev = self
            .bracket_states
            .insert(bracket.to_owned(), Box::new(factory));
        assert!(prev.is_none(), "duplicate bracket state for `{bracket}`");
        self
    }

    /// Register the state opened by `modifier`. Panics on duplicates.
    pub fn with_modifier_state(
        mut self,
        modifier: &str,
        factory: impl Fn() -> Box<dyn ParserState<E>> + Send + Sync + 'static,
    ) -> Self {
        let prev = self
            .modifier_states
            .insert(modifier.to_owned(), Box::new(factory));
        assert!(prev.is_none(), "duplicate modifier state for `{modifier}`");
        self
    }
}

impl<E, P: ValueParser<E> + Clone> PostfixParser<E> for PostfixCompiler<E, P> {
    fn initial_state(&self) -> Box<dyn ParserState<E> + '_> {
        Box::new(SimpleState::new(DefaultExecutableBuilder::new(
            self.value_parser.clone(),
            Arc::clone(&self.operators),
        )))
    }

    fn bracket_state(&self, bracket: &str) -> ParseResult<Box<dyn ParserState<E> + '_>> {
        match self.bracket_states.get(bracket) {
            Some(factory) => Ok(factory()),
            None => Err(ParseError::UnsupportedBracket(bracket.to_owned())),
        }
    }

    fn modifier_state(&self, modifier: &str) -> ParseResult<Box<dyn ParserState<E> + '_>> {
        match self.modifier_states.get(modifier) {
            Some(factory) => Ok(factory()),
            None => Err(ParseError::UnsupportedModifier(modifier.to_owned())),
        }
    }
}

impl<E, P: ValueParser<E> + Clone> Compiler<E> for PostfixCompiler<E, P> {
    fn compile<I: IntoIterator<Item = Token>>(&self, tokens: I) -> ParseResult<Executable<E>> {
        self.parse(tokens)
    }
}
