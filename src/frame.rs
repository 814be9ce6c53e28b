//! Execution context: symbol tables and the per-execution value stack.
//!
//! A [`Frame`] is created for one top-level execution and discarded afterwards.
//! Its value stack is private; its symbol scope is an `Arc`-shared
//! [`SymbolTable`] that may chain to outer scopes, so nested calls can see
//! outer symbols without ever sharing stacks.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ExecError, ExecResult};

/// A named entity resolvable from a frame's symbol table.
///
/// Symbols follow a single calling convention: `call` receives the frame (the
/// symbol pops its arguments from and pushes its results onto the frame's
/// stack) plus the call site's optional argument/result counts, `None` meaning
/// "symbol decides". `get` reads the symbol as a plain value, for symbols that
/// have one.
pub trait Symbol<E> {
    fn call(
        &self,
        frame: &mut Frame<E>,
        arg_count: Option<usize>,
        ret_count: Option<usize>,
    ) -> ExecResult<()>;

    fn get(&self, frame: &mut Frame<E>) -> ExecResult<E>;
}

/// A constant symbol: readable as a value, callable with zero arguments.
pub struct Constant<E>(pub E);

impl<E: Clone> Symbol<E> for Constant<E> {
    fn call(
        &self,
        frame: &mut Frame<E>,
        arg_count: Option<usize>,
        ret_count: Option<usize>,
    ) -> ExecResult<()> {
        check_count(arg_count, 0, |expected, actual| ExecError::ArgCountMismatch {
            expected,
            actual,
        })?;
        check_count(ret_count, 1, |expected, actual| ExecError::RetCountMismatch {
            expected,
            actual,
        })?;
        frame.push(self.0.clone());
        Ok(())
    }

    fn get(&self, _frame: &mut Frame<E>) -> ExecResult<E> {
        Ok(self.0.clone())
    }
}

/// A native function with a fixed argument count and a single result.
pub struct Function<E> {
    arg_count: usize,
    f: Box<dyn Fn(&[E]) -> ExecResult<E>>,
}

impl<E> Function<E> {
    pub fn new(arg_count: usize, f: impl Fn(&[E]) -> ExecResult<E> + 'static) -> Self {
        Function {
            arg_count,
            f: Box::new(f),
        }
    }
}

impl<E> Symbol<E> for Function<E> {
    fn call(
        &self,
        frame: &mut Frame<E>,
        arg_count: Option<usize>,
        ret_count: Option<usize>,
    ) -> ExecResult<()> {
        check_count(arg_count, self.arg_count, |expected, actual| {
            ExecError::ArgCountMismatch { expected, actual }
        })?;
        check_count(ret_count, 1, |expected, actual| ExecError::RetCountMismatch {
            expected,
            actual,
        })?;
        let args = frame.pop_args(self.arg_count)?;
        let result = (self.f)(&args)?;
        frame.push(result);
        Ok(())
    }

    fn get(&self, _frame: &mut Frame<E>) -> ExecResult<E> {
        Err(ExecError::NotAValue)
    }
}

fn check_count(
    requested: Option<usize>,
    expected: usize,
    err: impl FnOnce(usize, usize) -> ExecError,
) -> ExecResult<()> {
    match requested {
        Some(actual) if actual != expected => Err(err(expected, actual)),
        _ => Ok(()),
    }
}

/// Name → symbol mapping with optional parent-scope chaining.
pub struct SymbolTable<E> {
    parent: Option<Arc<SymbolTable<E>>>,
    symbols: HashMap<String, Arc<dyn Symbol<E>>>,
}

impl<E> Default for SymbolTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> SymbolTable<E> {
    pub fn new() -> Self {
        SymbolTable {
            parent: None,
            symbols: HashMap::new(),
        }
    }

    /// A fresh scope whose lookups fall back to `parent`.
    pub fn nested(parent: Arc<SymbolTable<E>>) -> Self {
        SymbolTable {
            parent: Some(parent),
            symbols: HashMap::new(),
        }
    }

    /// Bind a symbol, replacing any existing binding in this scope.
    pub fn define(&mut self, name: impl Into<String>, symbol: Arc<dyn Symbol<E>>) {
        self.symbols.insert(name.into(), symbol);
    }

    pub fn define_constant(&mut self, name: impl Into<String>, value: E)
    where
        E: Clone + 'static,
    {
        self.define(name, Arc::new(Constant(value)));
    }

    pub fn define_function(
        &mut self,
        name: impl Into<String>,
        arg_count: usize,
        f: impl Fn(&[E]) -> ExecResult<E> + 'static,
    ) where
        E: 'static,
    {
        self.define(name, Arc::new(Function::new(arg_count, f)));
    }

    /// Resolve a name in this scope or any ancestor scope.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Symbol<E>>> {
        match self.symbols.get(name) {
            Some(symbol) => Some(Arc::clone(symbol)),
            None => self.parent.as_ref()?.lookup(name),
        }
    }
}

/// The per-execution context: a symbol scope plus a private value stack.
pub struct Frame<E> {
    scope: Arc<SymbolTable<E>>,
    stack: Vec<E>,
}

impl<E> Frame<E> {
    pub fn new(scope: Arc<SymbolTable<E>>) -> Self {
        Frame {
            scope,
            stack: Vec::new(),
        }
    }

    /// A nested frame sharing this frame's symbol scope with a fresh,
    /// private stack.
    pub fn child(&self) -> Frame<E> {
        Frame::new(Arc::clone(&self.scope))
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Symbol<E>>> {
        self.scope.lookup(name)
    }

    pub fn push(&mut self, value: E) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> ExecResult<E> {
        self.stack.pop().ok_or(ExecError::StackUnderflow {
            needed: 1,
            available: 0,
        })
    }

    /// Pop `count` values, returned in the order they were pushed.
    pub fn pop_args(&mut self, count: usize) -> ExecResult<Vec<E>> {
        if self.stack.len() < count {
            return Err(ExecError::StackUnderflow {
                needed: count,
                available: self.stack.len(),
            });
        }
        let split = self.stack.len() - count;
        Ok(self.stack.split_off(split))
    }

    pub fn stack(&self) -> &[E] {
        &self.stack
    }

    pub fn into_stack(self) -> Vec<E> {
        self.stack
    }
}
