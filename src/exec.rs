//! The common runtime representation shared by both front-ends.
//!
//! Whatever path a token stream takes (AST flattening or direct postfix
//! parsing), it converges on an [`Executable`]: a flat, runnable program
//! fragment executed against a [`Frame`]. Sequences compare structurally, and
//! a nested [`ExecutableList`] is semantically equivalent to its fully
//! flattened contents.

use std::sync::Arc;

use crate::error::{ExecError, ExecResult};
use crate::frame::Frame;
use crate::op::Operator;

/// A symbol invocation with optional fixed argument/result counts.
///
/// Absent counts mean "infer": the symbol decides. Counts are validated by the
/// symbol itself at call time, never by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolCall {
    pub id: String,
    pub arg_count: Option<usize>,
    pub ret_count: Option<usize>,
}

impl SymbolCall {
    /// A call with both counts left for the symbol to infer.
    pub fn new(id: impl Into<String>) -> Self {
        SymbolCall {
            id: id.into(),
            arg_count: None,
            ret_count: None,
        }
    }

    pub fn with_counts(
        id: impl Into<String>,
        arg_count: Option<usize>,
        ret_count: Option<usize>,
    ) -> Self {
        SymbolCall {
            id: id.into(),
            arg_count,
            ret_count,
        }
    }
}

impl std::fmt::Display for SymbolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn opt(count: Option<usize>) -> String {
            count.map_or_else(|| "?".to_owned(), |n| n.to_string())
        }
        write!(
            f,
            "{}[-{}+{}]",
            self.id,
            opt(self.arg_count),
            opt(self.ret_count)
        )
    }
}

/// An ordered sequence of executables, run strictly in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableList<E>(Vec<Executable<E>>);

impl<E> ExecutableList<E> {
    pub fn new(items: Vec<Executable<E>>) -> Self {
        ExecutableList(items)
    }

    /// Canonical constructor used by both front-ends: collapses an empty
    /// sequence to [`Executable::Noop`] and a singleton to its only element.
    pub fn wrap(mut items: Vec<Executable<E>>) -> Executable<E> {
        match items.len() {
            0 => Executable::Noop,
            1 => items.pop().expect("len checked"),
            _ => Executable::List(ExecutableList(items)),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Executable<E>> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recursively inline nested lists (and drop no-ops) into `out`.
    ///
    /// Structure-erasing only: running the flattened output against a frame is
    /// equivalent to running the nested original.
    pub fn deep_flatten(self, out: &mut Vec<Executable<E>>) {
        for item in self.0 {
            match item {
                Executable::List(inner) => inner.deep_flatten(out),
                Executable::Noop => {}
                other => out.push(other),
            }
        }
    }
}

impl<E> IntoIterator for ExecutableList<E> {
    type Item = Executable<E>;
    type IntoIter = std::vec::IntoIter<Executable<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Anything that can mutate a frame when executed. Closed set of runtime
/// operations; execution is an exhaustive match.
#[derive(Debug, Clone, PartialEq)]
pub enum Executable<E> {
    /// Push a constant of the value domain.
    Value(E),
    /// Pop operand(s) per the operator's arity, push the result.
    Operator(Arc<Operator<E>>),
    /// Push the value of a named symbol.
    SymbolGet(String),
    /// Invoke a named symbol.
    SymbolCall(SymbolCall),
    /// Run a contained sequence in order.
    List(ExecutableList<E>),
    /// Do nothing; the wrap-collapse of an empty sequence.
    Noop,
}

impl<E: Clone> Executable<E> {
    pub fn execute(&self, frame: &mut Frame<E>) -> ExecResult<()> {
        match self {
            Executable::Value(value) => {
                frame.push(value.clone());
                Ok(())
            }
            Executable::Operator(op) => op.execute(frame),
            Executable::SymbolGet(id) => {
                let symbol = frame
                    .lookup(id)
                    .ok_or_else(|| ExecError::UnknownSymbol(id.clone()))?;
                let value = symbol.get(frame)?;
                frame.push(value);
                Ok(())
            }
            Executable::SymbolCall(call) => {
                let symbol = frame
                    .lookup(&call.id)
                    .ok_or_else(|| ExecError::UnknownSymbol(call.id.clone()))?;
                match symbol.call(frame, call.arg_count, call.ret_count) {
                    // domain failures cross the call boundary unchanged
                    Err(e) if !e.is_domain() => Err(ExecError::Symbol {
                        id: call.id.clone(),
                        source: Box::new(e),
                    }),
                    other => other,
                }
            }
            Executable::List(list) => {
                for item in list.iter() {
                    item.execute(frame)?;
                }
                Ok(())
            }
            Executable::Noop => Ok(()),
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for Executable<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Executable::Value(value) => write!(f, "{value}"),
            Executable::Operator(op) => write!(f, "{op}"),
            Executable::SymbolGet(id) => write!(f, "@{id}"),
            Executable::SymbolCall(call) => write!(f, "{call}"),
            Executable::List(list) => {
                write!(f, "{{")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Executable::Noop => write!(f, "<nop>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(n: i64) -> Executable<i64> {
        Executable::Value(n)
    }

    #[test]
    fn wrap_empty_is_noop() {
        assert_eq!(ExecutableList::<i64>::wrap(vec![]), Executable::Noop);
    }

    #[test]
    fn wrap_singleton_is_the_element() {
        assert_eq!(ExecutableList::wrap(vec![value(7)]), value(7));
    }

    #[test]
    fn wrap_many_is_a_list() {
        let wrapped = ExecutableList::wrap(vec![value(1), value(2)]);
        assert_eq!(
            wrapped,
            Executable::List(ExecutableList::new(vec![value(1), value(2)]))
        );
    }

    #[test]
    fn deep_flatten_erases_structure_only() {
        let nested = ExecutableList::new(vec![
            value(1),
            Executable::List(ExecutableList::new(vec![
                value(2),
                Executable::Noop,
                Executable::List(ExecutableList::new(vec![value(3)])),
            ])),
            Executable::SymbolCall(SymbolCall::new("f")),
        ]);
        let mut flat = Vec::new();
        nested.deep_flatten(&mut flat);
        assert_eq!(
            flat,
            vec![
                value(1),
                value(2),
                value(3),
                Executable::SymbolCall(SymbolCall::new("f")),
            ]
        );

        // idempotence: flattening the flat form changes nothing
        let mut again = Vec::new();
        ExecutableList::new(flat.clone()).deep_flatten(&mut again);
        assert_eq!(again, flat);
    }

    #[test]
    fn symbol_call_display() {
        assert_eq!(
            SymbolCall::with_counts("foo", Some(2), Some(1)).to_string(),
            "foo[-2+1]"
        );
        assert_eq!(SymbolCall::new("bar").to_string(), "bar[-?+?]");
    }
}
