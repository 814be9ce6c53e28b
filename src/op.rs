//! Operator model and the registration-then-freeze operator dictionary.
//!
//! Operators are created once at setup time, registered into an
//! [`OperatorDictionaryBuilder`], and frozen into an immutable
//! [`OperatorDictionary`] before any parse begins. Frozen operators are shared
//! by `Arc` across parses and executions. Registration mistakes (duplicate
//! `(arity, id)` keys, a second default operator, a non-binary default) are
//! programming errors and panic.
//!
//! Precedence and associativity are deliberately absent here: they belong to
//! the infix front-end (see [`crate::ast::infix`]), keeping the dictionary
//! usable by precedence-free front-ends such as the postfix parser.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use log::debug;

use crate::error::ExecResult;
use crate::frame::Frame;

/// Fixed operand count of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Arity {
    Unary,
    Binary,
}

impl Arity {
    pub const fn arg_count(self) -> usize {
        match self {
            Arity::Unary => 1,
            Arity::Binary => 2,
        }
    }
}

type UnaryFn<E> = Box<dyn Fn(E) -> ExecResult<E> + Send + Sync>;
type BinaryFn<E> = Box<dyn Fn(E, E) -> ExecResult<E> + Send + Sync>;

enum Applier<E> {
    Unary(UnaryFn<E>),
    Binary(BinaryFn<E>),
}

/// A named operator over the value domain `E`.
///
/// Identity is `(arity, id)`: the same textual id may exist as both a unary and
/// a binary operator (`-` being the canonical example). Equality and hashing
/// follow that identity; the application function never takes part in either.
pub struct Operator<E> {
    id: String,
    applier: Applier<E>,
}

impl<E> Operator<E> {
    pub fn unary(
        id: impl Into<String>,
        f: impl Fn(E) -> ExecResult<E> + Send + Sync + 'static,
    ) -> Self {
        Operator {
            id: id.into(),
            applier: Applier::Unary(Box::new(f)),
        }
    }

    pub fn binary(
        id: impl Into<String>,
        f: impl Fn(E, E) -> ExecResult<E> + Send + Sync + 'static,
    ) -> Self {
        Operator {
            id: id.into(),
            applier: Applier::Binary(Box::new(f)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn arity(&self) -> Arity {
        match self.applier {
            Applier::Unary(_) => Arity::Unary,
            Applier::Binary(_) => Arity::Binary,
        }
    }

    /// Pop operand(s) from the frame's stack, apply, push the result.
    ///
    /// Operands are taken in push order, so a program `a b op` computes
    /// `op(a, b)`. A short stack is reported against the operator's full
    /// requirement, with nothing consumed.
    pub fn execute(&self, frame: &mut Frame<E>) -> ExecResult<()> {
        let result = match &self.applier {
            Applier::Unary(f) => {
                let mut args = frame.pop_args(1)?;
                f(args.pop().expect("count checked"))?
            }
            Applier::Binary(f) => {
                let mut args = frame.pop_args(2)?;
                let right = args.pop().expect("count checked");
                let left = args.pop().expect("count checked");
                f(left, right)?
            }
        };
        frame.push(result);
        Ok(())
    }
}

impl<E> PartialEq for Operator<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.arity() == other.arity()
    }
}

impl<E> Eq for Operator<E> {}

impl<E> std::hash::Hash for Operator<E> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.arity().hash(state);
    }
}

impl<E> std::fmt::Debug for Operator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("id", &self.id)
            .field("arity", &self.arity())
            .finish()
    }
}

impl<E> std::fmt::Display for Operator<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Mutable registration stage of the dictionary. Consumed by [`Self::build`].
pub struct OperatorDictionaryBuilder<E> {
    ops: HashMap<(Arity, String), Arc<Operator<E>>>,
    default_id: Option<String>,
}

impl<E> Default for OperatorDictionaryBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> OperatorDictionaryBuilder<E> {
    pub fn new() -> Self {
        OperatorDictionaryBuilder {
            ops: HashMap::new(),
            default_id: None,
        }
    }

    /// Register an operator under its `(arity, id)` key.
    ///
    /// Panics if an operator with the same key is already registered. The
    /// returned handle allows marking the operator as the dictionary default.
    pub fn register(&mut self, op: Operator<E>) -> Registration<'_, E> {
        let key = (op.arity(), op.id.clone());
        let prev = self.ops.insert(key.clone(), Arc::new(op));
        assert!(
            prev.is_none(),
            "duplicate operator registration: {:?} `{}`",
            key.0,
            key.1
        );
        Registration { builder: self, key }
    }

    /// Freeze into an immutable, queryable dictionary.
    pub fn build(self) -> OperatorDictionary<E> {
        let default_op = self
            .default_id
            .map(|id| Arc::clone(&self.ops[&(Arity::Binary, id)]));
        debug!(
            "operator dictionary frozen: {} operators, default: {:?}",
            self.ops.len(),
            default_op.as_ref().map(|op| op.id())
        );
        OperatorDictionary {
            ops: self.ops,
            default_op,
        }
    }
}

/// Handle to a freshly registered operator.
pub struct Registration<'a, E> {
    builder: &'a mut OperatorDictionaryBuilder<E>,
    key: (Arity, String),
}

impl<'a, E> Registration<'a, E> {
    /// Mark this operator as the default used for operand juxtaposition.
    ///
    /// Panics if a default is already set or the operator is not binary.
    pub fn set_default(self) -> Self {
        assert_eq!(
            self.key.0,
            Arity::Binary,
            "default operator must be binary, `{}` is not",
            self.key.1
        );
        assert!(
            self.builder.default_id.is_none(),
            "trying to replace default operator `{}` with `{}`",
            self.builder.default_id.as_deref().unwrap_or(""),
            self.key.1
        );
        self.builder.default_id = Some(self.key.1.clone());
        self
    }
}

/// Immutable operator registry keyed by `(arity, id)`.
pub struct OperatorDictionary<E> {
    ops: HashMap<(Arity, String), Arc<Operator<E>>>,
    default_op: Option<Arc<Operator<E>>>,
}

impl<E> OperatorDictionary<E> {
    pub fn get(&self, id: &str, arity: Arity) -> Option<&Arc<Operator<E>>> {
        self.ops.get(&(arity, id.to_owned()))
    }

    pub fn unary(&self, id: &str) -> Option<&Arc<Operator<E>>> {
        self.get(id, Arity::Unary)
    }

    pub fn binary(&self, id: &str) -> Option<&Arc<Operator<E>>> {
        self.get(id, Arity::Binary)
    }

    /// Lookup ignoring arity, binary first. The postfix front-end uses this:
    /// in postfix programs the second form of an ambiguous id must be spelled
    /// differently (`-` vs `neg`).
    pub fn any(&self, id: &str) -> Option<&Arc<Operator<E>>> {
        self.binary(id).or_else(|| self.unary(id))
    }

    pub fn default_op(&self) -> Option<&Arc<Operator<E>>> {
        self.default_op.as_ref()
    }

    /// Distinct textual ids across both arities, for tokenizer hints and
    /// syntax validation.
    pub fn all_ids(&self) -> BTreeSet<&str> {
        self.ops.keys().map(|(_, id)| id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecError;
    use crate::frame::SymbolTable;

    fn add() -> Operator<i64> {
        Operator::binary("+", |a, b| Ok(a + b))
    }

    fn neg() -> Operator<i64> {
        Operator::unary("-", |a: i64| Ok(-a))
    }

    #[test]
    fn identity_is_arity_and_id() {
        let minus_bin = Operator::binary("-", |a, b| Ok(a - b));
        let minus_un = neg();
        assert_ne!(minus_bin, minus_un);
        assert_eq!(minus_un, neg());
    }

    #[test]
    fn same_id_both_arities() {
        let mut builder = OperatorDictionaryBuilder::new();
        builder.register(Operator::binary("-", |a, b| Ok(a - b)));
        builder.register(neg());
        let dict = builder.build();
        assert_eq!(dict.binary("-").unwrap().arity(), Arity::Binary);
        assert_eq!(dict.unary("-").unwrap().arity(), Arity::Unary);
        // binary wins the arity-agnostic lookup
        assert_eq!(dict.any("-").unwrap().arity(), Arity::Binary);
        assert_eq!(dict.all_ids().len(), 1);
    }

    #[test]
    #[should_panic(expected = "duplicate operator registration")]
    fn duplicate_registration_panics() {
        let mut builder = OperatorDictionaryBuilder::new();
        builder.register(add());
        builder.register(add());
    }

    #[test]
    #[should_panic(expected = "trying to replace default operator")]
    fn second_default_panics() {
        let mut builder = OperatorDictionaryBuilder::new();
        builder.register(add()).set_default();
        builder
            .register(Operator::binary("*", |a, b| Ok(a * b)))
            .set_default();
    }

    #[test]
    #[should_panic(expected = "default operator must be binary")]
    fn unary_default_panics() {
        let mut builder = OperatorDictionaryBuilder::new();
        builder.register(neg()).set_default();
    }

    #[test]
    fn default_op_survives_freeze() {
        let mut builder = OperatorDictionaryBuilder::new();
        builder.register(add()).set_default();
        builder.register(neg());
        let dict = builder.build();
        assert_eq!(dict.default_op().unwrap().id(), "+");
    }

    #[test]
    fn short_stack_reports_full_requirement() {
        let mut frame = Frame::new(Arc::new(SymbolTable::new()));
        frame.push(1);
        let err = add().execute(&mut frame).unwrap_err();
        assert!(matches!(
            err,
            ExecError::StackUnderflow {
                needed: 2,
                available: 1,
            }
        ));
        // the one operand is still there
        assert_eq!(frame.stack(), &[1]);
    }

    #[test]
    fn missing_lookups() {
        let mut builder = OperatorDictionaryBuilder::<i64>::new();
        builder.register(add());
        let dict = builder.build();
        assert!(dict.unary("+").is_none());
        assert!(dict.any("?").is_none());
        assert!(dict.default_op().is_none());
    }
}
