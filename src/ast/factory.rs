//! Pluggable node factories: the seam where hosts substitute custom node
//! variants per operator or per opening bracket.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::node::ExprNode;
use crate::error::{ParseError, ParseResult};
use crate::op::{Arity, Operator};
use crate::token::{Token, is_container_bracket, matching_bracket};
use crate::value::ValueParser;

/// Chooses the node variant for each construct encountered by the infix
/// parser.
pub trait ExprNodeFactory<E> {
    /// Parse a `Value` token's literal into a value node.
    fn value_node(&self, token: &Token) -> ParseResult<ExprNode<E>>;

    fn symbol_get_node(&self, id: &str) -> ExprNode<E> {
        ExprNode::SymbolGet(id.to_owned())
    }

    fn symbol_call_node(&self, id: &str, args: Vec<ExprNode<E>>) -> ExprNode<E> {
        ExprNode::SymbolCall {
            id: id.to_owned(),
            args,
        }
    }

    /// Build the node for an operator application.
    ///
    /// Panics unless `children.len() == op.arity().arg_count()`; the parser
    /// guarantees the count by construction, so a mismatch is a programming
    /// error in the caller.
    fn op_node(&self, op: &Arc<Operator<E>>, children: Vec<ExprNode<E>>) -> ExprNode<E>;

    /// Build the node for a bracketed construct, validating the pair against
    /// the known bracket table.
    fn bracket_node(
        &self,
        open: &str,
        close: &str,
        children: Vec<ExprNode<E>>,
    ) -> ParseResult<ExprNode<E>>;
}

fn check_bracket_pair(open: &str, close: &str) -> ParseResult<()> {
    match matching_bracket(open) {
        Some(expected) if expected == close => Ok(()),
        _ => Err(ParseError::MismatchedBrackets {
            open: open.to_owned(),
            close: close.to_owned(),
        }),
    }
}

/// The base factory: binary operators map to [`ExprNode::BinaryOp`], unary to
/// [`ExprNode::UnaryOp`], grouping brackets to a transparent [`ExprNode::Bracket`]
/// and `[` to a [`ExprNode::BracketContainer`].
pub struct DefaultExprNodeFactory<P> {
    value_parser: P,
}

impl<P> DefaultExprNodeFactory<P> {
    pub fn new(value_parser: P) -> Self {
        DefaultExprNodeFactory { value_parser }
    }
}

impl<E, P: ValueParser<E>> ExprNodeFactory<E> for DefaultExprNodeFactory<P> {
    fn value_node(&self, token: &Token) -> ParseResult<ExprNode<E>> {
        self.value_parser.parse(token).map(ExprNode::Value)
    }

    fn op_node(&self, op: &Arc<Operator<E>>, mut children: Vec<ExprNode<E>>) -> ExprNode<E> {
        assert_eq!(
            children.len(),
            op.arity().arg_count(),
            "operator `{}` expects {} children",
            op.id(),
            op.arity().arg_count()
        );
        match op.arity() {
            Arity::Unary => ExprNode::UnaryOp {
                op: Arc::clone(op),
                arg: Box::new(children.pop().expect("count checked")),
            },
            Arity::Binary => {
                let right = children.pop().expect("count checked");
                let left = children.pop().expect("count checked");
                ExprNode::BinaryOp {
                    op: Arc::clone(op),
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
        }
    }

    fn bracket_node(
        &self,
        open: &str,
        close: &str,
        mut children: Vec<ExprNode<E>>,
    ) -> ParseResult<ExprNode<E>> {
        check_bracket_pair(open, close)?;
        if is_container_bracket(open) {
            return Ok(ExprNode::BracketContainer {
                open: open.to_owned(),
                close: close.to_owned(),
                children,
            });
        }
        // grouping bracket: exactly one child
        if children.len() != 1 {
            return Err(ParseError::BracketChildCount {
                bracket: open.to_owned(),
                count: children.len(),
            });
        }
        Ok(ExprNode::Bracket(Box::new(
            children.pop().expect("count checked"),
        )))
    }
}

type BracketNodeFn<E> =
    Box<dyn Fn(Vec<ExprNode<E>>) -> ParseResult<ExprNode<E>> + Send + Sync>;
type OpNodeFn<E> = Box<dyn Fn(Vec<ExprNode<E>>) -> ExprNode<E> + Send + Sync>;

/// Layers put-once override tables over a base factory.
///
/// Overrides are keyed per opening bracket and per exact operator identity
/// (`(arity, id)`), so a unary `-` override never collides with a binary `-`
/// one. Registering the same key twice is a setup error and panics.
pub struct MappedExprNodeFactory<E, F> {
    base: F,
    bracket_overrides: HashMap<String, BracketNodeFn<E>>,
    op_overrides: HashMap<(Arity, String), OpNodeFn<E>>,
}

impl<E, F> MappedExprNodeFactory<E, F> {
    pub fn new(base: F) -> Self {
        MappedExprNodeFactory {
            base,
            bracket_overrides: HashMap::new(),
            op_overrides: HashMap::new(),
        }
    }

    pub fn with_bracket_factory(
        mut self,
        open: &str,
        factory: impl Fn(Vec<ExprNode<E>>) -> ParseResult<ExprNode<E>> + Send + Sync + 'static,
    ) -> Self {
        let prev = self
            .bracket_overrides
            .insert(open.to_owned(), Box::new(factory));
        assert!(prev.is_none(), "duplicate bracket factory for `{open}`");
        self
    }

    pub fn with_unary_factory(
        self,
        op: &Operator<E>,
        factory: impl Fn(ExprNode<E>) -> ExprNode<E> + Send + Sync + 'static,
    ) -> Self {
        assert_eq!(op.arity(), Arity::Unary, "`{}` is not unary", op.id());
        self.with_op_factory(op, move |mut children: Vec<ExprNode<E>>| {
            assert_eq!(children.len(), 1, "expected one child");
            factory(children.pop().expect("count checked"))
        })
    }

    pub fn with_binary_factory(
        self,
        op: &Operator<E>,
        factory: impl Fn(ExprNode<E>, ExprNode<E>) -> ExprNode<E> + Send + Sync + 'static,
    ) -> Self {
        assert_eq!(op.arity(), Arity::Binary, "`{}` is not binary", op.id());
        self.with_op_factory(op, move |mut children: Vec<ExprNode<E>>| {
            assert_eq!(children.len(), 2, "expected two children");
            let right = children.pop().expect("count checked");
            let left = children.pop().expect("count checked");
            factory(left, right)
        })
    }

    fn with_op_factory(
        mut self,
        op: &Operator<E>,
        factory: impl Fn(Vec<ExprNode<E>>) -> ExprNode<E> + Send + Sync + 'static,
    ) -> Self {
        let key = (op.arity(), op.id().to_owned());
        let prev = self.op_overrides.insert(key.clone(), Box::new(factory));
        assert!(
            prev.is_none(),
            "duplicate op factory for {:?} `{}`",
            key.0,
            key.1
        );
        self
    }
}

impl<E, F: ExprNodeFactory<E>> ExprNodeFactory<E> for MappedExprNodeFactory<E, F> {
    fn value_node(&self, token: &Token) -> ParseResult<ExprNode<E>> {
        self.base.value_node(token)
    }

    fn symbol_get_node(&self, id: &str) -> ExprNode<E> {
        self.base.symbol_get_node(id)
    }

    fn symbol_call_node(&self, id: &str, args: Vec<ExprNode<E>>) -> ExprNode<E> {
        self.base.symbol_call_node(id, args)
    }

    fn op_node(&self, op: &Arc<Operator<E>>, children: Vec<ExprNode<E>>) -> ExprNode<E> {
        match self.op_overrides.get(&(op.arity(), op.id().to_owned())) {
            Some(factory) => factory(children),
            None => self.base.op_node(op, children),
        }
    }

    fn bracket_node(
        &self,
        open: &str,
        close: &str,
        children: Vec<ExprNode<E>>,
    ) -> ParseResult<ExprNode<E>> {
        check_bracket_pair(open, close)?;
        match self.bracket_overrides.get(open) {
            Some(factory) => factory(children),
            None => self.base.bracket_node(open, close, children),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseResult;

    fn parser() -> impl ValueParser<i64> {
        |token: &Token| -> ParseResult<i64> {
            token
                .text
                .parse()
                .map_err(|e| ParseError::invalid_value(token, format!("{e}")))
        }
    }

    fn factory() -> DefaultExprNodeFactory<impl ValueParser<i64>> {
        DefaultExprNodeFactory::new(parser())
    }

    #[test]
    #[should_panic(expected = "operator `+` expects 2 children")]
    fn binary_op_node_rejects_one_child() {
        let plus = Arc::new(Operator::binary("+", |a: i64, b| Ok(a + b)));
        factory().op_node(&plus, vec![ExprNode::Value(1)]);
    }

    #[test]
    #[should_panic(expected = "operator `-` expects 1 children")]
    fn unary_op_node_rejects_two_children() {
        let neg = Arc::new(Operator::unary("-", |a: i64| Ok(-a)));
        factory().op_node(&neg, vec![ExprNode::Value(1), ExprNode::Value(2)]);
    }

    #[test]
    fn bracket_pair_validation() {
        let err = factory()
            .bracket_node("(", "]", vec![ExprNode::Value(1)])
            .unwrap_err();
        assert!(err.is_mismatched_brackets());

        let err = factory()
            .bracket_node("<", ">", vec![ExprNode::Value(1)])
            .unwrap_err();
        assert!(err.is_mismatched_brackets());
    }

    #[test]
    fn grouping_bracket_requires_single_child() {
        let err = factory().bracket_node("(", ")", vec![]).unwrap_err();
        assert!(err.is_bracket_child_count());

        let node = factory()
            .bracket_node("(", ")", vec![ExprNode::Value(1)])
            .unwrap();
        assert_eq!(node, ExprNode::Bracket(Box::new(ExprNode::Value(1))));
    }

    #[test]
    fn container_bracket_takes_any_count() {
        let node = factory()
            .bracket_node("[", "]", vec![ExprNode::Value(1), ExprNode::Value(2)])
            .unwrap();
        assert!(matches!(
            node,
            ExprNode::BracketContainer { ref children, .. } if children.len() == 2
        ));
    }

    #[test]
    fn mapped_factory_overrides_by_exact_identity() {
        let neg = Operator::unary("-", |a: i64| Ok(-a));
        let mapped = MappedExprNodeFactory::new(factory())
            .with_unary_factory(&neg, |child| ExprNode::SymbolCall {
                id: "negate".to_owned(),
                args: vec![child],
            });

        let unary = Arc::new(Operator::unary("-", |a: i64| Ok(-a)));
        let node = mapped.op_node(&unary, vec![ExprNode::Value(1)]);
        assert!(matches!(node, ExprNode::SymbolCall { ref id, .. } if id == "negate"));

        // binary `-` is a different identity and falls through to the base
        let binary = Arc::new(Operator::binary("-", |a: i64, b| Ok(a - b)));
        let node = mapped.op_node(&binary, vec![ExprNode::Value(1), ExprNode::Value(2)]);
        assert!(matches!(node, ExprNode::BinaryOp { .. }));
    }

    #[test]
    #[should_panic(expected = "duplicate bracket factory")]
    fn duplicate_bracket_override_panics() {
        let _ = MappedExprNodeFactory::<i64, _>::new(factory())
            .with_bracket_factory("[", |children| {
                Ok(ExprNode::BracketContainer {
                    open: "[".to_owned(),
                    close: "]".to_owned(),
                    children,
                })
            })
            .with_bracket_factory("[", |_| Ok(ExprNode::Null));
    }
}
