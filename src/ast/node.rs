//! Expression tree nodes and their flattening into executable sequences.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::exec::{Executable, SymbolCall};
use crate::op::Operator;

/// A node of the expression tree built by the infix front-end.
///
/// Ownership is tree-shaped: every child belongs to exactly one parent, nodes
/// are immutable once constructed, and no sharing or cycles exist.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode<E> {
    /// A parsed constant of the value domain.
    Value(E),
    /// A read of a named symbol's value.
    SymbolGet(String),
    /// An invocation of a named symbol with ordered argument sub-trees.
    SymbolCall { id: String, args: Vec<ExprNode<E>> },
    /// Application of a unary operator.
    UnaryOp {
        op: Arc<Operator<E>>,
        arg: Box<ExprNode<E>>,
    },
    /// Application of a binary operator.
    BinaryOp {
        op: Arc<Operator<E>>,
        left: Box<ExprNode<E>>,
        right: Box<ExprNode<E>>,
    },
    /// A transparent grouping bracket around a single child.
    Bracket(Box<ExprNode<E>>),
    /// A container bracket holding any number of children; the bracket pair is
    /// recorded for the host to interpret (e.g. a sequence literal).
    BracketContainer {
        open: String,
        close: String,
        children: Vec<ExprNode<E>>,
    },
    /// An empty node contributing nothing when flattened.
    Null,
    /// A transparent pass-through wrapper, used by node factories that rewrite
    /// trees macro-style.
    Dummy(Box<ExprNode<E>>),
}

impl<E> ExprNode<E> {
    /// Direct children, for read-only traversal (printing, validation).
    pub fn children(&self) -> SmallVec<[&ExprNode<E>; 2]> {
        match self {
            ExprNode::Value(_) | ExprNode::SymbolGet(_) | ExprNode::Null => SmallVec::new(),
            ExprNode::SymbolCall { args, .. } => args.iter().collect(),
            ExprNode::UnaryOp { arg, .. } => SmallVec::from_slice(&[arg.as_ref()]),
            ExprNode::BinaryOp { left, right, .. } => {
                SmallVec::from_slice(&[left.as_ref(), right.as_ref()])
            }
            ExprNode::Bracket(child) | ExprNode::Dummy(child) => {
                SmallVec::from_slice(&[child.as_ref()])
            }
            ExprNode::BracketContainer { children, .. } => children.iter().collect(),
        }
    }
}

impl<E: Clone> ExprNode<E> {
    /// Append this node's executable form to `out` in evaluation order:
    /// operands and children first, the operation itself last. Executing the
    /// output against a stack frame therefore evaluates operands left to
    /// right before applying each operator.
    pub fn flatten(&self, out: &mut Vec<Executable<E>>) {
        match self {
            ExprNode::Value(value) => out.push(Executable::Value(value.clone())),
            ExprNode::SymbolGet(id) => out.push(Executable::SymbolGet(id.clone())),
            ExprNode::SymbolCall { id, args } => {
                for arg in args {
                    arg.flatten(out);
                }
                out.push(Executable::SymbolCall(SymbolCall::with_counts(
                    id.clone(),
                    Some(args.len()),
                    Some(1),
                )));
            }
            ExprNode::UnaryOp { op, arg } => {
                arg.flatten(out);
                out.push(Executable::Operator(Arc::clone(op)));
            }
            ExprNode::BinaryOp { op, left, right } => {
                left.flatten(out);
                right.flatten(out);
                out.push(Executable::Operator(Arc::clone(op)));
            }
            ExprNode::Bracket(child) | ExprNode::Dummy(child) => child.flatten(out),
            ExprNode::BracketContainer { children, .. } => {
                for child in children {
                    child.flatten(out);
                }
            }
            ExprNode::Null => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecutableList;

    fn op(id: &str, arity: crate::op::Arity) -> Arc<Operator<i64>> {
        match arity {
            crate::op::Arity::Unary => Arc::new(Operator::unary(id, |a: i64| Ok(-a))),
            crate::op::Arity::Binary => Arc::new(Operator::binary(id, |a: i64, b| Ok(a + b))),
        }
    }

    #[test]
    fn binary_flattens_left_right_op() {
        let plus = op("+", crate::op::Arity::Binary);
        let node = ExprNode::BinaryOp {
            op: Arc::clone(&plus),
            left: Box::new(ExprNode::Value(1)),
            right: Box::new(ExprNode::Value(2)),
        };
        let mut out = Vec::new();
        node.flatten(&mut out);
        assert_eq!(
            out,
            vec![
                Executable::Value(1),
                Executable::Value(2),
                Executable::Operator(plus),
            ]
        );
    }

    #[test]
    fn unary_flattens_arg_then_op() {
        let neg = op("-", crate::op::Arity::Unary);
        let node = ExprNode::UnaryOp {
            op: Arc::clone(&neg),
            arg: Box::new(ExprNode::Value(3)),
        };
        let mut out = Vec::new();
        node.flatten(&mut out);
        assert_eq!(out, vec![Executable::Value(3), Executable::Operator(neg)]);
    }

    #[test]
    fn symbol_call_flattens_args_then_call() {
        let node = ExprNode::SymbolCall {
            id: "max".to_owned(),
            args: vec![ExprNode::Value(1), ExprNode::Value(2)],
        };
        let mut out = Vec::new();
        node.flatten(&mut out);
        assert_eq!(
            out,
            vec![
                Executable::Value(1),
                Executable::Value(2),
                Executable::SymbolCall(SymbolCall::with_counts("max", Some(2), Some(1))),
            ]
        );
    }

    #[test]
    fn transparent_nodes_delegate() {
        let inner = ExprNode::Value(5);
        for node in [
            ExprNode::Bracket(Box::new(inner.clone())),
            ExprNode::Dummy(Box::new(inner)),
        ] {
            let mut out = Vec::new();
            node.flatten(&mut out);
            assert_eq!(out, vec![Executable::Value(5)]);
        }
    }

    #[test]
    fn null_flattens_to_nothing() {
        let mut out: Vec<Executable<i64>> = Vec::new();
        ExprNode::Null.flatten(&mut out);
        assert!(out.is_empty());
        assert_eq!(ExecutableList::wrap(out), Executable::Noop);
    }

    #[test]
    fn children_traversal() {
        let plus = op("+", crate::op::Arity::Binary);
        let node = ExprNode::BinaryOp {
            op: plus,
            left: Box::new(ExprNode::Value(1)),
            right: Box::new(ExprNode::SymbolGet("x".to_owned())),
        };
        let children = node.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0], &ExprNode::Value(1));
        assert!(ExprNode::<i64>::Null.children().is_empty());
    }
}
