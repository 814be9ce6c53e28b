//! The AST front-ends: tree nodes, pluggable node factories, and the infix
//! and prefix parsers that build trees from token streams.
//!
//! Trees exist only between parsing and flattening; hosts normally see the
//! flat [`Executable`](crate::exec::Executable) produced by
//! [`AstCompiler`](crate::compiler::AstCompiler). The node model stays public
//! because custom node factories are the mechanism by which host constructs
//! (binding forms, quoting, sequence literals) are injected without touching
//! the core grammar.

pub mod factory;
pub mod infix;
pub mod node;
pub mod prefix;

pub use factory::{DefaultExprNodeFactory, ExprNodeFactory, MappedExprNodeFactory};
pub use infix::{Assoc, InfixParser};
pub use node::ExprNode;
pub use prefix::PrefixParser;
