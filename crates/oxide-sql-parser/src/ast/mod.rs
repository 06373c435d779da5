//! Arena-resident syntax tree.
//!
//! Every node is an [`AstNode`] stored in an [`AstArena`] and addressed by a
//! [`NodeId`]. Children hang off their parent as a singly linked sibling
//! chain, so the tree needs no per-node heap allocation.

mod flags;
mod node;
mod tree;
mod types;

pub use flags::{ParseContext, SemanticFlags};
pub use node::{AstNode, BinaryOp, NodeId, NodeType, Operator, Text, UnaryOp};
pub use tree::{Ast, AstArena, ChildIter, Script, Walk};
pub use types::DataType;
