//! Pipeline intermediate representation.
//!
//! Expressions and statements form an immutable, recursively defined tree.
//! Rewrites build new trees; unchanged subtrees may be shared freely between
//! the old and new tree because nodes are never mutated in place.

pub mod eval;
pub mod expr;
pub mod stmt;
pub mod subst;

pub use expr::{BinOp, CmpOp, Expr};
pub use stmt::{ForKind, Stmt};
pub use subst::{substitute, substitute_map, substitute_map_stmt, substitute_stmt};

/// Expression and statement constructors under one roof.
pub mod builder {
    pub use super::expr::builder::*;
    pub use super::stmt::builder::*;
}
