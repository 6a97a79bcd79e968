//! Statement nodes.
//!
//! Statements follow the lowering convention of the surrounding compiler:
//! every loop `v` has `min = Var("v.loop_min")` and
//! `extent = Var("v.loop_extent")`, with those names (and `v.loop_max`)
//! bound by enclosing `LetStmt`s. The sliding-window pass relies on this
//! when it renames a loop and recomputes its extent.

use crate::ir::expr::Expr;
use serde::{Deserialize, Serialize};

/// How a loop's iterations are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForKind {
    /// Ordinary sequential loop.
    Serial,
    /// Fully unrolled sequential loop.
    Unrolled,
    /// Iterations run on parallel workers.
    Parallel,
    /// Iterations run as vector lanes.
    Vectorized,
}

impl ForKind {
    /// Whether iterations execute in a defined serial order.
    ///
    /// Sliding is only sound across ordered loops.
    pub fn is_ordered(&self) -> bool {
        matches!(self, ForKind::Serial | ForKind::Unrolled)
    }
}

/// A statement in the pipeline IR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stmt {
    /// Symbolic binding scoped to `body`.
    LetStmt {
        /// Bound name.
        name: String,
        /// Bound value.
        value: Expr,
        /// Statement the binding is visible in.
        body: Box<Stmt>,
    },
    /// Loop over `[min, min + extent)`.
    For {
        /// Loop variable name.
        name: String,
        /// Lower bound.
        min: Expr,
        /// Trip count.
        extent: Expr,
        /// Execution order.
        kind: ForKind,
        /// Loop body.
        body: Box<Stmt>,
    },
    /// Storage-allocation scope for a stage's buffer.
    Realize {
        /// Stage name.
        stage: String,
        /// Statements with access to the buffer.
        body: Box<Stmt>,
    },
    /// Producer or consumer marker for a stage.
    ProducerConsumer {
        /// Stage name.
        stage: String,
        /// True for the producer side.
        is_producer: bool,
        /// Marked statements.
        body: Box<Stmt>,
    },
    /// Conditional execution.
    IfThenElse {
        /// Condition.
        cond: Expr,
        /// Statements when the condition holds.
        then_case: Box<Stmt>,
        /// Statements otherwise.
        else_case: Option<Box<Stmt>>,
    },
    /// Store into a stage's buffer at the given coordinates.
    Provide {
        /// Stage name.
        stage: String,
        /// Per-dimension coordinates.
        args: Vec<Expr>,
        /// Stored value.
        value: Expr,
    },
    /// Evaluate an expression for effect.
    Evaluate(Expr),
    /// Sequential composition.
    Block(Vec<Stmt>),
}

impl Stmt {
    /// Rebuild this node with each direct child statement mapped through `f`.
    ///
    /// Expressions are left untouched; passes that only restructure
    /// statements use this as their fallthrough case.
    pub fn map_children<E>(&self, f: &mut dyn FnMut(&Stmt) -> Result<Stmt, E>) -> Result<Stmt, E> {
        Ok(match self {
            Stmt::LetStmt { name, value, body } => Stmt::LetStmt {
                name: name.clone(),
                value: value.clone(),
                body: Box::new(f(body)?),
            },
            Stmt::For {
                name,
                min,
                extent,
                kind,
                body,
            } => Stmt::For {
                name: name.clone(),
                min: min.clone(),
                extent: extent.clone(),
                kind: *kind,
                body: Box::new(f(body)?),
            },
            Stmt::Realize { stage, body } => Stmt::Realize {
                stage: stage.clone(),
                body: Box::new(f(body)?),
            },
            Stmt::ProducerConsumer {
                stage,
                is_producer,
                body,
            } => Stmt::ProducerConsumer {
                stage: stage.clone(),
                is_producer: *is_producer,
                body: Box::new(f(body)?),
            },
            Stmt::IfThenElse {
                cond,
                then_case,
                else_case,
            } => Stmt::IfThenElse {
                cond: cond.clone(),
                then_case: Box::new(f(then_case)?),
                else_case: match else_case {
                    Some(e) => Some(Box::new(f(e)?)),
                    None => None,
                },
            },
            Stmt::Provide { .. } | Stmt::Evaluate(_) => self.clone(),
            Stmt::Block(stmts) => {
                let mut out = Vec::with_capacity(stmts.len());
                for s in stmts {
                    out.push(f(s)?);
                }
                Stmt::Block(out)
            }
        })
    }

    /// Whether the tree contains a producer marker for `stage`.
    pub fn contains_producer_of(&self, stage: &str) -> bool {
        match self {
            Stmt::ProducerConsumer {
                stage: s,
                is_producer: true,
                ..
            } if s == stage => true,
            Stmt::LetStmt { body, .. }
            | Stmt::For { body, .. }
            | Stmt::Realize { body, .. }
            | Stmt::ProducerConsumer { body, .. } => body.contains_producer_of(stage),
            Stmt::IfThenElse {
                then_case,
                else_case,
                ..
            } => {
                then_case.contains_producer_of(stage)
                    || else_case
                        .as_ref()
                        .is_some_and(|e| e.contains_producer_of(stage))
            }
            Stmt::Block(stmts) => stmts.iter().any(|s| s.contains_producer_of(stage)),
            Stmt::Provide { .. } | Stmt::Evaluate(_) => false,
        }
    }
}

/// Convenience constructors used throughout the pass and its tests.
pub mod builder {
    use super::{Expr, ForKind, Stmt};

    /// Symbolic binding statement.
    pub fn let_stmt(name: impl Into<String>, value: Expr, body: Stmt) -> Stmt {
        Stmt::LetStmt {
            name: name.into(),
            value,
            body: Box::new(body),
        }
    }

    /// Loop statement.
    pub fn for_loop(
        name: impl Into<String>,
        min: Expr,
        extent: Expr,
        kind: ForKind,
        body: Stmt,
    ) -> Stmt {
        Stmt::For {
            name: name.into(),
            min,
            extent,
            kind,
            body: Box::new(body),
        }
    }

    /// Storage-allocation scope.
    pub fn realize(stage: impl Into<String>, body: Stmt) -> Stmt {
        Stmt::Realize {
            stage: stage.into(),
            body: Box::new(body),
        }
    }

    /// Producer marker.
    pub fn produce(stage: impl Into<String>, body: Stmt) -> Stmt {
        Stmt::ProducerConsumer {
            stage: stage.into(),
            is_producer: true,
            body: Box::new(body),
        }
    }

    /// Consumer marker.
    pub fn consume(stage: impl Into<String>, body: Stmt) -> Stmt {
        Stmt::ProducerConsumer {
            stage: stage.into(),
            is_producer: false,
            body: Box::new(body),
        }
    }

    /// Store statement.
    pub fn provide(stage: impl Into<String>, args: Vec<Expr>, value: Expr) -> Stmt {
        Stmt::Provide {
            stage: stage.into(),
            args,
            value,
        }
    }

    /// Sequential composition.
    pub fn block(stmts: Vec<Stmt>) -> Stmt {
        Stmt::Block(stmts)
    }
}

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;
    use crate::ir::expr::builder::{lit, v};

    #[test]
    fn test_contains_producer() {
        let s = for_loop(
            "i",
            lit(0),
            lit(4),
            ForKind::Serial,
            block(vec![
                produce("a", provide("a", vec![v("i")], lit(1))),
                consume("a", provide("b", vec![v("i")], lit(2))),
            ]),
        );
        assert!(s.contains_producer_of("a"));
        assert!(!s.contains_producer_of("b"));
    }

    #[test]
    fn test_map_children_identity() {
        let s = let_stmt("x", lit(3), provide("a", vec![v("x")], lit(0)));
        let mapped = s
            .map_children(&mut |c: &Stmt| Ok::<_, ()>(c.clone()))
            .unwrap();
        assert_eq!(s, mapped);
    }
}
