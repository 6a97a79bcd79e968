//! Written-region computation.
//!
//! `box_provided` answers "which box of a stage's buffer does this subtree
//! write", per dimension, as symbolic intervals. Store coordinates are
//! bounded by interval arithmetic over the enclosing loop ranges, with
//! symbolic bindings expanded so coordinates can be expressed in terms of
//! free names.

use crate::analysis::simplify::{as_linear, simplify};
use crate::analysis::solve::Interval;
use crate::ir::expr::Expr;
use crate::ir::stmt::Stmt;
use crate::ir::subst::substitute_map;
use std::collections::HashMap;

#[derive(Clone)]
struct Env {
    /// Loop variable -> (min, max), already expanded.
    ranges: HashMap<String, (Expr, Expr)>,
    /// Let bindings, already expanded.
    lets: HashMap<String, Expr>,
}

/// Per-dimension intervals written to `stage` by `stmt`.
///
/// Returns an empty list when the subtree stores nothing to the stage. A
/// dimension whose coordinate cannot be bounded gets an unbounded side.
pub fn box_provided(stmt: &Stmt, stage: &str) -> Vec<Interval> {
    let mut found: Option<Vec<Interval>> = None;
    let env = Env {
        ranges: HashMap::new(),
        lets: HashMap::new(),
    };
    walk(stmt, stage, &env, &mut found);
    found.unwrap_or_default()
}

fn walk(s: &Stmt, stage: &str, env: &Env, found: &mut Option<Vec<Interval>>) {
    match s {
        Stmt::LetStmt { name, value, body } => {
            let mut inner = env.clone();
            let expanded = simplify(&substitute_map(&env.lets, value));
            inner.lets.insert(name.clone(), expanded);
            walk(body, stage, &inner, found);
        }
        Stmt::For {
            name,
            min,
            extent,
            body,
            ..
        } => {
            let min = simplify(&substitute_map(&env.lets, min));
            let extent = simplify(&substitute_map(&env.lets, extent));
            let max = simplify(&(min.clone() + extent - 1));
            let mut inner = env.clone();
            inner.ranges.insert(name.clone(), (min, max));
            // The loop variable is no longer a let-bound name inside.
            inner.lets.remove(name);
            walk(body, stage, &inner, found);
        }
        Stmt::Provide {
            stage: s,
            args,
            value: _,
        } if s == stage => {
            let intervals: Vec<Interval> = args
                .iter()
                .map(|a| {
                    let expanded = simplify(&substitute_map(&env.lets, a));
                    bounds_of_expr(&expanded, &env.ranges)
                })
                .collect();
            merge(found, intervals);
        }
        Stmt::Realize { body, .. } | Stmt::ProducerConsumer { body, .. } => {
            walk(body, stage, env, found)
        }
        Stmt::IfThenElse {
            then_case,
            else_case,
            ..
        } => {
            walk(then_case, stage, env, found);
            if let Some(e) = else_case {
                walk(e, stage, env, found);
            }
        }
        Stmt::Block(stmts) => {
            for c in stmts {
                walk(c, stage, env, found);
            }
        }
        Stmt::Provide { .. } | Stmt::Evaluate(_) => {}
    }
}

fn merge(found: &mut Option<Vec<Interval>>, intervals: Vec<Interval>) {
    match found {
        None => *found = Some(intervals),
        Some(existing) => {
            for (e, i) in existing.iter_mut().zip(intervals) {
                *e = e.union(&i);
            }
        }
    }
}

/// Bound a coordinate expression over the given loop ranges.
///
/// Linear coordinates are bounded term by term: a positively weighted loop
/// variable contributes its range minimum to the lower bound and its range
/// maximum to the upper bound, and conversely for negative weights. Free
/// names stay symbolic. Non-linear coordinates are unbounded.
fn bounds_of_expr(e: &Expr, ranges: &HashMap<String, (Expr, Expr)>) -> Interval {
    let lin = match as_linear(e) {
        Some(l) => l,
        None => return Interval::everything(),
    };
    let mut lower = Expr::IntLit(lin.constant);
    let mut upper = Expr::IntLit(lin.constant);
    for (name, &c) in &lin.terms {
        let (lo_term, hi_term) = match ranges.get(name) {
            Some((range_min, range_max)) => {
                if c > 0 {
                    (range_min.clone(), range_max.clone())
                } else {
                    (range_max.clone(), range_min.clone())
                }
            }
            None => (Expr::Var(name.clone()), Expr::Var(name.clone())),
        };
        lower = lower + Expr::IntLit(c) * lo_term;
        upper = upper + Expr::IntLit(c) * hi_term;
    }
    Interval {
        min: Some(simplify(&lower)),
        max: Some(simplify(&upper)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;
    use crate::ir::ForKind;

    #[test]
    fn test_simple_loop_box() {
        // for y in [f.min, f.max]: f[y] = ...
        let tree = let_stmt(
            "lo",
            v("f.min"),
            for_loop(
                "y",
                v("lo"),
                v("f.max") - v("lo") + 1,
                ForKind::Serial,
                provide("f", vec![v("y")], lit(0)),
            ),
        );
        let b = box_provided(&tree, "f");
        assert_eq!(b.len(), 1);
        assert_eq!(b[0].min, Some(v("f.min")));
        assert_eq!(b[0].max, Some(v("f.max")));
    }

    #[test]
    fn test_union_of_two_provides() {
        let tree = block(vec![
            provide("f", vec![v("i")], lit(0)),
            provide("f", vec![v("i") + 3], lit(0)),
        ]);
        let b = box_provided(&tree, "f");
        assert_eq!(b[0].min, Some(v("i")));
        assert_eq!(b[0].max, Some(v("i") + 3));
    }

    #[test]
    fn test_negative_coefficient() {
        let tree = for_loop(
            "y",
            lit(0),
            lit(10),
            ForKind::Serial,
            provide("f", vec![lit(100) - v("y")], lit(0)),
        );
        let b = box_provided(&tree, "f");
        assert_eq!(b[0].min, Some(lit(91)));
        assert_eq!(b[0].max, Some(lit(100)));
    }

    #[test]
    fn test_nonlinear_coordinate_is_unbounded() {
        let tree = provide("f", vec![v("i") * v("i")], lit(0));
        let b = box_provided(&tree, "f");
        assert!(b[0].min.is_none() && b[0].max.is_none());
    }

    #[test]
    fn test_no_provides() {
        let tree = Stmt::Evaluate(lit(0));
        assert!(box_provided(&tree, "f").is_empty());
    }
}
