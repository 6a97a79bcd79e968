//! Variable-for-expression substitution.
//!
//! Substitution is capture-avoiding with respect to the binders in the IR:
//! a `Let`, `LetStmt`, or `For` that rebinds a substituted name shadows it
//! for the extent of its body.

use crate::ir::expr::Expr;
use crate::ir::stmt::Stmt;
use std::collections::HashMap;

/// Replace every free occurrence of `name` with `replacement` in `e`.
pub fn substitute(name: &str, replacement: &Expr, e: &Expr) -> Expr {
    let mut map = HashMap::new();
    map.insert(name.to_string(), replacement.clone());
    substitute_map(&map, e)
}

/// Replace every free occurrence of each mapped name in `e`.
pub fn substitute_map(map: &HashMap<String, Expr>, e: &Expr) -> Expr {
    if map.is_empty() {
        return e.clone();
    }
    match e {
        Expr::IntLit(_) | Expr::BoolLit(_) => e.clone(),
        Expr::Var(n) => match map.get(n) {
            Some(r) => r.clone(),
            None => e.clone(),
        },
        Expr::Binary { op, a, b } => Expr::Binary {
            op: *op,
            a: Box::new(substitute_map(map, a)),
            b: Box::new(substitute_map(map, b)),
        },
        Expr::Cmp { op, a, b } => Expr::Cmp {
            op: *op,
            a: Box::new(substitute_map(map, a)),
            b: Box::new(substitute_map(map, b)),
        },
        Expr::Not(a) => Expr::Not(Box::new(substitute_map(map, a))),
        Expr::Select {
            cond,
            if_true,
            if_false,
        } => Expr::Select {
            cond: Box::new(substitute_map(map, cond)),
            if_true: Box::new(substitute_map(map, if_true)),
            if_false: Box::new(substitute_map(map, if_false)),
        },
        Expr::Let { name, value, body } => Expr::Let {
            name: name.clone(),
            value: Box::new(substitute_map(map, value)),
            body: Box::new(substitute_shadowed(map, name, body)),
        },
        Expr::Call { stage, args } => Expr::Call {
            stage: stage.clone(),
            args: args.iter().map(|a| substitute_map(map, a)).collect(),
        },
        Expr::Likely(a) => Expr::Likely(Box::new(substitute_map(map, a))),
        Expr::UnsafePromise(a) => Expr::UnsafePromise(Box::new(substitute_map(map, a))),
    }
}

/// Replace every free occurrence of `name` with `replacement` in `s`.
pub fn substitute_stmt(name: &str, replacement: &Expr, s: &Stmt) -> Stmt {
    let mut map = HashMap::new();
    map.insert(name.to_string(), replacement.clone());
    substitute_map_stmt(&map, s)
}

/// Replace every free occurrence of each mapped name in `s`.
pub fn substitute_map_stmt(map: &HashMap<String, Expr>, s: &Stmt) -> Stmt {
    if map.is_empty() {
        return s.clone();
    }
    match s {
        Stmt::LetStmt { name, value, body } => Stmt::LetStmt {
            name: name.clone(),
            value: substitute_map(map, value),
            body: Box::new(substitute_shadowed_stmt(map, name, body)),
        },
        Stmt::For {
            name,
            min,
            extent,
            kind,
            body,
        } => Stmt::For {
            name: name.clone(),
            min: substitute_map(map, min),
            extent: substitute_map(map, extent),
            kind: *kind,
            body: Box::new(substitute_shadowed_stmt(map, name, body)),
        },
        Stmt::Realize { stage, body } => Stmt::Realize {
            stage: stage.clone(),
            body: Box::new(substitute_map_stmt(map, body)),
        },
        Stmt::ProducerConsumer {
            stage,
            is_producer,
            body,
        } => Stmt::ProducerConsumer {
            stage: stage.clone(),
            is_producer: *is_producer,
            body: Box::new(substitute_map_stmt(map, body)),
        },
        Stmt::IfThenElse {
            cond,
            then_case,
            else_case,
        } => Stmt::IfThenElse {
            cond: substitute_map(map, cond),
            then_case: Box::new(substitute_map_stmt(map, then_case)),
            else_case: else_case
                .as_ref()
                .map(|e| Box::new(substitute_map_stmt(map, e))),
        },
        Stmt::Provide { stage, args, value } => Stmt::Provide {
            stage: stage.clone(),
            args: args.iter().map(|a| substitute_map(map, a)).collect(),
            value: substitute_map(map, value),
        },
        Stmt::Evaluate(e) => Stmt::Evaluate(substitute_map(map, e)),
        Stmt::Block(stmts) => {
            Stmt::Block(stmts.iter().map(|c| substitute_map_stmt(map, c)).collect())
        }
    }
}

fn substitute_shadowed(map: &HashMap<String, Expr>, binder: &str, body: &Expr) -> Expr {
    if map.contains_key(binder) {
        let mut inner = map.clone();
        inner.remove(binder);
        substitute_map(&inner, body)
    } else {
        substitute_map(map, body)
    }
}

fn substitute_shadowed_stmt(map: &HashMap<String, Expr>, binder: &str, body: &Stmt) -> Stmt {
    if map.contains_key(binder) {
        let mut inner = map.clone();
        inner.remove(binder);
        substitute_map_stmt(&inner, body)
    } else {
        substitute_map_stmt(map, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;

    #[test]
    fn test_simple_substitution() {
        let e = v("i") + 1;
        let out = substitute("i", &lit(5), &e);
        assert_eq!(out, lit(5) + 1);
    }

    #[test]
    fn test_let_shadows() {
        // (let i = i + 1 in i * 2): the value sees the outer i, the body
        // sees the rebinding.
        let e = let_expr("i", v("i") + 1, v("i") * 2);
        let out = substitute("i", &lit(10), &e);
        assert_eq!(out, let_expr("i", lit(10) + 1, v("i") * 2));
    }

    #[test]
    fn test_for_shadows_in_stmt() {
        let s = for_loop(
            "i",
            v("i"),
            lit(4),
            crate::ir::ForKind::Serial,
            provide("a", vec![v("i")], lit(0)),
        );
        let out = substitute_stmt("i", &lit(7), &s);
        // The loop min sees the outer i; the body does not.
        match out {
            crate::ir::Stmt::For { min, body, .. } => {
                assert_eq!(min, lit(7));
                assert_eq!(*body, provide("a", vec![v("i")], lit(0)));
            }
            other => panic!("expected For, got {:?}", other),
        }
    }
}
