//! Expression simplification and a lightweight prover.
//!
//! The normal form is a linear combination `c0 + c1*x1 + ... + cn*xn` with
//! terms in name order. Expressions that linearize are rebuilt canonically;
//! everything else gets local rules for min/max/select/boolean nodes. The
//! prover decides exactly the comparisons whose linear difference is
//! variable-free, which is what the affine bounds this pass manipulates
//! need.

use crate::ir::expr::{BinOp, CmpOp, Expr};
use num_integer::Integer;
use std::collections::BTreeMap;

/// A linear combination of variables plus a constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Linear {
    /// Coefficient per variable name, in name order.
    pub terms: BTreeMap<String, i64>,
    /// Constant term.
    pub constant: i64,
}

impl Linear {
    pub(crate) fn constant(c: i64) -> Self {
        Self {
            terms: BTreeMap::new(),
            constant: c,
        }
    }

    fn var(name: &str) -> Self {
        let mut terms = BTreeMap::new();
        terms.insert(name.to_string(), 1);
        Self { terms, constant: 0 }
    }

    fn combine(mut self, other: &Linear, sign: i64) -> Self {
        for (name, c) in &other.terms {
            let entry = self.terms.entry(name.clone()).or_insert(0);
            *entry += c * sign;
            if *entry == 0 {
                self.terms.remove(name);
            }
        }
        self.constant += other.constant * sign;
        self
    }

    fn scale(mut self, factor: i64) -> Self {
        if factor == 0 {
            return Linear::constant(0);
        }
        for c in self.terms.values_mut() {
            *c *= factor;
        }
        self.constant *= factor;
        self
    }

    /// Whether there are no variable terms.
    pub(crate) fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Rebuild the canonical expression.
    pub(crate) fn to_expr(&self) -> Expr {
        let mut acc: Option<Expr> = None;
        for (name, &c) in &self.terms {
            if c == 0 {
                continue;
            }
            let magnitude = |k: i64| {
                if k == 1 {
                    Expr::Var(name.clone())
                } else {
                    Expr::IntLit(k) * Expr::Var(name.clone())
                }
            };
            acc = Some(match acc {
                None => {
                    if c > 0 {
                        magnitude(c)
                    } else {
                        Expr::IntLit(c) * Expr::Var(name.clone())
                    }
                }
                Some(prev) => {
                    if c > 0 {
                        prev + magnitude(c)
                    } else {
                        prev - magnitude(-c)
                    }
                }
            });
        }
        match acc {
            None => Expr::IntLit(self.constant),
            Some(e) => {
                if self.constant > 0 {
                    e + self.constant
                } else if self.constant < 0 {
                    e - (-self.constant)
                } else {
                    e
                }
            }
        }
    }
}

/// Try to view `e` as a linear combination. Hint and promise wrappers are
/// opaque here; strip them first if they should not block linearization.
pub(crate) fn as_linear(e: &Expr) -> Option<Linear> {
    match e {
        Expr::IntLit(v) => Some(Linear::constant(*v)),
        Expr::Var(name) => Some(Linear::var(name)),
        Expr::Binary { op, a, b } => {
            let la = as_linear(a)?;
            let lb = as_linear(b)?;
            match op {
                BinOp::Add => Some(la.combine(&lb, 1)),
                BinOp::Sub => Some(la.combine(&lb, -1)),
                BinOp::Mul => {
                    if la.is_constant() {
                        Some(lb.scale(la.constant))
                    } else if lb.is_constant() {
                        Some(la.scale(lb.constant))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Normalize an expression without changing its meaning.
pub fn simplify(e: &Expr) -> Expr {
    if let Some(lin) = as_linear(e) {
        return lin.to_expr();
    }
    match e {
        Expr::IntLit(_) | Expr::BoolLit(_) | Expr::Var(_) => e.clone(),
        Expr::Binary { op, a, b } => simplify_binary(*op, simplify(a), simplify(b)),
        Expr::Cmp { op, a, b } => simplify_cmp(*op, simplify(a), simplify(b)),
        Expr::Not(a) => match simplify(a) {
            Expr::BoolLit(v) => Expr::BoolLit(!v),
            Expr::Not(inner) => *inner,
            other => Expr::Not(Box::new(other)),
        },
        Expr::Select {
            cond,
            if_true,
            if_false,
        } => {
            let cond = simplify(cond);
            let if_true = simplify(if_true);
            let if_false = simplify(if_false);
            match cond {
                Expr::BoolLit(true) => if_true,
                Expr::BoolLit(false) => if_false,
                _ if if_true == if_false => if_true,
                _ => Expr::Select {
                    cond: Box::new(cond),
                    if_true: Box::new(if_true),
                    if_false: Box::new(if_false),
                },
            }
        }
        Expr::Let { name, value, body } => Expr::Let {
            name: name.clone(),
            value: Box::new(simplify(value)),
            body: Box::new(simplify(body)),
        },
        Expr::Call { stage, args } => Expr::Call {
            stage: stage.clone(),
            args: args.iter().map(simplify).collect(),
        },
        Expr::Likely(a) => Expr::Likely(Box::new(simplify(a))),
        Expr::UnsafePromise(a) => Expr::UnsafePromise(Box::new(simplify(a))),
    }
}

fn simplify_binary(op: BinOp, a: Expr, b: Expr) -> Expr {
    let node = Expr::Binary {
        op,
        a: Box::new(a),
        b: Box::new(b),
    };
    if let Some(lin) = as_linear(&node) {
        return lin.to_expr();
    }
    let (a, b) = match node {
        Expr::Binary { a, b, .. } => (*a, *b),
        _ => unreachable!(),
    };
    match op {
        BinOp::Min | BinOp::Max => {
            if a == b {
                return a;
            }
            // Decide by the sign of (b - a) when it is variable-free.
            let diff = as_linear(&(b.clone() - a.clone()));
            if let Some(d) = diff {
                if d.is_constant() {
                    let b_is_larger = d.constant >= 0;
                    return match (op, b_is_larger) {
                        (BinOp::Min, true) | (BinOp::Max, false) => a,
                        _ => b,
                    };
                }
            }
            rebuild(op, a, b)
        }
        BinOp::Div => match (&a, &b) {
            (Expr::IntLit(x), Expr::IntLit(y)) if *y != 0 => {
                Expr::IntLit(Integer::div_floor(x, y))
            }
            (_, Expr::IntLit(1)) => a,
            _ => rebuild(op, a, b),
        },
        BinOp::And => match (&a, &b) {
            (Expr::BoolLit(false), _) | (_, Expr::BoolLit(false)) => Expr::BoolLit(false),
            (Expr::BoolLit(true), _) => b,
            (_, Expr::BoolLit(true)) => a,
            _ => rebuild(op, a, b),
        },
        BinOp::Or => match (&a, &b) {
            (Expr::BoolLit(true), _) | (_, Expr::BoolLit(true)) => Expr::BoolLit(true),
            (Expr::BoolLit(false), _) => b,
            (_, Expr::BoolLit(false)) => a,
            _ => rebuild(op, a, b),
        },
        BinOp::Add | BinOp::Sub | BinOp::Mul => {
            // Non-linear operands; only strip identities.
            match (op, &a, &b) {
                (BinOp::Add, _, Expr::IntLit(0)) | (BinOp::Sub, _, Expr::IntLit(0)) => a,
                (BinOp::Add, Expr::IntLit(0), _) => b,
                (BinOp::Mul, _, Expr::IntLit(1)) => a,
                (BinOp::Mul, Expr::IntLit(1), _) => b,
                (BinOp::Mul, _, Expr::IntLit(0)) | (BinOp::Mul, Expr::IntLit(0), _) => {
                    Expr::IntLit(0)
                }
                _ => rebuild(op, a, b),
            }
        }
    }
}

fn rebuild(op: BinOp, a: Expr, b: Expr) -> Expr {
    Expr::Binary {
        op,
        a: Box::new(a),
        b: Box::new(b),
    }
}

fn simplify_cmp(op: CmpOp, a: Expr, b: Expr) -> Expr {
    if let Some(d) = as_linear(&(a.clone() - b.clone())) {
        if d.is_constant() {
            let c = d.constant;
            let result = match op {
                CmpOp::Eq => c == 0,
                CmpOp::Ne => c != 0,
                CmpOp::Lt => c < 0,
                CmpOp::Le => c <= 0,
                CmpOp::Gt => c > 0,
                CmpOp::Ge => c >= 0,
            };
            return Expr::BoolLit(result);
        }
    }
    if let (Expr::BoolLit(x), Expr::BoolLit(y)) = (&a, &b) {
        match op {
            CmpOp::Eq => return Expr::BoolLit(x == y),
            CmpOp::Ne => return Expr::BoolLit(x != y),
            _ => {}
        }
    }
    Expr::Cmp {
        op,
        a: Box::new(a),
        b: Box::new(b),
    }
}

/// Remove unsafe-promise wrappers; the wrapped value stands in directly.
pub fn lower_unsafe_promises(e: &Expr) -> Expr {
    map_nodes(e, &|node| match node {
        Expr::UnsafePromise(inner) => (**inner).clone(),
        other => other.clone(),
    })
}

/// Remove both hint and promise wrappers; used in proof-only contexts
/// where annotations carry no meaning.
fn strip_wrappers(e: &Expr) -> Expr {
    map_nodes(e, &|node| match node {
        Expr::Likely(inner) | Expr::UnsafePromise(inner) => (**inner).clone(),
        other => other.clone(),
    })
}

/// Bottom-up node replacement.
fn map_nodes(e: &Expr, f: &dyn Fn(&Expr) -> Expr) -> Expr {
    let rebuilt = match e {
        Expr::IntLit(_) | Expr::BoolLit(_) | Expr::Var(_) => e.clone(),
        Expr::Binary { op, a, b } => Expr::Binary {
            op: *op,
            a: Box::new(map_nodes(a, f)),
            b: Box::new(map_nodes(b, f)),
        },
        Expr::Cmp { op, a, b } => Expr::Cmp {
            op: *op,
            a: Box::new(map_nodes(a, f)),
            b: Box::new(map_nodes(b, f)),
        },
        Expr::Not(a) => Expr::Not(Box::new(map_nodes(a, f))),
        Expr::Select {
            cond,
            if_true,
            if_false,
        } => Expr::Select {
            cond: Box::new(map_nodes(cond, f)),
            if_true: Box::new(map_nodes(if_true, f)),
            if_false: Box::new(map_nodes(if_false, f)),
        },
        Expr::Let { name, value, body } => Expr::Let {
            name: name.clone(),
            value: Box::new(map_nodes(value, f)),
            body: Box::new(map_nodes(body, f)),
        },
        Expr::Call { stage, args } => Expr::Call {
            stage: stage.clone(),
            args: args.iter().map(|a| map_nodes(a, f)).collect(),
        },
        Expr::Likely(a) => Expr::Likely(Box::new(map_nodes(a, f))),
        Expr::UnsafePromise(a) => Expr::UnsafePromise(Box::new(map_nodes(a, f))),
    };
    f(&rebuilt)
}

/// Whether `e` provably holds for all values of its free variables.
pub fn can_prove(e: &Expr) -> bool {
    matches!(simplify(&strip_wrappers(e)), Expr::BoolLit(true))
}

/// Whether two expressions are provably equal.
pub fn equal(a: &Expr, b: &Expr) -> bool {
    a == b
        || can_prove(&Expr::Cmp {
            op: CmpOp::Eq,
            a: Box::new(a.clone()),
            b: Box::new(b.clone()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;

    #[test]
    fn test_linear_normal_form() {
        // i + (n - i + 1) - 1  ==>  n
        let e = v("i") + (v("n") - v("i") + 1) - 1;
        assert_eq!(simplify(&e), v("n"));
    }

    #[test]
    fn test_constant_folding() {
        let e = (lit(2) * lit(3)) + 4;
        assert_eq!(simplify(&e), lit(10));
    }

    #[test]
    fn test_min_of_ordered_operands() {
        let e = min(v("i") + 1, v("i") + 3);
        assert_eq!(simplify(&e), v("i") + 1);
        let e = max(v("i") + 1, v("i") + 3);
        assert_eq!(simplify(&e), v("i") + 3);
    }

    #[test]
    fn test_select_folding() {
        let e = select(le(v("i"), v("i")), lit(1), lit(2));
        assert_eq!(simplify(&e), lit(1));
    }

    #[test]
    fn test_can_prove() {
        assert!(can_prove(&ge(v("i") + 2, v("i"))));
        assert!(!can_prove(&ge(v("i"), v("i") + 2)));
        assert!(!can_prove(&ge(v("i"), v("j"))));
    }

    #[test]
    fn test_can_prove_through_wrappers() {
        let e = ge(unsafe_promise(v("i") + 2), likely(v("i")));
        assert!(can_prove(&e));
    }

    #[test]
    fn test_equal() {
        assert!(equal(&(v("i") + 1 + 1), &(v("i") + 2)));
        assert!(!equal(&v("i"), &(v("i") + 1)));
    }

    #[test]
    fn test_lower_unsafe_promises_keeps_likely() {
        let e = likely(unsafe_promise(v("x")) + 1);
        assert_eq!(lower_unsafe_promises(&e), likely(v("x") + 1));
    }

    #[test]
    fn test_simplify_keeps_wrappers() {
        let e = likely(v("i") + 0);
        assert_eq!(simplify(&e), likely(v("i")));
    }
}
