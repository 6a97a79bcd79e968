//! Monotonicity classification of expressions with respect to a variable.
//!
//! The pass only slides when a region bound provably moves in one direction
//! as the loop variable advances, so `Unknown` must be the answer whenever
//! the rules below cannot commit to a direction.

use crate::ir::expr::{BinOp, Expr};
use crate::ir::subst::substitute;
use serde::{Deserialize, Serialize};

/// Direction of change of an expression as a variable increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Monotonic {
    /// The value does not depend on the variable.
    Constant,
    /// The value never decreases as the variable increases.
    Increasing,
    /// The value never increases as the variable increases.
    Decreasing,
    /// No direction could be proven.
    Unknown,
}

use Monotonic::*;

fn unify(a: Monotonic, b: Monotonic) -> Monotonic {
    match (a, b) {
        (Constant, x) | (x, Constant) => x,
        (Increasing, Increasing) => Increasing,
        (Decreasing, Decreasing) => Decreasing,
        _ => Unknown,
    }
}

fn flip(m: Monotonic) -> Monotonic {
    match m {
        Increasing => Decreasing,
        Decreasing => Increasing,
        other => other,
    }
}

fn scale(m: Monotonic, factor: i64) -> Monotonic {
    if factor == 0 {
        Constant
    } else if factor > 0 {
        m
    } else {
        flip(m)
    }
}

/// Classify how `e` changes as `var` increases.
pub fn is_monotonic(e: &Expr, var: &str) -> Monotonic {
    match e {
        Expr::IntLit(_) | Expr::BoolLit(_) => Constant,
        Expr::Var(name) => {
            if name == var {
                Increasing
            } else {
                Constant
            }
        }
        Expr::Binary { op, a, b } => {
            let ma = is_monotonic(a, var);
            let mb = is_monotonic(b, var);
            match op {
                BinOp::Add => unify(ma, mb),
                BinOp::Sub => unify(ma, flip(mb)),
                BinOp::Min | BinOp::Max => unify(ma, mb),
                BinOp::Mul => match (a.as_int(), b.as_int()) {
                    (Some(c), _) => scale(mb, c),
                    (_, Some(c)) => scale(ma, c),
                    _ => {
                        if ma == Constant && mb == Constant {
                            Constant
                        } else {
                            Unknown
                        }
                    }
                },
                // Floor division by a constant preserves direction.
                BinOp::Div => match b.as_int() {
                    Some(0) => Unknown,
                    Some(c) => scale(ma, c),
                    None => {
                        if ma == Constant && mb == Constant {
                            Constant
                        } else {
                            Unknown
                        }
                    }
                },
                BinOp::And | BinOp::Or => {
                    if ma == Constant && mb == Constant {
                        Constant
                    } else {
                        Unknown
                    }
                }
            }
        }
        Expr::Cmp { a, b, .. } => {
            if is_monotonic(a, var) == Constant && is_monotonic(b, var) == Constant {
                Constant
            } else {
                Unknown
            }
        }
        Expr::Not(a) => {
            if is_monotonic(a, var) == Constant {
                Constant
            } else {
                Unknown
            }
        }
        Expr::Select {
            cond,
            if_true,
            if_false,
        } => {
            if is_monotonic(cond, var) == Constant {
                unify(is_monotonic(if_true, var), is_monotonic(if_false, var))
            } else {
                Unknown
            }
        }
        // Inline the binding; a rebinding of `var` is resolved by the
        // substitution rather than observed by the classifier.
        Expr::Let { name, value, body } => is_monotonic(&substitute(name, value, body), var),
        Expr::Call { args, .. } => {
            if args.iter().all(|a| is_monotonic(a, var) == Constant) {
                Constant
            } else {
                Unknown
            }
        }
        Expr::Likely(a) | Expr::UnsafePromise(a) => is_monotonic(a, var),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;

    #[test]
    fn test_linear_directions() {
        assert_eq!(is_monotonic(&(v("i") + 2), "i"), Increasing);
        assert_eq!(is_monotonic(&(lit(10) - v("i")), "i"), Decreasing);
        assert_eq!(is_monotonic(&v("n"), "i"), Constant);
        assert_eq!(is_monotonic(&(v("i") * -3), "i"), Decreasing);
    }

    #[test]
    fn test_division_by_constant() {
        assert_eq!(is_monotonic(&div(v("i"), lit(2)), "i"), Increasing);
        assert_eq!(is_monotonic(&div(v("i"), lit(-2)), "i"), Decreasing);
    }

    #[test]
    fn test_min_max_combine() {
        assert_eq!(is_monotonic(&min(v("i"), v("i") + 4), "i"), Increasing);
        assert_eq!(is_monotonic(&max(v("i"), lit(3) - v("i")), "i"), Unknown);
    }

    #[test]
    fn test_nonlinear_is_unknown() {
        assert_eq!(is_monotonic(&(v("i") * v("i")), "i"), Unknown);
        assert_eq!(
            is_monotonic(&select(ge(v("i"), lit(0)), v("i"), lit(0)), "i"),
            Unknown
        );
    }

    #[test]
    fn test_let_is_expanded() {
        let e = let_expr("t", v("i") * 2, v("t") + 1);
        assert_eq!(is_monotonic(&e, "i"), Increasing);
    }

    #[test]
    fn test_wrappers_are_transparent() {
        assert_eq!(is_monotonic(&likely(v("i")), "i"), Increasing);
        assert_eq!(is_monotonic(&unsafe_promise(lit(3) - v("i")), "i"), Decreasing);
    }
}
