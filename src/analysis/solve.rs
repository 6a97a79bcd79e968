//! Equation solving for a single bound variable.
//!
//! `solve_for_inner` answers "for which values of `var` does this equation
//! hold": the pass uses it to find the loop start at which the first
//! iteration's required region lines up with the steady-state window. Only
//! equalities linear in `var` are solved; anything else yields the
//! unbounded interval and the caller falls back to a guarded formula.

use crate::analysis::simplify::{as_linear, equal, simplify, Linear};
use crate::ir::expr::{CmpOp, Expr};
use num_integer::Integer;

/// A possibly one-sided interval of expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    /// Lower bound, if known.
    pub min: Option<Expr>,
    /// Upper bound, if known.
    pub max: Option<Expr>,
}

impl Interval {
    /// The interval containing every value.
    pub fn everything() -> Self {
        Self {
            min: None,
            max: None,
        }
    }

    /// The interval containing exactly `e`.
    pub fn single_point(e: Expr) -> Self {
        Self {
            min: Some(e.clone()),
            max: Some(e),
        }
    }

    /// Whether an upper bound is known.
    pub fn has_upper_bound(&self) -> bool {
        self.max.is_some()
    }

    /// Whether a lower bound is known.
    pub fn has_lower_bound(&self) -> bool {
        self.min.is_some()
    }

    /// The sole member, when both bounds exist and provably coincide.
    pub fn as_single_point(&self) -> Option<&Expr> {
        match (&self.min, &self.max) {
            (Some(a), Some(b)) if equal(a, b) => Some(b),
            _ => None,
        }
    }

    /// The smallest interval containing both `self` and `other`.
    ///
    /// Symbolic bounds combine through min/max nodes; a missing bound stays
    /// missing.
    pub fn union(&self, other: &Interval) -> Interval {
        use crate::ir::builder::{max, min};
        Interval {
            min: match (&self.min, &other.min) {
                (Some(a), Some(b)) => Some(simplify(&min(a.clone(), b.clone()))),
                _ => None,
            },
            max: match (&self.max, &other.max) {
                (Some(a), Some(b)) => Some(simplify(&max(a.clone(), b.clone()))),
                _ => None,
            },
        }
    }
}

/// Solve `eq` (an equality) for `var`, returning the tightest provable
/// interval of solutions.
///
/// The equation is normalized by the gcd of its coefficients. When the
/// coefficient of `var` then divides nothing further, or the equation is
/// not linear in `var`, the result is unbounded rather than wrong.
pub fn solve_for_inner(eq: &Expr, var: &str) -> Interval {
    let (a, b) = match eq {
        Expr::Cmp {
            op: CmpOp::Eq,
            a,
            b,
        } => (a, b),
        _ => return Interval::everything(),
    };
    let diff = match as_linear(&((**a).clone() - (**b).clone())) {
        Some(d) => d,
        None => return Interval::everything(),
    };
    let coeff = diff.terms.get(var).copied().unwrap_or(0);
    if coeff == 0 {
        return Interval::everything();
    }

    // coeff * var + rest == 0
    let mut rest = Linear {
        terms: diff.terms.clone(),
        constant: diff.constant,
    };
    rest.terms.remove(var);

    let mut g = coeff.abs();
    for c in rest.terms.values() {
        g = g.gcd(c);
    }
    g = g.gcd(&rest.constant);
    let g = if g == 0 { 1 } else { g };

    let coeff = coeff / g;
    for c in rest.terms.values_mut() {
        *c /= g;
    }
    rest.constant /= g;

    let solution = match coeff {
        1 => negate(rest),
        -1 => rest,
        _ => return Interval::everything(),
    };
    Interval::single_point(solution.to_expr())
}

fn negate(mut l: Linear) -> Linear {
    for c in l.terms.values_mut() {
        *c = -*c;
    }
    l.constant = -l.constant;
    l
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;

    #[test]
    fn test_exact_solution() {
        // m == x + 2  ==>  x = m - 2
        let eqn = eq(v("m"), v("x") + 2);
        let result = solve_for_inner(&eqn, "x");
        assert_eq!(result.as_single_point(), Some(&(v("m") - 2)));
    }

    #[test]
    fn test_gcd_normalization() {
        // 2x == 2m  ==>  x = m
        let eqn = eq(v("x") * 2, v("m") * 2);
        let result = solve_for_inner(&eqn, "x");
        assert_eq!(result.as_single_point(), Some(&v("m")));
    }

    #[test]
    fn test_unsolvable_coefficient() {
        // 2x == m + 1: no integral symbolic solution.
        let eqn = eq(v("x") * 2, v("m") + 1);
        let result = solve_for_inner(&eqn, "x");
        assert!(!result.has_upper_bound());
    }

    #[test]
    fn test_nonlinear_gives_everything() {
        let eqn = eq(v("x") * v("x"), lit(4));
        let result = solve_for_inner(&eqn, "x");
        assert!(!result.has_upper_bound() && !result.has_lower_bound());
    }

    #[test]
    fn test_var_absent_gives_everything() {
        let eqn = eq(v("m"), lit(3));
        assert!(solve_for_inner(&eqn, "x").as_single_point().is_none());
    }

    #[test]
    fn test_union() {
        let a = Interval::single_point(v("i"));
        let b = Interval::single_point(v("i") + 2);
        let u = a.union(&b);
        assert_eq!(u.min, Some(v("i")));
        assert_eq!(u.max, Some(v("i") + 2));
    }
}
