//! Expression nodes.
//!
//! All values are integers or booleans; bounds and loop variables are
//! symbolic names over integer expressions. `Likely` and `UnsafePromise`
//! are semantically the identity: the first is a branch-prediction hint for
//! innermost loops, the second an optimization promise that must be stripped
//! before equation solving.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// Binary arithmetic and logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Floor division.
    Div,
    /// Minimum of two values.
    Min,
    /// Maximum of two values.
    Max,
    /// Logical and.
    And,
    /// Logical or.
    Or,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// An expression in the pipeline IR.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expr {
    /// Integer literal.
    IntLit(i64),
    /// Boolean literal.
    BoolLit(bool),
    /// Variable reference.
    Var(String),
    /// Binary operation.
    Binary {
        /// Operator.
        op: BinOp,
        /// Left operand.
        a: Box<Expr>,
        /// Right operand.
        b: Box<Expr>,
    },
    /// Comparison producing a boolean.
    Cmp {
        /// Operator.
        op: CmpOp,
        /// Left operand.
        a: Box<Expr>,
        /// Right operand.
        b: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// Conditional select: `if_true` when `cond` holds, else `if_false`.
    Select {
        /// Condition.
        cond: Box<Expr>,
        /// Value when the condition holds.
        if_true: Box<Expr>,
        /// Value otherwise.
        if_false: Box<Expr>,
    },
    /// Let-binding scoped to `body`.
    Let {
        /// Bound name.
        name: String,
        /// Bound value.
        value: Box<Expr>,
        /// Expression the binding is visible in.
        body: Box<Expr>,
    },
    /// Load of a stage's value at the given coordinates.
    Call {
        /// Stage name.
        stage: String,
        /// Per-dimension coordinates.
        args: Vec<Expr>,
    },
    /// Likely-taken branch hint for the innermost loop; identity value.
    Likely(Box<Expr>),
    /// Unsafe-promise wrapper; identity value, stripped before solving.
    UnsafePromise(Box<Expr>),
}

impl Expr {
    /// The integer value if this is an integer literal.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Expr::IntLit(v) => Some(*v),
            _ => None,
        }
    }

    /// The variable name if this is a variable reference.
    pub fn as_var(&self) -> Option<&str> {
        match self {
            Expr::Var(name) => Some(name),
            _ => None,
        }
    }

    /// Whether this is the integer literal `v`.
    pub fn is_const(&self, v: i64) -> bool {
        self.as_int() == Some(v)
    }

    /// Whether the expression contains no stage-value loads.
    ///
    /// Loads observe buffer contents at evaluation time, so expressions
    /// containing them cannot be hoisted out of the iteration order.
    pub fn is_pure(&self) -> bool {
        match self {
            Expr::IntLit(_) | Expr::BoolLit(_) | Expr::Var(_) => true,
            Expr::Binary { a, b, .. } | Expr::Cmp { a, b, .. } => a.is_pure() && b.is_pure(),
            Expr::Not(a) | Expr::Likely(a) | Expr::UnsafePromise(a) => a.is_pure(),
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => cond.is_pure() && if_true.is_pure() && if_false.is_pure(),
            Expr::Let { value, body, .. } => value.is_pure() && body.is_pure(),
            Expr::Call { .. } => false,
        }
    }
}

fn bin(op: BinOp, a: Expr, b: Expr) -> Expr {
    Expr::Binary {
        op,
        a: Box::new(a),
        b: Box::new(b),
    }
}

impl Add for Expr {
    type Output = Expr;
    fn add(self, rhs: Expr) -> Expr {
        bin(BinOp::Add, self, rhs)
    }
}

impl Add<i64> for Expr {
    type Output = Expr;
    fn add(self, rhs: i64) -> Expr {
        bin(BinOp::Add, self, Expr::IntLit(rhs))
    }
}

impl Sub for Expr {
    type Output = Expr;
    fn sub(self, rhs: Expr) -> Expr {
        bin(BinOp::Sub, self, rhs)
    }
}

impl Sub<i64> for Expr {
    type Output = Expr;
    fn sub(self, rhs: i64) -> Expr {
        bin(BinOp::Sub, self, Expr::IntLit(rhs))
    }
}

impl Mul for Expr {
    type Output = Expr;
    fn mul(self, rhs: Expr) -> Expr {
        bin(BinOp::Mul, self, rhs)
    }
}

impl Mul<i64> for Expr {
    type Output = Expr;
    fn mul(self, rhs: i64) -> Expr {
        bin(BinOp::Mul, self, Expr::IntLit(rhs))
    }
}

/// Convenience constructors used throughout the pass and its tests.
pub mod builder {
    use super::{bin, BinOp, CmpOp, Expr};

    /// Variable reference.
    pub fn v(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    /// Integer literal.
    pub fn lit(value: i64) -> Expr {
        Expr::IntLit(value)
    }

    /// Minimum of two expressions.
    pub fn min(a: Expr, b: Expr) -> Expr {
        bin(BinOp::Min, a, b)
    }

    /// Maximum of two expressions.
    pub fn max(a: Expr, b: Expr) -> Expr {
        bin(BinOp::Max, a, b)
    }

    /// Floor division.
    pub fn div(a: Expr, b: Expr) -> Expr {
        bin(BinOp::Div, a, b)
    }

    /// Comparison `a == b`.
    pub fn eq(a: Expr, b: Expr) -> Expr {
        cmp(CmpOp::Eq, a, b)
    }

    /// Comparison `a <= b`.
    pub fn le(a: Expr, b: Expr) -> Expr {
        cmp(CmpOp::Le, a, b)
    }

    /// Comparison `a >= b`.
    pub fn ge(a: Expr, b: Expr) -> Expr {
        cmp(CmpOp::Ge, a, b)
    }

    /// Comparison `a < b`.
    pub fn lt(a: Expr, b: Expr) -> Expr {
        cmp(CmpOp::Lt, a, b)
    }

    /// Comparison with an explicit operator.
    pub fn cmp(op: CmpOp, a: Expr, b: Expr) -> Expr {
        Expr::Cmp {
            op,
            a: Box::new(a),
            b: Box::new(b),
        }
    }

    /// Conditional select.
    pub fn select(cond: Expr, if_true: Expr, if_false: Expr) -> Expr {
        Expr::Select {
            cond: Box::new(cond),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// Let-binding expression.
    pub fn let_expr(name: impl Into<String>, value: Expr, body: Expr) -> Expr {
        Expr::Let {
            name: name.into(),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    /// Load of a stage's value.
    pub fn call(stage: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            stage: stage.into(),
            args,
        }
    }

    /// Likely-taken branch hint.
    pub fn likely(e: Expr) -> Expr {
        Expr::Likely(Box::new(e))
    }

    /// Unsafe-promise wrapper.
    pub fn unsafe_promise(e: Expr) -> Expr {
        Expr::UnsafePromise(Box::new(e))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLit(v) => write!(f, "{}", v),
            Expr::BoolLit(b) => write!(f, "{}", b),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Binary { op, a, b } => match op {
                BinOp::Add => write!(f, "({} + {})", a, b),
                BinOp::Sub => write!(f, "({} - {})", a, b),
                BinOp::Mul => write!(f, "({}*{})", a, b),
                BinOp::Div => write!(f, "({}/{})", a, b),
                BinOp::Min => write!(f, "min({}, {})", a, b),
                BinOp::Max => write!(f, "max({}, {})", a, b),
                BinOp::And => write!(f, "({} && {})", a, b),
                BinOp::Or => write!(f, "({} || {})", a, b),
            },
            Expr::Cmp { op, a, b } => {
                let sym = match op {
                    CmpOp::Eq => "==",
                    CmpOp::Ne => "!=",
                    CmpOp::Lt => "<",
                    CmpOp::Le => "<=",
                    CmpOp::Gt => ">",
                    CmpOp::Ge => ">=",
                };
                write!(f, "({} {} {})", a, sym, b)
            }
            Expr::Not(a) => write!(f, "!{}", a),
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => write!(f, "select({}, {}, {})", cond, if_true, if_false),
            Expr::Let { name, value, body } => write!(f, "(let {} = {} in {})", name, value, body),
            Expr::Call { stage, args } => {
                write!(f, "{}(", stage)?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", a)?;
                }
                write!(f, ")")
            }
            Expr::Likely(a) => write!(f, "likely({})", a),
            Expr::UnsafePromise(a) => write!(f, "unsafe_promise({})", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::builder::*;
    use super::*;

    #[test]
    fn test_ops_build_binary_nodes() {
        let e = v("i") + 1;
        assert_eq!(
            e,
            Expr::Binary {
                op: BinOp::Add,
                a: Box::new(v("i")),
                b: Box::new(lit(1)),
            }
        );
    }

    #[test]
    fn test_display() {
        let e = min(v("i") + 2, v("n") - 1);
        assert_eq!(e.to_string(), "min((i + 2), (n - 1))");
    }

    #[test]
    fn test_purity() {
        assert!((v("i") + 3).is_pure());
        assert!(!call("blur", vec![v("i")]).is_pure());
        assert!(!select(ge(v("i"), lit(0)), call("f", vec![]), lit(0)).is_pure());
    }
}
