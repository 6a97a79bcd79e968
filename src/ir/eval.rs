//! Reference interpreter for lowered pipeline trees.
//!
//! Executes a statement over concrete integer buffers. Used by the test
//! suite to check that a transformed tree computes the same values as the
//! tree it came from: a read of a never-written cell is an error, so a
//! rewrite that narrows a required region too far fails loudly instead of
//! producing garbage.

use crate::ir::expr::{BinOp, CmpOp, Expr};
use crate::ir::stmt::Stmt;
use anyhow::{bail, Result};
use num_integer::Integer;
use std::collections::HashMap;

/// A stage's buffer: coordinates to stored value.
pub type Buffer = HashMap<Vec<i64>, i64>;

/// Interprets statements over concrete buffers.
///
/// Booleans evaluate to 0/1. All loop kinds execute serially; the
/// interpreter checks values, not schedules.
#[derive(Debug, Default)]
pub struct Evaluator {
    vars: HashMap<String, Vec<i64>>,
    buffers: HashMap<String, Buffer>,
    store_counts: HashMap<String, u64>,
}

impl Evaluator {
    /// Create an evaluator with no buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a statement.
    pub fn run(&mut self, stmt: &Stmt) -> Result<()> {
        self.exec(stmt)
    }

    /// The buffer written for `stage`, if any statement realized it.
    pub fn buffer(&self, stage: &str) -> Option<&Buffer> {
        self.buffers.get(stage)
    }

    /// How many stores were executed for `stage`.
    pub fn stores_to(&self, stage: &str) -> u64 {
        self.store_counts.get(stage).copied().unwrap_or(0)
    }

    fn exec(&mut self, s: &Stmt) -> Result<()> {
        match s {
            Stmt::LetStmt { name, value, body } => {
                let v = self.eval(value)?;
                self.vars.entry(name.clone()).or_default().push(v);
                let result = self.exec(body);
                if let Some(stack) = self.vars.get_mut(name) {
                    stack.pop();
                }
                result
            }
            Stmt::For {
                name,
                min,
                extent,
                body,
                ..
            } => {
                let min = self.eval(min)?;
                let extent = self.eval(extent)?.max(0);
                for i in 0..extent {
                    self.vars.entry(name.clone()).or_default().push(min + i);
                    let result = self.exec(body);
                    if let Some(stack) = self.vars.get_mut(name) {
                        stack.pop();
                    }
                    result?;
                }
                Ok(())
            }
            Stmt::Realize { stage, body } => {
                // Buffers persist after the realize so tests can inspect them.
                self.buffers.insert(stage.clone(), Buffer::new());
                self.exec(body)
            }
            Stmt::ProducerConsumer { body, .. } => self.exec(body),
            Stmt::IfThenElse {
                cond,
                then_case,
                else_case,
            } => {
                if self.eval(cond)? != 0 {
                    self.exec(then_case)
                } else if let Some(e) = else_case {
                    self.exec(e)
                } else {
                    Ok(())
                }
            }
            Stmt::Provide { stage, args, value } => {
                let coords = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>>>()?;
                let v = self.eval(value)?;
                self.buffers
                    .entry(stage.clone())
                    .or_default()
                    .insert(coords, v);
                *self.store_counts.entry(stage.clone()).or_insert(0) += 1;
                Ok(())
            }
            Stmt::Evaluate(e) => {
                self.eval(e)?;
                Ok(())
            }
            Stmt::Block(stmts) => {
                for c in stmts {
                    self.exec(c)?;
                }
                Ok(())
            }
        }
    }

    fn eval(&mut self, e: &Expr) -> Result<i64> {
        Ok(match e {
            Expr::IntLit(v) => *v,
            Expr::BoolLit(b) => *b as i64,
            Expr::Var(name) => match self.vars.get(name).and_then(|stack| stack.last()) {
                Some(v) => *v,
                None => bail!("unbound variable `{}`", name),
            },
            Expr::Binary { op, a, b } => {
                let a = self.eval(a)?;
                let b = self.eval(b)?;
                match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => {
                        if b == 0 {
                            bail!("division by zero");
                        }
                        Integer::div_floor(&a, &b)
                    }
                    BinOp::Min => a.min(b),
                    BinOp::Max => a.max(b),
                    BinOp::And => ((a != 0) && (b != 0)) as i64,
                    BinOp::Or => ((a != 0) || (b != 0)) as i64,
                }
            }
            Expr::Cmp { op, a, b } => {
                let a = self.eval(a)?;
                let b = self.eval(b)?;
                let r = match op {
                    CmpOp::Eq => a == b,
                    CmpOp::Ne => a != b,
                    CmpOp::Lt => a < b,
                    CmpOp::Le => a <= b,
                    CmpOp::Gt => a > b,
                    CmpOp::Ge => a >= b,
                };
                r as i64
            }
            Expr::Not(a) => (self.eval(a)? == 0) as i64,
            Expr::Select {
                cond,
                if_true,
                if_false,
            } => {
                if self.eval(cond)? != 0 {
                    self.eval(if_true)?
                } else {
                    self.eval(if_false)?
                }
            }
            Expr::Let { name, value, body } => {
                let v = self.eval(value)?;
                self.vars.entry(name.clone()).or_default().push(v);
                let result = self.eval(body);
                if let Some(stack) = self.vars.get_mut(name) {
                    stack.pop();
                }
                result?
            }
            Expr::Call { stage, args } => {
                let coords = args
                    .iter()
                    .map(|a| self.eval(a))
                    .collect::<Result<Vec<_>>>()?;
                match self.buffers.get(stage).and_then(|buf| buf.get(&coords)) {
                    Some(v) => *v,
                    None => bail!("read of `{}` at {:?} before it was written", stage, coords),
                }
            }
            Expr::Likely(a) | Expr::UnsafePromise(a) => self.eval(a)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::*;
    use crate::ir::{ForKind, Stmt};

    #[test]
    fn test_loop_and_store() {
        // realize a { for i in [0, 4): a[i] = i * 2 }
        let tree = realize(
            "a",
            for_loop(
                "i",
                lit(0),
                lit(4),
                ForKind::Serial,
                provide("a", vec![v("i")], v("i") * 2),
            ),
        );
        let mut eval = Evaluator::new();
        eval.run(&tree).unwrap();
        let buf = eval.buffer("a").unwrap();
        assert_eq!(buf.get(&vec![3]), Some(&6));
        assert_eq!(eval.stores_to("a"), 4);
    }

    #[test]
    fn test_uncovered_read_fails() {
        let tree = realize(
            "a",
            Stmt::Evaluate(call("a", vec![lit(0)])),
        );
        let mut eval = Evaluator::new();
        let err = eval.run(&tree).unwrap_err();
        assert!(err.to_string().contains("before it was written"));
    }

    #[test]
    fn test_negative_extent_is_empty() {
        let tree = realize(
            "a",
            for_loop(
                "i",
                lit(0),
                lit(-3),
                ForKind::Serial,
                provide("a", vec![v("i")], lit(1)),
            ),
        );
        let mut eval = Evaluator::new();
        eval.run(&tree).unwrap();
        assert_eq!(eval.stores_to("a"), 0);
    }
}
