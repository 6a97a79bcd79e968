//! Best-effort diagnostics collected while sliding.
//!
//! When a required-region bound cannot be classified as monotonic with
//! respect to a loop variable, the pass records the pair for reporting.
//! Records never affect the transformation result.

use crate::ir::Expr;
use serde::{Deserialize, Serialize};

/// A bound expression that could not be proven monotonic in a loop variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonMonotonicVar {
    /// The loop variable the bound was classified against.
    pub loop_var: String,
    /// The offending bound expression, fully expanded.
    pub expr: Expr,
}

/// Append-only sink for sliding-window diagnostics.
#[derive(Debug, Default)]
pub struct Diagnostics {
    non_monotonic: Vec<NonMonotonicVar>,
}

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bound that could not be proven monotonic in `loop_var`.
    pub fn record_non_monotonic(&mut self, loop_var: &str, expr: &Expr) {
        self.non_monotonic.push(NonMonotonicVar {
            loop_var: loop_var.to_string(),
            expr: expr.clone(),
        });
    }

    /// All non-monotonic records, in the order they were made.
    pub fn non_monotonic(&self) -> &[NonMonotonicVar] {
        &self.non_monotonic
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.non_monotonic.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::builder::v;

    #[test]
    fn test_record() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());

        diag.record_non_monotonic("i", &v("n"));
        assert_eq!(diag.non_monotonic().len(), 1);
        assert_eq!(diag.non_monotonic()[0].loop_var, "i");
    }
}
